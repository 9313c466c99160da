pub mod normalize;
pub mod scan;
pub mod stats;
pub mod store;
pub mod types;

/// Convert an f32 embedding slice to raw bytes for sqlite-vec.
pub fn embedding_to_bytes(embedding: &[f32]) -> &[u8] {
    unsafe {
        std::slice::from_raw_parts(
            embedding.as_ptr() as *const u8,
            embedding.len() * std::mem::size_of::<f32>(),
        )
    }
}

/// Max L2 distance between unit vectors whose cosine similarity is at least
/// `threshold`: `d = sqrt(2 * (1 - cos))`.
pub fn cosine_threshold_to_l2(threshold: f64) -> f64 {
    (2.0 * (1.0 - threshold)).max(0.0).sqrt()
}

/// Cosine similarity of two unit vectors at L2 distance `d`: `1 - d^2 / 2`.
pub fn l2_to_cosine(distance: f64) -> f64 {
    1.0 - distance * distance / 2.0
}
