pub mod ask;
pub mod import;
pub mod re_embed;
pub mod stats;
