//! Ask your personal journal questions in natural language.
//!
//! memoir stores dated journal entries (MIT, free-form content, gratitude
//! list, daily ratings) in SQLite and answers free-text questions about them
//! by retrieving relevant entries, fitting them into a token budget, and
//! handing an assembled prompt to a completion service.
//!
//! # Architecture
//!
//! - **Storage**: SQLite with [sqlite-vec](https://github.com/asg017/sqlite-vec)
//!   for vector search
//! - **Embeddings & answers**: any OpenAI-compatible HTTP API
//!   (`text-embedding-3-small` / `gpt-4o` by default)
//! - **Retrieval**: three tiers with graceful degradation — semantic KNN,
//!   then date-filtered scans when the semantic layer fails or comes up dry
//! - **Budgeting**: deterministic selection under an approximate token
//!   ceiling; similarity ranking for semantic hits, stride sampling for
//!   scan results
//!
//! # Modules
//!
//! - [`config`] — Configuration loading from TOML files and environment variables
//! - [`db`] — SQLite database initialization and schema
//! - [`embedding`] / [`completion`] — Provider traits and OpenAI-compatible clients
//! - [`journal`] — Entry types, normalization, read/write paths, statistics
//! - [`ask`] — The question-answering pipeline

pub mod ask;
pub mod completion;
pub mod config;
pub mod db;
pub mod embedding;
pub mod journal;
