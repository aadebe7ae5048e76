pub mod database;
pub mod schema;
pub mod transcripts;

pub use database::{Database, PoolConfig};
pub use transcripts::TranscriptRepo;
