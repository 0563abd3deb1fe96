//! CLI commands implementation

pub mod ask;
pub mod ingest;
pub mod models;
pub mod status;

pub use ask::*;
pub use ingest::*;
pub use models::*;
pub use status::*;
