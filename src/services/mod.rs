pub mod worker_directory;

pub use worker_directory::{DirectoryError, InMemoryDirectory, PgDirectory, WorkerDirectory, WorkerRecord};
