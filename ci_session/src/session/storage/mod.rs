mod errors;
mod file;
mod memory;
mod types;

pub use errors::StorageError;
pub use types::{FileStorage, MemoryStorage, SessionStorage};
