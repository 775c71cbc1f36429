pub use registry_models::error::Result;
pub use registry_models::{ErrorKind, StorageError};
