mod disk_store;

pub use disk_store::{DiskStorage, StoredFile};
