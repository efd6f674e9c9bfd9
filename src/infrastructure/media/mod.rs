//! Media Storage
//!
//! Where uploaded files live. The messaging layer only ever sees the public
//! reference string returned by [`MediaStorage::store`].

mod storage;

pub use storage::{sanitize_file_name, LocalMediaStorage, MediaStorage};
