// Document cache module
// Author: kelexine (https://github.com/kelexine)

pub mod initializer;
pub mod models;

pub use initializer::{CacheInitializer, CacheSettings};
pub use models::{CacheHandle, DocumentReference, FileState, PollPolicy, RemoteFile};
