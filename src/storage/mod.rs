//! Object storage backends
//!
//! The pipeline talks to buckets through the `ObjectStore` trait. The S3
//! backend requires the `cloud` feature; the in-memory backend is always
//! available.

mod backend;
pub mod memory;
#[cfg(feature = "cloud")]
mod s3;

pub use backend::{body_from_bytes, ObjectBody, ObjectMetadata, ObjectStore, PutRequest};
pub use memory::MemoryStore;
#[cfg(feature = "cloud")]
pub use s3::S3Store;
