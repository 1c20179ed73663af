//! Object storage for uploaded files using Apache OpenDAL.
//!
//! The catalog only talks to the [`ObjectStore`] capability. Exactly one
//! adapter implements it, [`StorageService`], which supports:
//! - S3-compatible: MinIO, Cloudflare R2, AWS S3
//! - Local filesystem (development only)
//! - In-process memory (tests, ephemeral runs)
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      Apache OpenDAL                              │
//! │                   (Unified Storage API)                          │
//! ├─────────────────────────────────────────────────────────────────┤
//! │ op.write_with("key", data) │ op.presign_read("key", duration)   │
//! │ op.lister_with("prefix")   │ op.stat("key")                     │
//! │ op.delete("key")           │ op.check()                         │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! OpenDAL cannot create buckets, so S3 startup provisioning goes through
//! the AWS SDK ([`S3BucketAdmin`]).

mod bucket;
mod config;
mod error;
mod key;
mod provider;
mod service;

pub use bucket::{BucketAdmin, BucketCreation, S3BucketAdmin, ensure_bucket};
pub use config::{StorageConfig, StorageProvider};
pub use error::StorageError;
pub use key::{generate_storage_key, sanitize_filename, validate_key};
pub use provider::{ObjectInfo, ObjectStore, ObjectStream, StoredObject};
pub use service::StorageService;
