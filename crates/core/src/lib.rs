//! File catalog and object storage logic for Filegate.
//!
//! This crate contains the core with ZERO web or database dependencies.
//!
//! # Modules
//!
//! - `storage` - Object store capability and its OpenDAL adapter
//! - `catalog` - File records, query/filter/pagination and the catalog service

pub mod catalog;
pub mod storage;
