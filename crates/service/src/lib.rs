//! Service layer for the site content API.
//! - Type-keyed JSON documents with backup rotation (`storage::content_store`).
//! - Base64 image ingestion into the uploads tree (`storage::image_store`).
//! - Typed record collections and block documents built on top of them.

pub mod errors;
pub mod content_type;
pub mod runtime;
pub mod metrics;
pub mod storage;
pub mod collections;
pub mod blocks;
pub mod file;
pub mod admin;
