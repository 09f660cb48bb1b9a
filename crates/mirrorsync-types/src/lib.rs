//! Core types and error handling for mirrorsync
//!
//! This crate provides the foundational types shared by the mirrorsync
//! crates:
//!
//! - **Error handling**: path-scoped and process-level error types
//! - **Core types**: content digests and root-independent relative paths
//!
//! # Features
//!
//! - `serde`: Enable serialization support
//!
//! # Examples
//!
//! ```rust
//! use mirrorsync_types::{FileDigest, RelativePath, Result};
//! use std::path::Path;
//!
//! fn locate(root: &Path) -> Result<std::path::PathBuf> {
//!     let path = RelativePath::new("b/c.txt").expect("relative path");
//!     Ok(path.resolve(root))
//! }
//! # let _ = FileDigest::from(blake3::hash(b"hello"));
//! ```

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod result;
pub mod types;

// Re-export commonly used types
pub use error::{Error, ErrorKind};
pub use result::Result;
pub use types::{FileDigest, RelativePath};
