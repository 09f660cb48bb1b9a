//! Core data types for mirrorsync
//!
//! Content digests and root-independent relative paths, shared by the
//! indexer, the diff engine and the applicator.

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Component, Path, PathBuf};

/// BLAKE3 digest of a file's full byte content (256-bit)
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FileDigest([u8; 32]);

impl FileDigest {
    /// Length of a digest in bytes
    pub const LEN: usize = 32;

    /// Wrap raw digest bytes
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get raw bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lowercase hex representation
    pub fn to_hex(&self) -> String {
        blake3::Hash::from(self.0).to_hex().to_string()
    }
}

impl From<blake3::Hash> for FileDigest {
    fn from(hash: blake3::Hash) -> Self {
        Self(*hash.as_bytes())
    }
}

impl fmt::Debug for FileDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex = self.to_hex();
        write!(f, "FileDigest({})", &hex[..16])
    }
}

impl fmt::Display for FileDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Path of a file relative to a tree root
///
/// Stored as its normal components, so `b/c.txt` compares equal whatever
/// separator the platform uses. Displayed with `/` separators.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RelativePath {
    segments: Vec<OsString>,
}

impl RelativePath {
    /// Build from a relative path
    ///
    /// `.` components are dropped. Returns `None` for absolute paths, for
    /// paths containing `..` and for paths with no segments left.
    pub fn new(path: impl AsRef<Path>) -> Option<Self> {
        let mut segments = Vec::new();
        for component in path.as_ref().components() {
            match component {
                Component::Normal(segment) => segments.push(segment.to_os_string()),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
            }
        }

        if segments.is_empty() {
            None
        } else {
            Some(Self { segments })
        }
    }

    /// Express `path` relative to `root`
    pub fn strip_root(root: &Path, path: &Path) -> Option<Self> {
        path.strip_prefix(root).ok().and_then(Self::new)
    }

    /// Location of this path under `root`
    pub fn resolve(&self, root: &Path) -> PathBuf {
        let mut path = root.to_path_buf();
        path.extend(&self.segments);
        path
    }

    /// Path segments, outermost first
    pub fn segments(&self) -> impl Iterator<Item = &OsStr> {
        self.segments.iter().map(OsString::as_os_str)
    }

    /// Whether this path equals `ancestor` or lies underneath it
    ///
    /// Comparison is per segment: `a/b` is within `a`, `ab` is not.
    pub fn is_within(&self, ancestor: &RelativePath) -> bool {
        self.segments.starts_with(&ancestor.segments)
    }
}

impl fmt::Display for RelativePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            write!(f, "{}", segment.to_string_lossy())?;
        }
        Ok(())
    }
}

impl fmt::Debug for RelativePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RelativePath({})", self)
    }
}
