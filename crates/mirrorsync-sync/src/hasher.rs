//! Content hashing for change detection

use mirrorsync_types::{Error, FileDigest, Result};
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;

/// Computes BLAKE3 digests of file content
///
/// Files are streamed through a fixed-size buffer, so memory use does not
/// grow with file size. The digest equals the hash of the whole content.
#[derive(Debug, Clone)]
pub struct ContentHasher {
    buffer_size: usize,
}

impl ContentHasher {
    /// Default read buffer size (64KB)
    pub const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;

    /// Create a hasher with the default buffer size
    pub fn new() -> Self {
        Self {
            buffer_size: Self::DEFAULT_BUFFER_SIZE,
        }
    }

    /// Create a hasher reading `buffer_size` bytes at a time
    pub fn with_buffer_size(buffer_size: usize) -> Self {
        Self {
            buffer_size: buffer_size.max(1),
        }
    }

    /// Hash an in-memory buffer
    pub fn digest_bytes(data: &[u8]) -> FileDigest {
        FileDigest::from(blake3::hash(data))
    }

    /// Hash the full content of the file at `path`
    pub fn digest(&self, path: &Path) -> Result<FileDigest> {
        let mut file = File::open(path).map_err(|e| Error::scan(path, e))?;
        let mut hasher = blake3::Hasher::new();
        let mut buffer = vec![0u8; self.buffer_size];

        loop {
            let bytes_read = match file.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(Error::scan(path, e)),
            };
            hasher.update(&buffer[..bytes_read]);
        }

        Ok(FileDigest::from(hasher.finalize()))
    }
}

impl Default for ContentHasher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mirrorsync_types::ErrorKind as MirrorErrorKind;
    use rstest::rstest;
    use std::fs;
    use tempfile::TempDir;

    #[rstest]
    #[case(1)]
    #[case(7)]
    #[case(4096)]
    #[case(ContentHasher::DEFAULT_BUFFER_SIZE)]
    fn test_chunked_digest_matches_whole_content(#[case] buffer_size: usize) {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("data.bin");
        let content: Vec<u8> = (0..100_000u32).map(|i| (i * 31 % 251) as u8).collect();
        fs::write(&path, &content).unwrap();

        let digest = ContentHasher::with_buffer_size(buffer_size)
            .digest(&path)
            .unwrap();

        assert_eq!(digest, ContentHasher::digest_bytes(&content));
    }

    #[test]
    fn test_empty_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("empty");
        fs::write(&path, b"").unwrap();

        let digest = ContentHasher::new().digest(&path).unwrap();
        assert_eq!(digest, ContentHasher::digest_bytes(b""));
    }

    #[test]
    fn test_missing_file_is_scan_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("gone.txt");

        let error = ContentHasher::new().digest(&path).unwrap_err();
        assert_eq!(error.kind(), MirrorErrorKind::Scan);
        assert_eq!(error.path(), Some(path.as_path()));
    }

    #[test]
    fn test_directory_is_scan_error() {
        let temp_dir = TempDir::new().unwrap();
        assert!(ContentHasher::new().digest(temp_dir.path()).is_err());
    }
}
