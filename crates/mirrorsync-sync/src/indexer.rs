//! Directory tree indexing
//!
//! A [`TreeIndexer`] walks a root and maps every regular file's
//! [`RelativePath`] to its content digest. Unreadable entries are reported
//! as [`ScanFailure`]s and left out of the index; they never abort the walk.

use crate::hasher::ContentHasher;
use mirrorsync_types::{Error, FileDigest, RelativePath};
use std::collections::btree_map::{self, BTreeMap};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

/// Mapping from relative path to content digest for the regular files of
/// one tree
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeIndex {
    entries: BTreeMap<RelativePath, FileDigest>,
}

impl TreeIndex {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an entry
    pub fn insert(&mut self, path: RelativePath, digest: FileDigest) -> Option<FileDigest> {
        self.entries.insert(path, digest)
    }

    /// Digest recorded for `path`
    pub fn get(&self, path: &RelativePath) -> Option<&FileDigest> {
        self.entries.get(path)
    }

    /// Whether `path` is indexed
    pub fn contains(&self, path: &RelativePath) -> bool {
        self.entries.contains_key(path)
    }

    /// Number of indexed files
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no file is indexed
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in path order
    pub fn iter(&self) -> btree_map::Iter<'_, RelativePath, FileDigest> {
        self.entries.iter()
    }

    /// Indexed paths in order
    pub fn paths(&self) -> btree_map::Keys<'_, RelativePath, FileDigest> {
        self.entries.keys()
    }
}

impl FromIterator<(RelativePath, FileDigest)> for TreeIndex {
    fn from_iter<I: IntoIterator<Item = (RelativePath, FileDigest)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a TreeIndex {
    type Item = (&'a RelativePath, &'a FileDigest);
    type IntoIter = btree_map::Iter<'a, RelativePath, FileDigest>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// An entry that could not be enumerated or hashed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanFailure {
    /// Affected path, or `None` when the root itself failed
    pub path: Option<RelativePath>,
    /// What went wrong
    pub error: Error,
}

impl ScanFailure {
    fn at_root(error: Error) -> Self {
        Self { path: None, error }
    }
}

/// Result of indexing one root
#[derive(Debug, Clone)]
pub struct IndexedTree {
    /// Root that was walked
    pub root: PathBuf,
    /// Successfully hashed regular files
    pub index: TreeIndex,
    /// Entries left out of the index
    pub failures: Vec<ScanFailure>,
}

impl IndexedTree {
    /// Whether the root itself could not be walked
    pub fn root_failed(&self) -> bool {
        self.failures.iter().any(|failure| failure.path.is_none())
    }

    /// Relative paths that failed to scan
    pub fn failed_paths(&self) -> Vec<RelativePath> {
        self.failures
            .iter()
            .filter_map(|failure| failure.path.clone())
            .collect()
    }
}

/// Walks directory trees and builds [`TreeIndex`]es
#[derive(Debug, Clone, Default)]
pub struct TreeIndexer {
    follow_symlinks: bool,
    hasher: ContentHasher,
}

impl TreeIndexer {
    /// Create an indexer that does not follow symbolic links
    pub fn new() -> Self {
        Self::default()
    }

    /// Index files reached through symbolic links
    ///
    /// When disabled (the default) symlinks are neither followed nor indexed.
    pub fn follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }

    /// Use a specific content hasher
    pub fn with_hasher(mut self, hasher: ContentHasher) -> Self {
        self.hasher = hasher;
        self
    }

    /// Lazily enumerate the regular files under `root`
    ///
    /// Yields `(relative, absolute)` pairs, or a failure for entries that
    /// could not be read. Directories are traversed but not yielded.
    pub fn regular_files<'a>(
        &self,
        root: &'a Path,
    ) -> impl Iterator<Item = Result<(RelativePath, PathBuf), ScanFailure>> + 'a {
        WalkDir::new(root)
            .follow_links(self.follow_symlinks)
            .sort_by_file_name()
            .into_iter()
            .filter_map(move |entry| match entry {
                Ok(entry) if entry.depth() == 0 => {
                    if entry.file_type().is_dir() {
                        None
                    } else {
                        Some(Err(ScanFailure::at_root(Error::scan(
                            root,
                            "root is not a directory",
                        ))))
                    }
                }
                Ok(entry) if entry.file_type().is_file() => {
                    let absolute = entry.into_path();
                    RelativePath::strip_root(root, &absolute)
                        .map(|relative| Ok((relative, absolute)))
                }
                Ok(_) => None,
                Err(e) => {
                    let path = e.path().map_or_else(|| root.to_path_buf(), Path::to_path_buf);
                    let failure = if e.depth() == 0 {
                        ScanFailure::at_root(Error::scan(&path, &e))
                    } else {
                        ScanFailure {
                            path: RelativePath::strip_root(root, &path),
                            error: Error::scan(&path, &e),
                        }
                    };
                    Some(Err(failure))
                }
            })
    }

    /// Build the index of every regular file under `root`
    pub fn index(&self, root: &Path) -> IndexedTree {
        let mut index = TreeIndex::new();
        let mut failures = Vec::new();

        for item in self.regular_files(root) {
            match item {
                Ok((relative, absolute)) => match self.hasher.digest(&absolute) {
                    Ok(digest) => {
                        index.insert(relative, digest);
                    }
                    Err(error) => failures.push(ScanFailure {
                        path: Some(relative),
                        error,
                    }),
                },
                Err(failure) => failures.push(failure),
            }
        }

        for failure in &failures {
            debug!("Scan failure under '{}': {}", root.display(), failure.error);
        }
        info!(
            "Indexed {} files in '{}' ({} failures)",
            index.len(),
            root.display(),
            failures.len()
        );

        IndexedTree {
            root: root.to_path_buf(),
            index,
            failures,
        }
    }
}
