//! One-way directory mirroring engine for mirrorsync
//!
//! This crate keeps a replica directory identical to a source directory:
//!
//! - **Content hashing**: BLAKE3 digests decide whether a file changed
//! - **Tree indexing**: recursive walk producing a path to digest map
//! - **Diffing**: pure comparison of two indices into creates, updates and deletes
//! - **Application**: copies and deletes against the replica, writes first
//! - **Scheduling**: periodic cycles with cooperative cancellation
//!
//! Per-path failures never abort a cycle. They are recorded in the
//! [`CycleReport`] and handed to the injected [`SyncLogger`].
//!
//! # Examples
//!
//! ```rust
//! use mirrorsync_sync::{MemoryLogger, SyncCycle};
//! use std::sync::Arc;
//!
//! # fn main() -> std::io::Result<()> {
//! # let temp = std::env::temp_dir().join(format!("mirrorsync-doc-{}", std::process::id()));
//! # let (source, replica) = (temp.join("source"), temp.join("replica"));
//! # std::fs::create_dir_all(source.join("b"))?;
//! # std::fs::write(source.join("a.txt"), "hello")?;
//! # std::fs::write(source.join("b/c.txt"), "world")?;
//! let cycle = SyncCycle::new(&source, &replica, Arc::new(MemoryLogger::new()));
//!
//! let first = cycle.run();
//! assert_eq!(first.created(), 2);
//!
//! let second = cycle.run();
//! assert_eq!(second.created() + second.updated() + second.deleted(), 0);
//! # std::fs::remove_dir_all(&temp)?;
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod applicator;
pub mod cycle;
pub mod diff;
pub mod hasher;
pub mod indexer;
pub mod logger;
pub mod report;
pub mod scheduler;

pub use applicator::Applicator;
pub use cycle::SyncCycle;
pub use diff::{DiffEngine, OperationSet, WriteKind};
pub use hasher::ContentHasher;
pub use indexer::{IndexedTree, ScanFailure, TreeIndex, TreeIndexer};
pub use logger::{EventLevel, MemoryLogger, NullLogger, SyncEvent, SyncLogger, TracingLogger};
pub use report::{CycleReport, CycleSummary, Outcome, PathOutcome, SyncAction};
pub use scheduler::{Scheduler, SchedulerSummary};
