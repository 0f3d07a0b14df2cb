//! Virtual file store for agent workspaces.
//!
//! This module provides:
//! - [`FileStore`] - Ordered, flat map of path to text content
//! - [`FsError`] - Errors returned by reads and guarded edits
//!
//! Paths are plain keys. `notes/plan.md` is a single file name, not a file
//! inside a `notes` directory, and nothing is ever written to a real disk.

mod store;

pub use store::{DEFAULT_READ_LIMIT, EMPTY_FILE_NOTICE, FileStore, FsError, MAX_LINE_CHARS};
