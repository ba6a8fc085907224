//! Persistence of submitted scripts.
//!
//! Each submission gets its own file named after a [`SubmissionId`], so
//! concurrent submissions never overwrite each other.

mod id;
mod store;

pub use id::SubmissionId;
pub use store::{ScriptStore, StoreConfig, StoredScript, DEFAULT_EXTENSION, DEFAULT_SCRIPT_DIR};
