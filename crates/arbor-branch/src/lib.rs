//! Branch store for Arbor.
//!
//! A [`BranchStore`] is a handle on one named branch. It reads and writes a
//! hierarchical key/value tree at the branch head, merges other commits and
//! branches into it, and streams changes below a path. This is the main
//! entry point for applications embedding Arbor.
//!
//! ```
//! use arbor_branch::{BranchName, BranchStore, Path};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> arbor_branch::BranchResult<()> {
//! let master = BranchStore::<String>::create_default();
//! master.update(&Path::from(["a", "b"]), "v1".to_string(), None).await?;
//!
//! let feature = master.clone_force(BranchName::new("feature").unwrap()).await?;
//! feature.update(&Path::from(["a", "b"]), "v2".to_string(), None).await?;
//!
//! master.merge_exn(feature.branch(), None).await?;
//! assert_eq!(master.read_exn(&Path::from(["a", "b"])).await?, "v2");
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
mod history;
mod kv;
mod merge;
pub mod store;
#[cfg(test)]
mod testing;
pub mod watch;

pub use config::BranchConfig;
pub use error::{BranchError, BranchResult};
pub use store::BranchStore;
pub use watch::{NodeEvent, NodeWatch, ValueEvent, ValueWatch, Watch};

// Re-export key types
pub use arbor_dag::CommitInfo;
pub use arbor_diff::{NodeChange, NodeDiff};
pub use arbor_merge::{Conflict, ContentMerge, MergeResult};
pub use arbor_types::{BranchName, ObjectId, Origin, Path};
