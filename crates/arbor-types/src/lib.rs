//! Foundation types for Arbor.
//!
//! Every other Arbor crate depends on `arbor-types`.
//!
//! # Key Types
//!
//! - [`ObjectId`]: Content-addressed key of a contents, node, or commit object
//! - [`BranchName`]: Validated name of a branch (default `master`)
//! - [`Path`]: Sequence of segments addressing a location in a tree
//! - [`Origin`]: Commit provenance: message, author, [`Timestamp`]

pub mod branch;
pub mod error;
pub mod object;
pub mod origin;
pub mod path;

pub use branch::BranchName;
pub use error::TypeError;
pub use object::ObjectId;
pub use origin::{Origin, Timestamp, DEFAULT_AUTHOR};
pub use path::Path;
