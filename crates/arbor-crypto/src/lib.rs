//! Content hashing for Arbor.
//!
//! Every object key is a domain-separated BLAKE3 hash, so contents, nodes
//! and commits with identical bytes never share a key.

pub mod hasher;

pub use hasher::ContentHasher;
