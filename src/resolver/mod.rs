// src/resolver/mod.rs

//! Dependency resolution across the sync repositories and the AUR
//!
//! The usual sequence is:
//! 1. [`Pool::resolve`] discovers every package the targets need
//! 2. [`Pool::check_missing`] verifies each dependency has a satisfier
//! 3. [`Pool::check_conflicts`] finds forward, reverse and inner conflicts
//! 4. [`get_order`] produces the build and install order

mod conflict;
mod missing;
mod order;
mod pool;
mod provider;

pub use conflict::{ConflictMap, ConflictReport};
pub use missing::MissingDependency;
pub use order::{Base, Order, get_order};
pub use pool::{Pool, ResolveOptions};
