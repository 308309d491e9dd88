// src/lib.rs

//! Auric: AUR-aware dependency resolution for pacman
//!
//! Given a set of targets, work out which packages to install from the sync
//! repositories and which to build from the AUR, check the result for
//! missing dependencies and conflicts, and order it so dependencies are
//! built and installed before their dependents.
//!
//! # Architecture
//!
//! - `alpm`: the native package databases behind the [`alpm::LocalDb`] trait
//! - `registry`: AUR records behind the [`registry::Registry`] trait
//! - `resolver`: the resolution pool, its checks and the order builder
//! - `version`: pacman version ordering and dependency constraints

pub mod alpm;
pub mod config;
mod error;
pub mod registry;
pub mod resolver;
pub mod target;
pub mod version;

pub use config::{Config, RebuildMode, TargetMode};
pub use error::{Error, Result};
pub use resolver::{ConflictReport, MissingDependency, Order, Pool, ResolveOptions, get_order};
pub use target::Target;
