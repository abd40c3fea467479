//! glnav Core: shared types, traits, errors and the capability table.
//!
//! This crate provides the foundational types used across all glnav crates.
//! It has no internal glnav dependencies.
//!
//! # Modules
//!
//! - [`capability`]: Capability families, selectors and the capability table
//! - [`error`]: Error types and Result alias
//! - [`mock`]: In-memory resource graph for tests
//! - [`operation`]: Operation descriptors, arguments and outcomes
//! - [`resource`]: Resource graph traits and [`ResourceNode`]
//! - [`traits`]: Configuration abstraction

#![doc = include_str!("../README.md")]

pub mod capability;
pub mod error;
pub mod mock;
pub mod operation;
pub mod resource;
pub mod traits;

// Re-export key types at crate root for convenience
pub use capability::{Capability, Family, Selector};
pub use error::{Error, Result};
pub use operation::{Args, OperationDescriptor, Outcome, Param, ParamKind};
pub use resource::{
    Collection, Object, ParentContext, Record, RemoteClient, Resource, ResourceKind, ResourceNode,
};
pub use traits::ConfigProvider;
