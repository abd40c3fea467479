//! glnav GitLab: the GitLab REST v4 resource graph.
//!
//! # Modules
//!
//! - [`client`]: HTTP client (token header, pagination, error mapping)
//! - [`schema`]: Static manifest of collections and object kinds
//! - [`resources`]: [`Gitlab`] root, REST-bound collections and objects
//! - [`overrides`]: GitLab-specific handlers and [`handler_registry`]

#![doc = include_str!("../README.md")]

pub mod client;
pub mod overrides;
pub mod resources;
pub mod schema;

pub use client::GitlabClient;
pub use overrides::{IssueLinkCreate, handler_registry};
pub use resources::{Gitlab, RestCollection, RestObject};
