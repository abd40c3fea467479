//! glnav Explorer: capability discovery, action dispatch and navigation.
//!
//! # Modules
//!
//! - [`catalog`]: Action catalog builder
//! - [`dispatch`]: Handler registry and the [`Handler`] trait
//! - [`handlers`]: Generic fallback and named handlers
//! - [`menu`]: Menu adapter over a [`Picker`]
//! - [`mock`]: Scripted picker and operator for tests
//! - [`navigator`]: The recursive explorer loop
//! - [`operator`]: Prompts and output outside the picker
//! - [`picker`]: The `fzf` picker

#![doc = include_str!("../README.md")]

pub mod catalog;
pub mod dispatch;
pub mod handlers;
pub mod menu;
pub mod mock;
pub mod navigator;
pub mod operator;
pub mod picker;

pub use catalog::{ActionCatalogEntry, EntryKind, build_actions, build_catalog};
pub use dispatch::{Console, Handler, HandlerRegistry, Invocation, Resolution};
pub use handlers::{GenericHandler, Protocol};
pub use menu::MenuAdapter;
pub use navigator::{Flow, Navigator};
pub use operator::{Operator, TerminalOperator};
pub use picker::{FzfPicker, PickRequest, Picker};
