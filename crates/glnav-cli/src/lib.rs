//! Command-line front end for glnav.
//!
//! # Modules
//!
//! - [`cli`]: clap argument and subcommand definitions
//! - [`config`]: [`GlnavConfig`] loaded from TOML and `GLNAV_*` variables
//! - [`config_handlers`]: `glnav config {path,get,set,init}`
//! - [`app`]: [`GlnavCli`], logging setup and command dispatch

#![doc = include_str!("../README.md")]

pub mod app;
pub mod cli;
pub mod config;
pub mod config_handlers;

pub use app::{GlnavCli, init_logging, run};
pub use cli::{CliArgs, Command, ConfigAction, ConfigCommand};
pub use config::GlnavConfig;
