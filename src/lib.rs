//! Lockfile generator and verifier for CI workflow action dependencies.
//!
//! The three entry points a front-end drives live in [`commands`]:
//! [`commands::generate`], [`commands::verify_command`], [`commands::list`].

pub mod commands;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::Config;
pub use domain::{ActionReference, Lockfile, LockedAction, LockedDependency};
