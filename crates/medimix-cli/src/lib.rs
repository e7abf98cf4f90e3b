//! Medimix CLI library.
//!
//! This crate provides the command implementations behind the `medimix`
//! binary: configuration loading, logging setup and the mix, merge,
//! binaural and render commands.

pub mod commands;
pub mod settings;
