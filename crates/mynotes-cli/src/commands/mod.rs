//! Command handlers for the `mynotes` CLI

pub mod config;
pub mod note;
pub mod status;
