//! Editing sessions and their configuration.

pub mod config;
pub mod editor;
