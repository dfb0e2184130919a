//! Common functionality for Surgecast.
#![warn(missing_docs)]
pub mod admissions;
pub mod calendar;
pub mod cli;
pub mod commands;
pub mod environment;
pub mod facility;
pub mod forecast;
pub mod id;
pub mod input;
pub mod log;
pub mod model;
pub mod narrative;
pub mod output;
pub mod pooling;
pub mod procurement;
pub mod resources;
pub mod settings;
pub mod supply;
pub mod surge;
pub mod timeline;

#[cfg(test)]
mod fixture;

use std::path::PathBuf;

/// Get the path to the directory where program configuration is stored
pub fn get_config_dir() -> PathBuf {
    let mut path = dirs::config_dir().unwrap_or_default();
    path.push("surgecast");

    path
}
