//! Host-side services for the Scribbler editor
//!
//! Everything here is independent of the plugin subsystem: configuration
//! resolution, home directory lookup, logging setup and plain text file I/O.

pub mod config;
pub mod home;
pub mod logging;
pub mod text;
