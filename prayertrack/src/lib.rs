//! PrayerTrack library
//!
//! Prayer request tracking with an import from Google Sheets. The binary
//! is a thin command line over [`commands`]; everything else lives here
//! so it can be tested and embedded behind other front ends.

pub mod app;
pub mod commands;
pub mod config;
pub mod database;
pub mod error;
pub mod services;
