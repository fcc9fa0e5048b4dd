//! redmine-launcher - Redmine issues, projects and timesheets for a launcher
//!
//! This library crate exposes internal modules for integration testing.

pub mod config;
pub mod data;
pub mod integrations;
pub mod launcher;
pub mod util;
