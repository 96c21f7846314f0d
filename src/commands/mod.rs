//! Command implementations

pub mod completions;
pub mod config;
pub mod domains;
pub mod images;
pub mod login;
pub mod pods;
pub mod predefined_apps;
pub mod pstorage;
pub mod system_settings;
