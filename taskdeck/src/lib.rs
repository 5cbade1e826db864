//! Taskdeck — terminal task manager synchronized against a remote collection.

pub mod app;
pub mod config;
pub mod prefs;
pub mod services;
pub mod sync;
pub mod ui;
