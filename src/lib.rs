//! linkshelf: personal bookmarks with a shared, periodically rebuilt popularity ranking.
//!
//! This library crate exposes all modules for use by the binary and integration tests.

pub mod app;
pub mod database;
pub mod managers;
pub mod services;
pub mod storage;
pub mod types;
