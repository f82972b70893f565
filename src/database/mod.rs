//! linkshelf database layer.
//!
//! Provides SQLite connection management and schema migrations.
//!
//! # Usage
//!
//! ```no_run
//! use linkshelf::database::{Database, SharedDatabase};
//!
//! // Open a persistent database
//! let db = Database::open("linkshelf.db").expect("failed to open database");
//!
//! // Share it between the service layer and scheduled jobs
//! let shared = SharedDatabase::new(db);
//! let guard = shared.lock();
//! let conn = guard.connection();
//! ```

pub mod connection;
pub mod migrations;

pub use connection::{Database, SharedDatabase};
