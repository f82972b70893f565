// linkshelf shared type definitions
// Each submodule defines types used across the application.

pub mod bookmark;
pub mod click;
pub mod errors;
pub mod ranking;
pub mod settings;
pub mod user;
