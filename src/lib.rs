//! Playlist matching library - shared modules for all binaries.

pub mod matcher;
pub mod models;
pub mod normalize;
pub mod progress;
pub mod records;
pub mod safety;
pub mod scoring;
