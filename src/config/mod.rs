//! JSON configuration files of the command-line tools.
pub mod alignment;
pub mod geometry;
pub mod scenario;
pub mod summary;
