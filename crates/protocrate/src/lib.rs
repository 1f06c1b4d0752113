//! Rust crate generation for compiled Protocol Buffers schemas
//!
//! Given the files compiled together into one crate, this library decides which
//! file hosts the crate root, declares the other files as submodules of it, and
//! re-exports the types of publicly imported files from other crates. Type
//! bodies come from a pluggable [`entity::EntityGenerator`].

pub mod config;
pub mod context;
pub mod crate_mapping;
pub mod crate_membership;
pub mod descriptor;
pub mod entity;
pub mod error;
pub mod generator;
pub mod host;
pub mod naming;
pub mod printer;
pub mod reexports;
pub mod relative_path;
pub mod submodules;
pub mod types;

pub use config::{Kernel, Options};
pub use error::GenerateError;
pub use generator::RustGenerator;
