//! buf-module-index - index of Buf modules pinned by `buf.lock` files
//!
//! This crate provides the pieces an editor host needs to index the
//! dependencies of Buf projects: an input filter, an extractor turning lock
//! file content into module coordinates, a key codec and a lookup helper.

pub mod codec;
pub mod config;
pub mod coordinates;
pub mod document;
pub mod file_types;
pub mod host;
pub mod index;
pub mod parsers;
pub mod scan;
