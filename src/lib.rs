//! An RPL object runtime: tagged objects in one compacting arena.
//!
//! Objects are byte strings in a fixed-size arena ([`data`]), reached through
//! safe pointers that the collector keeps up to date. Each kind of object
//! answers a small set of operations through a per-tag handler table
//! ([`dispatch`]); the reader and renderer go through the same table.

pub mod config;
pub mod data;
pub mod dispatch;
pub mod eval;
pub mod objects;
pub mod reader;
pub mod render;
pub mod repl;

pub use config::Config;
pub use data::Runtime;
pub use repl::repl;
