//! Tool server for editing RPG Maker MZ projects: event command lists,
//! maps and database files, with a backup taken before every write.

pub mod annotate;
#[cfg(feature = "http-api")]
pub mod api;
pub mod audit;
pub mod backup;
pub mod error;
pub mod logging;
pub mod mcp;
pub mod mutator;
pub mod mz;
pub mod paths;
pub mod project;
pub mod registry;
pub mod search;
pub mod settings;
pub mod state;
pub mod store;
pub mod structure;
pub mod util;
