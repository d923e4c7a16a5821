//! The RPG Maker MZ data model: opcodes, event commands, maps, database
//! records and the plugin list.

pub mod codes;
pub mod command;
pub mod database;
pub mod fields;
pub mod map;
pub mod plugins;

pub use command::EventCommand;
pub use map::{Event, EventPage, EventTable, MapData};
