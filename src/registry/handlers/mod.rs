pub mod backup;
pub mod database;
pub mod events;
pub mod map;
pub mod plugins;
pub mod project;
pub mod query;
