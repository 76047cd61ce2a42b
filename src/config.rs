//! Configuration: runtime settings, the persisted key/value store and the
//! background-playback preference migration.
//!
//! `Settings` drives how the bridge process starts; the store holds values the
//! player and web-app shell read and write while running.

mod load;
mod migrate;
mod schema;
mod store;

pub use load::{default_config_path, resolve_config_path};
pub use migrate::*;
pub use schema::*;
pub use store::*;
