//! Bridge between a web music player's integration script and the desktop:
//! playback state, MPRIS, notifications, artwork and persisted preferences.

pub mod artwork;
pub mod bus;
pub mod config;
pub mod host;
pub mod mpris;
pub mod notify;
pub mod player;
pub mod runtime;
pub mod session;
pub mod time;
pub mod webapp;
