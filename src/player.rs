//! Player state controller.
//!
//! `MediaPlayer` is the single source of truth for what the integration
//! reported. Every setter compares against the stored value first and only
//! then touches the host channel, the action registry, the launcher and the
//! playback notification.

mod actions;
mod controller;
mod model;

pub use actions::*;
pub use controller::*;
pub use model::*;
