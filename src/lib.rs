//! linkpeek: a floating link-preview window engine.
//!
//! The core is a pure, single-threaded state machine: a host adapter turns
//! raw input into semantic [`events::InputEvent`]s, feeds them (plus a
//! monotonic clock) into an [`engine::Engine`], and applies the drained
//! [`effects::Effect`] stream back onto its surface. The crate also ships a
//! terminal simulator (`sim`) used by the `linkpeek` binary for development
//! and manual testing.

pub mod arbiter;
pub mod config;
pub mod effects;
pub mod engine;
pub mod error;
pub mod events;
pub mod geometry;
pub mod messages;
pub mod persist;
pub mod search;
pub mod sim;
pub mod theme;
pub mod video;
pub mod window;

pub use config::{TriggerConfig, TriggerMode};
pub use effects::Effect;
pub use engine::{Engine, PageContext};
pub use error::EngineError;
pub use events::InputEvent;
