//! Glue between the calendar, the cache and the screen.
//!
//! A single actor owns refreshing; the display reads whatever feed it last
//! published and recomputes the schedule on every tick.

mod actor;
mod handle;
pub mod input;
pub mod models;
pub mod presenter;
pub mod render;
mod scheduler;

pub use handle::OverlayHandle;
pub use input::{read_commands, spawn_key_reader, InputCommand};
pub use models::{EventFeed, FeedSource, OverlayView, RefreshOutcome};
pub use presenter::{Presenter, TerminalPresenter, TerminalSession};
pub use render::{render, Frame, Line};
pub use scheduler::start_scheduler;
