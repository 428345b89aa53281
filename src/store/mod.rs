//! Client-side state shared between the timer loops and the views. Both stores are plain
//! handles around a `watch` channel; the app builds them once and passes them around.

mod app;
mod timer;

pub use app::{AppState, AppStore, Selection};
pub use timer::{TimerState, TimerStore};
