//! Application state shared by the runtime loop and the renderer.
//!
//! `App` in `app::model` owns the session, the playback core and the
//! persistent store; `app::queue` is the displayed track list and its
//! displayed-row to catalog-index translation.

mod model;
mod queue;

pub use model::*;
pub use queue::Queue;
