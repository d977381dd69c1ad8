//! Query Handlers 实现

mod editor_handlers;
mod story_handlers;

pub use editor_handlers::*;
pub use story_handlers::*;
