//! HTTP Handlers

mod editor;
mod generation;
mod ping;
mod story;
mod upload;
mod websocket;

pub use editor::*;
pub use generation::*;
pub use ping::*;
pub use story::*;
pub use upload::*;
pub use websocket::*;
