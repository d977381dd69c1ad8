//! SQLite Persistence - SQLite 数据库持久化实现

mod database;
mod story_store;

pub use database::*;
pub use story_store::*;
