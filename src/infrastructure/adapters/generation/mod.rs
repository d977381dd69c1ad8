//! Generation Adapter - HTTP webhook 客户端实现

mod http_generation_client;

pub use http_generation_client::*;
