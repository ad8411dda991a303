pub mod auth;
pub mod config;
pub mod content;
pub mod error;
pub mod logger;
pub mod post_processor;
pub mod server;
pub mod storage;
mod paginator;
mod query_string;
mod test_data;
mod text_utils;
mod view;
