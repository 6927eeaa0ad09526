pub mod cache;
pub mod config;
pub mod error;
pub mod extract;
pub mod logging;
pub mod proxy;
pub mod resolver;
