mod handler;
mod models;
mod relay;
mod server;

pub use handler::*;
pub use models::*;
pub use relay::*;
pub use server::*;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

pub const CHUNK_SIZE: usize = 64 * 1024; // 64KB chunks
