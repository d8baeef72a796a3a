pub mod api;
pub mod assets;
pub mod error;
pub mod middleware;
pub mod server;
