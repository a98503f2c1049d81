pub mod config;
pub mod encoding;
pub mod grant_helpers;
pub mod http_client;
pub mod jwt;
pub mod memory;
pub mod message;
pub mod oauth_client;
pub mod server;
pub mod types;
