// Stream relay service — provider fetchers plus a backpressured segment relay.

pub mod config;
pub mod health;
pub mod logging;
pub mod provider;
pub mod relay;
pub mod server;
