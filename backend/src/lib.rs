pub mod config;
pub mod error;
pub mod poller;
pub mod sink;
pub mod time;
