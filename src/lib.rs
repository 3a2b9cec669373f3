pub mod analysis;
pub mod clients;
pub mod config;
pub mod error;
pub mod http;
pub mod report;
pub mod session;
pub mod store;
