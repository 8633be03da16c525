pub mod api;
pub mod app;
pub mod cli;
pub mod config;
pub mod credentials;
pub mod models;
pub mod paths;
pub mod session;
pub mod storage;
