pub mod build_info;
pub mod cli;
pub mod config;
pub mod db;
pub mod logging;
pub mod repository;
pub mod server;
pub mod state;
pub mod swimlane;
