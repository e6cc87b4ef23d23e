//! Bootstrap module for initializing the streamer node
//!
//! This module handles:
//! - Configuration loading
//! - Credential chain and producer wiring

pub mod config;
pub mod services;

pub use config::load_config;
pub use services::{init_services, Services};
