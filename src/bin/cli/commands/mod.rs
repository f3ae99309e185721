//! Command handlers for the sign-transfer CLI

pub mod config;
pub mod template;

pub use config::handle_config_command;
pub use template::handle_template_command;
