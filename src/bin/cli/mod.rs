//! CLI module for the sign-transfer tool
//!
//! This module organizes all CLI-related functionality including
//! command structures and their handlers.

pub mod commands;

pub use commands::{handle_config_command, handle_template_command};
