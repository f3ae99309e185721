#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Sign Transfer
//!
//! Client library for cloning e-signature library document templates between
//! user accounts over the platform's REST API.
//!
//! ## Module Organization
//!
//! - [`api_clients`] - Authenticated REST session and library document calls
//! - [`models`] - Request and response bodies
//! - [`transport`] - API trait implemented by the REST client and test doubles
//! - [`transfer`] - Template clone and bulk clone orchestration
//! - [`config`] - Configuration management
//! - [`error`] - Structured error handling

pub mod api_clients;
pub mod config;
pub mod error;
pub mod models;
pub mod transfer;
pub mod transport;

// Re-export commonly used types for convenience
pub use api_clients::{SignApiClient, SignApiConfig};
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use transfer::{clone_template_as, BulkCloneReport, TemplateTransfer, TransferStep};
pub use transport::{list_all_templates, ActingUserControl, LibraryDocumentApi};
