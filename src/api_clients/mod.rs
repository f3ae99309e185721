//! API Client Modules
//!
//! HTTP client for the e-signature REST API: the authenticated session and
//! the library document (template) operations built on it.

pub mod library_documents;
pub mod sign_client;

pub use sign_client::{
    normalize_base_url, validate, ApiResponse, Endpoint, RequestBody, SignApiClient,
    SignApiConfig, ACTING_USER_HEADER, ACTING_USER_PREFIX,
};
