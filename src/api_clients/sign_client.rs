//! # Sign API Client
//!
//! Authenticated HTTP session for the e-signature REST API. Every request is
//! resolved against a normalized base URL and carries the integration key as a
//! bearer credential plus, when set, the acting user header.
//!
//! The acting user is plain client state: changing it affects every request
//! prepared afterwards. Callers that need two identities at once should hold two
//! clients (see [`crate::transfer::TemplateTransfer`]).

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::multipart::Form;
use reqwest::{Client, Method, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::time::Duration;
use tracing::{debug, error, info};

use crate::config::{ApiEndpointConfig, DEFAULT_PAGE_SIZE};
use crate::error::{ClientError, ClientResult};
use crate::models::PDF_MIME_TYPE;

/// Header naming the user an API call is performed for.
pub const ACTING_USER_HEADER: &str = "x-api-user";

/// Prefix of the acting user header value.
pub const ACTING_USER_PREFIX: &str = "email:";

/// Configuration for the sign API client
///
/// ```rust
/// use sign_transfer::api_clients::SignApiConfig;
///
/// let config = SignApiConfig {
///     base_url: "https://api.na1.example.com/api/rest/v6".to_string(),
///     integration_key: "3AAABLblqZhB".to_string(),
///     acting_user: Some("alice@example.com".to_string()),
///     ..Default::default()
/// };
/// assert_eq!(config.timeout_ms, 30000);
/// ```
#[derive(Debug, Clone)]
pub struct SignApiConfig {
    /// REST base URL including the API path (e.g., "<https://api.na1.example.com/api/rest/v6/>")
    pub base_url: String,
    /// Integration key sent as `Authorization: Bearer <key>`
    pub integration_key: String,
    /// Per-request timeout in milliseconds
    pub timeout_ms: u64,
    /// Page size for library document listing
    pub page_size: u32,
    /// Initial acting user, if any
    pub acting_user: Option<String>,
}

impl Default for SignApiConfig {
    fn default() -> Self {
        Self {
            base_url: ApiEndpointConfig::default().api_base_url(),
            integration_key: String::new(),
            timeout_ms: 30000,
            page_size: DEFAULT_PAGE_SIZE,
            acting_user: None,
        }
    }
}

impl From<&ApiEndpointConfig> for SignApiConfig {
    fn from(config: &ApiEndpointConfig) -> Self {
        Self {
            base_url: config.api_base_url(),
            integration_key: config.integration_key.clone().unwrap_or_default(),
            timeout_ms: config.timeout_ms,
            page_size: config.page_size,
            acting_user: None,
        }
    }
}

impl SignApiConfig {
    /// Same settings, acting as `user`
    #[must_use]
    pub fn acting_as(&self, user: Option<&str>) -> Self {
        Self {
            acting_user: user.map(str::to_string),
            ..self.clone()
        }
    }
}

/// Base URL with exactly one trailing `/`
#[must_use]
pub fn normalize_base_url(base_url: &str) -> String {
    format!("{}/", base_url.trim_end_matches('/'))
}

/// Whether `segment` survives URL parsing as itself: non-empty and not a dot segment
fn is_plain_segment(segment: &str) -> bool {
    let dots = segment.to_ascii_lowercase().replace("%2e", ".");
    !segment.is_empty() && dots != "." && dots != ".."
}

fn acting_user_header_value(user: &str) -> ClientResult<HeaderValue> {
    let value = if user.starts_with(ACTING_USER_PREFIX) {
        user.to_string()
    } else {
        format!("{}{}", ACTING_USER_PREFIX, user)
    };

    HeaderValue::from_str(&value)
        .map_err(|e| ClientError::InvalidInput(format!("Invalid acting user '{}': {}", user, e)))
}

/// The library document endpoints and their contracts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint<'a> {
    ListTemplates {
        cursor: Option<&'a str>,
        page_size: u32,
    },
    GetTemplate {
        id: &'a str,
    },
    GetTemplateDocuments {
        id: &'a str,
    },
    GetTemplateDocument {
        id: &'a str,
        document_id: &'a str,
    },
    GetTemplateFormFields {
        id: &'a str,
    },
    CreateTransientDocument,
    CreateTemplate,
    UpdateTemplateFormFields {
        id: &'a str,
    },
}

impl Endpoint<'_> {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Endpoint::ListTemplates { .. } => "list templates",
            Endpoint::GetTemplate { .. } => "get template",
            Endpoint::GetTemplateDocuments { .. } => "get template documents",
            Endpoint::GetTemplateDocument { .. } => "get template document",
            Endpoint::GetTemplateFormFields { .. } => "get template form fields",
            Endpoint::CreateTransientDocument => "create transient document",
            Endpoint::CreateTemplate => "create template",
            Endpoint::UpdateTemplateFormFields { .. } => "update template form fields",
        }
    }

    #[must_use]
    pub fn method(&self) -> Method {
        match self {
            Endpoint::CreateTransientDocument | Endpoint::CreateTemplate => Method::POST,
            Endpoint::UpdateTemplateFormFields { .. } => Method::PUT,
            _ => Method::GET,
        }
    }

    /// Path segments below the API base URL, IDs unencoded
    #[must_use]
    pub fn segments(&self) -> Vec<&str> {
        match *self {
            Endpoint::ListTemplates { .. } | Endpoint::CreateTemplate => vec!["libraryDocuments"],
            Endpoint::GetTemplate { id } => vec!["libraryDocuments", id],
            Endpoint::GetTemplateDocuments { id } => vec!["libraryDocuments", id, "documents"],
            Endpoint::GetTemplateDocument { id, document_id } => {
                vec!["libraryDocuments", id, "documents", document_id]
            }
            Endpoint::GetTemplateFormFields { id } | Endpoint::UpdateTemplateFormFields { id } => {
                vec!["libraryDocuments", id, "formFields"]
            }
            Endpoint::CreateTransientDocument => vec!["transientDocuments"],
        }
    }

    /// Unencoded path, for logs
    #[must_use]
    pub fn path(&self) -> String {
        format!("/{}", self.segments().join("/"))
    }

    /// Status the API must answer with for the call to count as successful
    #[must_use]
    pub fn expected_status(&self) -> StatusCode {
        match self {
            Endpoint::CreateTransientDocument | Endpoint::CreateTemplate => StatusCode::CREATED,
            _ => StatusCode::OK,
        }
    }

    #[must_use]
    pub fn query(&self) -> Vec<(&'static str, String)> {
        match self {
            Endpoint::ListTemplates { cursor, page_size } => {
                let mut query = Vec::with_capacity(2);
                if let Some(cursor) = cursor {
                    query.push(("cursor", (*cursor).to_string()));
                }
                query.push(("pageSize", page_size.to_string()));
                query
            }
            _ => Vec::new(),
        }
    }

    /// Media type to request, when the endpoint does not answer with JSON
    #[must_use]
    pub fn accept(&self) -> Option<&'static str> {
        match self {
            Endpoint::GetTemplateDocument { .. } => Some(PDF_MIME_TYPE),
            _ => None,
        }
    }
}

/// Body attached to a prepared request
#[derive(Debug)]
pub enum RequestBody {
    Empty,
    Json(serde_json::Value),
    Multipart(Form),
}

/// Status, headers and raw body of a completed call
#[derive(Debug, Clone)]
pub struct ApiResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl ApiResponse {
    pub fn new(status: StatusCode, headers: HeaderMap, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
        }
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.body
    }

    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.body
    }

    #[must_use]
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    pub fn json<T: DeserializeOwned>(&self) -> ClientResult<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }
}

/// Fail with `BadResponse` unless `response` has exactly the `expected` status
pub fn validate(response: ApiResponse, expected: StatusCode) -> ClientResult<ApiResponse> {
    if response.status == expected {
        Ok(response)
    } else {
        Err(ClientError::bad_response(
            response.status.as_u16(),
            response.text().into_owned(),
        ))
    }
}

/// HTTP client for the e-signature REST API
///
/// ```rust
/// use sign_transfer::api_clients::{SignApiClient, SignApiConfig};
///
/// let mut client = SignApiClient::new(SignApiConfig {
///     base_url: "https://api.na1.example.com/api/rest/v6".to_string(),
///     integration_key: "3AAABLblqZhB".to_string(),
///     ..Default::default()
/// })
/// .unwrap();
///
/// client.set_acting_user(Some("alice@example.com")).unwrap();
/// assert_eq!(client.acting_user(), Some("alice@example.com"));
///
/// let url = client.resolve("/libraryDocuments").unwrap();
/// assert_eq!(url.as_str(), "https://api.na1.example.com/api/rest/v6/libraryDocuments");
/// ```
#[derive(Clone)]
pub struct SignApiClient {
    client: Client,
    config: SignApiConfig,
    base_url: Url,
    authorization: HeaderValue,
    acting_user: Option<String>,
}

impl std::fmt::Debug for SignApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignApiClient")
            .field("base_url", &self.base_url.as_str())
            .field("timeout_ms", &self.config.timeout_ms)
            .field("acting_user", &self.acting_user)
            .finish_non_exhaustive()
    }
}

impl SignApiClient {
    /// Create a new client with the given configuration
    ///
    /// Fails with `ConfigError` for an empty integration key or a base URL that
    /// does not parse, and with `InvalidInput` for an unusable acting user.
    pub fn new(config: SignApiConfig) -> ClientResult<Self> {
        if config.integration_key.trim().is_empty() {
            return Err(ClientError::config_error("Integration key must not be empty"));
        }

        let base_url = Url::parse(&normalize_base_url(&config.base_url))
            .map_err(|e| ClientError::config_error(format!("Invalid base URL: {}", e)))?;

        let mut authorization = HeaderValue::from_str(&format!("Bearer {}", config.integration_key))
            .map_err(|e| ClientError::config_error(format!("Invalid integration key: {}", e)))?;
        authorization.set_sensitive(true);

        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent(format!("sign-transfer/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                ClientError::config_error(format!("Failed to create HTTP client: {}", e))
            })?;

        let mut api_client = Self {
            client,
            base_url,
            authorization,
            acting_user: None,
            config,
        };
        let initial_user = api_client.config.acting_user.clone();
        api_client.set_acting_user(initial_user.as_deref())?;

        info!(
            base_url = %api_client.base_url,
            timeout_ms = api_client.config.timeout_ms,
            acting_user = ?api_client.acting_user,
            "Created sign API client"
        );

        Ok(api_client)
    }

    /// Normalized base URL, always ending in `/`
    #[must_use]
    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    #[must_use]
    pub fn page_size(&self) -> u32 {
        self.config.page_size
    }

    /// User subsequent requests act as, if any
    #[must_use]
    pub fn acting_user(&self) -> Option<&str> {
        self.acting_user.as_deref()
    }

    /// Replace the acting user for every request prepared from now on
    ///
    /// `None` removes the header so calls run as the integration's own identity.
    pub fn set_acting_user(&mut self, user: Option<&str>) -> ClientResult<()> {
        self.acting_user = match user {
            Some(user) if user.trim().is_empty() => {
                return Err(ClientError::InvalidInput(
                    "Acting user must not be empty".to_string(),
                ))
            }
            Some(user) => {
                acting_user_header_value(user)?;
                Some(
                    user.strip_prefix(ACTING_USER_PREFIX)
                        .unwrap_or(user)
                        .to_string(),
                )
            }
            None => None,
        };

        debug!(acting_user = ?self.acting_user, "Acting user changed");
        Ok(())
    }

    pub fn clear_acting_user(&mut self) {
        self.acting_user = None;
        debug!("Acting user cleared");
    }

    /// A copy of this client acting as `user`
    pub fn with_acting_user(&self, user: Option<&str>) -> ClientResult<Self> {
        let mut client = self.clone();
        client.set_acting_user(user)?;
        Ok(client)
    }

    /// Resolve `path` against the base URL
    ///
    /// Leading `/` on the path is ignored, so `"/libraryDocuments"` and
    /// `"libraryDocuments"` both land under the API base path.
    pub fn resolve(&self, path: &str) -> ClientResult<Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ClientError::InvalidInput(format!("Failed to construct URL: {}", e)))
    }

    /// URL of `endpoint` with every ID percent-encoded as exactly one path segment
    ///
    /// IDs that are empty or dot segments fail with `InvalidInput`.
    pub fn endpoint_url(&self, endpoint: &Endpoint<'_>) -> ClientResult<Url> {
        let segments = endpoint.segments();
        if let Some(segment) = segments.iter().find(|segment| !is_plain_segment(segment)) {
            return Err(ClientError::InvalidInput(format!(
                "Invalid ID '{}' for {}",
                segment,
                endpoint.name()
            )));
        }

        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                ClientError::config_error(format!("Base URL cannot take a path: {}", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Build an authenticated request for `endpoint`
    pub fn prepare(&self, endpoint: &Endpoint<'_>) -> ClientResult<RequestBuilder> {
        let url = self.endpoint_url(endpoint)?;
        let mut builder = self.authorized(endpoint.method(), url)?;

        let query = endpoint.query();
        if !query.is_empty() {
            builder = builder.query(&query);
        }
        if let Some(accept) = endpoint.accept() {
            builder = builder.header(ACCEPT, accept);
        }
        Ok(builder)
    }

    /// Build an authenticated request for an arbitrary method and path
    pub fn request(&self, method: Method, path: &str) -> ClientResult<RequestBuilder> {
        let url = self.resolve(path)?;
        self.authorized(method, url)
    }

    fn authorized(&self, method: Method, url: Url) -> ClientResult<RequestBuilder> {
        debug!(
            method = %method,
            url = %url,
            acting_user = ?self.acting_user,
            "Preparing sign API request"
        );

        let mut builder = self
            .client
            .request(method, url)
            .header(AUTHORIZATION, self.authorization.clone());

        if let Some(user) = &self.acting_user {
            builder = builder.header(
                HeaderName::from_static(ACTING_USER_HEADER),
                acting_user_header_value(user)?,
            );
        }

        Ok(builder)
    }

    /// Send a prepared request and capture the whole response
    pub async fn execute(&self, builder: RequestBuilder) -> ClientResult<ApiResponse> {
        let response = builder.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        Ok(ApiResponse::new(status, headers, body.to_vec()))
    }

    /// Call `endpoint` with `body` and validate the status against its contract
    pub async fn send(
        &self,
        endpoint: &Endpoint<'_>,
        body: RequestBody,
    ) -> ClientResult<ApiResponse> {
        let builder = self.prepare(endpoint)?;
        let builder = match body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(&value),
            RequestBody::Multipart(form) => builder.multipart(form),
        };

        let response = self.execute(builder).await?;

        validate(response, endpoint.expected_status()).inspect_err(|e| {
            error!(
                operation = endpoint.name(),
                path = %endpoint.path(),
                acting_user = ?self.acting_user,
                error = %e,
                "Sign API call failed"
            );
        })
    }
}
