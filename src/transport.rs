//! # Library Document API Abstraction
//!
//! Provides the interface the transfer orchestrator talks to. The REST client
//! implements it; tests implement it with in-memory doubles.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use futures::TryStreamExt;
//! use sign_transfer::transport::list_all_templates;
//!
//! let ids: Vec<String> = list_all_templates(&client).try_collect().await?;
//! ```

use async_trait::async_trait;
use futures::stream::{self, Stream, TryStreamExt};
use tracing::debug;

use crate::api_clients::SignApiClient;
use crate::error::{ClientError, ClientResult};
use crate::models::{
    DocumentDescriptor, DocumentFile, FormFields, LibraryDocumentInfo,
    LibraryDocumentListResponse,
};

/// Template-level operations of the e-signature API.
#[async_trait]
pub trait LibraryDocumentApi: Send + Sync {
    /// User the calls are performed for, if any.
    fn acting_user(&self) -> Option<&str>;

    /// List one page of templates.
    async fn list_templates(&self, cursor: Option<&str>)
        -> ClientResult<LibraryDocumentListResponse>;

    async fn get_template(&self, id: &str) -> ClientResult<LibraryDocumentInfo>;

    /// Ordered document descriptors of a template.
    async fn get_template_documents(&self, id: &str) -> ClientResult<Vec<DocumentDescriptor>>;

    /// Raw bytes of one template document.
    async fn get_template_document(&self, id: &str, document_id: &str) -> ClientResult<Vec<u8>>;

    async fn get_template_form_fields(&self, id: &str) -> ClientResult<FormFields>;

    /// Upload a transient document, returning its ID.
    async fn create_transient_document(&self, file: &DocumentFile) -> ClientResult<String>;

    /// Create a template from `source` metadata and uploaded files, returning its ID.
    async fn create_template(
        &self,
        source: &LibraryDocumentInfo,
        transient_ids: &[String],
    ) -> ClientResult<String>;

    async fn update_template_form_fields(&self, id: &str, fields: &FormFields)
        -> ClientResult<()>;
}

/// An API handle whose acting user can be switched in place.
pub trait ActingUserControl: LibraryDocumentApi {
    fn set_acting_user(&mut self, user: Option<&str>) -> ClientResult<()>;
}

#[async_trait]
impl LibraryDocumentApi for SignApiClient {
    fn acting_user(&self) -> Option<&str> {
        SignApiClient::acting_user(self)
    }

    async fn list_templates(
        &self,
        cursor: Option<&str>,
    ) -> ClientResult<LibraryDocumentListResponse> {
        SignApiClient::list_templates(self, cursor).await
    }

    async fn get_template(&self, id: &str) -> ClientResult<LibraryDocumentInfo> {
        SignApiClient::get_template(self, id).await
    }

    async fn get_template_documents(&self, id: &str) -> ClientResult<Vec<DocumentDescriptor>> {
        SignApiClient::get_template_documents(self, id).await
    }

    async fn get_template_document(&self, id: &str, document_id: &str) -> ClientResult<Vec<u8>> {
        SignApiClient::get_template_document(self, id, document_id).await
    }

    async fn get_template_form_fields(&self, id: &str) -> ClientResult<FormFields> {
        SignApiClient::get_template_form_fields(self, id).await
    }

    async fn create_transient_document(&self, file: &DocumentFile) -> ClientResult<String> {
        SignApiClient::create_transient_document(self, file).await
    }

    async fn create_template(
        &self,
        source: &LibraryDocumentInfo,
        transient_ids: &[String],
    ) -> ClientResult<String> {
        SignApiClient::create_template(self, source, transient_ids).await
    }

    async fn update_template_form_fields(
        &self,
        id: &str,
        fields: &FormFields,
    ) -> ClientResult<()> {
        SignApiClient::update_template_form_fields(self, id, fields).await
    }
}

impl ActingUserControl for SignApiClient {
    fn set_acting_user(&mut self, user: Option<&str>) -> ClientResult<()> {
        SignApiClient::set_acting_user(self, user)
    }
}

enum PageCursor {
    Start,
    Next(String),
    Done,
}

async fn fetch_page<A>(
    api: &A,
    cursor: PageCursor,
) -> ClientResult<Option<(Vec<String>, PageCursor)>>
where
    A: LibraryDocumentApi + ?Sized,
{
    let cursor = match cursor {
        PageCursor::Done => return Ok(None),
        PageCursor::Start => None,
        PageCursor::Next(cursor) => Some(cursor),
    };

    let page = api.list_templates(cursor.as_deref()).await?;

    let next = match page.next_cursor() {
        Some(next) if cursor.as_deref() == Some(next) => {
            return Err(ClientError::invalid_response(
                "page.nextCursor",
                format!("cursor '{}' returned for its own page", next),
            ));
        }
        Some(next) => PageCursor::Next(next.to_string()),
        None => PageCursor::Done,
    };

    let ids: Vec<String> = page
        .library_document_list
        .into_iter()
        .map(|template| template.id)
        .collect();

    debug!(
        cursor = ?cursor,
        count = ids.len(),
        has_next = matches!(next, PageCursor::Next(_)),
        "Fetched template ID page"
    );

    Ok(Some((ids, next)))
}

/// Lazily list every template ID visible to `api`, following `nextCursor`
///
/// Each call starts a fresh listing from the first page. Pages are requested
/// only as the stream is polled.
pub fn list_all_templates<A>(api: &A) -> impl Stream<Item = ClientResult<String>> + Send + '_
where
    A: LibraryDocumentApi + ?Sized,
{
    stream::try_unfold(PageCursor::Start, move |cursor| fetch_page(api, cursor))
        .map_ok(|ids| stream::iter(ids.into_iter().map(Ok::<String, ClientError>)))
        .try_flatten()
}
