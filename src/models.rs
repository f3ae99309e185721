//! # Library Document Models
//!
//! Request and response bodies for the library document (template) endpoints.
//! Field names follow the platform's camelCase JSON.

use serde::{Deserialize, Serialize};

/// MIME type requested for document downloads and used for re-uploads.
pub const PDF_MIME_TYPE: &str = "application/pdf";

/// One page of `GET /libraryDocuments`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryDocumentListResponse {
    #[serde(default)]
    pub library_document_list: Vec<LibraryDocumentSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<PageInfo>,
}

impl LibraryDocumentListResponse {
    /// Cursor of the following page, if the listing continues
    #[must_use]
    pub fn next_cursor(&self) -> Option<&str> {
        self.page
            .as_ref()
            .and_then(|page| page.next_cursor.as_deref())
            .filter(|cursor| !cursor.is_empty())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

/// Entry in a library document listing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryDocumentSummary {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub sharing_mode: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub template_types: Vec<String>,
}

/// `GET /libraryDocuments/{id}`
///
/// Fields this crate does not interpret are kept in `extra`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryDocumentInfo {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub template_types: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sharing_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// `GET /libraryDocuments/{id}/documents`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentsResponse {
    #[serde(default)]
    pub documents: Vec<DocumentDescriptor>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentDescriptor {
    pub id: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub num_pages: Option<u32>,
}

impl DocumentDescriptor {
    /// Name to upload the downloaded bytes under
    #[must_use]
    pub fn file_name(&self) -> String {
        match self.name.as_deref().filter(|name| !name.is_empty()) {
            Some(name) => name.to_string(),
            None => format!("{}.pdf", self.id),
        }
    }
}

/// Downloaded document content, ready to become a transient document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentFile {
    pub file_name: String,
    pub mime_type: String,
    pub content: Vec<u8>,
}

impl DocumentFile {
    pub fn pdf(file_name: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: PDF_MIME_TYPE.to_string(),
            content,
        }
    }
}

/// `POST /transientDocuments`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransientDocumentResponse {
    pub transient_document_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SharingMode {
    User,
    Group,
    Account,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LibraryDocumentState {
    Authoring,
    Active,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileInfo {
    pub transient_document_id: String,
}

/// Body of `POST /libraryDocuments`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryDocumentCreationInfo {
    pub name: String,
    pub template_types: Vec<String>,
    pub sharing_mode: SharingMode,
    pub state: LibraryDocumentState,
    pub file_infos: Vec<FileInfo>,
}

impl LibraryDocumentCreationInfo {
    /// A user-owned, active copy of `source` built from freshly uploaded files
    pub fn from_source(source: &LibraryDocumentInfo, transient_ids: &[String]) -> Self {
        Self {
            name: source.name.clone(),
            template_types: source.template_types.clone(),
            sharing_mode: SharingMode::User,
            state: LibraryDocumentState::Active,
            file_infos: transient_ids
                .iter()
                .map(|id| FileInfo {
                    transient_document_id: id.clone(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryDocumentCreationResponse {
    pub id: String,
}

/// Form field definitions of a template, carried verbatim between templates
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormFields(pub serde_json::Value);

impl FormFields {
    /// Number of entries in the `fields` array, when present
    #[must_use]
    pub fn field_count(&self) -> usize {
        self.0
            .get("fields")
            .and_then(serde_json::Value::as_array)
            .map_or(0, Vec::len)
    }
}
