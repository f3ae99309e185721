#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use sign_transfer::models::{
    DocumentDescriptor, DocumentFile, FormFields, LibraryDocumentCreationInfo,
    LibraryDocumentInfo, LibraryDocumentListResponse, LibraryDocumentSummary, PageInfo,
};
use sign_transfer::{ActingUserControl, ClientError, ClientResult, LibraryDocumentApi};

/// Kind of API call, used for failure and cancellation injection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    ListTemplates,
    GetTemplate,
    GetDocuments,
    GetDocument,
    GetFormFields,
    UploadTransient,
    CreateTemplate,
    UpdateFormFields,
}

/// One recorded call together with the acting user it ran as
#[derive(Debug, Clone, PartialEq)]
pub enum ApiCall {
    ListTemplates {
        cursor: Option<String>,
        user: Option<String>,
    },
    GetTemplate {
        id: String,
        user: Option<String>,
    },
    GetDocuments {
        id: String,
        user: Option<String>,
    },
    GetDocument {
        id: String,
        document_id: String,
        user: Option<String>,
    },
    GetFormFields {
        id: String,
        user: Option<String>,
    },
    UploadTransient {
        file_name: String,
        content: Vec<u8>,
        user: Option<String>,
    },
    CreateTemplate {
        body: Value,
        user: Option<String>,
    },
    UpdateFormFields {
        id: String,
        body: Value,
        user: Option<String>,
    },
}

impl ApiCall {
    pub fn user(&self) -> Option<&str> {
        match self {
            ApiCall::ListTemplates { user, .. }
            | ApiCall::GetTemplate { user, .. }
            | ApiCall::GetDocuments { user, .. }
            | ApiCall::GetDocument { user, .. }
            | ApiCall::GetFormFields { user, .. }
            | ApiCall::UploadTransient { user, .. }
            | ApiCall::CreateTemplate { user, .. }
            | ApiCall::UpdateFormFields { user, .. } => user.as_deref(),
        }
    }

    pub fn is_write(&self) -> bool {
        matches!(
            self,
            ApiCall::UploadTransient { .. }
                | ApiCall::CreateTemplate { .. }
                | ApiCall::UpdateFormFields { .. }
        )
    }
}

#[derive(Debug, Clone)]
pub struct MockTemplate {
    pub info: Value,
    pub documents: Vec<(String, Vec<u8>)>,
    pub fields: Value,
}

#[derive(Debug, Default)]
pub struct MockState {
    pub calls: Vec<ApiCall>,
    pub templates: HashMap<String, MockTemplate>,
    pub pages: HashMap<Option<String>, LibraryDocumentListResponse>,
    failures: HashMap<(Op, Option<String>), u16>,
    cancel_on: Option<(Op, CancellationToken)>,
    next_transient: usize,
    next_template: usize,
}

/// In-memory library document API that records every call in a shared log
///
/// Clones share the same state, so a sender and a receiver built from one
/// `MockSignApi` write into one ordered call log.
#[derive(Debug, Clone)]
pub struct MockSignApi {
    user: Option<String>,
    state: Arc<Mutex<MockState>>,
}

impl MockSignApi {
    pub fn new() -> Self {
        Self {
            user: None,
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    /// Another handle on the same state, acting as `user`
    pub fn as_user(&self, user: Option<&str>) -> Self {
        Self {
            user: user.map(str::to_string),
            state: Arc::clone(&self.state),
        }
    }

    pub fn with_template(
        self,
        id: &str,
        name: &str,
        documents: Vec<(&str, &[u8])>,
        fields: Value,
    ) -> Self {
        self.state.lock().templates.insert(
            id.to_string(),
            MockTemplate {
                info: json!({
                    "id": id,
                    "name": name,
                    "templateTypes": ["DOCUMENT", "FORM_FIELD_LAYER"],
                    "sharingMode": "ACCOUNT",
                    "status": "ACTIVE"
                }),
                documents: documents
                    .into_iter()
                    .map(|(doc_id, bytes)| (doc_id.to_string(), bytes.to_vec()))
                    .collect(),
                fields,
            },
        );
        self
    }

    /// Serve `ids` for the page requested with `cursor`, pointing at `next`
    pub fn with_page(self, cursor: Option<&str>, ids: &[&str], next: Option<&str>) -> Self {
        self.state.lock().pages.insert(
            cursor.map(str::to_string),
            LibraryDocumentListResponse {
                library_document_list: ids
                    .iter()
                    .map(|id| LibraryDocumentSummary {
                        id: (*id).to_string(),
                        name: None,
                        sharing_mode: None,
                        status: None,
                        template_types: Vec::new(),
                    })
                    .collect(),
                page: Some(PageInfo {
                    next_cursor: next.map(str::to_string),
                }),
            },
        );
        self
    }

    /// Answer every `op` call with `status`
    pub fn failing(self, op: Op, status: u16) -> Self {
        self.state.lock().failures.insert((op, None), status);
        self
    }

    /// Answer `op` calls for template `id` with `status`
    pub fn failing_for(self, op: Op, id: &str, status: u16) -> Self {
        self.state
            .lock()
            .failures
            .insert((op, Some(id.to_string())), status);
        self
    }

    /// Cancel `token` while serving the first `op` call
    pub fn cancelling_on(self, op: Op, token: CancellationToken) -> Self {
        self.state.lock().cancel_on = Some((op, token));
        self
    }

    pub fn calls(&self) -> Vec<ApiCall> {
        self.state.lock().calls.clone()
    }

    pub fn uploads(&self) -> Vec<Vec<u8>> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                ApiCall::UploadTransient { content, .. } => Some(content),
                _ => None,
            })
            .collect()
    }

    pub fn created(&self) -> Vec<Value> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                ApiCall::CreateTemplate { body, .. } => Some(body),
                _ => None,
            })
            .collect()
    }

    pub fn field_updates(&self) -> Vec<(String, Value)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                ApiCall::UpdateFormFields { id, body, .. } => Some((id, body)),
                _ => None,
            })
            .collect()
    }

    fn record(&self, op: Op, template_id: Option<&str>, call: ApiCall) -> ClientResult<()> {
        let mut state = self.state.lock();
        state.calls.push(call);

        if let Some((cancel_op, token)) = &state.cancel_on {
            if *cancel_op == op {
                token.cancel();
            }
        }

        let status = template_id
            .and_then(|id| state.failures.get(&(op, Some(id.to_string()))))
            .or_else(|| state.failures.get(&(op, None)))
            .copied();

        match status {
            Some(status) => Err(ClientError::bad_response(
                status,
                format!(r#"{{"code":"MOCK_FAILURE","op":"{:?}"}}"#, op),
            )),
            None => Ok(()),
        }
    }

    fn template(&self, id: &str) -> ClientResult<MockTemplate> {
        self.state.lock().templates.get(id).cloned().ok_or_else(|| {
            ClientError::bad_response(404, r#"{"code":"INVALID_LIBRARY_DOCUMENT_ID"}"#)
        })
    }
}

#[async_trait]
impl LibraryDocumentApi for MockSignApi {
    fn acting_user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    async fn list_templates(
        &self,
        cursor: Option<&str>,
    ) -> ClientResult<LibraryDocumentListResponse> {
        self.record(
            Op::ListTemplates,
            None,
            ApiCall::ListTemplates {
                cursor: cursor.map(str::to_string),
                user: self.user.clone(),
            },
        )?;

        self.state
            .lock()
            .pages
            .get(&cursor.map(str::to_string))
            .cloned()
            .ok_or_else(|| ClientError::bad_response(400, r#"{"code":"INVALID_CURSOR"}"#))
    }

    async fn get_template(&self, id: &str) -> ClientResult<LibraryDocumentInfo> {
        self.record(
            Op::GetTemplate,
            Some(id),
            ApiCall::GetTemplate {
                id: id.to_string(),
                user: self.user.clone(),
            },
        )?;
        Ok(serde_json::from_value(self.template(id)?.info)?)
    }

    async fn get_template_documents(&self, id: &str) -> ClientResult<Vec<DocumentDescriptor>> {
        self.record(
            Op::GetDocuments,
            Some(id),
            ApiCall::GetDocuments {
                id: id.to_string(),
                user: self.user.clone(),
            },
        )?;
        Ok(self
            .template(id)?
            .documents
            .into_iter()
            .map(|(doc_id, _)| DocumentDescriptor {
                name: Some(format!("{}.pdf", doc_id)),
                id: doc_id,
                label: None,
                mime_type: Some("application/pdf".to_string()),
                num_pages: Some(1),
            })
            .collect())
    }

    async fn get_template_document(&self, id: &str, document_id: &str) -> ClientResult<Vec<u8>> {
        self.record(
            Op::GetDocument,
            Some(id),
            ApiCall::GetDocument {
                id: id.to_string(),
                document_id: document_id.to_string(),
                user: self.user.clone(),
            },
        )?;
        self.template(id)?
            .documents
            .into_iter()
            .find(|(doc_id, _)| doc_id == document_id)
            .map(|(_, bytes)| bytes)
            .ok_or_else(|| ClientError::bad_response(404, r#"{"code":"INVALID_DOCUMENT_ID"}"#))
    }

    async fn get_template_form_fields(&self, id: &str) -> ClientResult<FormFields> {
        self.record(
            Op::GetFormFields,
            Some(id),
            ApiCall::GetFormFields {
                id: id.to_string(),
                user: self.user.clone(),
            },
        )?;
        Ok(FormFields(self.template(id)?.fields))
    }

    async fn create_transient_document(&self, file: &DocumentFile) -> ClientResult<String> {
        self.record(
            Op::UploadTransient,
            None,
            ApiCall::UploadTransient {
                file_name: file.file_name.clone(),
                content: file.content.clone(),
                user: self.user.clone(),
            },
        )?;
        let mut state = self.state.lock();
        state.next_transient += 1;
        Ok(format!("transient-{}", state.next_transient))
    }

    async fn create_template(
        &self,
        source: &LibraryDocumentInfo,
        transient_ids: &[String],
    ) -> ClientResult<String> {
        let body =
            serde_json::to_value(LibraryDocumentCreationInfo::from_source(source, transient_ids))?;
        self.record(
            Op::CreateTemplate,
            None,
            ApiCall::CreateTemplate {
                body,
                user: self.user.clone(),
            },
        )?;
        let mut state = self.state.lock();
        state.next_template += 1;
        Ok(format!("new-{}", state.next_template))
    }

    async fn update_template_form_fields(
        &self,
        id: &str,
        fields: &FormFields,
    ) -> ClientResult<()> {
        self.record(
            Op::UpdateFormFields,
            Some(id),
            ApiCall::UpdateFormFields {
                id: id.to_string(),
                body: fields.0.clone(),
                user: self.user.clone(),
            },
        )
    }
}

impl ActingUserControl for MockSignApi {
    fn set_acting_user(&mut self, user: Option<&str>) -> ClientResult<()> {
        if user.is_some_and(|user| user.trim().is_empty()) {
            return Err(ClientError::InvalidInput(
                "Acting user must not be empty".to_string(),
            ));
        }
        self.user = user.map(str::to_string);
        Ok(())
    }
}

/// Form field set used across transfer tests
pub fn sample_fields() -> Value {
    json!({
        "fields": [
            {
                "name": "Signature 1",
                "inputType": "SIGNATURE",
                "locations": [
                    {"pageNumber": 1, "top": 100, "left": 50, "width": 200, "height": 30}
                ],
                "assignee": "recipient0"
            },
            {
                "name": "Date",
                "inputType": "TEXT_FIELD",
                "contentType": "SIGNATURE_DATE",
                "locations": [{"pageNumber": 2, "top": 400, "left": 50, "width": 120, "height": 20}]
            }
        ]
    })
}
