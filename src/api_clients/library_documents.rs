//! # Library Document Operations
//!
//! Template-level calls on [`SignApiClient`]. Each method is one HTTP round
//! trip validated against the status its [`Endpoint`] expects.

use reqwest::multipart::{Form, Part};
use tracing::{debug, info};

use super::sign_client::{Endpoint, RequestBody, SignApiClient};
use crate::error::{ClientError, ClientResult};
use crate::models::{
    DocumentDescriptor, DocumentFile, DocumentsResponse, FormFields, LibraryDocumentCreationInfo,
    LibraryDocumentCreationResponse, LibraryDocumentInfo, LibraryDocumentListResponse,
    TransientDocumentResponse,
};

impl SignApiClient {
    /// List one page of library documents
    ///
    /// GET /libraryDocuments?cursor=..&pageSize=..
    pub async fn list_templates(
        &self,
        cursor: Option<&str>,
    ) -> ClientResult<LibraryDocumentListResponse> {
        let endpoint = Endpoint::ListTemplates {
            cursor,
            page_size: self.page_size(),
        };
        let page: LibraryDocumentListResponse =
            self.send(&endpoint, RequestBody::Empty).await?.json()?;

        debug!(
            count = page.library_document_list.len(),
            next_cursor = ?page.next_cursor(),
            "Listed library documents"
        );
        Ok(page)
    }

    /// GET /libraryDocuments/{id}
    pub async fn get_template(&self, id: &str) -> ClientResult<LibraryDocumentInfo> {
        self.send(&Endpoint::GetTemplate { id }, RequestBody::Empty)
            .await?
            .json()
    }

    /// Ordered document descriptors of a template
    ///
    /// GET /libraryDocuments/{id}/documents
    pub async fn get_template_documents(&self, id: &str) -> ClientResult<Vec<DocumentDescriptor>> {
        let response: DocumentsResponse = self
            .send(&Endpoint::GetTemplateDocuments { id }, RequestBody::Empty)
            .await?
            .json()?;
        Ok(response.documents)
    }

    /// Raw PDF bytes of one document
    ///
    /// GET /libraryDocuments/{id}/documents/{document_id} (Accept: application/pdf)
    pub async fn get_template_document(
        &self,
        id: &str,
        document_id: &str,
    ) -> ClientResult<Vec<u8>> {
        let response = self
            .send(
                &Endpoint::GetTemplateDocument { id, document_id },
                RequestBody::Empty,
            )
            .await?;

        debug!(
            template_id = %id,
            document_id = %document_id,
            bytes = response.bytes().len(),
            "Downloaded template document"
        );
        Ok(response.into_bytes())
    }

    /// GET /libraryDocuments/{id}/formFields
    pub async fn get_template_form_fields(&self, id: &str) -> ClientResult<FormFields> {
        self.send(&Endpoint::GetTemplateFormFields { id }, RequestBody::Empty)
            .await?
            .json()
    }

    /// Upload bytes as a transient document and return its ID
    ///
    /// POST /transientDocuments (multipart)
    pub async fn create_transient_document(&self, file: &DocumentFile) -> ClientResult<String> {
        let part = Part::bytes(file.content.clone())
            .file_name(file.file_name.clone())
            .mime_str(&file.mime_type)?;
        let form = Form::new()
            .text("File-Name", file.file_name.clone())
            .text("Mime-Type", file.mime_type.clone())
            .part("File", part);

        let response: TransientDocumentResponse = self
            .send(&Endpoint::CreateTransientDocument, RequestBody::Multipart(form))
            .await?
            .json()?;

        if response.transient_document_id.is_empty() {
            return Err(ClientError::invalid_response(
                "transientDocumentId",
                "empty transient document ID",
            ));
        }

        debug!(
            file_name = %file.file_name,
            transient_document_id = %response.transient_document_id,
            "Uploaded transient document"
        );
        Ok(response.transient_document_id)
    }

    /// Create a user-owned, active template from `source` and uploaded files
    ///
    /// POST /libraryDocuments
    pub async fn create_template(
        &self,
        source: &LibraryDocumentInfo,
        transient_ids: &[String],
    ) -> ClientResult<String> {
        let body = LibraryDocumentCreationInfo::from_source(source, transient_ids);
        let response: LibraryDocumentCreationResponse = self
            .send(
                &Endpoint::CreateTemplate,
                RequestBody::Json(serde_json::to_value(&body)?),
            )
            .await?
            .json()?;

        info!(
            template_id = %response.id,
            name = %body.name,
            files = body.file_infos.len(),
            acting_user = ?self.acting_user(),
            "Created library document"
        );
        Ok(response.id)
    }

    /// PUT /libraryDocuments/{id}/formFields
    pub async fn update_template_form_fields(
        &self,
        id: &str,
        fields: &FormFields,
    ) -> ClientResult<()> {
        self.send(
            &Endpoint::UpdateTemplateFormFields { id },
            RequestBody::Json(fields.0.clone()),
        )
        .await?;

        debug!(template_id = %id, fields = fields.field_count(), "Applied form fields");
        Ok(())
    }
}
