//! # Template Transfer
//!
//! Clones a library document template from one account to another: metadata,
//! documents and form fields are read as the sender, then re-uploaded, created
//! and re-applied as the receiver.
//!
//! Two entry points exist:
//!
//! - [`TemplateTransfer`] holds one API handle per identity and never mutates
//!   either. Use it for anything that clones more than one template.
//! - [`clone_template_as`] switches the acting user of a single handle for the
//!   sender and receiver phases and restores the previous acting user on every
//!   exit path.
//!
//! No step is retried. The first failing step aborts the clone; transient
//! documents uploaded before the failure are left to expire server-side.

use futures::TryStreamExt;
use std::fmt;
use std::future::Future;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::api_clients::SignApiClient;
use crate::error::{ClientError, ClientResult};
use crate::models::{DocumentFile, FormFields, LibraryDocumentInfo};
use crate::transport::{list_all_templates, ActingUserControl, LibraryDocumentApi};

/// Step of a template clone, used to report where a clone failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferStep {
    ListTemplates,
    SwitchToSender,
    FetchTemplate,
    FetchDocumentList,
    FetchFormFields,
    DownloadDocument,
    SwitchToReceiver,
    UploadDocument,
    CreateTemplate,
    ApplyFormFields,
    RestoreActingUser,
}

impl fmt::Display for TransferStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            TransferStep::ListTemplates => "list the sender's templates",
            TransferStep::SwitchToSender => "act as the sender",
            TransferStep::FetchTemplate => "fetch the template",
            TransferStep::FetchDocumentList => "list the template's documents",
            TransferStep::FetchFormFields => "fetch the form fields",
            TransferStep::DownloadDocument => "download a document",
            TransferStep::SwitchToReceiver => "act as the receiver",
            TransferStep::UploadDocument => "upload a transient document",
            TransferStep::CreateTemplate => "create the template",
            TransferStep::ApplyFormFields => "apply the form fields",
            TransferStep::RestoreActingUser => "restore the acting user",
        };
        f.write_str(text)
    }
}

fn step_failed(template_id: &str, step: TransferStep, error: ClientError) -> ClientError {
    error!(
        template_id = %template_id,
        step = %step,
        error = %error,
        "Template clone step failed"
    );
    ClientError::clone_failed(template_id, step, error)
}

async fn run_step<T, F>(
    cancel: &CancellationToken,
    template_id: &str,
    step: TransferStep,
    operation: F,
) -> ClientResult<T>
where
    F: Future<Output = ClientResult<T>>,
{
    let outcome = tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(ClientError::cancelled(step.to_string())),
        result = operation => result,
    };

    outcome.map_err(|e| step_failed(template_id, step, e))
}

/// Everything read from the source template
struct SourceTemplate {
    info: LibraryDocumentInfo,
    fields: FormFields,
}

/// Result of cloning one template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClonedTemplate {
    pub source_id: String,
    pub new_id: String,
}

#[derive(Debug)]
pub struct CloneFailure {
    pub template_id: String,
    pub error: ClientError,
}

/// Outcome of a bulk clone
#[derive(Debug, Default)]
pub struct BulkCloneReport {
    pub cloned: Vec<ClonedTemplate>,
    pub failed: Vec<CloneFailure>,
    /// Templates never attempted because the run stopped early
    pub skipped: Vec<String>,
    /// The run was stopped by its cancellation token
    pub cancelled: bool,
}

impl BulkCloneReport {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed.is_empty() && self.skipped.is_empty()
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.cloned.len() + self.failed.len() + self.skipped.len()
    }

    /// Process exit code for the run
    ///
    /// 0 when every template was cloned, 5 when the run was cancelled, otherwise
    /// the code of the first failure (3 for an unexpected API status).
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        if self.is_success() {
            0
        } else if self.cancelled {
            5
        } else {
            self.failed
                .first()
                .map_or(1, |failure| failure.error.exit_code())
        }
    }
}

/// Clones templates from a sender API handle to a receiver API handle
///
/// ```rust,ignore
/// use sign_transfer::transfer::TemplateTransfer;
///
/// let transfer = TemplateTransfer::from_client(
///     &client,
///     Some("alice@example.com"),
///     Some("bob@example.com"),
/// )?;
/// let new_id = transfer.clone_template("CBJCHBCAABAA...").await?;
/// ```
#[derive(Debug)]
pub struct TemplateTransfer<S, R> {
    sender: S,
    receiver: R,
    cancel: CancellationToken,
    continue_on_error: bool,
}

impl TemplateTransfer<SignApiClient, SignApiClient> {
    /// Sender and receiver copies of `client`, pinned to the given identities
    pub fn from_client(
        client: &SignApiClient,
        sender: Option<&str>,
        receiver: Option<&str>,
    ) -> ClientResult<Self> {
        Ok(Self::new(
            client.with_acting_user(sender)?,
            client.with_acting_user(receiver)?,
        ))
    }
}

impl<S, R> TemplateTransfer<S, R>
where
    S: LibraryDocumentApi,
    R: LibraryDocumentApi,
{
    pub fn new(sender: S, receiver: R) -> Self {
        Self {
            sender,
            receiver,
            cancel: CancellationToken::new(),
            continue_on_error: true,
        }
    }

    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Whether a bulk clone moves on to the next template after a failure
    #[must_use]
    pub fn continue_on_error(mut self, continue_on_error: bool) -> Self {
        self.continue_on_error = continue_on_error;
        self
    }

    pub fn sender(&self) -> &S {
        &self.sender
    }

    pub fn receiver(&self) -> &R {
        &self.receiver
    }

    /// Clone template `id` and return the new template's ID
    ///
    /// Documents move one at a time: each is downloaded from the sender and
    /// uploaded to the receiver before the next is fetched, in the source order.
    pub async fn clone_template(&self, id: &str) -> ClientResult<String> {
        let cancel = &self.cancel;

        info!(
            template_id = %id,
            sender = ?self.sender.acting_user(),
            receiver = ?self.receiver.acting_user(),
            "Cloning template"
        );

        let info = run_step(
            cancel,
            id,
            TransferStep::FetchTemplate,
            self.sender.get_template(id),
        )
        .await?;
        let descriptors = run_step(
            cancel,
            id,
            TransferStep::FetchDocumentList,
            self.sender.get_template_documents(id),
        )
        .await?;
        let fields = run_step(
            cancel,
            id,
            TransferStep::FetchFormFields,
            self.sender.get_template_form_fields(id),
        )
        .await?;

        if descriptors.is_empty() {
            warn!(template_id = %id, "Template has no documents");
        }

        let mut transient_ids = Vec::with_capacity(descriptors.len());
        for descriptor in &descriptors {
            let content = run_step(
                cancel,
                id,
                TransferStep::DownloadDocument,
                self.sender.get_template_document(id, &descriptor.id),
            )
            .await?;
            let file = DocumentFile::pdf(descriptor.file_name(), content);

            let transient_id = run_step(
                cancel,
                id,
                TransferStep::UploadDocument,
                self.receiver.create_transient_document(&file),
            )
            .await?;
            transient_ids.push(transient_id);
        }

        let new_id = publish(
            &self.receiver,
            cancel,
            id,
            &SourceTemplate { info, fields },
            &transient_ids,
        )
        .await?;

        Ok(new_id)
    }

    /// Clone every template in `ids`, in order
    ///
    /// With `continue_on_error` a failed template is recorded and the run moves
    /// on; otherwise the remaining IDs are skipped. Cancellation always stops
    /// the run.
    pub async fn bulk_clone<I>(&self, ids: I) -> BulkCloneReport
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let mut report = BulkCloneReport::default();
        let mut stopped = false;

        for id in ids {
            let id: String = id.into();
            if self.cancel.is_cancelled() {
                report.cancelled = true;
            }
            if stopped || report.cancelled {
                report.skipped.push(id);
                continue;
            }

            match self.clone_template(&id).await {
                Ok(new_id) => report.cloned.push(ClonedTemplate {
                    source_id: id,
                    new_id,
                }),
                Err(error) => {
                    report.cancelled |= error.is_cancelled();
                    stopped = report.cancelled || !self.continue_on_error;
                    warn!(
                        template_id = %id,
                        error = %error,
                        stopping = stopped,
                        "Bulk clone failed for template"
                    );
                    report.failed.push(CloneFailure {
                        template_id: id,
                        error,
                    });
                }
            }
        }

        info!(
            cloned = report.cloned.len(),
            failed = report.failed.len(),
            skipped = report.skipped.len(),
            cancelled = report.cancelled,
            "Bulk clone finished"
        );
        report
    }

    /// Clone every template the sender can list
    ///
    /// The full listing is collected before the first clone so templates created
    /// during the run are never picked up, even when sender and receiver are the
    /// same account.
    pub async fn clone_all(&self) -> ClientResult<BulkCloneReport> {
        let listing = list_all_templates(&self.sender).try_collect::<Vec<String>>();
        let outcome: ClientResult<Vec<String>> = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                Err(ClientError::cancelled(TransferStep::ListTemplates.to_string()))
            }
            result = listing => result,
        };
        let ids = outcome.inspect_err(|e| {
            error!(step = %TransferStep::ListTemplates, error = %e, "Listing templates failed");
        })?;

        info!(count = ids.len(), "Listed sender templates");
        Ok(self.bulk_clone(ids).await)
    }
}

/// Create the new template from uploaded files and apply the source form fields
async fn publish<A>(
    api: &A,
    cancel: &CancellationToken,
    source_id: &str,
    source: &SourceTemplate,
    transient_ids: &[String],
) -> ClientResult<String>
where
    A: LibraryDocumentApi + ?Sized,
{
    let new_id = run_step(
        cancel,
        source_id,
        TransferStep::CreateTemplate,
        api.create_template(&source.info, transient_ids),
    )
    .await?;

    run_step(
        cancel,
        source_id,
        TransferStep::ApplyFormFields,
        api.update_template_form_fields(&new_id, &source.fields),
    )
    .await?;

    info!(
        template_id = %source_id,
        new_template_id = %new_id,
        documents = transient_ids.len(),
        acting_user = ?api.acting_user(),
        "Template cloned"
    );
    Ok(new_id)
}

/// Clone template `id` through one client by switching its acting user
///
/// Reads run as `sender` and writes as `receiver`; `None` keeps the current
/// identity for that phase. All document bytes are downloaded before the
/// switch to the receiver. The acting user the client had on entry is restored
/// whether the clone succeeds or fails.
pub async fn clone_template_as<C>(
    client: &mut C,
    id: &str,
    sender: Option<&str>,
    receiver: Option<&str>,
    cancel: &CancellationToken,
) -> ClientResult<String>
where
    C: ActingUserControl,
{
    let previous = client.acting_user().map(str::to_string);

    let result = clone_switching(client, id, sender, receiver, cancel).await;

    let restored = client
        .set_acting_user(previous.as_deref())
        .map_err(|e| step_failed(id, TransferStep::RestoreActingUser, e));

    let new_id = result?;
    restored?;
    Ok(new_id)
}

async fn clone_switching<C>(
    client: &mut C,
    id: &str,
    sender: Option<&str>,
    receiver: Option<&str>,
    cancel: &CancellationToken,
) -> ClientResult<String>
where
    C: ActingUserControl,
{
    if let Some(sender) = sender {
        client
            .set_acting_user(Some(sender))
            .map_err(|e| step_failed(id, TransferStep::SwitchToSender, e))?;
    }

    info!(template_id = %id, sender = ?client.acting_user(), "Reading template");

    let info = run_step(cancel, id, TransferStep::FetchTemplate, client.get_template(id)).await?;
    let descriptors = run_step(
        cancel,
        id,
        TransferStep::FetchDocumentList,
        client.get_template_documents(id),
    )
    .await?;

    let mut files = Vec::with_capacity(descriptors.len());
    for descriptor in &descriptors {
        let content = run_step(
            cancel,
            id,
            TransferStep::DownloadDocument,
            client.get_template_document(id, &descriptor.id),
        )
        .await?;
        files.push(DocumentFile::pdf(descriptor.file_name(), content));
    }

    let fields = run_step(
        cancel,
        id,
        TransferStep::FetchFormFields,
        client.get_template_form_fields(id),
    )
    .await?;

    if let Some(receiver) = receiver {
        client
            .set_acting_user(Some(receiver))
            .map_err(|e| step_failed(id, TransferStep::SwitchToReceiver, e))?;
    }

    let mut transient_ids = Vec::with_capacity(files.len());
    for file in &files {
        let transient_id = run_step(
            cancel,
            id,
            TransferStep::UploadDocument,
            client.create_transient_document(file),
        )
        .await?;
        transient_ids.push(transient_id);
    }

    publish(&*client, cancel, id, &SourceTemplate { info, fields }, &transient_ids).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transfer_step_display() {
        assert_eq!(TransferStep::UploadDocument.to_string(), "upload a transient document");
        assert_eq!(TransferStep::RestoreActingUser.to_string(), "restore the acting user");
    }

    #[test]
    fn test_bulk_report_success_requires_nothing_failed_or_skipped() {
        let mut report = BulkCloneReport::default();
        assert!(report.is_success());

        report.cloned.push(ClonedTemplate {
            source_id: "a".to_string(),
            new_id: "a2".to_string(),
        });
        assert!(report.is_success());

        report.skipped.push("b".to_string());
        assert!(!report.is_success());
        assert_eq!(report.total(), 2);

        report.skipped.clear();
        report.failed.push(CloneFailure {
            template_id: "c".to_string(),
            error: ClientError::bad_response(500, "boom"),
        });
        assert!(!report.is_success());
    }

    #[test]
    fn test_bulk_report_exit_codes() {
        let mut report = BulkCloneReport::default();
        assert_eq!(report.exit_code(), 0);

        report.failed.push(CloneFailure {
            template_id: "a".to_string(),
            error: ClientError::bad_response(404, "missing"),
        });
        assert_eq!(report.exit_code(), 3);

        let cancelled_early = BulkCloneReport {
            skipped: vec!["a".to_string(), "b".to_string()],
            cancelled: true,
            ..Default::default()
        };
        assert_eq!(cancelled_early.exit_code(), 5);
    }

    #[test]
    fn test_from_client_pins_identities() {
        let client = SignApiClient::new(crate::api_clients::SignApiConfig {
            base_url: "https://api.na1.example.com/api/rest/v6".to_string(),
            integration_key: "k".to_string(),
            ..Default::default()
        })
        .unwrap();

        let transfer =
            TemplateTransfer::from_client(&client, Some("alice@example.com"), None).unwrap();
        assert_eq!(transfer.sender().acting_user(), Some("alice@example.com"));
        assert_eq!(transfer.receiver().acting_user(), None);
        assert_eq!(client.acting_user(), None);
    }
}
