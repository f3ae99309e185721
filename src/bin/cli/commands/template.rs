//! Template command handlers for the sign-transfer CLI

use futures::TryStreamExt;
use sign_transfer::{
    clone_template_as, list_all_templates, BulkCloneReport, ClientConfig, ClientResult,
    SignApiClient, SignApiConfig, TemplateTransfer,
};
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;

use crate::TemplateCommands;

pub async fn handle_template_command(
    cmd: TemplateCommands,
    config: &ClientConfig,
    cancel: CancellationToken,
) -> ClientResult<ExitCode> {
    config.validate()?;
    let client = SignApiClient::new(SignApiConfig::from(&config.api))?;

    match cmd {
        TemplateCommands::Clone {
            template_id,
            sender,
            receiver,
            single_session,
        } => {
            let sender = sender.or_else(|| config.transfer.sender.clone());
            let receiver = receiver.or_else(|| config.transfer.receiver.clone());

            let new_id = if single_session {
                let mut client = client;
                clone_template_as(
                    &mut client,
                    &template_id,
                    sender.as_deref(),
                    receiver.as_deref(),
                    &cancel,
                )
                .await?
            } else {
                TemplateTransfer::from_client(&client, sender.as_deref(), receiver.as_deref())?
                    .with_cancellation(cancel)
                    .clone_template(&template_id)
                    .await?
            };

            println!("{}", new_id);
            Ok(ExitCode::SUCCESS)
        }
        TemplateCommands::BulkClone {
            ids,
            sender,
            receiver,
            fail_fast,
        } => {
            let sender = sender.or_else(|| config.transfer.sender.clone());
            let receiver = receiver.or_else(|| config.transfer.receiver.clone());

            let transfer =
                TemplateTransfer::from_client(&client, sender.as_deref(), receiver.as_deref())?
                    .with_cancellation(cancel)
                    .continue_on_error(config.transfer.continue_on_error && !fail_fast);

            let report = if ids.is_empty() {
                transfer.clone_all().await?
            } else {
                transfer.bulk_clone(ids).await
            };

            print_report(&report);
            Ok(report_exit_code(&report))
        }
        TemplateCommands::List { as_user } => {
            let client = client.with_acting_user(as_user.as_deref())?;
            let mut ids = std::pin::pin!(list_all_templates(&client));

            let mut count = 0usize;
            while let Some(id) = ids.try_next().await? {
                println!("{}", id);
                count += 1;
            }
            eprintln!("✓ {} templates", count);
            Ok(ExitCode::SUCCESS)
        }
        TemplateCommands::Get {
            template_id,
            as_user,
        } => {
            let client = client.with_acting_user(as_user.as_deref())?;

            let info = client.get_template(&template_id).await?;
            let documents = client.get_template_documents(&template_id).await?;

            println!("✓ Template details:");
            println!("  ID: {}", info.id.as_deref().unwrap_or(&template_id));
            println!("  Name: {}", info.name);
            println!("  Types: {}", info.template_types.join(", "));
            if let Some(sharing_mode) = &info.sharing_mode {
                println!("  Sharing mode: {}", sharing_mode);
            }
            if let Some(status) = info.status.as_ref().or(info.state.as_ref()) {
                println!("  Status: {}", status);
            }
            println!("  Documents: {}", documents.len());
            for (index, document) in documents.iter().enumerate() {
                println!(
                    "    {}. {} ({}{})",
                    index + 1,
                    document.file_name(),
                    document.id,
                    document
                        .num_pages
                        .map(|pages| format!(", {} pages", pages))
                        .unwrap_or_default()
                );
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn print_report(report: &BulkCloneReport) {
    for cloned in &report.cloned {
        println!("{}\t{}", cloned.source_id, cloned.new_id);
    }
    for failure in &report.failed {
        eprintln!("✗ {}: {}", failure.template_id, failure.error);
    }
    for skipped in &report.skipped {
        eprintln!("- {}: skipped", skipped);
    }
    eprintln!(
        "Cloned {}/{} templates ({} failed, {} skipped)",
        report.cloned.len(),
        report.total(),
        report.failed.len(),
        report.skipped.len()
    );
}

fn report_exit_code(report: &BulkCloneReport) -> ExitCode {
    ExitCode::from(report.exit_code())
}
