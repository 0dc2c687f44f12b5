//! Presentation export: render the markup file with the external Marp CLI.
//!
//! The subprocess is bounded by the remaining pipeline budget; on expiry it
//! is killed and no partial output is retained. A non-zero exit is a stage
//! failure, also with no partial output.

use crate::deadline::Deadline;
use crate::error::Pdf2MarpError;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info};

/// Render `markup_path` to `output_path` via `<marp_command> --pdf
/// --allow-local-files <markup> --output <output>`.
pub async fn export_presentation(
    markup_path: &Path,
    output_path: &Path,
    marp_command: &str,
    deadline: &Deadline,
) -> Result<(), Pdf2MarpError> {
    let budget = deadline.check("export-presentation")?;

    if let Some(parent) = output_path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| Pdf2MarpError::OutputWriteFailed {
                path: output_path.to_path_buf(),
                source: e,
            })?;
    }

    debug!(
        "Running {marp_command} --pdf for '{}' (budget {:?})",
        markup_path.display(),
        budget
    );

    let mut command = Command::new(marp_command);
    command
        .arg("--pdf")
        .arg("--allow-local-files")
        .arg(markup_path)
        .arg("--output")
        .arg(output_path)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let result = tokio::time::timeout(budget, command.output()).await;

    match result {
        Err(_) => {
            discard_partial(output_path).await;
            Err(Pdf2MarpError::TimeoutExceeded {
                stage: "export-presentation".to_string(),
                budget_secs: deadline.budget_secs(),
            })
        }
        Ok(Err(e)) => Err(Pdf2MarpError::ExportFailed {
            tool: marp_command.to_string(),
            detail: format!("failed to launch: {e}"),
        }),
        Ok(Ok(output)) if !output.status.success() => {
            discard_partial(output_path).await;
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(Pdf2MarpError::ExportFailed {
                tool: marp_command.to_string(),
                detail: format!("{}: {}", output.status, stderr.trim()),
            })
        }
        Ok(Ok(_)) => {
            info!("Presentation exported → {}", output_path.display());
            Ok(())
        }
    }
}

async fn discard_partial(path: &Path) {
    let _ = tokio::fs::remove_file(path).await;
}
