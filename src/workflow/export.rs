use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use super::WorkflowController;
use crate::error::WorkflowError;
use crate::presentation::{COLOR_SUCCESS, StatusEvent};

/// A downloaded export, ready to be written under `file_name`.
#[derive(Debug, Clone)]
pub struct ExportFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportSummary {
    pub count: Option<u64>,
    pub errors: Vec<String>,
}

pub fn export_file_name(at: DateTime<Utc>) -> String {
    format!("analyses_{}.csv", at.format("%Y-%m-%dT%H-%M-%S"))
}

impl WorkflowController {
    pub async fn export_csv(&self) -> Result<ExportFile, WorkflowError> {
        self.publish(StatusEvent::progress("Preparing CSV export..."));
        let bytes = self
            .backend
            .export_csv()
            .await
            .map_err(|e| self.fail(e.into()))?;
        let file = ExportFile {
            file_name: export_file_name(Utc::now()),
            bytes,
        };
        info!("Exported {} bytes as {}", file.bytes.len(), file.file_name);
        self.publish(StatusEvent::new("CSV generated.", Some(COLOR_SUCCESS)));
        Ok(file)
    }

    pub async fn export_db(&self) -> Result<ExportSummary, WorkflowError> {
        self.publish(StatusEvent::progress("Exporting to the database..."));
        let response = self
            .backend
            .export_db()
            .await
            .map_err(|e| self.fail(e.into()))?;
        for error in &response.errors {
            warn!("Database export reported: {}", error);
        }
        let saved = response
            .count
            .map(|count| format!("{} records saved.", count))
            .unwrap_or_else(|| "Records saved.".to_string());
        self.publish(StatusEvent::new(saved, Some(COLOR_SUCCESS)));
        self.refresh_analysis_count().await;
        Ok(ExportSummary {
            count: response.count,
            errors: response.errors,
        })
    }

    pub async fn analysis_count(&self) -> Result<u64, WorkflowError> {
        let response = self
            .backend
            .count_analyses()
            .await
            .map_err(|e| self.fail(e.into()))?;
        if !response.status.is_success() {
            let message = response
                .message
                .unwrap_or_else(|| "Could not load the analysis count.".to_string());
            return Err(self.fail(WorkflowError::backend(message, None)));
        }
        self.count_tx.send_replace(Some(response.count));
        Ok(response.count)
    }

    /// Updates the stored count without surfacing failures in the status area.
    pub(super) async fn refresh_analysis_count(&self) {
        match self.backend.count_analyses().await {
            Ok(response) if response.status.is_success() => {
                debug!("Analysis count is now {}", response.count);
                self.count_tx.send_replace(Some(response.count));
            }
            Ok(response) => warn!(
                "Analysis count refresh rejected: {}",
                response.message.unwrap_or_default()
            ),
            Err(e) => warn!("Analysis count refresh failed: {}", e),
        }
    }
}
