//! Export record command implementation
//!
//! Prints the labelled instrument dicts of one record, exactly as
//! `GET /get-redcap-responses` returns them.

use crate::adapters::redcap::RegistryProvider;
use crate::config::load_config_or_defaults;
use crate::core::transform::export_record_with_labels;
use crate::domain::RecordId;
use clap::Args;

/// Arguments for the export-record command
#[derive(Args, Debug)]
pub struct ExportRecordArgs {
    /// Record identifier to export
    #[arg(short, long)]
    pub record_id: String,

    /// Print compact JSON instead of pretty-printed JSON
    #[arg(long)]
    pub compact: bool,
}

impl ExportRecordArgs {
    /// Execute the export-record command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let record_id = match RecordId::new(self.record_id.as_str()) {
            Ok(id) => id,
            Err(e) => {
                eprintln!("Error: {e}");
                return Ok(2);
            }
        };

        let config = match load_config_or_defaults(config_path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error: {e}");
                return Ok(2);
            }
        };

        let project = RegistryProvider::from_config(&config.redcap)?.project()?;
        let instruments = export_record_with_labels(project.as_ref(), &record_id).await?;

        tracing::info!(
            record_id = %record_id,
            instruments = instruments.len(),
            "Record exported"
        );

        let output = if self.compact {
            serde_json::to_string(&instruments)?
        } else {
            serde_json::to_string_pretty(&instruments)?
        };
        println!("{output}");
        Ok(0)
    }
}
