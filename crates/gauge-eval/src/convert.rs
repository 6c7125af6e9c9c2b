//! Rewrites stored results into the harness prediction format

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{BenchError, BenchResult};
use crate::prompts::{MODEL_NAME_KEY, PATCH_KEY};
use crate::tasks::TaskResult;

/// One line of a harness predictions file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarnessPrediction {
    pub instance_id: String,
    pub model_patch: String,
    pub model_name_or_path: String,
}

impl HarnessPrediction {
    /// Convert a stored result; `None` when it carries no patch
    pub fn from_result(result: &TaskResult) -> Option<Self> {
        let model_patch = result.output_str(PATCH_KEY)?;
        Some(Self {
            instance_id: result.instance_id.clone(),
            model_patch: model_patch.to_string(),
            model_name_or_path: result
                .output_str(MODEL_NAME_KEY)
                .unwrap_or("unknown")
                .to_string(),
        })
    }
}

/// Counts from one conversion
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConversionSummary {
    pub converted: usize,
    /// Records without a patch, usually failed generations
    pub skipped: usize,
}

/// Read a result store file and write the harness predictions file
///
/// Unreadable lines are skipped with a warning, as the store does on open.
pub async fn convert_predictions(input: &Path, output: &Path) -> BenchResult<ConversionSummary> {
    convert_filtered(input, output, None).await
}

/// Like [`convert_predictions`], keeping only records whose id is in `selected`
pub async fn convert_selected(
    input: &Path,
    output: &Path,
    selected: &HashSet<String>,
) -> BenchResult<ConversionSummary> {
    convert_filtered(input, output, Some(selected)).await
}

async fn convert_filtered(
    input: &Path,
    output: &Path,
    selected: Option<&HashSet<String>>,
) -> BenchResult<ConversionSummary> {
    let content = tokio::fs::read(input)
        .await
        .map_err(|e| BenchError::store_at(input, e))?;

    let mut summary = ConversionSummary::default();
    let mut out = String::new();

    for (idx, line) in content.split(|b| *b == b'\n').enumerate() {
        let line = line.trim_ascii();
        if line.is_empty() {
            continue;
        }
        let result: TaskResult = match serde_json::from_slice(line) {
            Ok(result) => result,
            Err(e) => {
                warn!(path = %input.display(), line = idx + 1, error = %e, "skipping unreadable record");
                summary.skipped += 1;
                continue;
            }
        };

        if selected.is_some_and(|ids| !ids.contains(&result.instance_id)) {
            continue;
        }

        match HarnessPrediction::from_result(&result) {
            Some(prediction) => {
                out.push_str(&serde_json::to_string(&prediction)?);
                out.push('\n');
                summary.converted += 1;
            }
            None => summary.skipped += 1,
        }
    }

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(output, out).await?;

    info!(
        input = %input.display(),
        output = %output.display(),
        converted = summary.converted,
        skipped = summary.skipped,
        "converted predictions"
    );
    Ok(summary)
}
