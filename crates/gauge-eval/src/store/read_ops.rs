//! Loading an existing result file

use std::collections::HashSet;
use std::path::Path;

use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, warn};

use crate::error::{BenchError, BenchResult};
use crate::tasks::TaskResult;

/// Records already on disk
pub(super) struct Loaded {
    pub results: Vec<TaskResult>,
    pub seen: HashSet<String>,
    /// The file exists and its last byte is not a newline
    pub needs_newline: bool,
}

/// Read every valid record from `path`
///
/// A missing file is an empty store. Unparseable lines, such as a partial
/// write left by a crash, are skipped with a warning. When an id appears more
/// than once the first record wins.
pub(super) async fn load_existing(path: &Path) -> BenchResult<Loaded> {
    let mut loaded = Loaded {
        results: Vec::new(),
        seen: HashSet::new(),
        needs_newline: false,
    };

    if !tokio::fs::try_exists(path)
        .await
        .map_err(|e| BenchError::store_at(path, e))?
    {
        return Ok(loaded);
    }

    let len = tokio::fs::metadata(path)
        .await
        .map_err(|e| BenchError::store_at(path, e))?
        .len();

    let file = File::open(path)
        .await
        .map_err(|e| BenchError::store_at(path, format!("failed to open: {}", e)))?;
    // Bytes, not `lines()`: a crash can tear a multi-byte character.
    let mut reader = BufReader::new(file);
    let mut buf = Vec::new();
    let mut line_no = 0usize;

    loop {
        buf.clear();
        let read = reader
            .read_until(b'\n', &mut buf)
            .await
            .map_err(|e| BenchError::store_at(path, format!("failed to read line: {}", e)))?;
        if read == 0 {
            break;
        }
        line_no += 1;

        let line = buf.trim_ascii();
        if line.is_empty() {
            continue;
        }

        match serde_json::from_slice::<TaskResult>(line) {
            Ok(result) => {
                if loaded.seen.insert(result.instance_id.clone()) {
                    loaded.results.push(result);
                } else {
                    warn!(
                        path = %path.display(),
                        instance_id = %result.instance_id,
                        "duplicate record in result store, keeping the first"
                    );
                }
            }
            Err(e) => {
                let preview: String = String::from_utf8_lossy(line).chars().take(60).collect();
                warn!(
                    path = %path.display(),
                    line = line_no,
                    error = %e,
                    preview = %preview,
                    "skipping unreadable record in result store"
                );
            }
        }
    }

    loaded.needs_newline = len > 0 && !ends_with_newline(path, len).await?;

    debug!(
        path = %path.display(),
        records = loaded.results.len(),
        "loaded existing results"
    );
    Ok(loaded)
}

async fn ends_with_newline(path: &Path, len: u64) -> BenchResult<bool> {
    use tokio::io::{AsyncReadExt, AsyncSeekExt, SeekFrom};

    let mut file = File::open(path)
        .await
        .map_err(|e| BenchError::store_at(path, e))?;
    file.seek(SeekFrom::Start(len - 1))
        .await
        .map_err(|e| BenchError::store_at(path, e))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)
        .await
        .map_err(|e| BenchError::store_at(path, e))?;
    Ok(last[0] == b'\n')
}
