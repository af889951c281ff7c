//! Async file reading with progress logging.

use std::path::Path;

use anyhow::{Context, Result};
use tokio::io::AsyncReadExt;

const CHUNK: usize = 64 * 1024;

/// Read a whole file, logging percent progress under `label` at debug level.
pub async fn read_with_progress(path: &Path, label: &str) -> Result<Vec<u8>> {
    let mut file = tokio::fs::File::open(path)
        .await
        .with_context(|| format!("Failed to open {}", path.display()))?;
    let total = file.metadata().await.map(|m| m.len()).unwrap_or(0);

    let mut bytes = Vec::with_capacity(total as usize);
    let mut chunk = vec![0u8; CHUNK];
    let mut last_percent = None;
    loop {
        let n = file
            .read(&mut chunk)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        if n == 0 {
            break;
        }
        bytes.extend_from_slice(&chunk[..n]);

        if let Some(percent) = progress_percent(bytes.len() as u64, total) {
            if last_percent != Some(percent) {
                log::debug!("{label}: {percent}% loaded");
                last_percent = Some(percent);
            }
        }
    }
    Ok(bytes)
}

/// Whole-number percentage, `None` when the total is unknown.
fn progress_percent(loaded: u64, total: u64) -> Option<u64> {
    (total > 0).then(|| (loaded.min(total) * 100) / total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_is_capped_and_needs_total() {
        assert_eq!(progress_percent(50, 200), Some(25));
        assert_eq!(progress_percent(300, 200), Some(100));
        assert_eq!(progress_percent(10, 0), None);
    }

    #[tokio::test]
    async fn missing_file_names_the_path() {
        let err = read_with_progress(Path::new("definitely/not/here.obj"), "mesh")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("definitely/not/here.obj"));
    }

    #[tokio::test]
    async fn reads_files_larger_than_one_chunk() {
        let path = std::env::temp_dir().join(format!("orbitview-io-{}.bin", std::process::id()));
        let contents: Vec<u8> = (0..CHUNK * 2 + 17).map(|i| (i % 251) as u8).collect();
        std::fs::write(&path, &contents).unwrap();

        let bytes = read_with_progress(&path, "blob").await.unwrap();
        assert_eq!(bytes, contents);
        std::fs::remove_file(path).ok();
    }
}
