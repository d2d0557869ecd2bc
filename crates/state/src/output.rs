//! CI step outputs

use mhub_errors::{Error, StorageError};
use std::path::Path;
use tokio::io::AsyncWriteExt;

/// Selected names as the JSON array a CI matrix consumes
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn selection_json(selected: &[String]) -> Result<String, Error> {
    Ok(serde_json::to_string(selected)?)
}

/// `exporters=<json>` and `build_needed=<bool>` lines for a step output file
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn github_output_lines(selected: &[String]) -> Result<String, Error> {
    Ok(format!(
        "exporters={}\nbuild_needed={}\n",
        selection_json(selected)?,
        !selected.is_empty()
    ))
}

/// Append the step outputs to the file named by `GITHUB_OUTPUT`
///
/// # Errors
///
/// Returns an error if the file cannot be opened or written.
pub async fn append_github_output(path: &Path, selected: &[String]) -> Result<(), Error> {
    append_lines(path, &github_output_lines(selected)?).await
}

/// Append `updated_names=a, b` for the step that opens the version bump PR
///
/// # Errors
///
/// Returns an error if the file cannot be opened or written.
pub async fn append_updated_names(path: &Path, updated: &[String]) -> Result<(), Error> {
    append_lines(path, &format!("updated_names={}\n", updated.join(", "))).await
}

async fn append_lines(path: &Path, lines: &str) -> Result<(), Error> {
    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await
        .map_err(|e| StorageError::from_io_with_path(&e, path))?;
    file.write_all(lines.as_bytes())
        .await
        .map_err(|e| StorageError::from_io_with_path(&e, path))?;
    file.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lines() {
        let selected = vec!["node_exporter".to_string()];
        assert_eq!(
            github_output_lines(&selected).unwrap(),
            "exporters=[\"node_exporter\"]\nbuild_needed=true\n"
        );
        assert_eq!(
            github_output_lines(&[]).unwrap(),
            "exporters=[]\nbuild_needed=false\n"
        );
    }

    #[tokio::test]
    async fn test_append_keeps_existing_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out");
        tokio::fs::write(&path, "previous=1\n").await.unwrap();

        append_github_output(&path, &["a".to_string(), "b".to_string()])
            .await
            .unwrap();
        let content = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(
            content,
            "previous=1\nexporters=[\"a\",\"b\"]\nbuild_needed=true\n"
        );
    }

    #[tokio::test]
    async fn test_updated_names_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out");

        append_updated_names(&path, &["node_exporter".to_string(), "redis_exporter".to_string()])
            .await
            .unwrap();
        let content = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(content, "updated_names=node_exporter, redis_exporter\n");
    }
}
