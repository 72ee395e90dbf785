//! Watermark removal by shelling out to the external image tool.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use quotagate_application::{ImageUpload, WatermarkRemover};
use quotagate_core::{AppError, AppResult};
use tokio::process::Command;
use tracing::warn;
use uuid::Uuid;

/// Runs the external watermark tool as `<tool> -i <input> -o <output>`.
///
/// Each call writes into its own pair of scratch files under `work_dir`,
/// both removed once the call returns.
#[derive(Debug, Clone)]
pub struct CommandWatermarkRemover {
    tool_path: PathBuf,
    work_dir: PathBuf,
    timeout: Duration,
}

struct ScratchFiles {
    input: PathBuf,
    output: PathBuf,
}

impl ScratchFiles {
    fn new(work_dir: &Path, extension: &str) -> Self {
        let stem = Uuid::new_v4();
        Self {
            input: work_dir.join(format!("{stem}.{extension}")),
            output: work_dir.join(format!("{stem}_clean.{extension}")),
        }
    }

    async fn remove(&self) {
        for path in [&self.input, &self.output] {
            if let Err(error) = tokio::fs::remove_file(path).await
                && error.kind() != std::io::ErrorKind::NotFound
            {
                warn!(path = %path.display(), error = %error, "failed to remove scratch file");
            }
        }
    }
}

impl CommandWatermarkRemover {
    /// Creates a remover for the tool at `tool_path`.
    #[must_use]
    pub fn new(tool_path: impl Into<PathBuf>, work_dir: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            tool_path: tool_path.into(),
            work_dir: work_dir.into(),
            timeout,
        }
    }

    async fn run(&self, files: &ScratchFiles, upload: ImageUpload) -> AppResult<Vec<u8>> {
        tokio::fs::create_dir_all(&self.work_dir)
            .await
            .map_err(|error| {
                AppError::Internal(format!(
                    "failed to prepare work dir '{}': {error}",
                    self.work_dir.display()
                ))
            })?;
        tokio::fs::write(&files.input, &upload.bytes)
            .await
            .map_err(|error| AppError::Internal(format!("failed to stage upload: {error}")))?;

        let mut command = Command::new(&self.tool_path);
        command
            .arg("-i")
            .arg(&files.input)
            .arg("-o")
            .arg(&files.output)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| {
                AppError::Internal(format!(
                    "watermark tool timed out after {}s",
                    self.timeout.as_secs()
                ))
            })?
            .map_err(|error| {
                AppError::Internal(format!(
                    "failed to launch watermark tool '{}': {error}",
                    self.tool_path.display()
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!(
                status = %output.status,
                stderr = %stderr.trim(),
                "watermark tool failed"
            );
            return Err(AppError::Internal("processing failed".to_owned()));
        }

        match tokio::fs::read(&files.output).await {
            Ok(bytes) => Ok(bytes),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Err(AppError::Internal(
                "watermark tool produced no output".to_owned(),
            )),
            Err(error) => Err(AppError::Internal(format!(
                "failed to read processed image: {error}"
            ))),
        }
    }
}

#[async_trait]
impl WatermarkRemover for CommandWatermarkRemover {
    async fn remove_watermark(&self, upload: ImageUpload) -> AppResult<Vec<u8>> {
        let files = ScratchFiles::new(&self.work_dir, upload.format.extension());
        let result = self.run(&files, upload).await;
        files.remove().await;
        result
    }
}

#[cfg(all(test, unix))]
mod tests {
    use std::os::unix::fs::PermissionsExt;
    use std::path::PathBuf;
    use std::time::Duration;

    use quotagate_application::{ImageFormat, ImageUpload, WatermarkRemover};
    use quotagate_core::AppError;
    use uuid::Uuid;

    use super::CommandWatermarkRemover;

    async fn scratch_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("quotagate-test-{}", Uuid::new_v4()));
        let _ = tokio::fs::create_dir_all(&dir).await;
        dir
    }

    async fn write_script(dir: &PathBuf, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        let _ = tokio::fs::write(&path, format!("#!/bin/sh\n{body}\n")).await;
        let _ = tokio::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).await;
        path
    }

    async fn entries(dir: &PathBuf) -> usize {
        let mut count = 0;
        if let Ok(mut read_dir) = tokio::fs::read_dir(dir).await {
            while let Ok(Some(_)) = read_dir.next_entry().await {
                count += 1;
            }
        }
        count
    }

    fn upload(bytes: &[u8]) -> ImageUpload {
        ImageUpload {
            bytes: bytes.to_vec(),
            format: ImageFormat::Png,
        }
    }

    #[tokio::test]
    async fn returns_tool_output_and_cleans_up() {
        let tools = scratch_dir().await;
        let work = scratch_dir().await;
        let tool = write_script(&tools, "copy.sh", "cp \"$2\" \"$4\"").await;
        let remover = CommandWatermarkRemover::new(tool, &work, Duration::from_secs(10));

        let result = remover.remove_watermark(upload(b"pixels")).await;

        assert_eq!(result.ok().as_deref(), Some(b"pixels".as_slice()));
        assert_eq!(entries(&work).await, 0);
        let _ = tokio::fs::remove_dir_all(&tools).await;
        let _ = tokio::fs::remove_dir_all(&work).await;
    }

    #[tokio::test]
    async fn non_zero_exit_is_a_processing_failure() {
        let tools = scratch_dir().await;
        let work = scratch_dir().await;
        let tool = write_script(&tools, "fail.sh", "echo broken >&2\nexit 3").await;
        let remover = CommandWatermarkRemover::new(tool, &work, Duration::from_secs(10));

        let result = remover.remove_watermark(upload(b"pixels")).await;

        assert!(matches!(result, Err(AppError::Internal(message)) if message == "processing failed"));
        assert_eq!(entries(&work).await, 0);
        let _ = tokio::fs::remove_dir_all(&tools).await;
        let _ = tokio::fs::remove_dir_all(&work).await;
    }

    #[tokio::test]
    async fn missing_output_file_is_reported() {
        let tools = scratch_dir().await;
        let work = scratch_dir().await;
        let tool = write_script(&tools, "noop.sh", "exit 0").await;
        let remover = CommandWatermarkRemover::new(tool, &work, Duration::from_secs(10));

        let result = remover.remove_watermark(upload(b"pixels")).await;

        assert!(matches!(result, Err(AppError::Internal(_))));
        let _ = tokio::fs::remove_dir_all(&tools).await;
        let _ = tokio::fs::remove_dir_all(&work).await;
    }

    #[tokio::test]
    async fn slow_tool_times_out() {
        let tools = scratch_dir().await;
        let work = scratch_dir().await;
        let tool = write_script(&tools, "slow.sh", "sleep 5").await;
        let remover = CommandWatermarkRemover::new(tool, &work, Duration::from_millis(200));

        let result = remover.remove_watermark(upload(b"pixels")).await;

        assert!(matches!(result, Err(AppError::Internal(message)) if message.contains("timed out")));
        let _ = tokio::fs::remove_dir_all(&tools).await;
        let _ = tokio::fs::remove_dir_all(&work).await;
    }
}
