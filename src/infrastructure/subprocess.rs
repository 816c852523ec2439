use std::path::{Path, PathBuf};

use anyhow::{ensure, Context, Result};
use tokio::process::Command;

use crate::domain::MessageData;

/// Host-side adapter for the single-shot scraper contract: spawn the
/// configured program with `RUN_MODE=once` and `OUTPUT_FILE` set, wait for
/// it to finish, read back the JSON array it wrote. Run to completion,
/// read result file, nothing more.
pub struct CaptureCommand {
    program: PathBuf,
    args: Vec<String>,
}

impl CaptureCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub async fn capture(&self, output_file: &Path) -> Result<Vec<MessageData>> {
        tracing::info!(
            target: "subprocess",
            program = %self.program.display(),
            output = %output_file.display(),
            "starting scraper process"
        );

        let status = Command::new(&self.program)
            .args(&self.args)
            .env("RUN_MODE", "once")
            .env("OUTPUT_FILE", output_file)
            .status()
            .await
            .with_context(|| format!("failed to spawn {}", self.program.display()))?;
        ensure!(status.success(), "scraper process exited with {status}");

        let body = tokio::fs::read(output_file)
            .await
            .with_context(|| format!("scraper wrote no output at {}", output_file.display()))?;
        serde_json::from_slice(&body)
            .with_context(|| format!("invalid scraper output in {}", output_file.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[cfg(unix)]
    #[tokio::test]
    async fn capture_reads_back_what_the_child_wrote() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("capture.json");

        let payload = r#"[{"data_post":"foo/1","user_url":"https://t.me/foo",
            "user_name":"Foo","message_url":"https://t.me/foo/1",
            "message_text":"hi","message_photo":[],"message_video":[],
            "datetime":"2023-11-14T22:13:20.000Z","id":1}]"#;

        let command = CaptureCommand::new("sh")
            .arg("-c")
            .arg(format!("printf '%s' '{payload}' > \"$OUTPUT_FILE\""));
        let records = command.capture(&output).await.unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].data_post, "foo/1");
        assert_eq!(records[0].id, Some(1));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn nonzero_exit_is_an_error() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("capture.json");

        let command = CaptureCommand::new("sh").arg("-c").arg("exit 1");
        assert!(command.capture(&output).await.is_err());
    }
}
