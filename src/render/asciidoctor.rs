//! `asciidoctor-pdf` subprocess renderer.
//!
//! Runs `<command> - --theme <theme>`, feeds the source on stdin and reads
//! the PDF from stdout.

use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use super::errors::{RenderError, RenderResult};
use super::PdfRenderer;
use crate::observability::{log_event_with_fields, Event};

pub const DEFAULT_COMMAND: &str = "asciidoctor-pdf";
pub const DEFAULT_THEME: &str = "default-sans";

#[derive(Debug, Clone)]
pub struct AsciidoctorRenderer {
    command: String,
    args: Vec<String>,
}

impl AsciidoctorRenderer {
    /// Renderer invoking `command - --theme theme`
    pub fn new(command: impl Into<String>, theme: &str) -> Self {
        Self::with_args(
            command,
            vec!["-".to_string(), "--theme".to_string(), theme.to_string()],
        )
    }

    /// Renderer invoking `command` with exactly `args`
    pub fn with_args(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
        }
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }
}

impl Default for AsciidoctorRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_COMMAND, DEFAULT_THEME)
    }
}

#[async_trait]
impl PdfRenderer for AsciidoctorRenderer {
    async fn render(&self, content: &[u8]) -> RenderResult<Vec<u8>> {
        let mut child = Command::new(&self.command)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| RenderError::Spawn {
                command: self.command.clone(),
                source,
            })?;

        // Feed stdin concurrently with draining stdout so large documents cannot deadlock
        let stdin = child.stdin.take();
        let input = content.to_vec();
        let feeder = tokio::spawn(async move {
            if let Some(mut stdin) = stdin {
                stdin.write_all(&input).await?;
                stdin.shutdown().await?;
            }
            Ok::<(), std::io::Error>(())
        });

        let output = child.wait_with_output().await?;
        let fed = feeder
            .await
            .map_err(|e| RenderError::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            log_event_with_fields(
                Event::RenderFailed,
                &[("command", &self.command), ("status", &output.status.to_string())],
            );
            return Err(RenderError::Failed {
                status: output.status.to_string(),
                stderr,
            });
        }
        // A renderer that exits early without reading stdin is fine if it succeeded
        if let Err(e) = fed {
            if e.kind() != std::io::ErrorKind::BrokenPipe {
                return Err(RenderError::Io(e));
            }
        }
        if output.stdout.is_empty() {
            return Err(RenderError::EmptyOutput);
        }

        let bytes = output.stdout.len().to_string();
        log_event_with_fields(
            Event::RenderComplete,
            &[("command", &self.command), ("bytes", &bytes)],
        );

        Ok(output.stdout)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn test_default_args() {
        let r = AsciidoctorRenderer::default();
        assert_eq!(r.command(), "asciidoctor-pdf");
        assert_eq!(r.args(), ["-", "--theme", "default-sans"]);
    }

    #[tokio::test]
    async fn test_stdout_is_returned() {
        let r = AsciidoctorRenderer::with_args("cat", vec![]);
        let out = r.render(b"= Report\n\nHello").await.unwrap();
        assert_eq!(out, b"= Report\n\nHello");
    }

    #[tokio::test]
    async fn test_large_input_does_not_deadlock() {
        let r = AsciidoctorRenderer::with_args("cat", vec![]);
        let big = vec![b'a'; 4 * 1024 * 1024];
        let out = r.render(&big).await.unwrap();
        assert_eq!(out.len(), big.len());
    }

    #[tokio::test]
    async fn test_missing_binary() {
        let r = AsciidoctorRenderer::with_args("adocflow-no-such-renderer", vec![]);
        let err = r.render(b"x").await.unwrap_err();
        assert!(matches!(err, RenderError::Spawn { .. }));
    }

    #[tokio::test]
    async fn test_nonzero_exit() {
        let r = AsciidoctorRenderer::with_args(
            "sh",
            vec![
                "-c".to_string(),
                "cat >/dev/null; echo 'bad theme' >&2; exit 3".to_string(),
            ],
        );
        match r.render(b"x").await.unwrap_err() {
            RenderError::Failed { stderr, .. } => assert_eq!(stderr, "bad theme"),
            other => panic!("expected Failed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_empty_output() {
        let r = AsciidoctorRenderer::with_args(
            "sh",
            vec!["-c".to_string(), "cat >/dev/null".to_string()],
        );
        assert!(matches!(r.render(b"x").await, Err(RenderError::EmptyOutput)));
    }
}
