use async_trait::async_trait;
use std::ffi::OsString;
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use tokio::process::Command;

use crate::error::ConversionError;
use crate::models::upload::ConvertedArtifact;
use crate::services::staging::StagedRequest;

pub const OUTLINED_FILENAME: &str = "GCI_Vector_Outlined.pdf";

/// Ghostscript's console binary name on the current platform.
pub fn default_binary() -> &'static str {
    if cfg!(windows) {
        "gswin64c"
    } else {
        "gs"
    }
}

/// Result of running an external program to completion.
#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    pub success: bool,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

/// Narrow capability for running an external program.
#[async_trait]
pub trait ToolRunner: Send + Sync {
    async fn run(&self, program: &str, args: &[OsString]) -> std::io::Result<ToolOutput>;
}

/// Runs programs found on the process search path.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

#[async_trait]
impl ToolRunner for SystemRunner {
    async fn run(&self, program: &str, args: &[OsString]) -> std::io::Result<ToolOutput> {
        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await?;

        Ok(ToolOutput {
            success: output.status.success(),
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Converts every glyph in a PDF to vector outlines using Ghostscript.
pub struct GhostscriptOutliner {
    binary: String,
    runner: Arc<dyn ToolRunner>,
}

impl GhostscriptOutliner {
    pub fn new(binary: Option<String>, runner: Arc<dyn ToolRunner>) -> Self {
        Self {
            binary: binary.unwrap_or_else(|| default_binary().to_string()),
            runner,
        }
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }

    /// `-o <output> -sDEVICE=pdfwrite -dNoOutputFonts <input>`
    pub fn outline_args(input: &Path, output: &Path) -> Vec<OsString> {
        vec![
            OsString::from("-o"),
            output.as_os_str().to_owned(),
            OsString::from("-sDEVICE=pdfwrite"),
            OsString::from("-dNoOutputFonts"),
            input.as_os_str().to_owned(),
        ]
    }

    /// Write an outlined copy of `input` to `output`.
    ///
    /// Waits for the process to exit. The input is not inspected; a malformed
    /// PDF shows up as a nonzero exit.
    pub async fn outline(&self, input: &Path, output: &Path) -> Result<(), ToolError> {
        let args = Self::outline_args(input, output);

        tracing::debug!(binary = %self.binary, input = %input.display(), "Invoking Ghostscript");

        let result = self.runner.run(&self.binary, &args).await.map_err(|e| {
            tracing::error!(
                binary = %self.binary,
                error = %e,
                "Ghostscript could not be started; ensure it is installed and on PATH"
            );
            ToolError::Spawn(e)
        })?;

        if !result.success {
            tracing::error!(
                binary = %self.binary,
                exit_code = ?result.exit_code,
                stderr = %result.stderr.trim(),
                "Ghostscript exited with failure"
            );
            return Err(ToolError::Exit {
                code: result.exit_code,
                stderr: result.stderr,
            });
        }

        if !tokio::fs::try_exists(output).await.unwrap_or(false) {
            tracing::error!(output = %output.display(), "Ghostscript reported success but wrote no output");
            return Err(ToolError::MissingOutput);
        }

        Ok(())
    }

    /// Outline a staged upload into a new artifact of the same request.
    pub async fn outline_staged(
        &self,
        staged: &mut StagedRequest,
    ) -> Result<ConvertedArtifact, ConversionError> {
        let output = staged.artifact_path("_outlined.pdf");
        self.outline(staged.upload().path(), &output)
            .await
            .map_err(|e| ConversionError::ToolInvocation(e.to_string()))?;

        tracing::info!(token = %staged.token(), "PDF outlined");

        Ok(ConvertedArtifact {
            path: output,
            filename: OUTLINED_FILENAME,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("failed to start tool: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("tool exited with code {code:?}: {stderr}")]
    Exit { code: Option<i32>, stderr: String },

    #[error("tool produced no output file")]
    MissingOutput,
}
