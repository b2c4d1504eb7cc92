//! Document compiler capability.
//!
//! The pipeline only needs two operations: render to a vector surface (for
//! the preview) and render to a byte document (for export). Both are assumed
//! idempotent and side-effect free on failure.

use core_model::{CompileFailure, VectorSurface};
use std::future::Future;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, trace};

pub trait DocumentCompiler: Send + Sync + 'static {
    fn render_vector(
        &self,
        source: &str,
    ) -> impl Future<Output = Result<VectorSurface, CompileFailure>> + Send;

    fn render_bytes(&self, source: &str)
    -> impl Future<Output = Result<Vec<u8>, CompileFailure>> + Send;
}

/// Compiler backed by an external program that reads the source on stdin and
/// writes its output on stdout. Non-zero exit turns stderr into the failure text.
#[derive(Debug, Clone)]
pub struct CommandCompiler {
    program: String,
    vector_args: Vec<String>,
    bytes_args: Vec<String>,
}

impl CommandCompiler {
    pub fn new<P: Into<String>>(
        program: P,
        vector_args: Vec<String>,
        bytes_args: Vec<String>,
    ) -> Self {
        Self {
            program: program.into(),
            vector_args,
            bytes_args,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    async fn run(&self, args: &[String], source: &str) -> Result<Vec<u8>, CompileFailure> {
        let mut child = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| CompileFailure::new(format!("failed to start {}: {e}", self.program)))?;

        let stdin = child.stdin.take();
        let feed = async move {
            if let Some(mut stdin) = stdin {
                // A compiler that exits early closes its end; the exit status reports why.
                if let Err(err) = stdin.write_all(source.as_bytes()).await {
                    trace!(target: "pipeline.compile", ?err, "stdin_write_failed");
                }
            }
        };
        let (_, output) = tokio::join!(feed, child.wait_with_output());
        let output = output
            .map_err(|e| CompileFailure::new(format!("{} did not finish: {e}", self.program)))?;

        if output.status.success() {
            debug!(
                target: "pipeline.compile",
                program = self.program.as_str(),
                size_bytes = output.stdout.len(),
                "external_compile_ok"
            );
            return Ok(output.stdout);
        }
        let stderr = String::from_utf8_lossy(&output.stderr);
        let message = stderr.trim();
        if message.is_empty() {
            Err(CompileFailure::new(format!(
                "{} exited with {}",
                self.program, output.status
            )))
        } else {
            Err(CompileFailure::new(message))
        }
    }
}

impl DocumentCompiler for CommandCompiler {
    async fn render_vector(&self, source: &str) -> Result<VectorSurface, CompileFailure> {
        let bytes = self.run(&self.vector_args, source).await?;
        let svg = String::from_utf8(bytes)
            .map_err(|e| CompileFailure::new(format!("vector output is not UTF-8: {e}")))?;
        Ok(VectorSurface::from_svg(svg))
    }

    async fn render_bytes(&self, source: &str) -> Result<Vec<u8>, CompileFailure> {
        self.run(&self.bytes_args, source).await
    }
}
