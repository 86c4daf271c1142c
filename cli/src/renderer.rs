//! Subprocess renderer adapter.
//!
//! Drives an external rendering command that reads HTML on stdin and writes
//! PDF to stdout, e.g. `wkhtmltopdf - -`. The library never retries a
//! renderer, so a deterministic content error surfaces once per document.

use std::io::Write;
use std::process::{Command, Stdio};

use topdf::{PdfRenderer, RenderError};

/// Renderer backed by an external command.
pub struct CommandRenderer {
    program: String,
    args: Vec<String>,
}

impl CommandRenderer {
    /// Parse a whitespace-separated command line into a renderer.
    pub fn new(command_line: &str) -> Result<Self, RenderError> {
        let mut parts = command_line.split_whitespace();
        let program = parts
            .next()
            .ok_or_else(|| RenderError::new("renderer command is empty"))?
            .to_string();
        Ok(Self {
            program,
            args: parts.map(String::from).collect(),
        })
    }

    /// The program this renderer invokes.
    pub fn program(&self) -> &str {
        &self.program
    }
}

impl PdfRenderer for CommandRenderer {
    fn render(&self, html: &[u8], _base_url: &str) -> Result<Vec<u8>, RenderError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| RenderError::new(format!("failed to start {}: {}", self.program, e)))?;

        // Take stdin so it closes once the document is written; the child
        // will not see EOF otherwise.
        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| RenderError::new("renderer stdin unavailable"))?;
        stdin
            .write_all(html)
            .map_err(|e| RenderError::new(format!("failed to feed {}: {}", self.program, e)))?;
        drop(stdin);

        let output = child
            .wait_with_output()
            .map_err(|e| RenderError::new(format!("{} did not finish: {}", self.program, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(RenderError::new(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }
        if output.stdout.is_empty() {
            return Err(RenderError::new(format!(
                "{} produced no output",
                self.program
            )));
        }

        Ok(output.stdout)
    }
}
