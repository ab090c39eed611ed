//! External diagram rendering.

use super::diagram::MermaidDiagram;
use crate::config::{DiagramConfig, ImageFormat};
use crate::error::{RenderError, RenderResult};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Turns diagram source into an image file
pub trait DiagramRenderer {
    fn render(&self, source: &str, output: &Path, format: ImageFormat) -> RenderResult<()>;
}

/// Renders through the Mermaid command line tool
#[derive(Debug, Clone)]
pub struct MermaidCli {
    program: String,
}

impl MermaidCli {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn from_config(config: &DiagramConfig) -> Self {
        Self::new(config.renderer.clone())
    }
}

impl DiagramRenderer for MermaidCli {
    fn render(&self, source: &str, output: &Path, format: ImageFormat) -> RenderResult<()> {
        let mut input = tempfile::Builder::new().suffix(".mmd").tempfile()?;
        input.write_all(source.as_bytes())?;
        input.flush()?;

        let result = Command::new(&self.program)
            .arg("-i")
            .arg(input.path())
            .arg("-o")
            .arg(output)
            .args(["-e", format.extension()])
            .output()
            .map_err(|e| RenderError::SpawnFailed {
                program: self.program.clone(),
                message: e.to_string(),
            })?;

        if !result.status.success() {
            return Err(RenderError::Failed {
                code: result.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&result.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}

/// Render every diagram into `images_dir`, returning the written paths
pub fn render_all(
    renderer: &dyn DiagramRenderer,
    diagrams: &[MermaidDiagram],
    images_dir: &Path,
    format: ImageFormat,
) -> RenderResult<Vec<PathBuf>> {
    std::fs::create_dir_all(images_dir)?;
    let mut written = Vec::with_capacity(diagrams.len());
    for diagram in diagrams {
        let output = images_dir.join(diagram.image_file(format));
        tracing::info!("Rendering {}", output.display());
        renderer.render(&diagram.source, &output, format)?;
        written.push(output);
    }
    Ok(written)
}
