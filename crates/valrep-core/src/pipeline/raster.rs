//! Page rasterization with poppler's `pdftoppm`.

use std::path::{Path, PathBuf};
use std::process::Command;

use image::DynamicImage;
use tracing::{debug, info};

use super::PageRasterizer;
use crate::error::RasterError;
use crate::models::config::RasterConfig;

const PDFTOPPM: &str = "pdftoppm";
const PAGE_PREFIX: &str = "page";

/// Raster inputs that are loaded directly as a single page.
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "tif", "tiff", "bmp"];

/// Renders PDF pages through `pdftoppm` and loads image files directly.
#[derive(Debug, Clone)]
pub struct PdftoppmRasterizer {
    config: RasterConfig,
}

impl PdftoppmRasterizer {
    pub fn new(config: RasterConfig) -> Self {
        Self { config }
    }

    /// Locate `pdftoppm` in the configured poppler directory, else on `PATH`.
    pub fn locate_tool(&self) -> Result<PathBuf, RasterError> {
        let found = match &self.config.poppler_dir {
            Some(dir) => which::which_in(PDFTOPPM, Some(dir), dir),
            None => which::which(PDFTOPPM),
        };
        found.map_err(|e| RasterError::ToolNotFound(format!("{}: {}", PDFTOPPM, e)))
    }

    fn render_pdf(&self, path: &Path) -> Result<Vec<DynamicImage>, RasterError> {
        let tool = self.locate_tool()?;
        let out_dir = tempfile::tempdir()?;
        let prefix = out_dir.path().join(PAGE_PREFIX);

        let mut command = Command::new(&tool);
        command.arg("-r").arg(self.config.dpi.to_string()).arg("-png");
        if self.config.max_pages > 0 {
            command.arg("-l").arg(self.config.max_pages.to_string());
        }
        command.arg(path).arg(&prefix);

        debug!("Running {} on {}", tool.display(), path.display());
        let output = command.output()?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(RasterError::ToolFailed(format!(
                "{} exited with {}: {}",
                PDFTOPPM,
                output.status,
                stderr.trim()
            )));
        }

        let mut pages: Vec<(usize, PathBuf)> = std::fs::read_dir(out_dir.path())?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter_map(|p| page_number(&p).map(|n| (n, p)))
            .collect();
        pages.sort_by_key(|(n, _)| *n);

        let images = pages
            .iter()
            .map(|(_, p)| image::open(p))
            .collect::<Result<Vec<_>, _>>()?;

        info!(
            "Rendered {} pages from {} at {} DPI",
            images.len(),
            path.display(),
            self.config.dpi
        );
        Ok(images)
    }
}

impl PageRasterizer for PdftoppmRasterizer {
    fn rasterize(&self, path: &Path) -> Result<Vec<DynamicImage>, RasterError> {
        match extension(path).as_deref() {
            Some("pdf") => self.render_pdf(path),
            Some(ext) if IMAGE_EXTENSIONS.contains(&ext) => Ok(vec![image::open(path)?]),
            other => Err(RasterError::UnsupportedFormat(
                other.unwrap_or("<none>").to_string(),
            )),
        }
    }
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

/// Page number of a `pdftoppm` output file such as `page-03.png`.
fn page_number(path: &Path) -> Option<usize> {
    if extension(path).as_deref() != Some("png") {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    let (prefix, number) = stem.rsplit_once('-')?;
    if prefix != PAGE_PREFIX {
        return None;
    }
    number.parse().ok()
}
