use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use image::codecs::png::PngEncoder;
use image::ImageEncoder;

use crate::error::{Error, Result};

use super::Raster;

pub fn encode_png(raster: &Raster) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    PngEncoder::new(&mut buf)
        .write_image(raster.pixels(), raster.width(), raster.height(), image::ExtendedColorType::Rgb8)
        .map_err(|e| Error::Image(e.to_string()))?;
    Ok(buf)
}

pub fn write_png(raster: &Raster, path: &Path) -> Result<()> {
    let png = encode_png(raster)?;
    fs::write(path, png).map_err(|e| Error::Io(format!("{}: {e}", path.display())))?;
    tracing::debug!(path = %path.display(), width = raster.width(), height = raster.height(), "Wrote image");
    Ok(())
}

/// Assembles numbered frames into a video with an external encoder
#[derive(Debug, Clone)]
pub struct VideoEncoder {
    program: PathBuf,
}

impl Default for VideoEncoder {
    fn default() -> Self {
        Self::ffmpeg()
    }
}

impl VideoEncoder {
    /// `ffmpeg` from `PATH`
    pub fn ffmpeg() -> Self {
        Self::with_program("ffmpeg")
    }

    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self { program: program.into() }
    }

    /// One frame per second of input, 30 fps H.264 output
    pub fn args(&self, pattern: &str, out: &Path) -> Vec<String> {
        [
            "-y", "-framerate", "1", "-i", pattern, "-c:v", "libx264", "-r", "30",
        ]
        .into_iter()
        .map(String::from)
        .chain(std::iter::once(out.display().to_string()))
        .collect()
    }

    pub fn encode(&self, pattern: &str, out: &Path) -> Result<()> {
        let args = self.args(pattern, out);
        let cmdline = format!("{} {}", self.program.display(), args.join(" "));
        tracing::info!("Creating movie: {cmdline}");

        let output = Command::new(&self.program)
            .args(&args)
            .output()
            .map_err(|e| Error::Encoder(format!("{cmdline}: {e}")))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let last = stderr.lines().last().unwrap_or("");
            return Err(Error::Encoder(format!("{cmdline}: {} {last}", output.status)));
        }
        Ok(())
    }
}
