// Lossless export of a composited raster: PNG bytes, and a timestamped file.

use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use image::ImageFormat;
use log::info;

use crate::error::Error;
use crate::stroke::to_rgba_image;
use crate::types::FrameBuffer;

/// Encode the raster as PNG.
pub fn encode_png(raster: &FrameBuffer) -> Result<Vec<u8>, Error> {
    if raster.is_empty() {
        return Err(Error::Export("nothing to encode: empty raster".into()));
    }
    let mut bytes = Vec::new();
    to_rgba_image(raster)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(|e| Error::Export(format!("PNG encode: {e}")))?;
    Ok(bytes)
}

/// `sketch-<unix millis>.png`
pub fn export_file_name(at: SystemTime) -> String {
    let millis = at.duration_since(UNIX_EPOCH).map(|d| d.as_millis()).unwrap_or(0);
    format!("sketch-{millis}.png")
}

/// Write already-encoded PNG bytes into `dir` under a timestamped name.
pub fn save_png(bytes: &[u8], dir: &Path) -> Result<PathBuf, Error> {
    fs::create_dir_all(dir)?;
    let path = dir.join(export_file_name(SystemTime::now()));
    fs::write(&path, bytes)?;
    info!("saved {} ({} bytes)", path.display(), bytes.len());
    Ok(path)
}
