//! Frame decoding. Frames may be BMP, PNG or binary PGM/PPM files, optionally gzipped; the
//! format is detected from the file contents.

use std::path::Path;

use image::RgbImage;

use crate::errors::VqalignError;
use crate::io::read_all;

/// Decode a frame held in memory as an 8-bit RGB image. Greyscale frames are expanded to
/// three equal channels.
pub fn decode_frame(data: &[u8]) -> Result<RgbImage, String> {
    let image = image::load_from_memory(data)
        .map_err(|e| e.to_string())?;

    if image.width() == 0 || image.height() == 0 {
        return Err(format!("invalid dimensions {}x{}", image.width(), image.height()));
    }

    Ok(image.to_rgb8())
}

/// Load a (possibly gzipped) frame file
pub fn load_frame(path: &Path) -> Result<RgbImage, VqalignError> {
    let data = read_all(path)?;

    decode_frame(&data)
        .map_err(|reason| VqalignError::InvalidFrame {
            path: path.to_path_buf(),
            reason,
        })
}
