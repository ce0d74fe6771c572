//! I/O helpers: grayscale image load/save, HTTP frame download, JSON.

use crate::error::{ReaderError, Result};
use crate::frame::Frame;
use image::GrayImage;
use log::{debug, info};
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Load an image file and convert to 8-bit grayscale.
pub fn load_grayscale(path: &Path) -> Result<Frame> {
    let img = image::open(path)?.into_luma8();
    let (w, h) = (img.width() as usize, img.height() as usize);
    debug!("loaded {} ({w}x{h})", path.display());
    Frame::from_raw(w, h, img.into_raw())
        .ok_or_else(|| ReaderError::ImageUnavailable(format!("bad buffer for {}", path.display())))
}

/// Fetch an image over HTTP and convert to 8-bit grayscale. Any transport
/// or decode failure is `ImageUnavailable`: fatal for this cycle, retried
/// only by the next polling interval.
pub fn fetch_grayscale(client: &reqwest::blocking::Client, url: &str) -> Result<Frame> {
    info!("downloading frame from {url}");
    let fetch = || -> std::result::Result<Vec<u8>, String> {
        let response = client.get(url).send().map_err(|e| e.to_string())?;
        let response = response.error_for_status().map_err(|e| e.to_string())?;
        response
            .bytes()
            .map(|b| b.to_vec())
            .map_err(|e| e.to_string())
    };
    let bytes = fetch().map_err(|e| ReaderError::ImageUnavailable(format!("{url}: {e}")))?;
    let img = image::load_from_memory(&bytes)
        .map_err(|e| ReaderError::ImageUnavailable(format!("{url}: {e}")))?
        .into_luma8();
    let (w, h) = (img.width() as usize, img.height() as usize);
    Frame::from_raw(w, h, img.into_raw())
        .ok_or_else(|| ReaderError::ImageUnavailable(format!("bad buffer from {url}")))
}

/// Save a frame as a grayscale PNG, creating parent directories.
pub fn save_grayscale(frame: &Frame, path: &Path) -> Result<()> {
    ensure_parent_dir(path)?;
    let img = GrayImage::from_raw(frame.w as u32, frame.h as u32, frame.data.clone())
        .ok_or_else(|| ReaderError::ImageUnavailable("frame buffer mismatch".into()))?;
    img.save(path)?;
    Ok(())
}

/// Serialize a value as pretty JSON to `path`, creating parent directories.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    ensure_parent_dir(path)?;
    let json = serde_json::to_string_pretty(value).map_err(|e| ReaderError::json(path, e))?;
    fs::write(path, json).map_err(|e| ReaderError::io(path, e))
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| ReaderError::io(parent, e))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn png_round_trip_preserves_pixels() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/frame.png");
        let mut frame = Frame::new(17, 9);
        for (i, px) in frame.data.iter_mut().enumerate() {
            *px = (i * 7 % 256) as u8;
        }
        save_grayscale(&frame, &path).unwrap();
        let loaded = load_grayscale(&path).unwrap();
        assert_eq!(loaded, frame);
    }
}
