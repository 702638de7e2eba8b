use image::{DynamicImage, Rgba, RgbaImage};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub fn create_temp_directory() -> TempDir {
    TempDir::new().unwrap()
}

/// Opaque RGB PNG of the given dimensions.
pub fn create_opaque_png(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    let path = dir.join(name);
    DynamicImage::new_rgb8(width, height)
        .save_with_format(&path, image::ImageFormat::Png)
        .unwrap();
    path
}

/// Transparent RGBA WebP (lossless) of the given dimensions.
pub fn create_transparent_webp(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    let path = dir.join(name);
    let mut img = RgbaImage::new(width, height);
    for (x, _, pixel) in img.enumerate_pixels_mut() {
        // Left half opaque red, right half fully transparent.
        *pixel = if x < width / 2 {
            Rgba([255, 0, 0, 255])
        } else {
            Rgba([0, 0, 0, 0])
        };
    }
    DynamicImage::ImageRgba8(img)
        .save_with_format(&path, image::ImageFormat::WebP)
        .unwrap();
    path
}

pub fn create_jpeg(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    let path = dir.join(name);
    DynamicImage::new_rgb8(width, height)
        .save_with_format(&path, image::ImageFormat::Jpeg)
        .unwrap();
    path
}

/// A file with an image extension but garbage content.
pub fn create_corrupt_image(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    File::create(&path)
        .unwrap()
        .write_all(b"definitely not image data")
        .unwrap();
    path
}
