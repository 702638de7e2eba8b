use crate::detect::{detect_format, has_alpha};
use crate::error::{CompressionError, Result};
use image::{GenericImageView, ImageReader};
use std::fs;
use std::path::Path;

/// Print what the detector and library can tell about one file:
/// the sniffed format (which may disagree with the extension), the
/// transparency flag, and basic geometry.
pub fn print_image_info(input_path: &Path) -> Result<()> {
    if !input_path.exists() {
        return Err(CompressionError::FileNotFound(input_path.to_path_buf()));
    }

    let bytes = fs::read(input_path)?;
    let format = detect_format(&bytes);
    let alpha = has_alpha(&bytes, format);

    println!("📊 Analyzing image: {:?}", input_path);
    println!("📋 Detection:");
    println!("  🎭 Detected format: {}", format);
    let extension = input_path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("(none)");
    println!("  📎 Extension: .{}", extension);
    if format.is_known() && !extension.eq_ignore_ascii_case(format.name()) {
        let matches = match format.name() {
            "JPEG" => extension.eq_ignore_ascii_case("jpg") || extension.eq_ignore_ascii_case("jpeg"),
            name => extension.eq_ignore_ascii_case(name),
        };
        if !matches {
            println!("  ⚠️  Extension does not match the actual content");
        }
    }
    println!("  🎨 Transparency: {}", if alpha { "yes" } else { "no" });
    println!("  📦 File size: {} bytes", bytes.len());

    // Geometry needs a full decode and not every format is decodable
    // by the library (AVIF in particular); report what we can.
    match ImageReader::open(input_path)?.with_guessed_format()?.decode() {
        Ok(img) => {
            let (width, height) = img.dimensions();
            println!("  📏 Dimensions: {}x{} pixels", width, height);
            println!("  🎨 Color type: {:?}", img.color());
        }
        Err(_) => {
            println!("  📏 Dimensions: not decodable by the image library");
        }
    }

    if !format.is_known() {
        println!("\n⚠️  Unknown format; this file would be skipped by compression");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::DynamicImage;
    use tempfile::TempDir;

    #[test]
    fn test_info_missing_file() {
        let result = print_image_info(Path::new("/nonexistent/file.png"));
        assert!(matches!(result, Err(CompressionError::FileNotFound(_))));
    }

    #[test]
    fn test_info_valid_png() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.png");
        DynamicImage::new_rgba8(10, 10)
            .save_with_format(&path, image::ImageFormat::Png)
            .unwrap();
        print_image_info(&path).unwrap();
    }

    #[test]
    fn test_info_garbage_file_does_not_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("junk.png");
        fs::write(&path, b"junk").unwrap();
        print_image_info(&path).unwrap();
    }
}
