/// Content-based image format detection.
///
/// Input files are classified by magic bytes, never by extension alone:
/// sticker packs scraped from chat platforms routinely carry WebP data
/// behind a `.png` name and vice versa.
use std::fmt;

const PNG_SIGNATURE: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
const JPEG_SOI: &[u8] = &[0xFF, 0xD8, 0xFF];

/// Image format as determined from file content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SniffedFormat {
    Png,
    Jpeg,
    WebP,
    Avif,
    Unknown,
}

impl SniffedFormat {
    pub fn name(&self) -> &'static str {
        match self {
            SniffedFormat::Png => "PNG",
            SniffedFormat::Jpeg => "JPEG",
            SniffedFormat::WebP => "WebP",
            SniffedFormat::Avif => "AVIF",
            SniffedFormat::Unknown => "unknown",
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, SniffedFormat::Unknown)
    }
}

impl fmt::Display for SniffedFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Classify raw file bytes by signature. Returns `Unknown` when no
/// signature matches; callers must not feed `Unknown` inputs into the
/// conversion pipeline.
pub fn detect_format(bytes: &[u8]) -> SniffedFormat {
    if bytes.starts_with(PNG_SIGNATURE) {
        return SniffedFormat::Png;
    }
    if bytes.starts_with(JPEG_SOI) {
        return SniffedFormat::Jpeg;
    }
    if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        return SniffedFormat::WebP;
    }
    if is_avif(bytes) {
        return SniffedFormat::Avif;
    }
    SniffedFormat::Unknown
}

/// ISOBMFF check: an `ftyp` box whose major brand or compatible brands
/// include `avif`/`avis`.
fn is_avif(bytes: &[u8]) -> bool {
    if bytes.len() < 12 || &bytes[4..8] != b"ftyp" {
        return false;
    }

    // A size of 0 means the box extends to the end of the file; sizes
    // below the 8-byte header are corrupt.
    let box_size = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize;
    let box_size = if box_size == 0 { bytes.len() } else { box_size };
    let scan_end = box_size.min(bytes.len()).min(64);
    if scan_end <= 8 {
        return false;
    }

    bytes[8..scan_end]
        .chunks_exact(4)
        .any(|brand| brand == b"avif" || brand == b"avis")
}

/// Whether the image carries an alpha channel that a conversion chain
/// must preserve.
///
/// PNG: IHDR color type with alpha, or a tRNS chunk. WebP: VP8X alpha
/// flag, or the VP8L bitstream alpha bit. AVIF: assumed transparent
/// (detecting the alpha auxiliary item would need a full box parse, and
/// over-preserving costs nothing). JPEG has no alpha channel.
pub fn has_alpha(bytes: &[u8], format: SniffedFormat) -> bool {
    match format {
        SniffedFormat::Png => png_has_alpha(bytes),
        SniffedFormat::WebP => webp_has_alpha(bytes),
        SniffedFormat::Avif => true,
        SniffedFormat::Jpeg | SniffedFormat::Unknown => false,
    }
}

fn png_has_alpha(bytes: &[u8]) -> bool {
    // IHDR payload starts at offset 16; color type is its 10th byte.
    if bytes.len() < 26 || &bytes[12..16] != b"IHDR" {
        return false;
    }
    let color_type = bytes[25];
    if color_type == 4 || color_type == 6 {
        return true;
    }

    // Indexed and truecolor PNGs can still be transparent via tRNS.
    let mut pos = 8;
    while pos + 8 <= bytes.len() {
        let len =
            u32::from_be_bytes([bytes[pos], bytes[pos + 1], bytes[pos + 2], bytes[pos + 3]])
                as usize;
        let chunk_type = &bytes[pos + 4..pos + 8];
        if chunk_type == b"tRNS" {
            return true;
        }
        if chunk_type == b"IDAT" || chunk_type == b"IEND" {
            break;
        }
        pos = pos.saturating_add(12).saturating_add(len);
    }
    false
}

fn webp_has_alpha(bytes: &[u8]) -> bool {
    if bytes.len() < 16 {
        return false;
    }
    match &bytes[12..16] {
        // Extended container: alpha flag is bit 4 of the feature byte.
        b"VP8X" => bytes.len() > 20 && bytes[20] & 0x10 != 0,
        // Lossless bitstream: 1-byte 0x2F signature, then 14+14 bits of
        // dimensions followed by the alpha_is_used bit.
        b"VP8L" => bytes.len() > 24 && bytes[20] == 0x2F && (bytes[24] >> 4) & 1 == 1,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat};
    use std::io::Cursor;

    fn encode(img: &DynamicImage, format: ImageFormat) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, format).unwrap();
        buf.into_inner()
    }

    #[test]
    fn test_detect_png() {
        let bytes = encode(&DynamicImage::new_rgb8(4, 4), ImageFormat::Png);
        assert_eq!(detect_format(&bytes), SniffedFormat::Png);
    }

    #[test]
    fn test_detect_jpeg() {
        let bytes = encode(&DynamicImage::new_rgb8(4, 4), ImageFormat::Jpeg);
        assert_eq!(detect_format(&bytes), SniffedFormat::Jpeg);
    }

    #[test]
    fn test_detect_webp() {
        let bytes = encode(&DynamicImage::new_rgb8(4, 4), ImageFormat::WebP);
        assert_eq!(detect_format(&bytes), SniffedFormat::WebP);
    }

    #[test]
    fn test_detect_avif_major_brand() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&20u32.to_be_bytes());
        bytes.extend_from_slice(b"ftyp");
        bytes.extend_from_slice(b"avif");
        bytes.extend_from_slice(&0u32.to_be_bytes()); // minor version
        bytes.extend_from_slice(b"mif1");
        assert_eq!(detect_format(&bytes), SniffedFormat::Avif);
    }

    #[test]
    fn test_detect_avif_compatible_brand() {
        // mif1 major brand, avif only listed as compatible
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&24u32.to_be_bytes());
        bytes.extend_from_slice(b"ftyp");
        bytes.extend_from_slice(b"mif1");
        bytes.extend_from_slice(&0u32.to_be_bytes());
        bytes.extend_from_slice(b"mif1");
        bytes.extend_from_slice(b"avif");
        assert_eq!(detect_format(&bytes), SniffedFormat::Avif);
    }

    #[test]
    fn test_detect_avif_zero_size_ftyp_box() {
        // Size 0 means the box runs to the end of the file.
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&0u32.to_be_bytes());
        bytes.extend_from_slice(b"ftyp");
        bytes.extend_from_slice(b"avif");
        assert_eq!(detect_format(&bytes), SniffedFormat::Avif);
    }

    #[test]
    fn test_detect_undersized_ftyp_box_is_unknown() {
        // A size field smaller than the box header is corrupt and must
        // classify as Unknown, not blow up the scan.
        for size in [1u32, 3, 7, 8] {
            let mut bytes = Vec::new();
            bytes.extend_from_slice(&size.to_be_bytes());
            bytes.extend_from_slice(b"ftyp");
            bytes.extend_from_slice(b"avif");
            assert_eq!(detect_format(&bytes), SniffedFormat::Unknown);
        }
    }

    #[test]
    fn test_detect_unknown_garbage() {
        assert_eq!(detect_format(b"this is not an image"), SniffedFormat::Unknown);
        assert_eq!(detect_format(&[]), SniffedFormat::Unknown);
        assert_eq!(detect_format(&[0x89]), SniffedFormat::Unknown);
    }

    #[test]
    fn test_detect_heic_is_not_avif() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&20u32.to_be_bytes());
        bytes.extend_from_slice(b"ftyp");
        bytes.extend_from_slice(b"heic");
        bytes.extend_from_slice(&0u32.to_be_bytes());
        bytes.extend_from_slice(b"mif1");
        assert_eq!(detect_format(&bytes), SniffedFormat::Unknown);
    }

    #[test]
    fn test_detection_ignores_extension() {
        // Classification is a pure function of bytes; a PNG renamed to
        // .jpg is still a PNG.
        let bytes = encode(&DynamicImage::new_rgb8(4, 4), ImageFormat::Png);
        assert_eq!(detect_format(&bytes), SniffedFormat::Png);
        assert_ne!(detect_format(&bytes), SniffedFormat::Jpeg);
    }

    #[test]
    fn test_png_alpha_rgba() {
        let bytes = encode(&DynamicImage::new_rgba8(4, 4), ImageFormat::Png);
        assert_eq!(detect_format(&bytes), SniffedFormat::Png);
        assert!(has_alpha(&bytes, SniffedFormat::Png));
    }

    #[test]
    fn test_png_no_alpha_rgb() {
        let bytes = encode(&DynamicImage::new_rgb8(4, 4), ImageFormat::Png);
        assert!(!has_alpha(&bytes, SniffedFormat::Png));
    }

    #[test]
    fn test_webp_vp8x_alpha_flag() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"RIFF");
        bytes.extend_from_slice(&30u32.to_le_bytes());
        bytes.extend_from_slice(b"WEBP");
        bytes.extend_from_slice(b"VP8X");
        bytes.extend_from_slice(&10u32.to_le_bytes());
        bytes.push(0x10); // feature flags: alpha set
        bytes.extend_from_slice(&[0; 9]);
        assert_eq!(detect_format(&bytes), SniffedFormat::WebP);
        assert!(has_alpha(&bytes, SniffedFormat::WebP));

        bytes[20] = 0x00; // alpha cleared
        assert!(!has_alpha(&bytes, SniffedFormat::WebP));
    }

    #[test]
    fn test_webp_lossy_no_alpha() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"RIFF");
        bytes.extend_from_slice(&20u32.to_le_bytes());
        bytes.extend_from_slice(b"WEBP");
        bytes.extend_from_slice(b"VP8 ");
        bytes.extend_from_slice(&[0; 12]);
        assert_eq!(detect_format(&bytes), SniffedFormat::WebP);
        assert!(!has_alpha(&bytes, SniffedFormat::WebP));
    }

    #[test]
    fn test_jpeg_never_has_alpha() {
        let bytes = encode(&DynamicImage::new_rgb8(4, 4), ImageFormat::Jpeg);
        assert!(!has_alpha(&bytes, SniffedFormat::Jpeg));
    }

    #[test]
    fn test_avif_assumed_transparent() {
        assert!(has_alpha(&[], SniffedFormat::Avif));
    }

    #[test]
    fn test_format_display() {
        assert_eq!(SniffedFormat::Png.to_string(), "PNG");
        assert_eq!(SniffedFormat::WebP.to_string(), "WebP");
        assert_eq!(SniffedFormat::Unknown.to_string(), "unknown");
        assert!(SniffedFormat::Avif.is_known());
        assert!(!SniffedFormat::Unknown.is_known());
    }
}
