use std::time::Duration;

pub const DEFAULT_TARGET_SIZE: u32 = 60;
pub const DEFAULT_QUALITY: u8 = 50;
pub const MIN_QUALITY: u8 = 1;
pub const MAX_QUALITY: u8 = 100;

/// Hard cap on how long a single external tool invocation may run.
pub const TOOL_TIMEOUT: Duration = Duration::from_secs(30);

/// avifenc speed setting (0 = slowest/best, 10 = fastest).
pub const AVIF_ENCODER_SPEED: u8 = 6;

/// cwebp degradation path uses a higher quality than AVIF to stay
/// visually comparable at emoji sizes.
pub const WEBP_QUALITY_BOOST: u8 = 30;

/// cwebp compression method (-m), 0-6.
pub const WEBP_METHOD: u8 = 6;

pub const SUPPORTED_IMAGE_EXTENSIONS: &[&str] =
    &["jpg", "jpeg", "png", "webp", "avif", "gif"];
