use crate::error::{DecodeError, VisionError, VisionResult};
use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine as _;
use image::{DynamicImage, ImageFormat, RgbImage};
use std::io::Cursor;
use tracing::debug;

// Browsers and phone uploads are inconsistent about trailing `=`.
const PAYLOAD_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Strips a `data:<mime>;base64,` prefix (everything up to the first comma).
pub fn strip_data_uri(encoded: &str) -> &str {
    match encoded.split_once(',') {
        Some((_, payload)) => payload,
        None => encoded,
    }
}

pub fn decode_base64_bytes(encoded: &str) -> Result<Vec<u8>, DecodeError> {
    let payload: String = strip_data_uri(encoded)
        .chars()
        .filter(|ch| !ch.is_ascii_whitespace())
        .collect();
    if payload.is_empty() {
        return Err(DecodeError::Empty);
    }
    PAYLOAD_ENGINE
        .decode(payload.as_bytes())
        .map_err(|err| DecodeError::Base64(err.to_string()))
}

pub fn decode_image_bytes(bytes: &[u8]) -> Result<RgbImage, DecodeError> {
    if bytes.is_empty() {
        return Err(DecodeError::Empty);
    }
    let image = image::load_from_memory(bytes).map_err(|err| DecodeError::Image(err.to_string()))?;
    let rgb = image.to_rgb8();
    if rgb.width() == 0 || rgb.height() == 0 {
        return Err(DecodeError::Image("image has no pixels".to_string()));
    }
    Ok(rgb)
}

/// Decodes a base64 (optionally data-URI prefixed) image into an RGB raster.
pub fn decode_base64_image(encoded: &str) -> Result<RgbImage, DecodeError> {
    let bytes = decode_base64_bytes(encoded)?;
    let image = decode_image_bytes(&bytes)?;
    debug!(
        bytes = bytes.len(),
        width = image.width(),
        height = image.height(),
        "decoded sketch image"
    );
    Ok(image)
}

/// Encodes a raster as `data:image/png;base64,...`.
pub fn encode_image_to_base64(image: &DynamicImage) -> VisionResult<String> {
    let mut buffer = Cursor::new(Vec::new());
    image
        .write_to(&mut buffer, ImageFormat::Png)
        .map_err(|err| VisionError::Encode(err.to_string()))?;
    let encoded = PAYLOAD_ENGINE.encode(buffer.into_inner());
    Ok(format!("data:image/png;base64,{encoded}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn sample_png() -> DynamicImage {
        let mut img = RgbImage::from_pixel(12, 8, Rgb([255, 255, 255]));
        img.put_pixel(3, 4, Rgb([0, 0, 0]));
        DynamicImage::ImageRgb8(img)
    }

    #[test]
    fn strips_data_uri_prefix() {
        assert_eq!(strip_data_uri("data:image/png;base64,AAAA"), "AAAA");
        assert_eq!(strip_data_uri("AAAA"), "AAAA");
    }

    #[test]
    fn decodes_with_and_without_prefix() {
        let encoded = encode_image_to_base64(&sample_png()).unwrap();
        assert!(encoded.starts_with("data:image/png;base64,"));

        let with_prefix = decode_base64_image(&encoded).unwrap();
        let without_prefix = decode_base64_image(strip_data_uri(&encoded)).unwrap();
        assert_eq!(with_prefix.dimensions(), (12, 8));
        assert_eq!(with_prefix, without_prefix);
        assert_eq!(with_prefix.get_pixel(3, 4), &Rgb([0, 0, 0]));
    }

    #[test]
    fn rejects_invalid_base64() {
        let err = decode_base64_image("not-base64!!").unwrap_err();
        assert!(matches!(err, DecodeError::Base64(_)));
    }

    #[test]
    fn rejects_non_image_bytes() {
        let payload = PAYLOAD_ENGINE.encode(b"definitely not a png file");
        let err = decode_base64_image(&payload).unwrap_err();
        assert!(matches!(err, DecodeError::Image(_)));
    }

    #[test]
    fn rejects_empty_payload() {
        assert_eq!(
            decode_base64_image("data:image/png;base64,").unwrap_err(),
            DecodeError::Empty
        );
    }
}
