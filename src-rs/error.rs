use thiserror::Error;

/// The single failure kind surfaced by the decoder boundary.
///
/// Lower-level `base64` and `image` errors are flattened into their display
/// string so callers never need to depend on either crate's error types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("image payload is empty")]
    Empty,
    #[error("invalid base64 payload: {0}")]
    Base64(String),
    #[error("unrecognized image bytes: {0}")]
    Image(String),
}

#[derive(Debug, Error)]
pub enum VisionError {
    #[error("could not decode image: {0}")]
    Decode(#[from] DecodeError),
    #[error("invalid raster at {stage}: {width}x{height}")]
    InvalidRaster {
        stage: &'static str,
        width: u32,
        height: u32,
    },
    #[error("could not encode debug image: {0}")]
    Encode(String),
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl VisionError {
    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Decode(_))
    }
}

pub type VisionResult<T> = std::result::Result<T, VisionError>;

/// Fail fast on zero-sized rasters before any stage divides by a dimension.
pub(crate) fn ensure_non_empty(stage: &'static str, width: u32, height: u32) -> VisionResult<()> {
    if width == 0 || height == 0 {
        return Err(VisionError::InvalidRaster {
            stage,
            width,
            height,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_sized_raster_is_rejected() {
        let err = ensure_non_empty("classify", 0, 10).unwrap_err();
        assert!(matches!(
            err,
            VisionError::InvalidRaster {
                stage: "classify",
                width: 0,
                height: 10
            }
        ));
        assert!(ensure_non_empty("classify", 1, 1).is_ok());
    }

    #[test]
    fn decode_errors_convert_into_vision_error() {
        let err: VisionError = DecodeError::Empty.into();
        assert!(err.is_decode());
        assert_eq!(err.to_string(), "could not decode image: image payload is empty");
    }
}
