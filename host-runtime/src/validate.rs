//! Program image validation
//!
//! A pure gate in front of the interpreter: nothing that fails these checks
//! is ever handed to task creation. Checks run cheapest-first and
//! short-circuit; the header comparison comes last because the bounds
//! checks guarantee offsets 0..=3 exist. Bytes past offset 3 are never
//! inspected here; deeper structural validation is the interpreter's job.

use thiserror::Error;

use crate::{config::HostConfig, error::exit_code};

/// Reasons a program image is rejected before execution
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ImageError {
    /// No image was supplied
    #[error("program image is null")]
    Null,

    /// Image is shorter than the configured minimum
    #[error("program image too small: {len} bytes (minimum {min})")]
    TooSmall {
        /// Offending image length
        len: usize,
        /// Configured minimum length
        min: usize,
    },

    /// Image is longer than the configured maximum
    #[error("program image too large: {len} bytes (maximum {max})")]
    TooLarge {
        /// Offending image length
        len: usize,
        /// Configured maximum length
        max: usize,
    },

    /// Image header does not start with the expected magic tag
    #[error("bad image header: expected {:?}, found {:?}",
        String::from_utf8_lossy(.expected), String::from_utf8_lossy(.found))]
    BadHeader {
        /// Expected magic tag
        expected: [u8; 4],
        /// Bytes actually found at offset 0
        found: [u8; 4],
    },
}

impl ImageError {
    /// The public exit code reported for this rejection
    pub fn exit_code(&self) -> i32 {
        match self {
            ImageError::Null => exit_code::NULL_IMAGE,
            ImageError::TooSmall { .. } => exit_code::TOO_SMALL,
            ImageError::TooLarge { .. } => exit_code::TOO_LARGE,
            ImageError::BadHeader { .. } => exit_code::BAD_HEADER,
        }
    }
}

/// Validate a program image against the configured bounds
///
/// Returns the image slice on success so callers cannot accidentally run
/// an unvalidated image.
///
/// # Errors
/// - [`ImageError::Null`] if `image` is `None`
/// - [`ImageError::TooSmall`] / [`ImageError::TooLarge`] on length bounds
/// - [`ImageError::BadHeader`] if offsets 0..=3 differ from the magic tag
pub fn validate<'a>(image: Option<&'a [u8]>, config: &HostConfig) -> Result<&'a [u8], ImageError> {
    let image = image.ok_or(ImageError::Null)?;
    let len = image.len();
    if len < config.min_image_size {
        return Err(ImageError::TooSmall {
            len,
            min: config.min_image_size,
        });
    }
    if len > config.max_image_size {
        return Err(ImageError::TooLarge {
            len,
            max: config.max_image_size,
        });
    }
    // min_image_size >= 4 is not guaranteed by the type, so read defensively
    let Some(found) = image.first_chunk::<4>() else {
        return Err(ImageError::TooSmall {
            len,
            min: config.min_image_size.max(4),
        });
    };
    if found != &config.magic {
        return Err(ImageError::BadHeader {
            expected: config.magic,
            found: *found,
        });
    }
    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> HostConfig {
        HostConfig::default()
    }

    fn valid_image() -> Vec<u8> {
        let mut image = b"RITE".to_vec();
        image.extend_from_slice(&[0, 0, 0, 1]);
        image
    }

    #[test]
    fn test_null_image() {
        let err = validate(None, &config()).unwrap_err();
        assert_eq!(err, ImageError::Null);
        assert_eq!(err.exit_code(), -1);
    }

    #[test]
    fn test_too_small() {
        let err = validate(Some(b"RITE"), &config()).unwrap_err();
        assert_eq!(err, ImageError::TooSmall { len: 4, min: 8 });
        assert_eq!(err.exit_code(), -2);
    }

    #[test]
    fn test_too_large() {
        let image = vec![0u8; 1024 * 1024 + 1];
        let err = validate(Some(&image), &config()).unwrap_err();
        assert_eq!(
            err,
            ImageError::TooLarge {
                len: 1024 * 1024 + 1,
                max: 1024 * 1024
            }
        );
        assert_eq!(err.exit_code(), -3);
    }

    #[test]
    fn test_bad_header() {
        let err = validate(Some(b"NOPE0000"), &config()).unwrap_err();
        assert_eq!(
            err,
            ImageError::BadHeader {
                expected: *b"RITE",
                found: *b"NOPE"
            }
        );
        assert_eq!(err.exit_code(), -4);
    }

    #[test]
    fn test_valid_image() {
        let image = valid_image();
        let accepted = validate(Some(&image), &config()).unwrap();
        assert_eq!(accepted, image.as_slice());
    }

    #[test]
    fn test_boundary_lengths() {
        // Exactly the minimum is accepted
        let image = valid_image();
        assert_eq!(image.len(), 8);
        assert!(validate(Some(&image), &config()).is_ok());

        // Exactly the maximum is accepted
        let mut image = b"RITE".to_vec();
        image.resize(1024 * 1024, 0);
        assert!(validate(Some(&image), &config()).is_ok());
    }

    #[test]
    fn test_check_ordering_size_before_header() {
        // Undersized image with a bad header reports the size, not the header
        let err = validate(Some(b"NO"), &config()).unwrap_err();
        assert!(matches!(err, ImageError::TooSmall { .. }));
    }
}
