//! Raw input checks

use crate::error::IngestError;

/// Default ceiling for a single uploaded listing (50 MiB).
pub const DEFAULT_MAX_INPUT_BYTES: usize = 50 * 1024 * 1024;

/// Validate size and encoding of an uploaded blob.
///
/// The size check runs first so an oversized blob is rejected without being
/// scanned.
pub fn decode_input(bytes: &[u8], limit: usize) -> Result<&str, IngestError> {
    if bytes.len() > limit {
        return Err(IngestError::InputTooLarge {
            size: bytes.len(),
            limit,
        });
    }
    std::str::from_utf8(bytes).map_err(|err| IngestError::InvalidEncoding {
        offset: err.valid_up_to(),
    })
}
