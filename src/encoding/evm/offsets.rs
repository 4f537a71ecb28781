use tracing::trace;

use crate::encoding::errors::EncodingError;

/// Returns the byte index of the first occurrence of `needle` in `haystack`.
///
/// Sub-call bodies are built by exchange adapters which embed quoted values as literals. The
/// first match is the one patched at runtime, so callers must never search for patterns that
/// could also match earlier, unrelated bytes.
pub fn find_offset(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Like `find_offset`, but the pattern is mandatory.
///
/// Returns a `PatternNotFound` error describing `what` when the pattern is absent.
pub fn require_offset(haystack: &[u8], needle: &[u8], what: &str) -> Result<usize, EncodingError> {
    let offset = find_offset(haystack, needle).ok_or_else(|| {
        EncodingError::PatternNotFound(format!(
            "{} 0x{} not found in {} bytes of calldata",
            what,
            hex::encode(needle),
            haystack.len()
        ))
    })?;
    trace!(what, offset, "located patch offset");
    Ok(offset)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_offset_absent() {
        assert_eq!(find_offset(&[1, 2, 3, 4], &[5]), None);
        assert_eq!(find_offset(&[1, 2], &[1, 2, 3]), None);
        assert_eq!(find_offset(&[1, 2], &[]), None);
    }

    #[test]
    fn test_find_offset_first_match_wins() {
        let haystack = [0xaa, 0x01, 0x02, 0xbb, 0x01, 0x02];
        assert_eq!(find_offset(&haystack, &[0x01, 0x02]), Some(1));
    }

    #[test]
    fn test_find_offset_is_byte_aligned() {
        // 0x12 0x34 contains the nibbles "23", which must not match the byte 0x23.
        assert_eq!(find_offset(&[0x12, 0x34], &[0x23]), None);
        assert_eq!(find_offset(&[0x12, 0x34], &[0x34]), Some(1));
    }

    #[test]
    fn test_require_offset_not_found() {
        let result = require_offset(&[0u8; 8], &[1u8; 4], "source amount");
        assert!(matches!(result, Err(EncodingError::PatternNotFound(_))));
        assert_eq!(require_offset(&[0, 1, 1, 1, 1], &[1u8; 4], "source amount"), Ok(1));
    }
}
