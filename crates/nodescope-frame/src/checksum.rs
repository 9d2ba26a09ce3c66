//! FNV-1a 32-bit payload checksum.
//!
//! Every frame header carries the FNV-1a hash of its payload. The hash must stay
//! bit-exact with the capture producers, so the byte is XORed in before the
//! multiply, never after.

use crate::error::{FrameError, Result};

/// FNV-1a 32-bit offset basis.
pub const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;

/// FNV-1a 32-bit prime.
pub const FNV_PRIME: u32 = 0x0100_0193;

/// Hash `bytes` with FNV-1a (32-bit).
#[inline]
pub fn checksum(bytes: &[u8]) -> u32 {
    bytes.iter().fold(FNV_OFFSET_BASIS, |hash, &byte| {
        (hash ^ u32::from(byte)).wrapping_mul(FNV_PRIME)
    })
}

/// Check `payload` against the checksum declared in its frame header.
pub fn verify(expected: u32, payload: &[u8]) -> Result<()> {
    let actual = checksum(payload);
    if actual == expected {
        Ok(())
    } else {
        Err(FrameError::ChecksumMismatch { expected, actual })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_hashes_to_offset_basis() {
        assert_eq!(checksum(b""), FNV_OFFSET_BASIS);
        assert_eq!(checksum(&[]), 0x811c_9dc5);
    }

    #[test]
    fn known_vectors() {
        assert_eq!(checksum(b"a"), 0xe40c_292c);
        assert_eq!(checksum(b"foobar"), 0xbf9c_f968);
    }

    #[test]
    fn xor_happens_before_multiply() {
        // multiply-then-xor (FNV-1) gives 0x050c5d7e for "a"
        assert_ne!(checksum(b"a"), 0x050c_5d7e);
    }

    #[test]
    fn deterministic_across_calls() {
        let data = vec![0x5a; 4096];
        assert_eq!(checksum(&data), checksum(&data));
    }

    #[test]
    fn verify_reports_both_values() {
        assert!(verify(checksum(b"state"), b"state").is_ok());

        let err = verify(0xdead_beef, b"state").unwrap_err();
        match err {
            FrameError::ChecksumMismatch { expected, actual } => {
                assert_eq!(expected, 0xdead_beef);
                assert_eq!(actual, checksum(b"state"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
