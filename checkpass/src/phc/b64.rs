use base64::alphabet;
use base64::engine::general_purpose::GeneralPurpose;
use base64::engine::general_purpose::GeneralPurposeConfig;
use base64::engine::general_purpose::STANDARD_NO_PAD;
use base64::engine::DecodePaddingMode;
use base64::Engine;

use crate::errors::FormatError;

/// Unpadded reader that ignores the unused low bits of the last character.
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_allow_trailing_bits(true)
        .with_decode_padding_mode(DecodePaddingMode::RequireNone),
);

/// Encode bytes as standard-alphabet base64 with the padding stripped.
pub fn encode(bytes: &[u8]) -> String {
    STANDARD_NO_PAD.encode(bytes)
}

/// Decode an unpadded base64 field.
///
/// A field whose length is 1 modulo 4 cannot come from any byte string and is
/// rejected before decoding. Unused trailing bits are ignored, so only the
/// decoded bytes are significant.
///
/// # Errors
/// * `MalformedLength` - Field length is 1 modulo 4
/// * `InvalidBase64` - Field contains characters outside the encoding
pub fn decode(field: &str) -> Result<Vec<u8>, FormatError> {
    if field.len() % 4 == 1 {
        return Err(FormatError::MalformedLength(field.len()));
    }
    LENIENT
        .decode(field)
        .map_err(|_| FormatError::InvalidBase64(field.to_string()))
}

/// Whether `field` is exactly the encoding of the bytes it decodes to.
pub fn is_canonical(field: &str) -> bool {
    decode(field).is_ok_and(|bytes| encode(&bytes) == field)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_strips_padding() {
        assert_eq!(encode(b"somesalt"), "c29tZXNhbHQ");
        assert_eq!(encode(b""), "");
        assert_eq!(encode(&[0xff]), "/w");
    }

    #[test]
    fn test_decode_unpadded_fields() {
        assert_eq!(decode("c29tZXNhbHQ").expect("decode"), b"somesalt");
        assert_eq!(decode("/w").expect("decode"), vec![0xff]);
        assert!(decode("").expect("decode").is_empty());
    }

    #[test]
    fn test_decode_rejects_impossible_length() {
        assert_eq!(decode("c29tZ"), Err(FormatError::MalformedLength(5)));
        assert_eq!(decode("A"), Err(FormatError::MalformedLength(1)));
    }

    #[test]
    fn test_decode_ignores_trailing_bits() {
        assert_eq!(decode("/x").expect("decode"), vec![0xff]);
        assert_eq!(decode("c29tZXNhbHR").expect("decode"), b"somesalt");
        assert!(is_canonical("c29tZXNhbHQ"));
        assert!(!is_canonical("c29tZXNhbHR"));
        assert!(is_canonical(""));
        assert!(!is_canonical("c2.t"));
    }

    #[test]
    fn test_decode_rejects_foreign_characters() {
        assert!(matches!(decode("c2.t"), Err(FormatError::InvalidBase64(_))));
        assert!(matches!(decode("c29t===="), Err(FormatError::InvalidBase64(_))));
    }
}
