// src/identity.rs
//! Deduplication keys for raw CT records

use crate::types::{RawRecord, SourceShape};

/// Derive the identity key for a record
///
/// Serial-keyed sources use the serial number verbatim, falling back to the
/// sequence token when the serial is missing. Fingerprint-grouped sources use
/// the upstream fingerprint unmodified. Returns `None` when the record carries
/// nothing to key on; such a record cannot be deduplicated.
pub fn resolve_key(shape: SourceShape, record: &RawRecord) -> Option<String> {
    match shape {
        SourceShape::SerialKeyed => {
            if let Some(serial) = record.serial_number.as_deref().filter(|s| !s.is_empty()) {
                Some(serial.to_string())
            } else {
                record.sequence.map(|seq| format!("id:{}", seq))
            }
        }
        SourceShape::FingerprintGrouped => record
            .fingerprint
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(str::to_string),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(serial: Option<&str>, fingerprint: Option<&str>, sequence: Option<i64>) -> RawRecord {
        RawRecord {
            serial_number: serial.map(str::to_string),
            fingerprint: fingerprint.map(str::to_string),
            sequence,
            ..Default::default()
        }
    }

    #[test]
    fn test_serial_passed_through_exactly() {
        let r = record(Some("03aBc123"), Some("ffff"), Some(7));
        assert_eq!(resolve_key(SourceShape::SerialKeyed, &r), Some("03aBc123".to_string()));
    }

    #[test]
    fn test_serial_not_normalized() {
        let upper = record(Some("ABC123"), None, None);
        let lower = record(Some("abc123"), None, None);
        assert_ne!(
            resolve_key(SourceShape::SerialKeyed, &upper),
            resolve_key(SourceShape::SerialKeyed, &lower)
        );
    }

    #[test]
    fn test_serial_missing_falls_back_to_sequence() {
        let r = record(None, None, Some(42));
        assert_eq!(resolve_key(SourceShape::SerialKeyed, &r), Some("id:42".to_string()));

        let r = record(Some(""), None, Some(43));
        assert_eq!(resolve_key(SourceShape::SerialKeyed, &r), Some("id:43".to_string()));
    }

    #[test]
    fn test_serial_and_sequence_missing() {
        let r = record(None, None, None);
        assert_eq!(resolve_key(SourceShape::SerialKeyed, &r), None);
    }

    #[test]
    fn test_fingerprint_ignores_serial() {
        let r = record(Some("ABC123"), Some("d4e5f6"), Some(1));
        assert_eq!(
            resolve_key(SourceShape::FingerprintGrouped, &r),
            Some("d4e5f6".to_string())
        );

        let r = record(Some("ABC123"), None, Some(1));
        assert_eq!(resolve_key(SourceShape::FingerprintGrouped, &r), None);
    }
}
