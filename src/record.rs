//! Canonical certificate records.
//!
//! Both trust-store import paths (PEM bundle and CSV export) and the live
//! chain extractor produce the same [`CertificateRecord`] shape, so that a
//! record imported from either source renders identically and can be
//! compared by fingerprint alone.

use std::fmt;

use der::flagset::FlagSet;
use serde::Serialize;
use time::Date;
pub use x509_cert::ext::pkix::KeyUsages;

use crate::error::{Result, TrustProbeError};

/// Sentinel rendered when a certificate carries no Key Usage extension.
pub const KEY_USAGE_UNIDENTIFIED: &str = "UNIDENTIFIED";

/// The seven recognized Key Usage flags, in rendering order, with their
/// display labels. CSV exports use the same labels (semicolon separated).
const KEY_USAGE_LABELS: [(KeyUsages, &str); 7] = [
    (KeyUsages::DigitalSignature, "Digital Signature"),
    (KeyUsages::NonRepudiation, "Content Commitment"),
    (KeyUsages::KeyEncipherment, "Key Encipherment"),
    (KeyUsages::DataEncipherment, "Data Encipherment"),
    (KeyUsages::KeyAgreement, "Key Agreement"),
    (KeyUsages::KeyCertSign, "Key Cert Sign"),
    (KeyUsages::CRLSign, "Crl Sign"),
];

/// Maps a display label back to its Key Usage flag.
///
/// Used by the CSV import path to recover the flag set from the export's
/// label list. Returns `None` for labels outside the recognized seven.
pub(crate) fn flag_for_label(label: &str) -> Option<KeyUsages> {
    KEY_USAGE_LABELS
        .iter()
        .find(|(_, l)| *l == label)
        .map(|(flag, _)| *flag)
}

/// The set-of-flags representation of the Key Usage extension.
///
/// Wraps the X.509 flag set so that "extension present with no bits set"
/// (an empty set) stays distinct from "extension absent" (`None` on the
/// record).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeyUsageFlags(pub FlagSet<KeyUsages>);

impl KeyUsageFlags {
    /// Returns the display labels of the set flags, in the fixed order.
    pub fn labels(&self) -> Vec<&'static str> {
        KEY_USAGE_LABELS
            .iter()
            .filter(|(flag, _)| self.0.contains(*flag))
            .map(|(_, label)| *label)
            .collect()
    }
}

impl fmt::Display for KeyUsageFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.labels().join(", "))
    }
}

/// SHA-1 digest of a certificate's DER encoding, its canonical identity.
///
/// Renders as 20 uppercase hex byte-pairs joined by colons (59 characters).
/// Two records describe the same certificate iff this value matches
/// byte-for-byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Sha1Fingerprint([u8; 20]);

impl Sha1Fingerprint {
    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Parses a fingerprint from hex, with or without colon separators,
    /// in either case.
    ///
    /// # Errors
    /// `InvalidFingerprint` when the input is not exactly 20 bytes of hex.
    pub fn parse(s: &str) -> Result<Self> {
        let hex: String = s.chars().filter(|c| *c != ':').collect();
        if hex.len() != 40 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(TrustProbeError::InvalidFingerprint(format!(
                "expected 40 hex digits, got {s:?}"
            )));
        }
        let mut bytes = [0u8; 20];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&hex[2 * i..2 * i + 2], 16)
                .map_err(|e| TrustProbeError::InvalidFingerprint(e.to_string()))?;
        }
        Ok(Self(bytes))
    }
}

impl fmt::Display for Sha1Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, byte) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(":")?;
            }
            write!(f, "{byte:02X}")?;
        }
        Ok(())
    }
}

/// Canonical certificate record, immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateRecord {
    /// Subject Common Name; `None` when the certificate has no CN attribute.
    pub common_name: Option<String>,
    /// Start of the validity period, reduced to a calendar date.
    pub not_before: Date,
    /// End of the validity period, reduced to a calendar date.
    pub not_after: Date,
    /// Hash/signature algorithm name, e.g. `sha256`.
    pub signature_algorithm: String,
    /// Public key length in bits.
    pub key_size_bits: u32,
    /// Key Usage flags; `None` when the extension is absent.
    pub key_usage: Option<KeyUsageFlags>,
    pub sha1_fingerprint: Sha1Fingerprint,
}

impl CertificateRecord {
    /// Renders the combined algorithm string, `"<algorithm> - <bits> bits"`.
    ///
    /// Both import paths must yield this exact shape so that PEM- and
    /// CSV-sourced records stay comparable.
    pub fn public_key_algorithm(&self) -> String {
        format!("{} - {} bits", self.signature_algorithm, self.key_size_bits)
    }

    /// Renders the validity window as `"<YYYY-MM-DD> - <YYYY-MM-DD>"`.
    pub fn validity(&self) -> String {
        format!(
            "{} - {}",
            render_date(self.not_before),
            render_date(self.not_after)
        )
    }

    /// Renders the Key Usage flags, or the sentinel when the extension is
    /// absent. An extension with no bits set renders as an empty string.
    pub fn key_usage_display(&self) -> String {
        match &self.key_usage {
            None => KEY_USAGE_UNIDENTIFIED.to_string(),
            Some(flags) => flags.to_string(),
        }
    }

    /// Flattens the record into the shape handed to presentation layers.
    pub fn to_display(&self) -> DisplayRecord {
        DisplayRecord {
            common_name: self.common_name.clone(),
            validity: self.validity(),
            public_key_algorithm: self.public_key_algorithm(),
            key_usage: self.key_usage_display(),
            sha1: self.sha1_fingerprint.to_string(),
        }
    }
}

/// Flattened display shape of a record, identical regardless of whether the
/// record was imported from a PEM bundle or a CSV export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayRecord {
    pub common_name: Option<String>,
    pub validity: String,
    pub public_key_algorithm: String,
    pub key_usage: String,
    pub sha1: String,
}

/// Renders a calendar date as `YYYY-MM-DD`.
pub(crate) fn render_date(date: Date) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Month;

    #[test]
    fn fingerprint_renders_as_59_colon_separated_hex_chars() {
        let fp = Sha1Fingerprint::from_bytes([0xAB; 20]);
        let rendered = fp.to_string();
        assert_eq!(rendered.len(), 59);
        let pattern = regex::Regex::new(r"^([0-9A-F]{2}:){19}[0-9A-F]{2}$").unwrap();
        assert!(pattern.is_match(&rendered));
    }

    #[test]
    fn fingerprint_parses_bare_and_colonized_hex() {
        let fp = Sha1Fingerprint::from_bytes([
            0xDE, 0xAD, 0xBE, 0xEF, 0x00, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88, 0x99,
            0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF,
        ]);
        let rendered = fp.to_string();
        assert_eq!(Sha1Fingerprint::parse(&rendered).unwrap(), fp);
        let bare = rendered.replace(':', "");
        assert_eq!(Sha1Fingerprint::parse(&bare).unwrap(), fp);
        let lower = bare.to_lowercase();
        assert_eq!(Sha1Fingerprint::parse(&lower).unwrap(), fp);
    }

    #[test]
    fn fingerprint_rejects_bad_input() {
        assert!(matches!(
            Sha1Fingerprint::parse("ABCD"),
            Err(TrustProbeError::InvalidFingerprint(_))
        ));
        assert!(matches!(
            Sha1Fingerprint::parse(&"ZZ".repeat(20)),
            Err(TrustProbeError::InvalidFingerprint(_))
        ));
    }

    #[test]
    fn key_usage_labels_follow_fixed_order() {
        let flags = KeyUsageFlags(KeyUsages::CRLSign | KeyUsages::KeyCertSign);
        assert_eq!(flags.to_string(), "Key Cert Sign, Crl Sign");

        let all = KeyUsageFlags(
            KeyUsages::DigitalSignature
                | KeyUsages::NonRepudiation
                | KeyUsages::KeyEncipherment
                | KeyUsages::DataEncipherment
                | KeyUsages::KeyAgreement
                | KeyUsages::KeyCertSign
                | KeyUsages::CRLSign,
        );
        assert_eq!(
            all.to_string(),
            "Digital Signature, Content Commitment, Key Encipherment, \
             Data Encipherment, Key Agreement, Key Cert Sign, Crl Sign"
        );
    }

    #[test]
    fn empty_flag_set_is_distinct_from_absent_extension() {
        let record = CertificateRecord {
            common_name: None,
            not_before: Date::from_calendar_date(2021, Month::January, 5).unwrap(),
            not_after: Date::from_calendar_date(2031, Month::January, 5).unwrap(),
            signature_algorithm: "sha256".to_string(),
            key_size_bits: 2048,
            key_usage: Some(KeyUsageFlags::default()),
            sha1_fingerprint: Sha1Fingerprint::from_bytes([0; 20]),
        };
        assert_eq!(record.key_usage_display(), "");

        let absent = CertificateRecord {
            key_usage: None,
            ..record
        };
        assert_eq!(absent.key_usage_display(), KEY_USAGE_UNIDENTIFIED);
    }

    #[test]
    fn label_lookup_round_trips() {
        for flags in [
            KeyUsages::DigitalSignature,
            KeyUsages::NonRepudiation,
            KeyUsages::KeyCertSign,
        ] {
            let label = KeyUsageFlags(flags.into()).labels()[0];
            assert_eq!(flag_for_label(label), Some(flags));
        }
        assert_eq!(flag_for_label("Quantum Signing"), None);
    }

    #[test]
    fn display_shape_renders_all_fields() {
        let record = CertificateRecord {
            common_name: Some("Example Root CA".to_string()),
            not_before: Date::from_calendar_date(2021, Month::January, 5).unwrap(),
            not_after: Date::from_calendar_date(2031, Month::January, 5).unwrap(),
            signature_algorithm: "sha256".to_string(),
            key_size_bits: 4096,
            key_usage: Some(KeyUsageFlags(KeyUsages::KeyCertSign | KeyUsages::CRLSign)),
            sha1_fingerprint: Sha1Fingerprint::from_bytes([0x0F; 20]),
        };
        let display = record.to_display();
        assert_eq!(display.validity, "2021-01-05 - 2031-01-05");
        assert_eq!(display.public_key_algorithm, "sha256 - 4096 bits");
        assert_eq!(display.key_usage, "Key Cert Sign, Crl Sign");
        assert_eq!(display.sha1.len(), 59);
    }
}
