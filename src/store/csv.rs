//! CSV-export import path.
//!
//! The export is a quoted, comma-separated file with a header row. Fields
//! are resolved by column name rather than position, so a reordered export
//! still imports correctly. Dates arrive as `"YYYY Mon DD"` with 3-letter
//! English month abbreviations; SHA-1 fingerprints arrive as bare hex; key
//! usage arrives as semicolon-separated labels.

use std::io::Read;

use der::flagset::FlagSet;
use serde::Deserialize;
use time::{Date, Month};

use crate::error::{Result, TrustProbeError};
use crate::record::{
    self, CertificateRecord, KEY_USAGE_UNIDENTIFIED, KeyUsageFlags, Sha1Fingerprint,
};
use crate::store::StoreName;

/// One row of the export, with fields bound by column name.
#[derive(Debug, Clone, Deserialize)]
struct ExportRow {
    #[serde(rename = "CA Common Name or Certificate Name")]
    common_name: String,
    #[serde(rename = "SHA-1 Fingerprint")]
    sha1_fingerprint: String,
    #[serde(rename = "Valid From [GMT]")]
    valid_from: String,
    #[serde(rename = "Valid To [GMT]")]
    valid_to: String,
    #[serde(rename = "Public Key Algorithm")]
    public_key_algorithm: String,
    #[serde(rename = "Key Usage")]
    key_usage: String,
}

pub(super) fn import<R: Read>(name: StoreName, reader: R) -> Result<Vec<CertificateRecord>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut records = Vec::new();
    for (index, row) in csv_reader.deserialize::<ExportRow>().enumerate() {
        let line = index + 2; // header occupies line 1
        let row = row.map_err(|e| malformed(name, format!("line {line}: {e}")))?;
        records.push(row_to_record(name, line, row)?);
    }
    Ok(records)
}

fn row_to_record(name: StoreName, line: usize, row: ExportRow) -> Result<CertificateRecord> {
    let common_name = match row.common_name.as_str() {
        "" => None,
        cn => Some(cn.to_string()),
    };

    let sha1_fingerprint = Sha1Fingerprint::parse(&row.sha1_fingerprint)
        .map_err(|e| malformed(name, format!("line {line}: {e}")))?;

    // UnknownMonth keeps its own identity; everything else becomes a
    // store-level failure.
    let not_before = parse_export_date(&row.valid_from).map_err(|e| date_error(name, line, e))?;
    let not_after = parse_export_date(&row.valid_to).map_err(|e| date_error(name, line, e))?;

    let (signature_algorithm, key_size_bits) = split_algorithm(&row.public_key_algorithm)
        .ok_or_else(|| {
            malformed(
                name,
                format!(
                    "line {line}: public key algorithm {:?} is not \"<algorithm> - <bits> bits\"",
                    row.public_key_algorithm
                ),
            )
        })?;

    let key_usage = parse_key_usage(name, line, &row.key_usage)?;

    Ok(CertificateRecord {
        common_name,
        not_before,
        not_after,
        signature_algorithm,
        key_size_bits,
        key_usage,
        sha1_fingerprint,
    })
}

/// Splits the export's combined `"<algorithm> - <bits> bits"` column back
/// into the two canonical fields.
fn split_algorithm(combined: &str) -> Option<(String, u32)> {
    let (algorithm, rest) = combined.rsplit_once(" - ")?;
    let bits: u32 = rest.strip_suffix(" bits")?.parse().ok()?;
    Some((algorithm.to_string(), bits))
}

/// Parses the semicolon-separated label list into the canonical flag set.
///
/// The sentinel maps to an absent extension; an empty field maps to an
/// extension with no bits set. Rendering the result joins labels with
/// `", "`, which keeps this path consistent with the PEM path.
fn parse_key_usage(name: StoreName, line: usize, field: &str) -> Result<Option<KeyUsageFlags>> {
    if field == KEY_USAGE_UNIDENTIFIED {
        return Ok(None);
    }
    let mut flags = FlagSet::default();
    for label in field.split(';').map(str::trim).filter(|l| !l.is_empty()) {
        let flag = record::flag_for_label(label).ok_or_else(|| {
            malformed(name, format!("line {line}: unknown key usage label {label:?}"))
        })?;
        flags |= flag;
    }
    Ok(Some(KeyUsageFlags(flags)))
}

/// Parses a `"YYYY Mon DD"` export date into a calendar date.
///
/// # Errors
/// `UnknownMonth` for an abbreviation outside the 12-entry table,
/// `InvalidDate` for any other shape problem.
pub(crate) fn parse_export_date(text: &str) -> Result<Date> {
    let mut parts = text.split_whitespace();
    let (Some(year), Some(month), Some(day), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(TrustProbeError::InvalidDate(text.to_string()));
    };

    let year: i32 = year
        .parse()
        .map_err(|_| TrustProbeError::InvalidDate(text.to_string()))?;
    let day: u8 = day
        .parse()
        .map_err(|_| TrustProbeError::InvalidDate(text.to_string()))?;
    let month = month_from_abbrev(month)?;

    Date::from_calendar_date(year, month, day)
        .map_err(|_| TrustProbeError::InvalidDate(text.to_string()))
}

/// The fixed 12-entry month-name table.
fn month_from_abbrev(abbrev: &str) -> Result<Month> {
    Ok(match abbrev {
        "Jan" => Month::January,
        "Feb" => Month::February,
        "Mar" => Month::March,
        "Apr" => Month::April,
        "May" => Month::May,
        "Jun" => Month::June,
        "Jul" => Month::July,
        "Aug" => Month::August,
        "Sep" => Month::September,
        "Oct" => Month::October,
        "Nov" => Month::November,
        "Dec" => Month::December,
        other => return Err(TrustProbeError::UnknownMonth(other.to_string())),
    })
}

fn malformed(name: StoreName, reason: String) -> TrustProbeError {
    TrustProbeError::MalformedTrustStore {
        store: name.to_string(),
        reason,
    }
}

fn date_error(name: StoreName, line: usize, err: TrustProbeError) -> TrustProbeError {
    match err {
        TrustProbeError::UnknownMonth(_) => err,
        other => malformed(name, format!("line {line}: {other}")),
    }
}
