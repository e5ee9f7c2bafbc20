//! Certificate record extraction.
//!
//! Parses one X.509 certificate, from DER or PEM, into the canonical
//! [`CertificateRecord`]. This is the leaf dependency of the crate: the PEM
//! trust-store importer and the chain verifier both funnel through it.

use const_oid::AssociatedOid;
use der::Decode;
use der::asn1::{ObjectIdentifier, PrintableStringRef, TeletexStringRef, Utf8StringRef};
use rsa::RsaPublicKey;
use rsa::pkcs1::DecodeRsaPublicKey;
use rsa::traits::PublicKeyParts;
use sha1::{Digest, Sha1};
use time::Date;
use tracing::warn;
use x509_cert::Certificate;
use x509_cert::ext::Extension;
use x509_cert::ext::pkix::KeyUsage as X509KeyUsage;
use x509_cert::name::Name;
use x509_cert::spki::SubjectPublicKeyInfoOwned;
use x509_cert::time::Time;

use crate::error::{Result, TrustProbeError};
use crate::record::{CertificateRecord, KeyUsageFlags, Sha1Fingerprint};

/// Extracts a canonical record from a DER-encoded certificate.
///
/// # Errors
/// `MalformedCertificate` when the input cannot be parsed as X.509. A
/// missing Common Name or Key Usage extension is not an error.
pub fn record_from_der(der_bytes: &[u8]) -> Result<CertificateRecord> {
    let cert = Certificate::from_der(der_bytes)?;
    let tbs = &cert.tbs_certificate;

    let digest: [u8; 20] = Sha1::digest(der_bytes).into();

    Ok(CertificateRecord {
        common_name: common_name(&tbs.subject),
        not_before: to_calendar_date(&tbs.validity.not_before)?,
        not_after: to_calendar_date(&tbs.validity.not_after)?,
        signature_algorithm: signature_algorithm_name(cert.signature_algorithm.oid),
        key_size_bits: key_size_bits(&tbs.subject_public_key_info)?,
        key_usage: key_usage_flags(tbs.extensions.as_deref())?,
        sha1_fingerprint: Sha1Fingerprint::from_bytes(digest),
    })
}

/// Extracts a canonical record from a single PEM certificate block.
pub fn record_from_pem(text: &str) -> Result<CertificateRecord> {
    let block =
        pem::parse(text).map_err(|e| TrustProbeError::MalformedCertificate(e.to_string()))?;
    if block.tag() != "CERTIFICATE" {
        return Err(TrustProbeError::MalformedCertificate(format!(
            "unexpected PEM label {:?}",
            block.tag()
        )));
    }
    record_from_der(block.contents())
}

/// Reads the Common Name from the subject, if any.
///
/// CNs appear as UTF8String in modern certificates and PrintableString (or,
/// rarely, TeletexString) in older roots; all three decode. An undecodable
/// CN is reported as absent, not as an error.
fn common_name(subject: &Name) -> Option<String> {
    for rdn in subject.0.iter() {
        for attr in rdn.0.iter() {
            if attr.oid != const_oid::db::rfc4519::CN {
                continue;
            }
            if let Ok(s) = attr.value.decode_as::<Utf8StringRef>() {
                return Some(s.to_string());
            }
            if let Ok(s) = attr.value.decode_as::<PrintableStringRef>() {
                return Some(s.to_string());
            }
            if let Ok(s) = attr.value.decode_as::<TeletexStringRef>() {
                return Some(s.to_string());
            }
            warn!("subject CN attribute uses an unsupported string encoding");
        }
    }
    None
}

/// Reduces an X.509 validity timestamp to a calendar date.
fn to_calendar_date(time: &Time) -> Result<Date> {
    let dt = match time {
        Time::UtcTime(t) => t.to_date_time(),
        Time::GeneralTime(t) => t.to_date_time(),
    };
    let month = time::Month::try_from(dt.month())
        .map_err(|e| TrustProbeError::MalformedCertificate(e.to_string()))?;
    Date::from_calendar_date(i32::from(dt.year()), month, dt.day())
        .map_err(|e| TrustProbeError::MalformedCertificate(e.to_string()))
}

/// Maps a signature algorithm OID to its hash algorithm name.
///
/// Unrecognized OIDs fall back to the dotted OID string rather than
/// failing, so exotic roots still import.
fn signature_algorithm_name(oid: ObjectIdentifier) -> String {
    use const_oid::db::rfc5912::{
        ECDSA_WITH_SHA_256, ECDSA_WITH_SHA_384, ECDSA_WITH_SHA_512, SHA_1_WITH_RSA_ENCRYPTION,
        SHA_256_WITH_RSA_ENCRYPTION, SHA_384_WITH_RSA_ENCRYPTION, SHA_512_WITH_RSA_ENCRYPTION,
    };
    match oid {
        SHA_1_WITH_RSA_ENCRYPTION => "sha1".to_string(),
        SHA_256_WITH_RSA_ENCRYPTION | ECDSA_WITH_SHA_256 => "sha256".to_string(),
        SHA_384_WITH_RSA_ENCRYPTION | ECDSA_WITH_SHA_384 => "sha384".to_string(),
        SHA_512_WITH_RSA_ENCRYPTION | ECDSA_WITH_SHA_512 => "sha512".to_string(),
        const_oid::db::rfc8410::ID_ED_25519 => "ed25519".to_string(),
        other => other.to_string(),
    }
}

/// Determines the public key's bit length from the SPKI.
fn key_size_bits(spki: &SubjectPublicKeyInfoOwned) -> Result<u32> {
    use const_oid::db::rfc5912::{
        ID_EC_PUBLIC_KEY, RSA_ENCRYPTION, SECP_256_R_1, SECP_384_R_1, SECP_521_R_1,
    };

    let bits = match spki.algorithm.oid {
        RSA_ENCRYPTION => {
            let key = RsaPublicKey::from_pkcs1_der(spki.subject_public_key.raw_bytes())
                .map_err(|e| {
                    TrustProbeError::MalformedCertificate(format!("bad RSA public key: {e}"))
                })?;
            u32::try_from(key.size() * 8).unwrap_or(u32::MAX)
        }
        ID_EC_PUBLIC_KEY => {
            let curve = spki
                .algorithm
                .parameters
                .as_ref()
                .and_then(|params| params.decode_as::<ObjectIdentifier>().ok());
            match curve {
                Some(SECP_256_R_1) => 256,
                Some(SECP_384_R_1) => 384,
                Some(SECP_521_R_1) => 521,
                // Unknown curve: the raw point length is the best available answer.
                _ => u32::try_from(spki.subject_public_key.bit_len()).unwrap_or(u32::MAX),
            }
        }
        const_oid::db::rfc8410::ID_ED_25519 => 256,
        _ => u32::try_from(spki.subject_public_key.bit_len()).unwrap_or(u32::MAX),
    };
    Ok(bits)
}

/// Looks up the Key Usage extension by OID.
///
/// Returns `None` when the certificate has no extensions or none of them is
/// Key Usage; the caller renders that case with the sentinel label.
fn key_usage_flags(extensions: Option<&[Extension]>) -> Result<Option<KeyUsageFlags>> {
    let Some(extensions) = extensions else {
        return Ok(None);
    };
    for ext in extensions {
        if ext.extn_id == <X509KeyUsage as AssociatedOid>::OID {
            let usage = X509KeyUsage::from_der(ext.extn_value.as_bytes())?;
            return Ok(Some(KeyUsageFlags(usage.0)));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn self_signed_der(cn: &str, usages: Vec<rcgen::KeyUsagePurpose>) -> Vec<u8> {
        let mut params = rcgen::CertificateParams::new(Vec::<String>::new()).unwrap();
        params.distinguished_name = rcgen::DistinguishedName::new();
        params.distinguished_name.push(rcgen::DnType::CommonName, cn);
        params.key_usages = usages;
        // rcgen only writes an extensions block for CA certificates, so mark
        // the fixture as a CA whenever key usages are requested (mirrors
        // tests/util.rs).
        if !params.key_usages.is_empty() {
            params.is_ca = rcgen::IsCa::Ca(rcgen::BasicConstraints::Unconstrained);
        }
        let cert = params
            .self_signed(&rcgen::KeyPair::generate().unwrap())
            .unwrap();
        cert.der().to_vec()
    }

    #[test]
    fn extracts_record_from_self_signed_certificate() {
        let der = self_signed_der("Probe Test Root", vec![]);
        let record = record_from_der(&der).unwrap();
        assert_eq!(record.common_name.as_deref(), Some("Probe Test Root"));
        // rcgen's default key is ECDSA P-256 signed with SHA-256.
        assert_eq!(record.signature_algorithm, "sha256");
        assert_eq!(record.key_size_bits, 256);
        assert_eq!(record.sha1_fingerprint.to_string().len(), 59);
    }

    #[test]
    fn absent_key_usage_yields_sentinel() {
        let der = self_signed_der("No Usage", vec![]);
        let record = record_from_der(&der).unwrap();
        assert!(record.key_usage.is_none());
        assert_eq!(record.key_usage_display(), "UNIDENTIFIED");
    }

    #[test]
    fn cert_sign_and_crl_sign_decode_in_order() {
        let der = self_signed_der(
            "CA Usage",
            vec![
                rcgen::KeyUsagePurpose::CrlSign,
                rcgen::KeyUsagePurpose::KeyCertSign,
            ],
        );
        let record = record_from_der(&der).unwrap();
        assert_eq!(record.key_usage_display(), "Key Cert Sign, Crl Sign");
    }

    #[test]
    fn pem_and_der_paths_agree() {
        let mut params = rcgen::CertificateParams::new(Vec::<String>::new()).unwrap();
        params.distinguished_name = rcgen::DistinguishedName::new();
        params
            .distinguished_name
            .push(rcgen::DnType::CommonName, "Agreement Root");
        let cert = params
            .self_signed(&rcgen::KeyPair::generate().unwrap())
            .unwrap();

        let from_der = record_from_der(cert.der()).unwrap();
        let from_pem = record_from_pem(&cert.pem()).unwrap();
        assert_eq!(from_der, from_pem);
    }

    #[test]
    fn garbage_input_is_malformed() {
        assert!(matches!(
            record_from_der(b"not a certificate"),
            Err(TrustProbeError::MalformedCertificate(_))
        ));
        assert!(matches!(
            record_from_pem("-----BEGIN GARBAGE-----"),
            Err(TrustProbeError::MalformedCertificate(_))
        ));
    }
}
