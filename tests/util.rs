use rcgen::{
    BasicConstraints, CertificateParams, DistinguishedName, DnType, IsCa, KeyPair, KeyUsagePurpose,
};
use time::{Date, Month};

/// Generates a self-signed CA certificate with a fixed validity window and
/// the usual root-certificate key usages. Returns (PEM, DER).
pub fn root_ca_cert(cn: &str) -> (String, Vec<u8>) {
    let mut params = CertificateParams::new(Vec::<String>::new()).unwrap();
    params.distinguished_name = DistinguishedName::new();
    params.distinguished_name.push(DnType::CommonName, cn);
    params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
    params.key_usages = vec![KeyUsagePurpose::KeyCertSign, KeyUsagePurpose::CrlSign];
    params.not_before = Date::from_calendar_date(2021, Month::January, 5)
        .unwrap()
        .midnight()
        .assume_utc();
    params.not_after = Date::from_calendar_date(2031, Month::January, 5)
        .unwrap()
        .midnight()
        .assume_utc();
    let cert = params.self_signed(&KeyPair::generate().unwrap()).unwrap();
    (cert.pem(), cert.der().to_vec())
}

/// Generates a plain self-signed end-entity certificate.
pub fn leaf_cert(cn: &str) -> Vec<u8> {
    let mut params = CertificateParams::new(vec![cn.to_string()]).unwrap();
    params.distinguished_name = DistinguishedName::new();
    params.distinguished_name.push(DnType::CommonName, cn);
    let cert = params.self_signed(&KeyPair::generate().unwrap()).unwrap();
    cert.der().to_vec()
}

const MONTH_ABBREVS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Renders a date the way the CSV export does: `"YYYY Mon DD"`.
pub fn export_date(date: Date) -> String {
    format!(
        "{} {} {:02}",
        date.year(),
        MONTH_ABBREVS[usize::from(u8::from(date.month())) - 1],
        date.day()
    )
}

/// Changes the first hex digit of a rendered fingerprint.
pub fn flip_first_hex_digit(rendered: &str) -> String {
    let mut chars: Vec<char> = rendered.chars().collect();
    chars[0] = if chars[0] == 'A' { 'B' } else { 'A' };
    chars.into_iter().collect()
}
