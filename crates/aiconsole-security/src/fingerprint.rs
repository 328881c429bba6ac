use ring::digest::{SHA256, digest};

/// Deployment-identifying values taken from configuration. Empty values are
/// skipped; the OS hostname is always part of the hash.
#[derive(Debug, Clone, Default)]
pub struct FingerprintInputs {
    pub site_url: Option<String>,
    pub db_host: Option<String>,
    pub db_name: Option<String>,
    pub secret_key: Option<String>,
}

/// Stable SHA-256 hex identifier for this deployment, sent to completion and
/// transcription backends for usage attribution. Not a security boundary.
pub fn deployment_fingerprint(inputs: &FingerprintInputs) -> String {
    let hostname = gethostname::gethostname().to_string_lossy().into_owned();
    fingerprint_with_hostname(&hostname, inputs)
}

fn fingerprint_with_hostname(hostname: &str, inputs: &FingerprintInputs) -> String {
    let mut parts: Vec<&str> = vec![hostname];

    if let Some(site_url) = non_empty(inputs.site_url.as_deref()) {
        parts.push(site_url);
    }

    let db = match (
        non_empty(inputs.db_host.as_deref()),
        non_empty(inputs.db_name.as_deref()),
    ) {
        (Some(host), Some(name)) => Some(format!("{host}:{name}")),
        _ => None,
    };
    if let Some(db) = db.as_deref() {
        parts.push(db);
    }

    if let Some(secret_key) = non_empty(inputs.secret_key.as_deref()) {
        parts.push(secret_key);
    }

    sha256_hex(parts.join("|").as_bytes())
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

fn sha256_hex(input: &[u8]) -> String {
    let hash = digest(&SHA256, input);
    let mut hex = String::with_capacity(hash.as_ref().len() * 2);
    for byte in hash.as_ref() {
        use std::fmt::Write as _;
        let _ = write!(&mut hex, "{byte:02x}");
    }
    hex
}
