pub mod fingerprint;
pub mod redaction;

pub use fingerprint::{FingerprintInputs, deployment_fingerprint};
pub use redaction::{RedactingWriter, redact_secrets};
