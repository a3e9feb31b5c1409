//! Envelope verification against a pinned root certificate.

use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;
use x509_parser::pem::parse_x509_pem;
use x509_parser::prelude::{FromDer, X509Certificate, X509Error};
use x509_parser::x509::SubjectPublicKeyInfo;

use super::compact::CompactJws;
use super::WebhookError;

const ENVELOPE_ALGORITHM: &str = "ES256";

#[derive(Debug, Deserialize)]
struct EnvelopeHeader {
    alg: String,
    #[serde(default)]
    x5c: Option<Vec<String>>,
}

/// Outcome of checking one link of the chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainTrust {
    Trusted,
    /// Definitely not issued by the expected key; always fatal.
    Mismatch(String),
    /// The verifier could not decide (unsupported algorithm and the like).
    Inconclusive(String),
}

pub struct WebhookVerifier {
    pinned_root: Vec<u8>,
    /// Fail closed on inconclusive links.
    strict: bool,
}

impl WebhookVerifier {
    pub fn new(pinned_root_der: Vec<u8>, strict: bool) -> Result<Self, WebhookError> {
        X509Certificate::from_der(&pinned_root_der)
            .map_err(|e| WebhookError::Config(format!("pinned root is not a certificate: {e}")))?;
        Ok(Self {
            pinned_root: pinned_root_der,
            strict,
        })
    }

    pub fn from_pem_or_der(bytes: &[u8], strict: bool) -> Result<Self, WebhookError> {
        if bytes.trim_ascii_start().starts_with(b"-----BEGIN") {
            let (_, pem) = parse_x509_pem(bytes.trim_ascii_start())
                .map_err(|e| WebhookError::Config(format!("pinned root PEM is unreadable: {e}")))?;
            Self::new(pem.contents, strict)
        } else {
            Self::new(bytes.to_vec(), strict)
        }
    }

    pub fn from_path(path: &Path, strict: bool) -> Result<Self, WebhookError> {
        let bytes = std::fs::read(path).map_err(|e| {
            WebhookError::Config(format!("cannot read pinned root {}: {e}", path.display()))
        })?;
        Self::from_pem_or_der(&bytes, strict)
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Verify the envelope and return its payload as JSON.
    pub fn verify(&self, signed_payload: &str) -> Result<Value, WebhookError> {
        let signed_payload = signed_payload.trim();
        let jws = CompactJws::split(signed_payload)?;

        let header: EnvelopeHeader = jws.decode_header()?;
        if header.alg != ENVELOPE_ALGORITHM {
            return Err(WebhookError::malformed(format!(
                "unsupported algorithm '{}'",
                header.alg
            )));
        }

        let chain = decode_chain(header.x5c.unwrap_or_default())?;
        enforce(self.assess_chain(&chain)?, self.strict)?;

        let (_, leaf) = X509Certificate::from_der(&chain[0])
            .map_err(|e| WebhookError::ChainVerificationFailed(format!("leaf unreadable: {e}")))?;
        verify_signature(signed_payload, &leaf.public_key().subject_public_key.data)
    }

    /// One outcome per link, leaf first, ending with the root-most
    /// certificate checked against the pinned root.
    pub fn assess_chain(&self, chain: &[Vec<u8>]) -> Result<Vec<ChainTrust>, WebhookError> {
        let certs = chain
            .iter()
            .enumerate()
            .map(|(i, der)| {
                X509Certificate::from_der(der)
                    .map(|(_, cert)| cert)
                    .map_err(|e| {
                        WebhookError::ChainVerificationFailed(format!(
                            "certificate {i} unreadable: {e}"
                        ))
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let (_, pinned) = X509Certificate::from_der(&self.pinned_root)
            .map_err(|e| WebhookError::Config(format!("pinned root unreadable: {e}")))?;

        let mut outcomes: Vec<ChainTrust> = certs
            .windows(2)
            .map(|pair| check_link(&pair[0], &pair[1]))
            .collect();

        let (root_most, root_der) = match (certs.last(), chain.last()) {
            (Some(cert), Some(der)) => (cert, der),
            _ => return Err(WebhookError::MissingCertificateChain),
        };
        outcomes.push(if *root_der == self.pinned_root {
            ChainTrust::Trusted
        } else {
            check_link(root_most, &pinned)
        });

        Ok(outcomes)
    }
}

/// Decode x5c entries (standard base64 DER), leaf first.
fn decode_chain(x5c: Vec<String>) -> Result<Vec<Vec<u8>>, WebhookError> {
    if x5c.is_empty() {
        return Err(WebhookError::MissingCertificateChain);
    }
    x5c.iter()
        .enumerate()
        .map(|(i, b64)| {
            STANDARD.decode(b64.trim()).map_err(|e| {
                WebhookError::ChainVerificationFailed(format!("certificate {i} is not base64: {e}"))
            })
        })
        .collect()
}

fn check_link(child: &X509Certificate<'_>, issuer: &X509Certificate<'_>) -> ChainTrust {
    if child.issuer().as_raw() != issuer.subject().as_raw() {
        return ChainTrust::Mismatch(format!(
            "'{}' is not issued by '{}'",
            child.subject(),
            issuer.subject()
        ));
    }
    signed_by(child, issuer.public_key())
}

fn signed_by(child: &X509Certificate<'_>, key: &SubjectPublicKeyInfo<'_>) -> ChainTrust {
    match child.verify_signature(Some(key)) {
        Ok(()) => ChainTrust::Trusted,
        Err(X509Error::SignatureVerificationError) => {
            ChainTrust::Mismatch(format!("signature on '{}' does not verify", child.subject()))
        }
        Err(e) => ChainTrust::Inconclusive(format!("'{}': {e}", child.subject())),
    }
}

/// Mismatch is always fatal; inconclusive links pass unless `strict`.
pub(crate) fn enforce(outcomes: Vec<ChainTrust>, strict: bool) -> Result<(), WebhookError> {
    for outcome in outcomes {
        match outcome {
            ChainTrust::Trusted => {}
            ChainTrust::Mismatch(detail) => {
                return Err(WebhookError::ChainVerificationFailed(detail));
            }
            ChainTrust::Inconclusive(detail) if strict => {
                return Err(WebhookError::ChainVerificationFailed(detail));
            }
            ChainTrust::Inconclusive(detail) => {
                warn!(detail = %detail, "inconclusive certificate link accepted");
            }
        }
    }
    Ok(())
}

fn verify_signature(signed_payload: &str, leaf_point: &[u8]) -> Result<Value, WebhookError> {
    let mut validation = Validation::new(Algorithm::ES256);
    validation.required_spec_claims.clear();
    validation.validate_exp = false;
    validation.validate_nbf = false;
    validation.validate_aud = false;

    decode::<Value>(signed_payload, &DecodingKey::from_ec_der(leaf_point), &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::InvalidSignature
            | ErrorKind::InvalidEcdsaKey
            | ErrorKind::InvalidKeyFormat => WebhookError::SignatureInvalid,
            _ => WebhookError::malformed(e.to_string()),
        })
}
