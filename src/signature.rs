//! Verification of webhook notifications sent by myPOS.
//!
//! Each notification carries a signature header in the form `t=<unix-seconds>,v1=<hex-digest>`,
//! where the digest is an HMAC-SHA256 of the canonicalized payload keyed by the webhook secret.
//!
//! ```rust
//! # use mypos_rust::signature::SignatureVerifier;
//! let verifier = SignatureVerifier::new();
//! let payload = br#"{"event": "payment", "amount": 10}"#;
//! let header = verifier.sign(payload, b"webhook-secret", 1_700_000_000);
//!
//! assert!(verifier.verify_at(payload, Some(&header), b"webhook-secret", 1_700_000_100));
//! assert!(!verifier.verify_at(payload, Some(&header), b"other-secret", 1_700_000_100));
//! ```
//!
//! Verification only ever returns a boolean. The reason for a rejection is logged at
//! `debug` level and never handed back to the caller.

use crate::common::SIGNATURE_HEADER;
use hmac::{Hmac, Mac};
use reqwest::header::HeaderMap;
use sha2::Sha256;
use std::{borrow::Cow, fmt::Debug};
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Default maximum distance in seconds between the signing time and now.
pub const DEFAULT_TOLERANCE_SECS: i64 = 300;

/// Strategy turning a received payload into the exact bytes the sender signed.
pub trait Canonicalizer: Debug + Send + Sync {
    /// Returns the bytes to authenticate, or `None` if the payload cannot be canonicalized.
    fn canonicalize<'a>(&self, payload: &'a [u8]) -> Option<Cow<'a, [u8]>>;
}

/// Removes the whitespace a JSON encoder puts after separators, turning `": "` into `":"`
/// and then `", "` into `","`.
///
/// This matches the signing convention of the myPOS reference implementations. Payloads that
/// contain these sequences inside string values are altered as well, which makes their
/// signatures fail to verify.
#[derive(Debug, Clone, Copy, Default)]
pub struct StripSeparatorWhitespace;

impl Canonicalizer for StripSeparatorWhitespace {
    fn canonicalize<'a>(&self, payload: &'a [u8]) -> Option<Cow<'a, [u8]>> {
        let text = std::str::from_utf8(payload).ok()?;
        if !text.contains(": ") && !text.contains(", ") {
            return Some(Cow::Borrowed(payload));
        }

        let stripped = text.replace(": ", ":").replace(", ", ",");
        Some(Cow::Owned(stripped.into_bytes()))
    }
}

/// Authenticates the payload exactly as received.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawPayload;

impl Canonicalizer for RawPayload {
    fn canonicalize<'a>(&self, payload: &'a [u8]) -> Option<Cow<'a, [u8]>> {
        Some(Cow::Borrowed(payload))
    }
}

/// Verifier for webhook signatures.
///
/// Verification is a pure function of its inputs: the verifier holds no state that changes
/// between calls.
#[derive(Debug, Clone)]
pub struct SignatureVerifier<C = StripSeparatorWhitespace> {
    canonicalizer: C,
    tolerance_secs: i64,
}

impl SignatureVerifier {
    /// Creates a verifier using the myPOS canonicalization and a 300 seconds replay window.
    pub fn new() -> Self {
        Self {
            canonicalizer: StripSeparatorWhitespace,
            tolerance_secs: DEFAULT_TOLERANCE_SECS,
        }
    }
}

impl Default for SignatureVerifier {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Canonicalizer> SignatureVerifier<C> {
    /// Replaces the canonicalization strategy.
    pub fn with_canonicalizer<T: Canonicalizer>(self, canonicalizer: T) -> SignatureVerifier<T> {
        SignatureVerifier {
            canonicalizer,
            tolerance_secs: self.tolerance_secs,
        }
    }

    /// Sets the maximum accepted distance in seconds between the signature timestamp and now.
    /// The boundary itself is accepted.
    pub fn with_tolerance(mut self, tolerance_secs: i64) -> Self {
        self.tolerance_secs = tolerance_secs;
        self
    }

    /// Verifies a notification against the current time.
    ///
    /// `signature_header` is the value of the `X-myPOS-Signature` header, if present.
    pub fn verify(&self, payload: &[u8], signature_header: Option<&str>, secret: &[u8]) -> bool {
        self.verify_at(
            payload,
            signature_header,
            secret,
            chrono::Utc::now().timestamp(),
        )
    }

    /// Verifies a notification, reading the signature from the request headers.
    pub fn verify_headers(&self, payload: &[u8], headers: &HeaderMap, secret: &[u8]) -> bool {
        let signature_header = headers
            .get(SIGNATURE_HEADER)
            .and_then(|v| v.to_str().ok());
        self.verify(payload, signature_header, secret)
    }

    /// Verifies a notification as if the current time were `now` (unix seconds).
    pub fn verify_at(
        &self,
        payload: &[u8],
        signature_header: Option<&str>,
        secret: &[u8],
        now: i64,
    ) -> bool {
        let signature_header = match signature_header {
            Some(header) => header,
            None => {
                tracing::debug!("Webhook rejected: missing signature header");
                return false;
            }
        };

        let signature = match SignatureHeader::parse(signature_header) {
            Some(signature) => signature,
            None => {
                tracing::debug!("Webhook rejected: malformed signature header");
                return false;
            }
        };

        let skew = now.checked_sub(signature.timestamp).map(i64::unsigned_abs);
        if !matches!(skew, Some(skew) if skew <= self.tolerance_secs.unsigned_abs()) {
            tracing::debug!(
                timestamp = signature.timestamp,
                now,
                "Webhook rejected: timestamp outside the tolerance window"
            );
            return false;
        }

        let canonical = match self.canonicalizer.canonicalize(payload) {
            Some(canonical) => canonical,
            None => {
                tracing::debug!("Webhook rejected: payload could not be canonicalized");
                return false;
            }
        };

        let expected = match hex_digest(&canonical, secret) {
            Some(expected) => expected,
            None => return false,
        };

        let matches: bool = expected.as_bytes().ct_eq(signature.digest.as_bytes()).into();
        if !matches {
            if let Cow::Owned(_) = canonical {
                // The payload was rewritten before hashing: the mismatch may come from the
                // canonicalization rather than from a forged signature.
                tracing::debug!(
                    canonicalizer = ?self.canonicalizer,
                    "Webhook rejected: digest mismatch on a canonicalized payload"
                );
            } else {
                tracing::debug!("Webhook rejected: digest mismatch");
            }
        }

        matches
    }

    /// Builds a signature header for `payload`, as the sender of a notification would.
    pub fn sign(&self, payload: &[u8], secret: &[u8], timestamp: i64) -> String {
        let digest = self
            .canonicalizer
            .canonicalize(payload)
            .and_then(|canonical| hex_digest(&canonical, secret))
            .unwrap_or_default();
        format!("t={},v1={}", timestamp, digest)
    }
}

/// Hex encoded HMAC-SHA256 of `payload`.
fn hex_digest(payload: &[u8], secret: &[u8]) -> Option<String> {
    let mut mac = HmacSha256::new_from_slice(secret).ok()?;
    mac.update(payload);
    Some(hex::encode(mac.finalize().into_bytes()))
}

/// Components of a signature header.
#[derive(Debug, PartialEq, Eq)]
struct SignatureHeader<'a> {
    timestamp: i64,
    digest: &'a str,
}

impl<'a> SignatureHeader<'a> {
    /// Parses comma separated `key=value` segments. Segments are taken verbatim, so
    /// `t=.., v1=..` does not yield a digest. Unknown keys are ignored and, for
    /// repeated keys, the last value wins.
    fn parse(header: &'a str) -> Option<Self> {
        let mut timestamp = None;
        let mut digest = None;

        for segment in header.split(',') {
            match segment.split_once('=') {
                Some(("t", value)) => timestamp = Some(value),
                Some(("v1", value)) => digest = Some(value),
                _ => {}
            }
        }

        let timestamp = timestamp?.parse().ok()?;
        let digest = digest.filter(|d| !d.is_empty())?;

        Some(Self { timestamp, digest })
    }
}
