//! AWS Signature Version 4 request signing.
//!
//! Signing runs in four steps: canonical request, string to sign, derived
//! signing key, signature. The derived key is date-scoped and cheap to
//! compute, so every request derives its own and nothing is cached.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

use crate::error::RelayError;

type HmacSha256 = Hmac<Sha256>;

pub const ALGORITHM: &str = "AWS4-HMAC-SHA256";
pub const SCOPE_TERMINATOR: &str = "aws4_request";
const SECRET_KEY_PREFIX: &str = "AWS4";
const AMZ_DATE_FORMAT: &str = "%Y%m%dT%H%M%SZ";
const DATE_STAMP_FORMAT: &str = "%Y%m%d";

#[derive(Clone, PartialEq, Eq)]
pub struct SigningCredentials {
    pub access_key: String,
    pub secret_key: String,
}

impl fmt::Debug for SigningCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningCredentials")
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

/// `date/region/service/aws4_request`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialScope {
    pub date_stamp: String,
    pub region: String,
    pub service: String,
}

impl fmt::Display for CredentialScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/{SCOPE_TERMINATOR}",
            self.date_stamp, self.region, self.service
        )
    }
}

/// The parts of an HTTP request covered by the signature.
#[derive(Debug, Clone)]
pub struct RequestToSign<'a> {
    pub method: &'a str,
    pub uri: &'a str,
    pub query: &'a str,
    pub headers: &'a [(&'a str, &'a str)],
    pub body: &'a [u8],
}

/// Everything produced while signing one request.
#[derive(Clone, PartialEq, Eq)]
pub struct SignedRequest {
    pub amz_date: String,
    pub canonical_request: String,
    pub string_to_sign: String,
    pub signing_key: Vec<u8>,
    pub signature: String,
    pub authorization: String,
}

impl fmt::Debug for SignedRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignedRequest")
            .field("amz_date", &self.amz_date)
            .field("canonical_request", &self.canonical_request)
            .field("string_to_sign", &self.string_to_sign)
            .field("signing_key", &"<redacted>")
            .field("signature", &self.signature)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct Signer {
    credentials: SigningCredentials,
    region: String,
    service: String,
}

impl Signer {
    pub fn new(
        credentials: SigningCredentials,
        region: impl Into<String>,
        service: impl Into<String>,
    ) -> Self {
        Self {
            credentials,
            region: region.into(),
            service: service.into(),
        }
    }

    pub fn scope(&self, at: DateTime<Utc>) -> CredentialScope {
        CredentialScope {
            date_stamp: date_stamp(at),
            region: self.region.clone(),
            service: self.service.clone(),
        }
    }

    /// Sign `request` as of `at`. The caller must include an `x-amz-date`
    /// header equal to [`amz_date`]`(at)` among the request headers.
    pub fn sign(
        &self,
        request: &RequestToSign<'_>,
        at: DateTime<Utc>,
    ) -> Result<SignedRequest, RelayError> {
        let amz_date = amz_date(at);
        let scope = self.scope(at);

        let (canonical_headers, signed_headers) = canonical_headers(request.headers);
        let canonical_request = format!(
            "{}\n{}\n{}\n{}\n{}\n{}",
            request.method,
            request.uri,
            request.query,
            canonical_headers,
            signed_headers,
            sha256_hex(request.body),
        );

        let string_to_sign = format!(
            "{ALGORITHM}\n{amz_date}\n{scope}\n{}",
            sha256_hex(canonical_request.as_bytes())
        );

        let signing_key = derive_signing_key(&self.credentials.secret_key, &scope)?;
        let signature = hex::encode(hmac_sha256(&signing_key, string_to_sign.as_bytes())?);

        let authorization = format!(
            "{ALGORITHM} Credential={}/{scope}, SignedHeaders={signed_headers}, Signature={signature}",
            self.credentials.access_key,
        );

        Ok(SignedRequest {
            amz_date,
            canonical_request,
            string_to_sign,
            signing_key,
            signature,
            authorization,
        })
    }
}

pub fn amz_date(at: DateTime<Utc>) -> String {
    at.format(AMZ_DATE_FORMAT).to_string()
}

pub fn date_stamp(at: DateTime<Utc>) -> String {
    at.format(DATE_STAMP_FORMAT).to_string()
}

/// HMAC chain: `AWS4<secret>` -> date -> region -> service -> `aws4_request`.
pub fn derive_signing_key(
    secret_key: &str,
    scope: &CredentialScope,
) -> Result<Vec<u8>, RelayError> {
    let seed = format!("{SECRET_KEY_PREFIX}{secret_key}");
    let k_date = hmac_sha256(seed.as_bytes(), scope.date_stamp.as_bytes())?;
    let k_region = hmac_sha256(&k_date, scope.region.as_bytes())?;
    let k_service = hmac_sha256(&k_region, scope.service.as_bytes())?;
    hmac_sha256(&k_service, SCOPE_TERMINATOR.as_bytes())
}

/// Returns `(canonical header block, signed header names)`.
///
/// Names are lowercased and sorted; values are trimmed with inner runs of
/// whitespace collapsed. Each canonical line ends with `\n`.
fn canonical_headers(headers: &[(&str, &str)]) -> (String, String) {
    let normalized: BTreeMap<String, String> = headers
        .iter()
        .map(|(name, value)| {
            (
                name.trim().to_ascii_lowercase(),
                value.split_whitespace().collect::<Vec<_>>().join(" "),
            )
        })
        .collect();

    let block = normalized
        .iter()
        .map(|(name, value)| format!("{name}:{value}\n"))
        .collect::<String>();
    let names = normalized.keys().cloned().collect::<Vec<_>>().join(";");
    (block, names)
}

fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

fn hmac_sha256(key: &[u8], message: &[u8]) -> Result<Vec<u8>, RelayError> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|error| RelayError::Configuration(format!("invalid signing key: {error}")))?;
    mac.update(message);
    Ok(mac.finalize().into_bytes().to_vec())
}
