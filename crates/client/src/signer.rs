//! HTTP Signature request signing
//!
//! The canonical string is `date: <RFC-1123 timestamp>`; it is signed with
//! the account's private key and rendered into the Authorization header.
//! Every physical attempt must be signed again because the service checks
//! the Date header for freshness.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use http::HeaderMap;
use http::header::{AUTHORIZATION, DATE, HeaderValue};
use jiff::Timestamp;
use mt_core::response::REQUEST_ID_HEADER;
use mt_core::{Credential, Error, Result, SignatureAlgorithm};
use rsa::RsaPrivateKey;
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs1v15::SigningKey;
use rsa::pkcs8::DecodePrivateKey;
use rsa::signature::{SignatureEncoding, Signer};
use sha2::{Sha256, Sha512};

/// Headers produced for one attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedHeaders {
    /// RFC-1123 timestamp that was signed
    pub date: String,
    pub authorization: String,
    /// Fresh correlation id for the attempt
    pub request_id: String,
}

impl SignedHeaders {
    /// Insert `Date`, `Authorization` and the correlation id, replacing any
    /// previous values
    pub fn apply(&self, headers: &mut HeaderMap) -> Result<()> {
        headers.insert(DATE, header_value(&self.date)?);
        headers.insert(AUTHORIZATION, header_value(&self.authorization)?);
        headers.insert(REQUEST_ID_HEADER, header_value(&self.request_id)?);
        Ok(())
    }
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| Error::Signing(format!("Signed header is not a valid header value: {e}")))
}

enum KeySigner {
    RsaSha256(SigningKey<Sha256>),
    RsaSha512(SigningKey<Sha512>),
}

/// Signs requests on behalf of one credential
///
/// The private key is parsed once; signing itself is synchronous.
pub struct RequestSigner {
    key_id_path: String,
    algorithm: SignatureAlgorithm,
    key: KeySigner,
}

impl std::fmt::Debug for RequestSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestSigner")
            .field("key_id", &self.key_id_path)
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}

impl RequestSigner {
    /// Parse the credential's key for its configured algorithm
    ///
    /// Accepts PKCS#1 (`BEGIN RSA PRIVATE KEY`) and PKCS#8
    /// (`BEGIN PRIVATE KEY`) PEM.
    pub fn new(credential: &Credential) -> Result<Self> {
        let key = match credential.algorithm {
            SignatureAlgorithm::RsaSha256 => {
                KeySigner::RsaSha256(SigningKey::new(parse_rsa_key(&credential.private_key)?))
            }
            SignatureAlgorithm::RsaSha512 => {
                KeySigner::RsaSha512(SigningKey::new(parse_rsa_key(&credential.private_key)?))
            }
            other => {
                return Err(Error::Signing(format!(
                    "Unsupported signature algorithm: {other}"
                )));
            }
        };

        Ok(Self {
            key_id_path: credential.key_id_path(),
            algorithm: credential.algorithm,
            key,
        })
    }

    pub fn algorithm(&self) -> SignatureAlgorithm {
        self.algorithm
    }

    /// Sign for the given instant
    pub fn sign(&self, timestamp: Timestamp) -> Result<SignedHeaders> {
        let date = http_date(timestamp);
        let signature = self.sign_bytes(format!("date: {date}").as_bytes())?;
        let authorization = format!(
            "Signature keyId=\"{}\",algorithm=\"{}\",signature=\"{}\"",
            self.key_id_path,
            self.algorithm.header_name(),
            signature
        );

        Ok(SignedHeaders {
            date,
            authorization,
            request_id: uuid::Uuid::new_v4().to_string(),
        })
    }

    /// Sign for the current instant
    pub fn sign_now(&self) -> Result<SignedHeaders> {
        self.sign(Timestamp::now())
    }

    /// Base64 signature over arbitrary bytes
    pub fn sign_bytes(&self, data: &[u8]) -> Result<String> {
        let raw = match &self.key {
            KeySigner::RsaSha256(key) => key.try_sign(data).map(|s| s.to_vec()),
            KeySigner::RsaSha512(key) => key.try_sign(data).map(|s| s.to_vec()),
        }
        .map_err(|e| Error::Signing(format!("Failed to sign request: {e}")))?;

        Ok(STANDARD.encode(raw))
    }
}

fn parse_rsa_key(pem: &str) -> Result<RsaPrivateKey> {
    let pem = pem.trim();
    if pem.contains("BEGIN RSA PRIVATE KEY") {
        RsaPrivateKey::from_pkcs1_pem(pem)
            .map_err(|e| Error::Signing(format!("Malformed PKCS#1 private key: {e}")))
    } else {
        RsaPrivateKey::from_pkcs8_pem(pem)
            .map_err(|e| Error::Signing(format!("Malformed private key: {e}")))
    }
}

/// RFC-1123 rendering in UTC, e.g. `Tue, 15 Nov 1994 08:12:31 GMT`
pub fn http_date(timestamp: Timestamp) -> String {
    timestamp.strftime("%a, %d %b %Y %H:%M:%S GMT").to_string()
}
