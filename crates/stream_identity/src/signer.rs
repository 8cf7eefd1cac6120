use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::fmt;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

const SEPARATOR: &str = "--";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdentityError {
    #[error("identifier is not of the form `data--digest`")]
    Malformed,
    #[error("identifier payload is not base64: {0}")]
    Base64(String),
    #[error("identifier digest is not hex: {0}")]
    Hex(String),
    #[error("identifier signature does not match")]
    BadSignature,
    #[error("identifier payload is not a JSON string")]
    Payload,
    #[error("signing key rejected: {0}")]
    Key(String),
}

/// `base64(json(name))--hex(hmac_sha256(secret, base64 part))`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SignedStreamIdentifier(String);

impl SignedStreamIdentifier {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for SignedStreamIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Signs and verifies stream names with a shared secret.
#[derive(Clone)]
pub struct StreamSigner {
    secret: Vec<u8>,
}

impl fmt::Debug for StreamSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamSigner").finish_non_exhaustive()
    }
}

impl StreamSigner {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    fn mac(&self) -> Result<HmacSha256, IdentityError> {
        HmacSha256::new_from_slice(&self.secret).map_err(|e| IdentityError::Key(e.to_string()))
    }

    pub fn sign(&self, stream_name: &str) -> Result<SignedStreamIdentifier, IdentityError> {
        let json = serde_json::Value::from(stream_name).to_string();
        let data = STANDARD.encode(json);
        let mut mac = self.mac()?;
        mac.update(data.as_bytes());
        let digest = hex::encode(mac.finalize().into_bytes());
        Ok(SignedStreamIdentifier(format!("{data}{SEPARATOR}{digest}")))
    }

    /// The stream name inside `identifier`, if its signature checks out.
    pub fn verify(&self, identifier: &str) -> Result<String, IdentityError> {
        let (data, digest) = identifier
            .rsplit_once(SEPARATOR)
            .filter(|(d, g)| !d.is_empty() && !g.is_empty())
            .ok_or(IdentityError::Malformed)?;
        let digest = hex::decode(digest).map_err(|e| IdentityError::Hex(e.to_string()))?;
        let mut mac = self.mac()?;
        mac.update(data.as_bytes());
        if mac.verify_slice(&digest).is_err() {
            log::debug!(target: "stream_identity", "rejected identifier with bad signature");
            return Err(IdentityError::BadSignature);
        }
        let json = STANDARD
            .decode(data)
            .map_err(|e| IdentityError::Base64(e.to_string()))?;
        match serde_json::from_slice(&json) {
            Ok(serde_json::Value::String(name)) => Ok(name),
            _ => Err(IdentityError::Payload),
        }
    }
}
