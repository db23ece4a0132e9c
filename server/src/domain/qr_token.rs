use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

const NONCE_LEN: usize = 12;

/// What a ticket QR code carries once decrypted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketClaims {
    pub purchase_id: Uuid,
    pub venue_id: Uuid,
    pub visit_date: NaiveDate,
    pub quantity: i32,
    pub issued_at: DateTime<Utc>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QrTokenError {
    #[error("QR token is not valid base64")]
    Encoding,

    #[error("QR token is too short")]
    Truncated,

    #[error("QR token could not be decrypted")]
    Decryption,

    #[error("QR token payload is malformed")]
    Payload,

    #[error("QR token could not be encrypted")]
    Encryption,
}

/// Seals ticket claims into opaque QR payloads with AES-256-GCM.
///
/// Token layout: `base64url(nonce[12] || ciphertext)`. A fresh random nonce is
/// drawn for every token.
#[derive(Clone)]
pub struct QrCipher {
    cipher: Aes256Gcm,
}

impl QrCipher {
    pub fn new(key: &[u8; 32]) -> Self {
        Self {
            cipher: Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key)),
        }
    }

    pub fn seal(&self, claims: &TicketClaims) -> Result<String, QrTokenError> {
        let plaintext = serde_json::to_vec(claims).map_err(|_| QrTokenError::Payload)?;
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, plaintext.as_slice())
            .map_err(|_| QrTokenError::Encryption)?;

        let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        sealed.extend_from_slice(&nonce);
        sealed.extend_from_slice(&ciphertext);
        Ok(URL_SAFE_NO_PAD.encode(sealed))
    }

    pub fn open(&self, token: &str) -> Result<TicketClaims, QrTokenError> {
        let raw = URL_SAFE_NO_PAD
            .decode(token.trim())
            .map_err(|_| QrTokenError::Encoding)?;
        if raw.len() <= NONCE_LEN {
            return Err(QrTokenError::Truncated);
        }

        let (nonce, ciphertext) = raw.split_at(NONCE_LEN);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| QrTokenError::Decryption)?;

        serde_json::from_slice(&plaintext).map_err(|_| QrTokenError::Payload)
    }
}
