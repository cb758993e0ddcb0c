//! Módulo de criptografia para anexos de exames
//!
//! - Conteúdo dos anexos: AES-256-GCM com a chave de dados.
//! - Chave de dados: embrulhada com ChaCha20-Poly1305 sob uma chave derivada
//!   da senha do administrador via Argon2id.

use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    Aes256Gcm, Key, Nonce,
};
use anyhow::Result;
use argon2::Argon2;
use chacha20poly1305::{ChaCha20Poly1305, Key as ChaChaKey, Nonce as ChaChaNonce};
use rand::{rngs::OsRng as RandOsRng, RngCore};
use sha2::{Digest, Sha256};
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Erros específicos para operações de criptografia
#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("Falha na criptografia: {0}")]
    EncryptionFailed(String),

    #[error("Falha na descriptografia: {0}")]
    DecryptionFailed(String),

    #[error("Dados inválidos: {0}")]
    InvalidData(String),

    #[error("Falha na derivação de chave: {0}")]
    KeyDerivation(String),
}

/// Tamanho do nonce em bytes (AES-GCM e ChaCha20-Poly1305)
const NONCE_SIZE: usize = 12;
/// Tamanho do salt da derivação de chave
pub const SALT_SIZE: usize = 16;

/// Chave AES-256 para criptografia (com zeroização automática)
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct EncryptionKey([u8; 32]);

impl EncryptionKey {
    /// Cria uma nova chave aleatória
    pub fn generate() -> Self {
        let mut key = [0u8; 32];
        RandOsRng.fill_bytes(&mut key);
        Self(key)
    }

    /// Cria uma chave a partir de bytes existentes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != 32 {
            return Err(CryptoError::InvalidData(format!(
                "A chave deve ter 32 bytes, recebeu {}",
                bytes.len()
            ))
            .into());
        }

        let mut key = [0u8; 32];
        key.copy_from_slice(bytes);
        Ok(Self(key))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("EncryptionKey(..)")
    }
}

/// Dados criptografados e seu nonce
#[derive(Debug, Clone, PartialEq)]
pub struct EncryptedData {
    pub ciphertext: Vec<u8>,
    pub nonce: Vec<u8>,
}

/// Chave de dados embrulhada, pronta para ser persistida
#[derive(Debug, Clone, PartialEq)]
pub struct WrappedKey {
    pub data: EncryptedData,
    pub salt: Vec<u8>,
}

/// Soma de verificação no formato "sha256:<hex>"
pub fn checksum(data: &[u8]) -> String {
    let digest = Sha256::digest(data);
    let hex: String = digest.iter().map(|b| format!("{:02x}", b)).collect();
    format!("sha256:{}", hex)
}

/// Criptografa dados usando AES-256-GCM
pub fn encrypt(data: &[u8], key: &EncryptionKey) -> Result<EncryptedData> {
    let aes_key = Key::<Aes256Gcm>::from_slice(key.as_bytes());
    let cipher = Aes256Gcm::new(aes_key);

    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

    let ciphertext = cipher
        .encrypt(&nonce, data)
        .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;

    Ok(EncryptedData {
        ciphertext,
        nonce: nonce.to_vec(),
    })
}

/// Descriptografa dados usando AES-256-GCM
pub fn decrypt(encrypted: &EncryptedData, key: &EncryptionKey) -> Result<Vec<u8>> {
    let aes_key = Key::<Aes256Gcm>::from_slice(key.as_bytes());
    let cipher = Aes256Gcm::new(aes_key);

    if encrypted.nonce.len() != NONCE_SIZE {
        return Err(CryptoError::InvalidData(format!(
            "Nonce inválido: esperado {} bytes, recebido {}",
            NONCE_SIZE,
            encrypted.nonce.len()
        ))
        .into());
    }

    let nonce = Nonce::from_slice(&encrypted.nonce);

    let plaintext = cipher
        .decrypt(nonce, encrypted.ciphertext.as_ref())
        .map_err(|e| CryptoError::DecryptionFailed(e.to_string()))?;

    Ok(plaintext)
}

/// Deriva a chave de embrulho a partir da senha com Argon2id
fn derive_wrapping_key(password: &str, salt: &[u8]) -> Result<[u8; 32]> {
    let mut wrapping_key = [0u8; 32];
    Argon2::default()
        .hash_password_into(password.as_bytes(), salt, &mut wrapping_key)
        .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;
    Ok(wrapping_key)
}

/// Embrulha a chave de dados com ChaCha20-Poly1305 sob a senha do admin
pub fn wrap_key(key: &EncryptionKey, password: &str) -> Result<WrappedKey> {
    let mut salt = vec![0u8; SALT_SIZE];
    RandOsRng.fill_bytes(&mut salt);

    let mut wrapping_key = derive_wrapping_key(password, &salt)?;
    let cipher = ChaCha20Poly1305::new(ChaChaKey::from_slice(&wrapping_key));
    wrapping_key.zeroize();

    let mut nonce = [0u8; NONCE_SIZE];
    RandOsRng.fill_bytes(&mut nonce);

    let ciphertext = cipher
        .encrypt(ChaChaNonce::from_slice(&nonce), key.as_bytes())
        .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;

    Ok(WrappedKey {
        data: EncryptedData {
            ciphertext,
            nonce: nonce.to_vec(),
        },
        salt,
    })
}

/// Desembrulha a chave de dados; senha errada resulta em erro
pub fn unwrap_key(wrapped: &WrappedKey, password: &str) -> Result<EncryptionKey> {
    if wrapped.data.nonce.len() != NONCE_SIZE {
        return Err(CryptoError::InvalidData(format!(
            "Nonce inválido: esperado {} bytes, recebido {}",
            NONCE_SIZE,
            wrapped.data.nonce.len()
        ))
        .into());
    }

    let mut wrapping_key = derive_wrapping_key(password, &wrapped.salt)?;
    let cipher = ChaCha20Poly1305::new(ChaChaKey::from_slice(&wrapping_key));
    wrapping_key.zeroize();

    let mut plaintext = cipher
        .decrypt(
            ChaChaNonce::from_slice(&wrapped.data.nonce),
            wrapped.data.ciphertext.as_ref(),
        )
        .map_err(|e| CryptoError::DecryptionFailed(e.to_string()))?;

    let key = EncryptionKey::from_bytes(&plaintext);
    plaintext.zeroize();
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encryption_decryption() -> Result<()> {
        let data = b"Laudo do hemograma";
        let key = EncryptionKey::generate();

        let encrypted = encrypt(data, &key)?;
        assert_ne!(&encrypted.ciphertext, data);

        let decrypted = decrypt(&encrypted, &key)?;
        assert_eq!(&decrypted, data);

        Ok(())
    }

    #[test]
    fn test_key_wrapping() -> Result<()> {
        let original_key = EncryptionKey::generate();
        let password = "senha-forte-do-admin";

        let wrapped = wrap_key(&original_key, password)?;
        assert_eq!(wrapped.salt.len(), SALT_SIZE);

        let unwrapped_key = unwrap_key(&wrapped, password)?;
        assert_eq!(original_key.as_bytes(), unwrapped_key.as_bytes());

        let result = unwrap_key(&wrapped, "senha-errada");
        assert!(result.is_err());

        Ok(())
    }

    #[test]
    fn test_encryption_with_different_keys() -> Result<()> {
        let data = b"Dados de teste";

        let key1 = EncryptionKey::generate();
        let key2 = EncryptionKey::generate();
        assert_ne!(key1.as_bytes(), key2.as_bytes());

        let encrypted = encrypt(data, &key1)?;
        assert!(decrypt(&encrypted, &key2).is_err());

        let decrypted = decrypt(&encrypted, &key1)?;
        assert_eq!(&decrypted, data);

        Ok(())
    }

    #[test]
    fn test_checksum_format() {
        assert_eq!(
            checksum(b"abc"),
            "sha256:ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
