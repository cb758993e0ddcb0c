//! Anexos de exames
//!
//! Prepara o conteúdo de um arquivo para armazenamento: calcula o checksum
//! do original, deduz o tipo e, havendo chave de dados, sela o conteúdo com
//! AES-256-GCM. A flag `criptografado` reflete exatamente o que foi feito.

use anyhow::{bail, Result};
use chrono::Utc;
use uuid::Uuid;

use crate::crypto::{self, EncryptedData, EncryptionKey};
use crate::models::{ArquivoExame, TipoArquivo};

/// Conteúdo como fica guardado no armazenamento
#[derive(Debug, Clone, PartialEq)]
pub enum StoredContent {
    Plain(Vec<u8>),
    Sealed(EncryptedData),
}

impl StoredContent {
    pub fn encrypted(&self) -> bool {
        matches!(self, StoredContent::Sealed(_))
    }
}

/// Anexo pronto: metadados para o exame e conteúdo para o armazenamento
#[derive(Debug, Clone)]
pub struct PreparedAttachment {
    pub arquivo: ArquivoExame,
    pub content: StoredContent,
}

/// Prepara um anexo do exame `exame_id`
pub fn seal_attachment(
    exame_id: Uuid,
    nome: &str,
    bytes: &[u8],
    key: Option<&EncryptionKey>,
) -> Result<PreparedAttachment> {
    let id = Uuid::new_v4();
    let content = match key {
        Some(key) => StoredContent::Sealed(crypto::encrypt(bytes, key)?),
        None => StoredContent::Plain(bytes.to_vec()),
    };

    let arquivo = ArquivoExame {
        id,
        nome: nome.to_string(),
        tipo: TipoArquivo::pelo_nome(nome),
        url: format!("exames/{}/arquivos/{}", exame_id, id),
        tamanho: bytes.len() as u64,
        data_upload: Utc::now(),
        checksum: crypto::checksum(bytes),
        criptografado: content.encrypted(),
    };

    Ok(PreparedAttachment { arquivo, content })
}

/// Recupera o conteúdo original e confere o checksum registrado
pub fn open_attachment(
    arquivo: &ArquivoExame,
    content: &StoredContent,
    key: Option<&EncryptionKey>,
) -> Result<Vec<u8>> {
    let bytes = match (content, key) {
        (StoredContent::Plain(bytes), _) => bytes.clone(),
        (StoredContent::Sealed(sealed), Some(key)) => crypto::decrypt(sealed, key)?,
        (StoredContent::Sealed(_), None) => {
            bail!("Anexo {} está criptografado e nenhuma chave foi fornecida", arquivo.id)
        }
    };

    let atual = crypto::checksum(&bytes);
    if atual != arquivo.checksum {
        bail!(
            "Checksum divergente para o anexo {}: esperado {}, obtido {}",
            arquivo.id,
            arquivo.checksum,
            atual
        );
    }
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sealed_attachment_round_trip() -> Result<()> {
        let key = EncryptionKey::generate();
        let bytes = b"%PDF-1.4 laudo";
        let preparado = seal_attachment(Uuid::new_v4(), "hemograma.pdf", bytes, Some(&key))?;

        assert!(preparado.arquivo.criptografado);
        assert_eq!(preparado.arquivo.tipo, TipoArquivo::Pdf);
        assert_eq!(preparado.arquivo.tamanho, bytes.len() as u64);
        assert!(preparado.arquivo.checksum.starts_with("sha256:"));
        match &preparado.content {
            StoredContent::Sealed(sealed) => assert_ne!(sealed.ciphertext.as_slice(), bytes),
            StoredContent::Plain(_) => panic!("conteúdo deveria estar selado"),
        }

        let aberto = open_attachment(&preparado.arquivo, &preparado.content, Some(&key))?;
        assert_eq!(aberto, bytes);
        assert!(open_attachment(&preparado.arquivo, &preparado.content, None).is_err());
        Ok(())
    }

    #[test]
    fn test_without_key_is_not_flagged_encrypted() -> Result<()> {
        let preparado = seal_attachment(Uuid::new_v4(), "foto.png", b"png", None)?;
        assert!(!preparado.arquivo.criptografado);
        assert_eq!(preparado.content, StoredContent::Plain(b"png".to_vec()));
        Ok(())
    }

    #[test]
    fn test_tampered_content_fails_checksum() -> Result<()> {
        let preparado = seal_attachment(Uuid::new_v4(), "laudo.txt", b"original", None)?;
        let adulterado = StoredContent::Plain(b"alterado".to_vec());
        let err = open_attachment(&preparado.arquivo, &adulterado, None).unwrap_err();
        assert!(err.to_string().contains("Checksum divergente"));
        Ok(())
    }
}
