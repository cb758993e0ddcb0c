//! Persistência da clínica em SQLite
//!
//! Cada coleção é guardada como um documento JSON na tabela `collections`,
//! com uma revisão que só avança por atualização condicional: dois
//! processos gravando a partir da mesma revisão não se sobrescrevem, o
//! segundo recebe `DbError::ConstraintViolation`.

use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::{bail, Context, Result};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::attachments::StoredContent;
use crate::clinic::Clinic;
use crate::crypto::{self, EncryptedData, EncryptionKey, WrappedKey};
use crate::error::DbError;
use crate::models::{AvaliacaoFisica, ArquivoExame, Cliente, Exame, Protocolo};
use crate::repository::{Entity, Repository};
use crate::{init_db_pool, DbConfig};

pub struct Store {
    pool: SqlitePool,
    /// Última revisão lida ou gravada por coleção
    revisions: Mutex<HashMap<&'static str, i64>>,
}

impl Store {
    pub async fn open(config: &DbConfig) -> Result<Self> {
        let pool = init_db_pool(config).await?;
        Ok(Self {
            pool,
            revisions: Mutex::new(HashMap::new()),
        })
    }

    fn revision(&self, collection: &'static str) -> i64 {
        let revisions = self.revisions.lock().unwrap_or_else(|e| e.into_inner());
        revisions.get(collection).copied().unwrap_or(0)
    }

    fn remember(&self, collection: &'static str, revision: i64) {
        let mut revisions = self.revisions.lock().unwrap_or_else(|e| e.into_inner());
        revisions.insert(collection, revision);
    }

    async fn load_collection<T: Entity>(&self) -> Result<Repository<T>> {
        let row: Option<(String, i64)> =
            sqlx::query_as("SELECT document, revision FROM collections WHERE name = ?")
                .bind(T::COLLECTION)
                .fetch_optional(&self.pool)
                .await
                .map_err(DbError::from)?;

        let (records, revision) = match row {
            Some((document, revision)) => {
                let records: Vec<T> = serde_json::from_str(&document)
                    .with_context(|| format!("Documento inválido na coleção {}", T::COLLECTION))?;
                (records, revision)
            }
            None => (Vec::new(), 0),
        };
        self.remember(T::COLLECTION, revision);
        debug!(
            "Coleção {} carregada: {} registros (revisão {})",
            T::COLLECTION,
            records.len(),
            revision
        );
        Ok(Repository::from_records(records))
    }

    /// Carrega as quatro coleções; coleções ausentes começam vazias
    pub async fn load_clinic(&self) -> Result<Clinic> {
        Ok(Clinic::from_parts(
            self.load_collection::<Cliente>().await?,
            self.load_collection::<AvaliacaoFisica>().await?,
            self.load_collection::<Exame>().await?,
            self.load_collection::<Protocolo>().await?,
        ))
    }

    /// Grava as quatro coleções em uma única transação
    pub async fn save_clinic(&self, clinic: &Clinic) -> Result<()> {
        self.commit_clinic(clinic, None).await
    }

    /// Grava a clínica e o conteúdo de um anexo novo na mesma transação:
    /// se a revisão estiver desatualizada, nenhum dos dois é gravado
    pub async fn save_clinic_with_attachment(
        &self,
        clinic: &Clinic,
        exame_id: Uuid,
        arquivo: &ArquivoExame,
        content: &StoredContent,
    ) -> Result<()> {
        self.commit_clinic(clinic, Some((exame_id, arquivo, content)))
            .await
    }

    async fn commit_clinic(
        &self,
        clinic: &Clinic,
        anexo: Option<(Uuid, &ArquivoExame, &StoredContent)>,
    ) -> Result<()> {
        let mut transaction = self
            .pool
            .begin()
            .await
            .context("Falha ao iniciar transação de gravação")?;

        let clientes = self.revision(Cliente::COLLECTION);
        let avaliacoes = self.revision(AvaliacaoFisica::COLLECTION);
        let exames = self.revision(Exame::COLLECTION);
        let protocolos = self.revision(Protocolo::COLLECTION);

        let clientes = save_collection(&mut transaction, clinic.clientes(), clientes).await?;
        let avaliacoes = save_collection(&mut transaction, clinic.avaliacoes(), avaliacoes).await?;
        let exames = save_collection(&mut transaction, clinic.exames(), exames).await?;
        let protocolos = save_collection(&mut transaction, clinic.protocolos(), protocolos).await?;

        if let Some((exame_id, arquivo, content)) = anexo {
            insert_attachment_content(&mut transaction, exame_id, arquivo, content)
                .await
                .with_context(|| format!("Falha ao gravar o anexo {}", arquivo.id))?;
        }
        let removidos = prune_attachment_contents(&mut transaction, clinic.exames()).await?;

        transaction
            .commit()
            .await
            .context("Falha ao confirmar gravação das coleções")?;

        self.remember(Cliente::COLLECTION, clientes);
        self.remember(AvaliacaoFisica::COLLECTION, avaliacoes);
        self.remember(Exame::COLLECTION, exames);
        self.remember(Protocolo::COLLECTION, protocolos);
        if removidos > 0 {
            debug!("{} anexo(s) sem exame removido(s)", removidos);
        }
        debug!("Clínica gravada");
        Ok(())
    }

    pub async fn load_attachment_content(&self, arquivo_id: Uuid) -> Result<StoredContent> {
        let row: Option<(bool, Vec<u8>, Option<Vec<u8>>)> =
            sqlx::query_as("SELECT encrypted, content, nonce FROM exam_files WHERE id = ?")
                .bind(arquivo_id.to_string())
                .fetch_optional(&self.pool)
                .await
                .map_err(DbError::from)?;

        match row {
            None => Err(DbError::NotFound(format!("Anexo {}", arquivo_id)).into()),
            Some((false, bytes, _)) => Ok(StoredContent::Plain(bytes)),
            Some((true, ciphertext, Some(nonce))) => {
                Ok(StoredContent::Sealed(EncryptedData { ciphertext, nonce }))
            }
            Some((true, _, None)) => {
                Err(DbError::CryptoError(format!("Anexo {} sem nonce", arquivo_id)).into())
            }
        }
    }

    /// Chave de dados dos anexos. Criada e embrulhada na primeira chamada;
    /// nas seguintes é desembrulhada com a mesma senha.
    pub async fn master_key(&self, passphrase: &str) -> Result<EncryptionKey> {
        if passphrase.is_empty() {
            bail!("A senha do administrador não pode ser vazia");
        }

        let active: Option<(Vec<u8>, Vec<u8>, Vec<u8>)> = sqlx::query_as(
            "SELECT wrapped_key_ciphertext, wrapped_key_nonce, kdf_salt FROM master_keys \
             WHERE active = 1 ORDER BY key_version DESC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::from)?;

        if let Some((ciphertext, nonce, salt)) = active {
            let wrapped = WrappedKey {
                data: EncryptedData { ciphertext, nonce },
                salt,
            };
            return crypto::unwrap_key(&wrapped, passphrase).map_err(|e| {
                warn!("Falha ao desembrulhar a chave mestra");
                DbError::CryptoError(format!("Senha do administrador incorreta: {}", e)).into()
            });
        }

        let key = EncryptionKey::generate();
        let wrapped = crypto::wrap_key(&key, passphrase)?;
        sqlx::query(
            "INSERT INTO master_keys \
             (active, wrapped_key_ciphertext, wrapped_key_nonce, kdf_salt, key_version) \
             VALUES (1, ?, ?, ?, 1)",
        )
        .bind(&wrapped.data.ciphertext)
        .bind(&wrapped.data.nonce)
        .bind(&wrapped.salt)
        .execute(&self.pool)
        .await
        .map_err(DbError::from)
        .context("Falha ao gravar a chave mestra")?;

        info!("Chave mestra criada");
        Ok(key)
    }
}

/// Grava a coleção se a revisão no banco ainda for `expected`; devolve a
/// nova revisão
async fn save_collection<T: Entity>(
    conn: &mut SqliteConnection,
    repository: &Repository<T>,
    expected: i64,
) -> Result<i64, DbError> {
    let document = serde_json::to_string(repository.records())?;

    let updated = sqlx::query(
        "UPDATE collections SET document = ?, revision = revision + 1, \
         updated_at = CURRENT_TIMESTAMP WHERE name = ? AND revision = ?",
    )
    .bind(&document)
    .bind(T::COLLECTION)
    .bind(expected)
    .execute(&mut *conn)
    .await?;
    if updated.rows_affected() == 1 {
        return Ok(expected + 1);
    }

    if expected == 0 {
        let inserted = sqlx::query(
            "INSERT INTO collections (name, document, revision) VALUES (?, ?, 1) \
             ON CONFLICT(name) DO NOTHING",
        )
        .bind(T::COLLECTION)
        .bind(&document)
        .execute(&mut *conn)
        .await?;
        if inserted.rows_affected() == 1 {
            return Ok(1);
        }
    }

    Err(DbError::ConstraintViolation(format!(
        "coleção {} alterada por outro processo (revisão esperada {})",
        T::COLLECTION,
        expected
    )))
}

async fn insert_attachment_content(
    conn: &mut SqliteConnection,
    exame_id: Uuid,
    arquivo: &ArquivoExame,
    content: &StoredContent,
) -> Result<(), DbError> {
    let (bytes, nonce) = match content {
        StoredContent::Plain(bytes) => (bytes.as_slice(), None),
        StoredContent::Sealed(sealed) => (sealed.ciphertext.as_slice(), Some(sealed.nonce.as_slice())),
    };

    sqlx::query(
        "INSERT INTO exam_files (id, exam_id, encrypted, content, nonce, checksum) \
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(arquivo.id.to_string())
    .bind(exame_id.to_string())
    .bind(content.encrypted())
    .bind(bytes)
    .bind(nonce)
    .bind(&arquivo.checksum)
    .execute(&mut *conn)
    .await?;

    debug!("Anexo {} gravado para o exame {}", arquivo.id, exame_id);
    Ok(())
}

/// Apaga o conteúdo dos anexos que nenhum exame referencia mais (exame
/// excluído ou anexo retirado da lista `arquivos`)
async fn prune_attachment_contents(
    conn: &mut SqliteConnection,
    exames: &Repository<Exame>,
) -> Result<u64, DbError> {
    let referenciados: Vec<String> = exames
        .iter()
        .flat_map(|exame| exame.arquivos.iter().map(|arquivo| arquivo.id.to_string()))
        .collect();

    let removidos = sqlx::query(
        "DELETE FROM exam_files WHERE id NOT IN (SELECT value FROM json_each(?))",
    )
    .bind(serde_json::to_string(&referenciados)?)
    .execute(&mut *conn)
    .await?;
    Ok(removidos.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attachments::{open_attachment, seal_attachment};
    use tempfile::tempdir;

    fn config(dir: &tempfile::TempDir) -> DbConfig {
        DbConfig {
            db_path: dir.path().join("evolution.db").to_string_lossy().to_string(),
            max_connections: 2,
            ..DbConfig::default()
        }
    }

    #[tokio::test]
    async fn test_save_and_load_round_trip() -> Result<()> {
        let dir = tempdir()?;
        let store = Store::open(&config(&dir)).await?;
        assert!(store.load_clinic().await?.is_empty());

        let clinic = Clinic::with_demo_data()?;
        store.save_clinic(&clinic).await?;

        let reaberto = Store::open(&config(&dir)).await?;
        let carregada = reaberto.load_clinic().await?;
        assert_eq!(carregada.clientes().records(), clinic.clientes().records());
        assert_eq!(carregada.avaliacoes().records(), clinic.avaliacoes().records());
        assert_eq!(carregada.exames().records(), clinic.exames().records());
        assert_eq!(carregada.protocolos().records(), clinic.protocolos().records());
        Ok(())
    }

    #[tokio::test]
    async fn test_stale_revision_is_rejected() -> Result<()> {
        let dir = tempdir()?;
        let primeiro = Store::open(&config(&dir)).await?;
        let mut clinic = Clinic::with_demo_data()?;
        primeiro.save_clinic(&clinic).await?;

        let segundo = Store::open(&config(&dir)).await?;
        let outra = segundo.load_clinic().await?;
        segundo.save_clinic(&outra).await?;

        clinic.create_client(crate::models::Cliente {
            email: "novo@email.com".to_string(),
            ..crate::demo::cliente_maria()
        })?;
        let err = primeiro.save_clinic(&clinic).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DbError>(),
            Some(DbError::ConstraintViolation(_))
        ));

        // quem relê a revisão atual volta a gravar
        let atual = primeiro.load_clinic().await?;
        primeiro.save_clinic(&atual).await?;
        Ok(())
    }

    async fn count_attachment_contents(store: &Store) -> Result<i64> {
        let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM exam_files")
            .fetch_one(&store.pool)
            .await?;
        Ok(total)
    }

    /// Clínica de demonstração com um anexo cifrado no hemograma, já gravada
    async fn clinic_with_attachment(store: &Store) -> Result<(Clinic, Uuid, Uuid)> {
        let key = store.master_key("senha-do-admin").await?;
        let mut clinic = Clinic::with_demo_data()?;
        store.save_clinic(&clinic).await?;

        let exame_id = clinic.exames().records()[0].id();
        let preparado = seal_attachment(exame_id, "laudo.pdf", b"%PDF-1.4", Some(&key))?;
        clinic.add_attachment(exame_id, preparado.arquivo.clone())?;
        store
            .save_clinic_with_attachment(&clinic, exame_id, &preparado.arquivo, &preparado.content)
            .await?;
        Ok((clinic, exame_id, preparado.arquivo.id))
    }

    #[tokio::test]
    async fn test_attachment_content_round_trip() -> Result<()> {
        let dir = tempdir()?;
        let store = Store::open(&config(&dir)).await?;
        let (clinic, exame_id, arquivo_id) = clinic_with_attachment(&store).await?;
        let key = store.master_key("senha-do-admin").await?;

        let arquivo = &clinic.get_exam(exame_id)?.arquivos[0];
        let guardado = store.load_attachment_content(arquivo_id).await?;
        assert!(guardado.encrypted());
        let bytes = open_attachment(arquivo, &guardado, Some(&key))?;
        assert_eq!(bytes, b"%PDF-1.4");

        assert!(store.load_attachment_content(Uuid::new_v4()).await.is_err());
        Ok(())
    }

    #[tokio::test]
    async fn test_stale_revision_keeps_attachment_out() -> Result<()> {
        let dir = tempdir()?;
        let store = Store::open(&config(&dir)).await?;
        let mut clinic = Clinic::with_demo_data()?;
        store.save_clinic(&clinic).await?;

        let externo = Store::open(&config(&dir)).await?;
        let outra = externo.load_clinic().await?;
        externo.save_clinic(&outra).await?;

        let exame_id = clinic.exames().records()[0].id();
        let preparado = seal_attachment(exame_id, "laudo.pdf", b"%PDF-1.4", None)?;
        clinic.add_attachment(exame_id, preparado.arquivo.clone())?;
        let err = store
            .save_clinic_with_attachment(&clinic, exame_id, &preparado.arquivo, &preparado.content)
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DbError>(),
            Some(DbError::ConstraintViolation(_))
        ));

        assert_eq!(count_attachment_contents(&store).await?, 0);
        assert!(store.load_attachment_content(preparado.arquivo.id).await.is_err());
        Ok(())
    }

    #[tokio::test]
    async fn test_deleting_exam_removes_its_contents() -> Result<()> {
        let dir = tempdir()?;
        let store = Store::open(&config(&dir)).await?;
        let (mut clinic, exame_id, arquivo_id) = clinic_with_attachment(&store).await?;
        assert_eq!(count_attachment_contents(&store).await?, 1);

        clinic.delete_exam(exame_id)?;
        store.save_clinic(&clinic).await?;

        assert_eq!(count_attachment_contents(&store).await?, 0);
        assert!(store.load_attachment_content(arquivo_id).await.is_err());
        Ok(())
    }

    #[tokio::test]
    async fn test_dropping_attachment_removes_its_content() -> Result<()> {
        let dir = tempdir()?;
        let store = Store::open(&config(&dir)).await?;
        let (mut clinic, exame_id, arquivo_id) = clinic_with_attachment(&store).await?;

        let versao = clinic.get_exam(exame_id)?.carimbo.versao;
        clinic.update_exam(exame_id, serde_json::json!({ "arquivos": [] }), Some(versao))?;
        store.save_clinic(&clinic).await?;

        assert!(clinic.get_exam(exame_id)?.arquivos.is_empty());
        assert_eq!(count_attachment_contents(&store).await?, 0);
        assert!(store.load_attachment_content(arquivo_id).await.is_err());
        Ok(())
    }

    #[tokio::test]
    async fn test_master_key_is_stable_per_passphrase() -> Result<()> {
        let dir = tempdir()?;
        let store = Store::open(&config(&dir)).await?;

        let criada = store.master_key("senha-do-admin").await?;
        let relida = store.master_key("senha-do-admin").await?;
        assert_eq!(criada.as_bytes(), relida.as_bytes());

        assert!(store.master_key("outra-senha").await.is_err());
        assert!(store.master_key("").await.is_err());
        Ok(())
    }
}
