//! Estado compartilhado entre os handlers

use std::sync::Arc;

use anyhow::Result;
use evolution_core::{
    attachments::PreparedAttachment, crypto::EncryptionKey, Clinic, DbError, DomainError, Store,
};
use tokio::sync::RwLock;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::BridgeConfig;
use crate::error::ApiError;

#[derive(Clone)]
pub struct AppState {
    pub clinic: Arc<RwLock<Clinic>>,
    pub store: Arc<Store>,
    /// Chave de dados dos anexos; ausente quando não há senha configurada
    pub data_key: Option<Arc<EncryptionKey>>,
}

impl AppState {
    pub fn new(clinic: Clinic, store: Store, data_key: Option<EncryptionKey>) -> Self {
        Self {
            clinic: Arc::new(RwLock::new(clinic)),
            store: Arc::new(store),
            data_key: data_key.map(Arc::new),
        }
    }

    /// Abre o banco, carrega a clínica e obtém a chave dos anexos
    pub async fn initialise(config: &BridgeConfig) -> Result<Self> {
        let store = Store::open(&config.db).await?;
        let mut clinic = store.load_clinic().await?;

        if clinic.is_empty() && config.seed {
            clinic = Clinic::with_demo_data()?;
            store.save_clinic(&clinic).await?;
            info!("Banco vazio populado com os dados de demonstração");
        }

        let data_key = if config.db.key_phrase.is_empty() {
            warn!("EVOLUTION_KEY_PHRASE ausente: anexos serão gravados sem criptografia");
            None
        } else {
            Some(store.master_key(&config.db.key_phrase).await?)
        };

        Ok(Self::new(clinic, store, data_key))
    }

    /// Aplica a alteração sobre uma cópia, grava e só então publica.
    /// Uma falha em qualquer etapa deixa o estado anterior intacto.
    pub async fn mutate<T, F>(&self, alterar: F) -> Result<T, ApiError>
    where
        F: FnOnce(&mut Clinic) -> Result<T, DomainError>,
    {
        self.apply(None, alterar).await
    }

    /// Como [`AppState::mutate`], gravando o conteúdo do anexo na mesma
    /// transação das coleções
    pub async fn mutate_with_attachment<T, F>(
        &self,
        exame_id: Uuid,
        preparado: &PreparedAttachment,
        alterar: F,
    ) -> Result<T, ApiError>
    where
        F: FnOnce(&mut Clinic) -> Result<T, DomainError>,
    {
        self.apply(Some((exame_id, preparado)), alterar).await
    }

    async fn apply<T, F>(
        &self,
        anexo: Option<(Uuid, &PreparedAttachment)>,
        alterar: F,
    ) -> Result<T, ApiError>
    where
        F: FnOnce(&mut Clinic) -> Result<T, DomainError>,
    {
        let mut clinic = self.clinic.write().await;
        let mut candidata = clinic.clone();
        let resultado = alterar(&mut candidata)?;

        let gravado = match anexo {
            Some((exame_id, preparado)) => {
                self.store
                    .save_clinic_with_attachment(
                        &candidata,
                        exame_id,
                        &preparado.arquivo,
                        &preparado.content,
                    )
                    .await
            }
            None => self.store.save_clinic(&candidata).await,
        };

        if let Err(erro) = gravado {
            // outro processo gravou: a próxima requisição parte do banco atual
            if let Some(DbError::ConstraintViolation(motivo)) = erro.downcast_ref::<DbError>() {
                warn!("Gravação recusada ({}); recarregando a clínica", motivo);
                match self.store.load_clinic().await {
                    Ok(atual) => *clinic = atual,
                    Err(e) => error!("Falha ao recarregar a clínica: {:#}", e),
                }
            }
            return Err(erro.into());
        }

        *clinic = candidata;
        Ok(resultado)
    }
}
