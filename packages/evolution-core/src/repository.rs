//! Repositório genérico em memória
//!
//! Mantém as entidades na ordem de inserção e oferece CRUD, busca textual
//! sem distinção de maiúsculas e paginação por deslocamento. Cada instância
//! é construída explicitamente e pertence a quem a criou (em geral o
//! [`Clinic`](crate::clinic::Clinic)); não há estado global.

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;
use crate::models::{AvaliacaoFisica, Carimbo, Cliente, Exame, Protocolo};

/// Campos controlados pelo repositório, ignorados em atualizações parciais
const CAMPOS_PROTEGIDOS: [&str; 4] = ["id", "createdAt", "updatedAt", "versao"];

/// Entidade armazenável
pub trait Entity: Clone + Serialize + DeserializeOwned {
    /// Nome usado em mensagens de erro
    const NAME: &'static str;
    /// Nome da coleção persistida
    const COLLECTION: &'static str;

    fn carimbo(&self) -> &Carimbo;
    fn carimbo_mut(&mut self) -> &mut Carimbo;

    /// Campos de texto considerados pela busca
    fn search_fields(&self) -> Vec<&str>;

    fn id(&self) -> Uuid {
        self.carimbo().id
    }

    fn matches(&self, termo_minusculo: &str) -> bool {
        self.search_fields()
            .iter()
            .any(|campo| campo.to_lowercase().contains(termo_minusculo))
    }
}

/// Parâmetros de listagem
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListQuery {
    /// Página, a partir de zero
    #[serde(default)]
    pub page: usize,
    #[serde(default = "default_page_size")]
    pub size: usize,
    #[serde(default)]
    pub search: Option<String>,
}

fn default_page_size() -> usize {
    10
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            page: 0,
            size: default_page_size(),
            search: None,
        }
    }
}

impl ListQuery {
    pub fn page(page: usize, size: usize) -> Self {
        Self {
            page,
            size,
            search: None,
        }
    }

    pub fn with_search(mut self, termo: impl Into<String>) -> Self {
        self.search = Some(termo.into());
        self
    }

    /// Termo de busca normalizado; vazio ou só espaços equivale a nenhum
    fn termo(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_lowercase)
    }
}

/// Página de resultados
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    pub total_elements: usize,
    pub total_pages: usize,
    pub size: usize,
    pub number: usize,
    pub first: bool,
    pub last: bool,
}

impl<T> Page<T> {
    /// Recorta `itens` (já filtrados e ordenados) na página pedida
    pub fn paginate(itens: Vec<T>, page: usize, size: usize) -> Result<Self, DomainError> {
        if size == 0 {
            return Err(DomainError::InvalidPagination(
                "tamanho da página deve ser maior que zero".to_string(),
            ));
        }
        let total_elements = itens.len();
        let inicio = page.saturating_mul(size);
        let fim = inicio.saturating_add(size);
        let content = itens.into_iter().skip(inicio).take(size).collect();
        Ok(Self {
            content,
            total_elements,
            total_pages: total_elements.div_ceil(size),
            size,
            number: page,
            first: page == 0,
            last: fim >= total_elements,
        })
    }
}

/// Aplica `patch` sobre `entity` como um espalhamento de objeto: chaves
/// presentes substituem as atuais, as demais permanecem. Os campos do
/// carimbo nunca são alterados por aqui.
pub fn merge_patch<T: Entity>(entity: &mut T, patch: &serde_json::Value) -> Result<(), DomainError> {
    let serde_json::Value::Object(campos) = patch else {
        return Err(DomainError::InvalidPatch(
            "a atualização deve ser um objeto JSON".to_string(),
        ));
    };
    let mut documento = serde_json::to_value(&*entity)?;
    if let Some(alvo) = documento.as_object_mut() {
        for (chave, valor) in campos {
            if !CAMPOS_PROTEGIDOS.contains(&chave.as_str()) {
                alvo.insert(chave.clone(), valor.clone());
            }
        }
    }
    *entity =
        serde_json::from_value(documento).map_err(|e| DomainError::InvalidPatch(e.to_string()))?;
    Ok(())
}

/// Coleção ordenada de entidades de um tipo
#[derive(Debug, Clone)]
pub struct Repository<T: Entity> {
    items: Vec<T>,
}

impl<T: Entity> Default for Repository<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Entity> Repository<T> {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Reconstrói a coleção a partir de registros já carimbados
    pub fn from_records(items: Vec<T>) -> Self {
        Self { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    pub fn records(&self) -> &[T] {
        &self.items
    }

    fn position(&self, id: Uuid) -> Result<usize, DomainError> {
        self.items
            .iter()
            .position(|item| item.id() == id)
            .ok_or_else(|| DomainError::not_found(T::NAME, id))
    }

    pub fn get(&self, id: Uuid) -> Result<&T, DomainError> {
        self.position(id).map(|i| &self.items[i])
    }

    /// Lista com busca textual, filtro opcional e paginação
    pub fn list<F>(&self, query: &ListQuery, filter: F) -> Result<Page<T>, DomainError>
    where
        F: Fn(&T) -> bool,
    {
        let termo = query.termo();
        let selecionados: Vec<T> = self
            .items
            .iter()
            .filter(|item| filter(item))
            .filter(|item| termo.as_deref().map_or(true, |t| item.matches(t)))
            .cloned()
            .collect();
        Page::paginate(selecionados, query.page, query.size)
    }

    /// Insere com novo id, carimbos de criação/atualização e versão 1
    pub fn create(&mut self, mut entity: T) -> T {
        let agora = Utc::now();
        *entity.carimbo_mut() = Carimbo {
            id: Uuid::new_v4(),
            created_at: agora,
            updated_at: agora,
            versao: 1,
        };
        self.items.push(entity.clone());
        entity
    }

    /// Mescla um objeto JSON parcial sobre o registro (mesclagem rasa)
    pub fn update(
        &mut self,
        id: Uuid,
        patch: serde_json::Value,
        expected_version: Option<u64>,
    ) -> Result<T, DomainError> {
        self.update_with(id, expected_version, |entity| merge_patch(entity, &patch))
    }

    /// Atualização tipada. O carimbo original é restaurado depois da
    /// alteração; só `updatedAt` e `versao` avançam.
    pub fn update_with<F>(
        &mut self,
        id: Uuid,
        expected_version: Option<u64>,
        alterar: F,
    ) -> Result<T, DomainError>
    where
        F: FnOnce(&mut T) -> Result<(), DomainError>,
    {
        let indice = self.position(id)?;
        let carimbo = self.items[indice].carimbo().clone();
        if let Some(esperada) = expected_version {
            if esperada != carimbo.versao {
                return Err(DomainError::VersionConflict {
                    id,
                    expected: esperada,
                    actual: carimbo.versao,
                });
            }
        }

        let mut candidato = self.items[indice].clone();
        alterar(&mut candidato)?;
        *candidato.carimbo_mut() = Carimbo {
            updated_at: Utc::now(),
            versao: carimbo.versao + 1,
            ..carimbo
        };
        self.items[indice] = candidato.clone();
        Ok(candidato)
    }

    pub fn delete(&mut self, id: Uuid) -> Result<T, DomainError> {
        let indice = self.position(id)?;
        Ok(self.items.remove(indice))
    }
}

impl Entity for Cliente {
    const NAME: &'static str = "Cliente";
    const COLLECTION: &'static str = "clientes";

    fn carimbo(&self) -> &Carimbo {
        &self.carimbo
    }

    fn carimbo_mut(&mut self) -> &mut Carimbo {
        &mut self.carimbo
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.nome.as_str(),
            self.email.as_str(),
            self.modalidade.as_str(),
        ]
    }
}

impl Entity for AvaliacaoFisica {
    const NAME: &'static str = "Avaliação";
    const COLLECTION: &'static str = "avaliacoes";

    fn carimbo(&self) -> &Carimbo {
        &self.carimbo
    }

    fn carimbo_mut(&mut self) -> &mut Carimbo {
        &mut self.carimbo
    }

    fn search_fields(&self) -> Vec<&str> {
        // tipo e status entram pelo nome serializado
        let mut campos = vec![tipo_texto(self), status_texto(self)];
        if let Some(cliente) = &self.cliente {
            campos.push(&cliente.nome);
        }
        campos
    }
}

fn tipo_texto(avaliacao: &AvaliacaoFisica) -> &'static str {
    use crate::models::TipoAvaliacao::*;
    match avaliacao.tipo {
        Inicial => "INICIAL",
        Reavaliacao => "REAVALIACAO",
        Controle => "CONTROLE",
    }
}

fn status_texto(avaliacao: &AvaliacaoFisica) -> &'static str {
    use crate::models::StatusAvaliacao::*;
    match avaliacao.status {
        Agendada => "AGENDADA",
        Realizada => "REALIZADA",
        Cancelada => "CANCELADA",
    }
}

impl Entity for Exame {
    const NAME: &'static str = "Exame";
    const COLLECTION: &'static str = "exames";

    fn carimbo(&self) -> &Carimbo {
        &self.carimbo
    }

    fn carimbo_mut(&mut self) -> &mut Carimbo {
        &mut self.carimbo
    }

    fn search_fields(&self) -> Vec<&str> {
        let mut campos = vec![
            self.tipo_exame.nome.as_str(),
            self.laboratorio.nome.as_str(),
            self.medico_solicitante.as_str(),
        ];
        if let Some(cliente) = &self.cliente {
            campos.push(&cliente.nome);
        }
        campos
    }
}

impl Entity for Protocolo {
    const NAME: &'static str = "Protocolo";
    const COLLECTION: &'static str = "protocolos";

    fn carimbo(&self) -> &Carimbo {
        &self.carimbo
    }

    fn carimbo_mut(&mut self) -> &mut Carimbo {
        &mut self.carimbo
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.nome.as_str(),
            self.descricao.as_str(),
            self.objetivo.as_str(),
        ]
    }
}
