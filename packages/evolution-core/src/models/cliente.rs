use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Carimbo;

/// Sexo biológico usado nas tabelas de classificação
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Genero {
    Masculino,
    Feminino,
}

impl std::fmt::Display for Genero {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Genero::Masculino => write!(f, "MASCULINO"),
            Genero::Feminino => write!(f, "FEMININO"),
        }
    }
}

/// Situação cadastral do cliente
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusCliente {
    Ativo,
    Inativo,
}

impl std::fmt::Display for StatusCliente {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatusCliente::Ativo => write!(f, "ATIVO"),
            StatusCliente::Inativo => write!(f, "INATIVO"),
        }
    }
}

/// Cliente acompanhado pela assessoria
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cliente {
    #[serde(flatten)]
    pub carimbo: Carimbo,
    pub nome: String,
    pub email: String,
    pub telefone: String,
    pub data_nascimento: NaiveDate,
    pub genero: Genero,
    /// Modalidade praticada (musculação, corrida, ...)
    pub modalidade: String,
    pub objetivo: String,
    pub status: StatusCliente,
}

impl Cliente {
    pub fn id(&self) -> Uuid {
        self.carimbo.id
    }

    /// Cópia desnormalizada guardada nos registros dependentes
    pub fn resumo(&self) -> ClienteResumo {
        ClienteResumo {
            id: self.carimbo.id,
            nome: self.nome.clone(),
            email: self.email.clone(),
            telefone: self.telefone.clone(),
            data_nascimento: self.data_nascimento,
            genero: self.genero,
        }
    }
}

/// Dados do cliente no momento em que o registro dependente foi criado.
/// Nunca é atualizado depois disso.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClienteResumo {
    pub id: Uuid,
    pub nome: String,
    pub email: String,
    pub telefone: String,
    pub data_nascimento: NaiveDate,
    pub genero: Genero,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cliente_json_shape() -> anyhow::Result<()> {
        let cliente = Cliente {
            carimbo: Carimbo::novo(),
            nome: "João Silva".to_string(),
            email: "joao.silva@email.com".to_string(),
            telefone: "(11) 99999-1111".to_string(),
            data_nascimento: NaiveDate::from_ymd_opt(1990, 5, 15).unwrap(),
            genero: Genero::Masculino,
            modalidade: "Musculação".to_string(),
            objetivo: "Hipertrofia".to_string(),
            status: StatusCliente::Ativo,
        };

        let json = serde_json::to_value(&cliente)?;
        assert_eq!(json["dataNascimento"], "1990-05-15");
        assert_eq!(json["genero"], "MASCULINO");
        assert_eq!(json["status"], "ATIVO");
        assert!(json.get("createdAt").is_some());
        assert_eq!(json["versao"], 0);

        let back: Cliente = serde_json::from_value(json)?;
        assert_eq!(back, cliente);
        Ok(())
    }
}
