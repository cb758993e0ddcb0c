//! Serviço da clínica
//!
//! `Clinic` é o agregado construído explicitamente que reúne os quatro
//! repositórios (clientes, avaliações, exames e protocolos) e o catálogo de
//! exames. Aplica as regras que dependem de mais de uma coleção: e-mail
//! único, instantâneo do cliente nos registros dependentes, derivação de
//! IMC e classificações, máquina de estados dos exames e alertas.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::comparison::{
    comparar_avaliacoes, comparar_exames, comparar_exames_com_politica, ComparativoAvaliacoes,
    ComparativoExames, TrendPolicy,
};
use crate::demo;
use crate::error::DomainError;
use crate::metrics::{arredondar_1, calcular_imc, classificar_imc, classificar_percentual_gordura};
use crate::models::*;
use crate::repository::{merge_patch, ListQuery, Page, Repository};
use crate::timeseries::{self, GraficoEvolutivo, HistoricoAvaliacoes, Metric, PontoSerie};

/// Recomendações padrão do relatório de exame
const RECOMENDACOES_EXAME: [&str; 3] = [
    "Manter acompanhamento médico regular",
    "Repetir exames conforme orientação médica",
    "Observar sinais de alteração",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EstatisticasClientes {
    pub total: usize,
    pub ativos: usize,
    pub inativos: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstatisticasAvaliacoes {
    pub total: usize,
    pub realizadas: usize,
    pub agendadas: usize,
    /// Média sobre as avaliações realizadas
    pub media_imc: Option<f64>,
    pub media_percentual_gordura: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EstatisticasExames {
    pub total: usize,
    pub pendentes: usize,
    pub concluidos: usize,
    /// Exames com ao menos um resultado alterado
    pub alterados: usize,
    /// Exames com ao menos um resultado crítico
    pub criticos: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstatisticasProtocolos {
    pub total: usize,
    pub pre_definidos: usize,
    pub personalizados: usize,
    pub ativos: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelatorioAvaliacao {
    pub avaliacao: AvaliacaoFisica,
    /// Comparativo com a avaliação anterior mais recente do cliente
    pub comparativo: Option<ComparativoAvaliacoes>,
    pub graficos: HistoricoAvaliacoes,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelatorioExame {
    pub exame: Exame,
    pub historico: Vec<Exame>,
    pub graficos: Vec<GraficoEvolutivo>,
    pub recomendacoes: Vec<String>,
}

/// Filtros da listagem de exames
#[derive(Debug, Clone, Default)]
pub struct ExamFilter {
    pub query: ListQuery,
    pub cliente_id: Option<Uuid>,
    pub status: Option<StatusExame>,
    /// Id ou nome da categoria
    pub categoria: Option<String>,
    /// Data de coleta mínima (inclusiva)
    pub desde: Option<NaiveDate>,
    /// Data de coleta máxima (inclusiva)
    pub ate: Option<NaiveDate>,
}

impl ExamFilter {
    fn aceita(&self, exame: &Exame) -> bool {
        let data = exame.data_coleta.date_naive();
        self.cliente_id.map_or(true, |id| exame.cliente_id == id)
            && self.status.map_or(true, |s| exame.status == s)
            && self.categoria.as_deref().map_or(true, |c| {
                exame.categoria.id == c || exame.categoria.nome.eq_ignore_ascii_case(c)
            })
            && self.desde.map_or(true, |d| data >= d)
            && self.ate.map_or(true, |d| data <= d)
    }
}

#[derive(Debug, Clone)]
pub struct Clinic {
    clientes: Repository<Cliente>,
    avaliacoes: Repository<AvaliacaoFisica>,
    exames: Repository<Exame>,
    protocolos: Repository<Protocolo>,
    tipos_exame: Vec<TipoExame>,
    laboratorios: Vec<Laboratorio>,
    politica: TrendPolicy,
}

impl Default for Clinic {
    fn default() -> Self {
        Self::new()
    }
}

impl Clinic {
    /// Clínica vazia, apenas com o catálogo de exames
    pub fn new() -> Self {
        Self::from_parts(
            Repository::new(),
            Repository::new(),
            Repository::new(),
            Repository::new(),
        )
    }

    /// Reconstrói a clínica a partir de coleções já persistidas
    pub fn from_parts(
        clientes: Repository<Cliente>,
        avaliacoes: Repository<AvaliacaoFisica>,
        exames: Repository<Exame>,
        protocolos: Repository<Protocolo>,
    ) -> Self {
        Self {
            clientes,
            avaliacoes,
            exames,
            protocolos,
            tipos_exame: demo::tipos_exame(),
            laboratorios: demo::laboratorios(),
            politica: TrendPolicy::default(),
        }
    }

    /// Clínica com os registros de demonstração
    pub fn with_demo_data() -> Result<Self, DomainError> {
        let mut clinic = Self::new();
        let joao = clinic.create_client(demo::cliente_joao())?;
        clinic.create_client(demo::cliente_maria())?;
        clinic.create_assessment(demo::avaliacao_joao(joao.id()))?;

        // o hemograma já chega concluído, fora do fluxo de criação
        let mut hemograma = demo::hemograma_joao(joao.id());
        hemograma.cliente = Some(joao.resumo());
        clinic.exames.create(hemograma);

        for protocolo in demo::protocolos_pre_definidos() {
            clinic.create_protocol(protocolo);
        }
        debug!("Dados de demonstração carregados");
        Ok(clinic)
    }

    /// Substitui a política usada em [`Clinic::compare_exams_clinically`]
    pub fn with_trend_policy(mut self, politica: TrendPolicy) -> Self {
        self.politica = politica;
        self
    }

    pub fn clientes(&self) -> &Repository<Cliente> {
        &self.clientes
    }

    pub fn avaliacoes(&self) -> &Repository<AvaliacaoFisica> {
        &self.avaliacoes
    }

    pub fn exames(&self) -> &Repository<Exame> {
        &self.exames
    }

    pub fn protocolos(&self) -> &Repository<Protocolo> {
        &self.protocolos
    }

    pub fn is_empty(&self) -> bool {
        self.clientes.is_empty()
            && self.avaliacoes.is_empty()
            && self.exames.is_empty()
            && self.protocolos.is_empty()
    }

    fn resumo_cliente(&self, cliente_id: Uuid) -> Option<ClienteResumo> {
        self.clientes.get(cliente_id).ok().map(Cliente::resumo)
    }

    // ---- Clientes ----

    pub fn list_clients(&self, query: &ListQuery) -> Result<Page<Cliente>, DomainError> {
        self.clientes.list(query, |_| true)
    }

    pub fn get_client(&self, id: Uuid) -> Result<&Cliente, DomainError> {
        self.clientes.get(id)
    }

    pub fn client_by_email(&self, email: &str) -> Option<&Cliente> {
        let email = email.trim();
        self.clientes
            .iter()
            .find(|c| c.email.trim().eq_ignore_ascii_case(email))
    }

    fn verificar_email_livre(&self, email: &str, dono: Option<Uuid>) -> Result<(), DomainError> {
        match self.client_by_email(email) {
            Some(existente) if Some(existente.id()) != dono => Err(DomainError::DuplicateIdentity(
                format!("e-mail já cadastrado: {}", email.trim()),
            )),
            _ => Ok(()),
        }
    }

    pub fn create_client(&mut self, cliente: Cliente) -> Result<Cliente, DomainError> {
        self.verificar_email_livre(&cliente.email, None)?;
        let criado = self.clientes.create(cliente);
        debug!("Cliente criado: {}", criado.id());
        Ok(criado)
    }

    pub fn update_client(
        &mut self,
        id: Uuid,
        patch: serde_json::Value,
        expected_version: Option<u64>,
    ) -> Result<Cliente, DomainError> {
        if let Some(email) = patch.get("email").and_then(|e| e.as_str()) {
            self.verificar_email_livre(email, Some(id))?;
        }
        let atualizado = self.clientes.update(id, patch, expected_version)?;
        debug!("Cliente atualizado: {} (versão {})", id, atualizado.carimbo.versao);
        Ok(atualizado)
    }

    pub fn set_client_status(
        &mut self,
        id: Uuid,
        status: StatusCliente,
    ) -> Result<Cliente, DomainError> {
        let atualizado = self.clientes.update_with(id, None, |cliente| {
            cliente.status = status;
            Ok(())
        })?;
        debug!("Cliente {} agora {}", id, status);
        Ok(atualizado)
    }

    /// Remove o cliente; avaliações e exames mantêm seu instantâneo
    pub fn delete_client(&mut self, id: Uuid) -> Result<Cliente, DomainError> {
        let removido = self.clientes.delete(id)?;
        debug!("Cliente removido: {}", id);
        Ok(removido)
    }

    pub fn client_stats(&self) -> EstatisticasClientes {
        let ativos = self
            .clientes
            .iter()
            .filter(|c| c.status == StatusCliente::Ativo)
            .count();
        EstatisticasClientes {
            total: self.clientes.len(),
            ativos,
            inativos: self.clientes.len() - ativos,
        }
    }

    // ---- Avaliações ----

    pub fn list_assessments(
        &self,
        query: &ListQuery,
        cliente_id: Option<Uuid>,
    ) -> Result<Page<AvaliacaoFisica>, DomainError> {
        self.avaliacoes
            .list(query, |a| cliente_id.map_or(true, |id| a.cliente_id == id))
    }

    pub fn get_assessment(&self, id: Uuid) -> Result<&AvaliacaoFisica, DomainError> {
        self.avaliacoes.get(id)
    }

    /// Cria a avaliação recalculando IMC e classificações e anexando o
    /// instantâneo do cliente, quando ele existe
    pub fn create_assessment(
        &mut self,
        mut avaliacao: AvaliacaoFisica,
    ) -> Result<AvaliacaoFisica, DomainError> {
        if let Some(resumo) = self.resumo_cliente(avaliacao.cliente_id) {
            avaliacao.cliente = Some(resumo);
        }
        let genero = self.genero_do_cliente(&avaliacao);
        derivar_avaliacao(&mut avaliacao, genero)?;
        let criada = self.avaliacoes.create(avaliacao);
        debug!(
            "Avaliação criada: {} (cliente {}, IMC {})",
            criada.id(),
            criada.cliente_id,
            criada.imc
        );
        Ok(criada)
    }

    fn genero_do_cliente(&self, avaliacao: &AvaliacaoFisica) -> Option<Genero> {
        avaliacao
            .cliente
            .as_ref()
            .map(|c| c.genero)
            .or_else(|| self.clientes.get(avaliacao.cliente_id).ok().map(|c| c.genero))
    }

    pub fn update_assessment(
        &mut self,
        id: Uuid,
        patch: serde_json::Value,
        expected_version: Option<u64>,
    ) -> Result<AvaliacaoFisica, DomainError> {
        let clientes = &self.clientes;
        let atualizada = self.avaliacoes.update_with(id, expected_version, |avaliacao| {
            merge_patch(avaliacao, &patch)?;
            let genero = avaliacao
                .cliente
                .as_ref()
                .map(|c| c.genero)
                .or_else(|| clientes.get(avaliacao.cliente_id).ok().map(|c| c.genero));
            derivar_avaliacao(avaliacao, genero)
        })?;
        debug!("Avaliação atualizada: {} (versão {})", id, atualizada.carimbo.versao);
        Ok(atualizada)
    }

    pub fn delete_assessment(&mut self, id: Uuid) -> Result<AvaliacaoFisica, DomainError> {
        let removida = self.avaliacoes.delete(id)?;
        debug!("Avaliação removida: {}", id);
        Ok(removida)
    }

    /// Todas as avaliações do cliente, da mais recente para a mais antiga
    pub fn assessments_for_client(&self, cliente_id: Uuid) -> Vec<&AvaliacaoFisica> {
        let mut do_cliente: Vec<&AvaliacaoFisica> = self
            .avaliacoes
            .iter()
            .filter(|a| a.cliente_id == cliente_id)
            .collect();
        do_cliente.sort_by(|a, b| {
            (b.data_avaliacao, b.carimbo.created_at).cmp(&(a.data_avaliacao, a.carimbo.created_at))
        });
        do_cliente
    }

    pub fn compare_assessments(
        &self,
        atual_id: Uuid,
        anterior_id: Uuid,
    ) -> Result<ComparativoAvaliacoes, DomainError> {
        let atual = self.avaliacoes.get(atual_id)?;
        let anterior = self.avaliacoes.get(anterior_id)?;
        comparar_avaliacoes(atual, anterior)
    }

    pub fn assessment_evolution(&self, cliente_id: Uuid, metrica: &Metric) -> Vec<PontoSerie> {
        timeseries::evolucao(self.avaliacoes.iter(), cliente_id, metrica)
    }

    pub fn assessment_history(
        &self,
        cliente_id: Uuid,
        desde: Option<NaiveDate>,
        ate: Option<NaiveDate>,
    ) -> HistoricoAvaliacoes {
        timeseries::historico_avaliacoes(self.avaliacoes.iter(), cliente_id, desde, ate)
    }

    /// Relatório da avaliação. O comparativo usa a avaliação mais recente
    /// do cliente com data anterior; fica ausente se não houver uma ou se
    /// os locais de circunferência não coincidirem.
    pub fn assessment_report(&self, id: Uuid) -> Result<RelatorioAvaliacao, DomainError> {
        let avaliacao = self.avaliacoes.get(id)?;
        let anterior = self
            .assessments_for_client(avaliacao.cliente_id)
            .into_iter()
            .find(|a| a.id() != id && a.data_avaliacao < avaliacao.data_avaliacao);

        let comparativo = match anterior.map(|anterior| comparar_avaliacoes(avaliacao, anterior)) {
            None | Some(Err(DomainError::IncompatibleRecords(_))) => None,
            Some(resultado) => Some(resultado?),
        };

        Ok(RelatorioAvaliacao {
            avaliacao: avaliacao.clone(),
            comparativo,
            graficos: self.assessment_history(avaliacao.cliente_id, None, None),
        })
    }

    pub fn assessment_stats(&self) -> EstatisticasAvaliacoes {
        let realizadas: Vec<&AvaliacaoFisica> =
            self.avaliacoes.iter().filter(|a| a.realizada()).collect();
        let media = |valor: fn(&AvaliacaoFisica) -> f64| {
            (!realizadas.is_empty()).then(|| {
                let soma: f64 = realizadas.iter().map(|&a| valor(a)).sum();
                arredondar_1(soma / realizadas.len() as f64)
            })
        };
        EstatisticasAvaliacoes {
            total: self.avaliacoes.len(),
            realizadas: realizadas.len(),
            agendadas: self
                .avaliacoes
                .iter()
                .filter(|a| a.status == StatusAvaliacao::Agendada)
                .count(),
            media_imc: media(|a| a.imc),
            media_percentual_gordura: media(|a| a.composicao_corporal.percentual_gordura),
        }
    }

    pub fn attach_photo(
        &mut self,
        id: Uuid,
        pose: PoseFoto,
        url: String,
    ) -> Result<AvaliacaoFisica, DomainError> {
        let atualizada = self.avaliacoes.update_with(id, None, |avaliacao| {
            avaliacao.fotos.definir(pose, url);
            Ok(())
        })?;
        debug!("Foto anexada à avaliação {}", id);
        Ok(atualizada)
    }

    // ---- Exames ----

    pub fn list_exams(&self, filtro: &ExamFilter) -> Result<Page<Exame>, DomainError> {
        self.exames.list(&filtro.query, |e| filtro.aceita(e))
    }

    pub fn get_exam(&self, id: Uuid) -> Result<&Exame, DomainError> {
        self.exames.get(id)
    }

    /// Cria o exame em um estado inicial (SOLICITADO ou AGENDADO) e deriva
    /// os alertas dos resultados
    pub fn create_exam(&mut self, mut exame: Exame) -> Result<Exame, DomainError> {
        if !exame.status.inicial() {
            return Err(DomainError::InvalidTransition {
                from: "NOVO".to_string(),
                to: exame.status.to_string(),
            });
        }
        if let Some(resumo) = self.resumo_cliente(exame.cliente_id) {
            exame.cliente = Some(resumo);
        }
        exame.derivar_alertas(Utc::now());
        let criado = self.exames.create(exame);
        debug!(
            "Exame criado: {} ({}, {} alertas)",
            criado.id(),
            criado.tipo_exame.nome,
            criado.alertas.len()
        );
        Ok(criado)
    }

    /// Atualização parcial; mudança de status passa pela máquina de estados
    pub fn update_exam(
        &mut self,
        id: Uuid,
        patch: serde_json::Value,
        expected_version: Option<u64>,
    ) -> Result<Exame, DomainError> {
        let atualizado = self.exames.update_with(id, expected_version, |exame| {
            let status_anterior = exame.status;
            merge_patch(exame, &patch)?;
            if exame.status != status_anterior {
                status_anterior.transicionar(exame.status)?;
                registrar_conclusao(exame);
            }
            exame.derivar_alertas(Utc::now());
            Ok(())
        })?;
        debug!("Exame atualizado: {} (versão {})", id, atualizado.carimbo.versao);
        Ok(atualizado)
    }

    pub fn transition_exam(
        &mut self,
        id: Uuid,
        destino: StatusExame,
        expected_version: Option<u64>,
    ) -> Result<Exame, DomainError> {
        let atualizado = self.exames.update_with(id, expected_version, |exame| {
            exame.status = exame.status.transicionar(destino)?;
            registrar_conclusao(exame);
            Ok(())
        })?;
        debug!("Exame {} agora {}", id, destino);
        Ok(atualizado)
    }

    pub fn delete_exam(&mut self, id: Uuid) -> Result<Exame, DomainError> {
        let removido = self.exames.delete(id)?;
        debug!("Exame removido: {}", id);
        Ok(removido)
    }

    pub fn exam_types(&self) -> &[TipoExame] {
        &self.tipos_exame
    }

    pub fn laboratories(&self) -> &[Laboratorio] {
        &self.laboratorios
    }

    pub fn compare_exams(
        &self,
        atual_id: Uuid,
        anterior_id: Uuid,
    ) -> Result<ComparativoExames, DomainError> {
        comparar_exames(self.exames.get(atual_id)?, self.exames.get(anterior_id)?)
    }

    /// Comparativo com a leitura clínica da política configurada
    pub fn compare_exams_clinically(
        &self,
        atual_id: Uuid,
        anterior_id: Uuid,
    ) -> Result<ComparativoExames, DomainError> {
        comparar_exames_com_politica(
            self.exames.get(atual_id)?,
            self.exames.get(anterior_id)?,
            &self.politica,
        )
    }

    /// Exames concluídos do cliente, do mais recente ao mais antigo,
    /// opcionalmente de um tipo (pelo nome)
    pub fn exam_history(&self, cliente_id: Uuid, tipo: Option<&str>) -> Vec<&Exame> {
        let mut historico: Vec<&Exame> = self
            .exames
            .iter()
            .filter(|e| e.cliente_id == cliente_id && e.status == StatusExame::Concluido)
            .filter(|e| tipo.map_or(true, |t| e.tipo_exame.nome == t))
            .collect();
        historico.sort_by(|a, b| b.data_coleta.cmp(&a.data_coleta));
        historico
    }

    pub fn exam_report(&self, id: Uuid) -> Result<RelatorioExame, DomainError> {
        let exame = self.exames.get(id)?;
        let historico: Vec<Exame> = self
            .exam_history(exame.cliente_id, Some(&exame.tipo_exame.nome))
            .into_iter()
            .cloned()
            .collect();
        Ok(RelatorioExame {
            exame: exame.clone(),
            graficos: timeseries::graficos_exame(exame, &historico),
            historico,
            recomendacoes: RECOMENDACOES_EXAME.iter().map(|r| r.to_string()).collect(),
        })
    }

    pub fn exam_stats(&self) -> EstatisticasExames {
        let contar = |f: fn(&Exame) -> bool| self.exames.iter().filter(|&e| f(e)).count();
        EstatisticasExames {
            total: self.exames.len(),
            pendentes: contar(|e| e.status.pendente()),
            concluidos: contar(|e| e.status == StatusExame::Concluido),
            alterados: contar(|e| e.possui_status(StatusResultado::Alterado)),
            criticos: contar(|e| e.possui_status(StatusResultado::Critico)),
        }
    }

    pub fn add_attachment(&mut self, id: Uuid, arquivo: ArquivoExame) -> Result<Exame, DomainError> {
        let arquivo_id = arquivo.id;
        let atualizado = self.exames.update_with(id, None, |exame| {
            exame.arquivos.push(arquivo);
            Ok(())
        })?;
        debug!("Arquivo {} anexado ao exame {}", arquivo_id, id);
        Ok(atualizado)
    }

    // ---- Protocolos ----

    pub fn list_protocols(
        &self,
        query: &ListQuery,
        tipo: Option<TipoProtocolo>,
    ) -> Result<Page<Protocolo>, DomainError> {
        self.protocolos
            .list(query, |p| tipo.map_or(true, |t| p.tipo == t))
    }

    pub fn get_protocol(&self, id: Uuid) -> Result<&Protocolo, DomainError> {
        self.protocolos.get(id)
    }

    pub fn create_protocol(&mut self, protocolo: Protocolo) -> Protocolo {
        let criado = self.protocolos.create(protocolo);
        debug!("Protocolo criado: {} ({})", criado.id(), criado.nome);
        criado
    }

    pub fn update_protocol(
        &mut self,
        id: Uuid,
        patch: serde_json::Value,
        expected_version: Option<u64>,
    ) -> Result<Protocolo, DomainError> {
        let atualizado = self.protocolos.update(id, patch, expected_version)?;
        debug!("Protocolo atualizado: {} (versão {})", id, atualizado.carimbo.versao);
        Ok(atualizado)
    }

    pub fn set_protocol_status(
        &mut self,
        id: Uuid,
        status: StatusProtocolo,
    ) -> Result<Protocolo, DomainError> {
        self.protocolos.update_with(id, None, |protocolo| {
            protocolo.status = status;
            Ok(())
        })
    }

    pub fn delete_protocol(&mut self, id: Uuid) -> Result<Protocolo, DomainError> {
        let removido = self.protocolos.delete(id)?;
        debug!("Protocolo removido: {}", id);
        Ok(removido)
    }

    /// Copia um protocolo como PERSONALIZADO, com nova identidade
    pub fn copy_protocol(&mut self, id: Uuid, novo_nome: &str) -> Result<Protocolo, DomainError> {
        let copia = self.protocolos.get(id)?.copiar(novo_nome);
        let criada = self.protocolos.create(copia);
        debug!("Protocolo {} copiado como {}", id, criada.id());
        Ok(criada)
    }

    pub fn protocols_by_kind(&self, tipo: TipoProtocolo) -> Vec<&Protocolo> {
        self.protocolos.iter().filter(|p| p.tipo == tipo).collect()
    }

    pub fn protocol_stats(&self) -> EstatisticasProtocolos {
        let contar = |f: fn(&Protocolo) -> bool| self.protocolos.iter().filter(|&p| f(p)).count();
        EstatisticasProtocolos {
            total: self.protocolos.len(),
            pre_definidos: contar(|p| p.tipo == TipoProtocolo::PreDefinido),
            personalizados: contar(|p| p.tipo == TipoProtocolo::Personalizado),
            ativos: contar(|p| p.status == StatusProtocolo::Ativo),
        }
    }
}

/// Recalcula IMC e classificações; sem o sexo do cliente a classificação
/// de gordura informada é mantida
fn derivar_avaliacao(
    avaliacao: &mut AvaliacaoFisica,
    genero: Option<Genero>,
) -> Result<(), DomainError> {
    avaliacao.imc = calcular_imc(avaliacao.peso, avaliacao.altura)?;
    avaliacao.resultados.classificacao_imc = classificar_imc(avaliacao.imc);
    if let Some(genero) = genero {
        avaliacao.resultados.classificacao_gordura = classificar_percentual_gordura(
            avaliacao.composicao_corporal.percentual_gordura,
            genero,
        );
    }
    Ok(())
}

fn registrar_conclusao(exame: &mut Exame) {
    if exame.status == StatusExame::Concluido && exame.data_resultado.is_none() {
        exame.data_resultado = Some(Utc::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comparison::{Evolucao, Tendencia};
    use crate::metrics::{ClassificacaoGordura, ClassificacaoImc};
    use anyhow::Result;
    use serde_json::json;

    fn data(ano: i32, mes: u32, dia: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(ano, mes, dia).unwrap()
    }

    fn clinica_com_joao() -> Result<(Clinic, Cliente)> {
        let mut clinic = Clinic::new();
        let joao = clinic.create_client(demo::cliente_joao())?;
        Ok((clinic, joao))
    }

    fn exame_solicitado(clinic: &Clinic, cliente_id: Uuid) -> Exame {
        let mut exame = demo::hemograma_joao(cliente_id);
        exame.status = StatusExame::Solicitado;
        exame.data_resultado = None;
        exame.tipo_exame = clinic.exam_types()[0].clone();
        exame
    }

    #[test]
    fn test_demo_data() -> Result<()> {
        let clinic = Clinic::with_demo_data()?;
        assert_eq!(
            clinic.client_stats(),
            EstatisticasClientes { total: 2, ativos: 2, inativos: 0 }
        );
        let joao = clinic.client_by_email("JOAO.SILVA@email.com").unwrap();
        let avaliacoes = clinic.assessments_for_client(joao.id());
        assert_eq!(avaliacoes.len(), 1);
        assert_eq!(avaliacoes[0].imc, 27.0);
        assert_eq!(avaliacoes[0].resultados.classificacao_imc, ClassificacaoImc::Sobrepeso);
        assert_eq!(avaliacoes[0].cliente.as_ref().map(|c| c.nome.as_str()), Some("João Silva"));

        assert_eq!(
            clinic.exam_stats(),
            EstatisticasExames { total: 1, pendentes: 0, concluidos: 1, alterados: 1, criticos: 0 }
        );
        assert_eq!(clinic.protocol_stats().pre_definidos, 2);
        assert_eq!(clinic.exam_types().len(), 3);
        assert_eq!(clinic.laboratories().len(), 2);
        Ok(())
    }

    #[test]
    fn test_duplicate_email_is_rejected() -> Result<()> {
        let (mut clinic, joao) = clinica_com_joao()?;
        let mut outro = demo::cliente_maria();
        outro.email = " Joao.Silva@Email.com".to_string();
        assert!(matches!(
            clinic.create_client(outro),
            Err(DomainError::DuplicateIdentity(_))
        ));

        let maria = clinic.create_client(demo::cliente_maria())?;
        let result = clinic.update_client(maria.id(), json!({"email": "joao.silva@email.com"}), None);
        assert!(matches!(result, Err(DomainError::DuplicateIdentity(_))));

        // o próprio cliente pode reescrever seu e-mail
        let atualizado =
            clinic.update_client(joao.id(), json!({"email": "JOAO.SILVA@email.com"}), None)?;
        assert_eq!(atualizado.carimbo.versao, 2);
        Ok(())
    }

    #[test]
    fn test_client_status_and_delete() -> Result<()> {
        let (mut clinic, joao) = clinica_com_joao()?;
        let avaliacao = clinic.create_assessment(demo::avaliacao_joao(joao.id()))?;

        clinic.set_client_status(joao.id(), StatusCliente::Inativo)?;
        assert_eq!(clinic.client_stats().inativos, 1);

        clinic.delete_client(joao.id())?;
        assert!(matches!(
            clinic.get_client(joao.id()),
            Err(DomainError::NotFound { .. })
        ));
        let mantida = clinic.get_assessment(avaliacao.id())?;
        assert_eq!(mantida.cliente.as_ref().map(|c| c.id), Some(joao.id()));
        Ok(())
    }

    #[test]
    fn test_create_assessment_derives_metrics() -> Result<()> {
        let (mut clinic, joao) = clinica_com_joao()?;
        let mut avaliacao = demo::avaliacao_joao(joao.id());
        avaliacao.imc = 0.0;
        avaliacao.cliente = None;
        avaliacao.resultados.classificacao_imc = ClassificacaoImc::AbaixoPeso;
        avaliacao.resultados.classificacao_gordura = ClassificacaoGordura::MuitoBaixo;

        let criada = clinic.create_assessment(avaliacao)?;
        assert_eq!(criada.imc, 27.0);
        assert_eq!(criada.resultados.classificacao_imc, ClassificacaoImc::Sobrepeso);
        assert_eq!(
            criada.resultados.classificacao_gordura,
            classificar_percentual_gordura(18.5, Genero::Masculino)
        );
        assert_eq!(criada.cliente, Some(joao.resumo()));
        Ok(())
    }

    #[test]
    fn test_invalid_measurement_is_not_stored() -> Result<()> {
        let (mut clinic, joao) = clinica_com_joao()?;
        let mut avaliacao = demo::avaliacao_joao(joao.id());
        avaliacao.altura = 0.0;
        assert!(matches!(
            clinic.create_assessment(avaliacao),
            Err(DomainError::InvalidMeasurement(_))
        ));
        assert!(clinic.avaliacoes().is_empty());

        let criada = clinic.create_assessment(demo::avaliacao_joao(joao.id()))?;
        let result = clinic.update_assessment(criada.id(), json!({"peso": -1.0}), None);
        assert!(matches!(result, Err(DomainError::InvalidMeasurement(_))));
        assert_eq!(clinic.get_assessment(criada.id())?.peso, 85.5);
        Ok(())
    }

    #[test]
    fn test_update_assessment_rederives_imc() -> Result<()> {
        let (mut clinic, joao) = clinica_com_joao()?;
        let criada = clinic.create_assessment(demo::avaliacao_joao(joao.id()))?;
        let atualizada =
            clinic.update_assessment(criada.id(), json!({"peso": 70.0, "altura": 1.75}), Some(1))?;
        assert_eq!(atualizada.imc, 22.9);
        assert_eq!(atualizada.resultados.classificacao_imc, ClassificacaoImc::PesoNormal);
        assert_eq!(atualizada.carimbo.versao, 2);
        Ok(())
    }

    fn reavaliacao(clinic: &mut Clinic, cliente_id: Uuid) -> Result<AvaliacaoFisica> {
        let mut segunda = demo::avaliacao_joao(cliente_id);
        segunda.data_avaliacao = data(2025, 3, 15);
        segunda.tipo = TipoAvaliacao::Reavaliacao;
        segunda.peso = 85.3;
        segunda.composicao_corporal.percentual_gordura = 16.0;
        segunda.composicao_corporal.massa_magra = 70.5;
        Ok(clinic.create_assessment(segunda)?)
    }

    #[test]
    fn test_compare_assessments_scenario() -> Result<()> {
        let (mut clinic, joao) = clinica_com_joao()?;
        let primeira = clinic.create_assessment(demo::avaliacao_joao(joao.id()))?;
        let segunda = reavaliacao(&mut clinic, joao.id())?;

        let comparativo = clinic.compare_assessments(segunda.id(), primeira.id())?;
        assert_eq!(comparativo.pontuacao, 5);
        assert_eq!(comparativo.evolucao, Evolucao::Positiva);
        assert_eq!(comparativo.diferencas.peso, 85.3 - 85.5);

        assert!(matches!(
            clinic.compare_assessments(primeira.id(), segunda.id()),
            Err(DomainError::InvalidComparison(_))
        ));
        Ok(())
    }

    #[test]
    fn test_assessment_report_and_history() -> Result<()> {
        let (mut clinic, joao) = clinica_com_joao()?;
        let primeira = clinic.create_assessment(demo::avaliacao_joao(joao.id()))?;
        let segunda = reavaliacao(&mut clinic, joao.id())?;

        let relatorio = clinic.assessment_report(segunda.id())?;
        let comparativo = relatorio.comparativo.expect("comparativo com a primeira");
        assert_eq!(comparativo.avaliacao_anterior.id(), primeira.id());
        assert_eq!(relatorio.graficos.peso.len(), 2);

        assert!(clinic.assessment_report(primeira.id())?.comparativo.is_none());

        let serie = clinic.assessment_evolution(joao.id(), &Metric::PercentualGordura);
        let valores: Vec<f64> = serie.iter().map(|p| p.valor).collect();
        assert_eq!(valores, vec![18.5, 16.0]);

        let recorte = clinic.assessment_history(joao.id(), Some(data(2025, 1, 1)), None);
        assert_eq!(recorte.imc.len(), 1);
        Ok(())
    }

    #[test]
    fn test_assessment_stats() -> Result<()> {
        let (mut clinic, joao) = clinica_com_joao()?;
        assert_eq!(clinic.assessment_stats().media_imc, None);

        let primeira = clinic.create_assessment(demo::avaliacao_joao(joao.id()))?;
        let segunda = reavaliacao(&mut clinic, joao.id())?;
        let mut agendada = demo::avaliacao_joao(joao.id());
        agendada.status = StatusAvaliacao::Agendada;
        agendada.data_avaliacao = data(2025, 6, 15);
        clinic.create_assessment(agendada)?;

        let stats = clinic.assessment_stats();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.realizadas, 2);
        assert_eq!(stats.agendadas, 1);
        assert_eq!(stats.media_imc, Some(arredondar_1((primeira.imc + segunda.imc) / 2.0)));
        assert_eq!(stats.media_percentual_gordura, Some(17.3));
        Ok(())
    }

    #[test]
    fn test_attach_photo() -> Result<()> {
        let (mut clinic, joao) = clinica_com_joao()?;
        let criada = clinic.create_assessment(demo::avaliacao_joao(joao.id()))?;
        let atualizada =
            clinic.attach_photo(criada.id(), PoseFoto::Frente, "fotos/frente.jpg".to_string())?;
        assert_eq!(atualizada.fotos.frente.as_deref(), Some("fotos/frente.jpg"));
        Ok(())
    }

    #[test]
    fn test_create_exam_requires_initial_status() -> Result<()> {
        let (mut clinic, joao) = clinica_com_joao()?;
        let concluido = demo::hemograma_joao(joao.id());
        assert!(matches!(
            clinic.create_exam(concluido),
            Err(DomainError::InvalidTransition { .. })
        ));

        let criado = clinic.create_exam(exame_solicitado(&clinic, joao.id()))?;
        assert_eq!(criado.cliente, Some(joao.resumo()));
        let nao_normais = criado
            .resultados
            .iter()
            .filter(|r| r.status != StatusResultado::Normal)
            .count();
        assert_eq!(criado.alertas.len(), nao_normais);
        assert_eq!(clinic.exam_stats().pendentes, 1);
        Ok(())
    }

    #[test]
    fn test_exam_status_flow() -> Result<()> {
        let (mut clinic, joao) = clinica_com_joao()?;
        let exame = clinic.create_exam(exame_solicitado(&clinic, joao.id()))?;
        let id = exame.id();

        clinic.transition_exam(id, StatusExame::Coletado, None)?;
        assert!(matches!(
            clinic.transition_exam(id, StatusExame::Agendado, None),
            Err(DomainError::InvalidTransition { .. })
        ));
        assert!(matches!(
            clinic.transition_exam(id, StatusExame::Coletado, None),
            Err(DomainError::InvalidTransition { .. })
        ));
        clinic.transition_exam(id, StatusExame::Reagendado, None)?;
        clinic.transition_exam(id, StatusExame::Agendado, None)?;
        let concluido = clinic.transition_exam(id, StatusExame::Concluido, None)?;
        assert!(concluido.data_resultado.is_some());
        assert!(matches!(
            clinic.transition_exam(id, StatusExame::Cancelado, None),
            Err(DomainError::InvalidTransition { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_update_exam_validates_status_and_rederives_alerts() -> Result<()> {
        let (mut clinic, joao) = clinica_com_joao()?;
        let exame = clinic.create_exam(exame_solicitado(&clinic, joao.id()))?;
        let id = exame.id();
        clinic.transition_exam(id, StatusExame::Processando, None)?;

        let result = clinic.update_exam(id, json!({"status": "SOLICITADO"}), None);
        assert!(matches!(result, Err(DomainError::InvalidTransition { .. })));
        assert_eq!(clinic.get_exam(id)?.status, StatusExame::Processando);

        let mut resultados = exame.resultados.clone();
        for resultado in &mut resultados {
            resultado.status = StatusResultado::Normal;
        }
        resultados[0].status = StatusResultado::Critico;
        let atualizado = clinic.update_exam(
            id,
            json!({"resultados": resultados, "status": "PROCESSANDO"}),
            None,
        )?;
        assert_eq!(atualizado.alertas.len(), 1);
        assert_eq!(atualizado.alertas[0].tipo, TipoAlerta::Critico);
        assert_eq!(atualizado.alertas[0].parametro, "Hemoglobina");
        Ok(())
    }

    #[test]
    fn test_update_exam_keeps_read_alert() -> Result<()> {
        let (mut clinic, joao) = clinica_com_joao()?;
        let exame = clinic.create_exam(exame_solicitado(&clinic, joao.id()))?;
        let id = exame.id();
        assert_eq!(exame.alertas.len(), 1);
        let alerta_id = exame.alertas[0].id;

        // leitura do alerta pelo profissional
        let mut alertas = exame.alertas.clone();
        alertas[0].visualizado = true;
        clinic.update_exam(id, json!({ "alertas": alertas }), None)?;

        let mut resultados = exame.resultados.clone();
        resultados[0].valor = ValorResultado::Numerico(15.1);
        let atualizado = clinic.update_exam(id, json!({ "resultados": resultados }), None)?;
        assert_eq!(atualizado.alertas.len(), 1);
        assert_eq!(atualizado.alertas[0].id, alerta_id);
        assert!(atualizado.alertas[0].visualizado);

        resultados[2].valor = ValorResultado::Numerico(7800.0);
        resultados[2].status = StatusResultado::Normal;
        let normalizado = clinic.update_exam(id, json!({ "resultados": resultados }), None)?;
        assert!(normalizado.alertas.is_empty());
        Ok(())
    }

    #[test]
    fn test_list_exams_filters() -> Result<()> {
        let mut clinic = Clinic::with_demo_data()?;
        let joao = clinic.client_by_email("joao.silva@email.com").unwrap().id();
        clinic.create_exam(exame_solicitado(&clinic, joao))?;

        let filtro = ExamFilter {
            status: Some(StatusExame::Solicitado),
            ..Default::default()
        };
        assert_eq!(clinic.list_exams(&filtro)?.total_elements, 1);

        let filtro = ExamFilter {
            categoria: Some("hematologia".to_string()),
            ate: Some(data(2024, 12, 31)),
            ..Default::default()
        };
        assert_eq!(clinic.list_exams(&filtro)?.total_elements, 2);

        let filtro = ExamFilter {
            query: ListQuery::default().with_search("laboratório inexistente"),
            ..Default::default()
        };
        assert_eq!(clinic.list_exams(&filtro)?.total_elements, 0);
        Ok(())
    }

    #[test]
    fn test_exam_comparison_and_report() -> Result<()> {
        let mut clinic = Clinic::with_demo_data()?;
        let joao = clinic.client_by_email("joao.silva@email.com").unwrap().id();
        let primeiro = clinic.exam_history(joao, None)[0].id();

        let proprio = clinic.compare_exams(primeiro, primeiro)?;
        assert!(proprio.diferencas.iter().all(|d| d.diferenca == 0.0));
        assert_eq!(proprio.tendencia, Tendencia::Estavel);

        let mut segundo = exame_solicitado(&clinic, joao);
        segundo.data_coleta = segundo.data_coleta + chrono::Duration::days(60);
        let segundo = clinic.create_exam(segundo)?;
        let mut resultados = segundo.resultados.clone();
        resultados[2].valor = ValorResultado::Numerico(9000.0);
        resultados[2].status = StatusResultado::Normal;
        clinic.update_exam(segundo.id(), json!({"resultados": resultados}), None)?;
        clinic.transition_exam(segundo.id(), StatusExame::Concluido, None)?;

        let comparativo = clinic.compare_exams(segundo.id(), primeiro)?;
        assert_eq!(comparativo.tendencia, Tendencia::Melhora);
        let clinico = clinic.compare_exams_clinically(segundo.id(), primeiro)?;
        assert_eq!(clinico.tendencia_clinica, Some(Tendencia::Melhora));

        let relatorio = clinic.exam_report(segundo.id())?;
        assert_eq!(relatorio.historico.len(), 2);
        assert_eq!(relatorio.historico[0].id(), segundo.id());
        assert_eq!(relatorio.graficos.len(), 3);
        assert_eq!(relatorio.recomendacoes.len(), 3);
        Ok(())
    }

    #[test]
    fn test_add_attachment() -> Result<()> {
        let (mut clinic, joao) = clinica_com_joao()?;
        let exame = clinic.create_exam(exame_solicitado(&clinic, joao.id()))?;
        let preparado =
            crate::attachments::seal_attachment(exame.id(), "laudo.pdf", b"%PDF", None)?;
        let atualizado = clinic.add_attachment(exame.id(), preparado.arquivo)?;
        assert_eq!(atualizado.arquivos.len(), 1);
        assert!(!atualizado.arquivos[0].criptografado);
        Ok(())
    }

    #[test]
    fn test_protocols() -> Result<()> {
        let mut clinic = Clinic::with_demo_data()?;
        let original = clinic.protocols_by_kind(TipoProtocolo::PreDefinido)[0].clone();

        let copia = clinic.copy_protocol(original.id(), "Meu Full Body")?;
        assert_ne!(copia.id(), original.id());
        assert_eq!(copia.tipo, TipoProtocolo::Personalizado);
        assert_eq!(copia.exercicios, original.exercicios);
        assert_eq!(copia.carimbo.versao, 1);

        clinic.set_protocol_status(original.id(), StatusProtocolo::Inativo)?;
        let stats = clinic.protocol_stats();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.personalizados, 1);
        assert_eq!(stats.ativos, 2);

        let pagina = clinic.list_protocols(&ListQuery::default(), Some(TipoProtocolo::Personalizado))?;
        assert_eq!(pagina.content[0].nome, "Meu Full Body");

        clinic.update_protocol(copia.id(), json!({"duracaoSemanas": 12}), Some(1))?;
        clinic.delete_protocol(copia.id())?;
        assert!(clinic.get_protocol(copia.id()).is_err());
        Ok(())
    }
}
