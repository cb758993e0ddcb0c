//! Dados de demonstração
//!
//! Registros de exemplo usados para popular um [`Clinic`](crate::clinic::Clinic)
//! vazio e pelos testes da biblioteca.

use std::collections::BTreeMap;

use chrono::{NaiveDate, TimeZone, Utc};
use uuid::Uuid;

use crate::metrics::{ClassificacaoGordura, ClassificacaoImc};
use crate::models::*;

fn data(ano: i32, mes: u32, dia: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(ano, mes, dia).unwrap_or_default()
}

fn textos(itens: &[&str]) -> Vec<String> {
    itens.iter().map(|s| s.to_string()).collect()
}

pub fn cliente_joao() -> Cliente {
    Cliente {
        carimbo: Carimbo::novo(),
        nome: "João Silva".to_string(),
        email: "joao.silva@email.com".to_string(),
        telefone: "(11) 99999-1111".to_string(),
        data_nascimento: data(1990, 5, 15),
        genero: Genero::Masculino,
        modalidade: "Musculação".to_string(),
        objetivo: "Ganho de massa muscular".to_string(),
        status: StatusCliente::Ativo,
    }
}

pub fn cliente_maria() -> Cliente {
    Cliente {
        carimbo: Carimbo::novo(),
        nome: "Maria Santos".to_string(),
        email: "maria.santos@email.com".to_string(),
        telefone: "(11) 99999-2222".to_string(),
        data_nascimento: data(1985, 8, 22),
        genero: Genero::Feminino,
        modalidade: "Funcional".to_string(),
        objetivo: "Emagrecimento".to_string(),
        status: StatusCliente::Ativo,
    }
}

/// Circunferências padrão da ficha de avaliação, em cm
pub fn circunferencias_joao() -> BTreeMap<String, f64> {
    [
        ("pescoco", 38.0),
        ("ombro", 118.0),
        ("braco_relaxado", 32.0),
        ("braco_contraido", 35.0),
        ("antebraco", 28.0),
        ("punho", 17.0),
        ("peitoral", 102.0),
        ("cintura", 88.0),
        ("abdomen", 92.0),
        ("quadril", 98.0),
        ("coxa_proximal", 58.0),
        ("coxa_medial", 55.0),
        ("coxa_distal", 52.0),
        ("panturrilha", 38.0),
        ("tornozelo", 23.0),
    ]
    .into_iter()
    .map(|(local, valor)| (local.to_string(), valor))
    .collect()
}

/// Avaliação inicial de João (85,5 kg; 1,78 m; 18,5 % de gordura)
pub fn avaliacao_joao(cliente_id: Uuid) -> AvaliacaoFisica {
    AvaliacaoFisica {
        carimbo: Carimbo::novo(),
        cliente_id,
        cliente: None,
        data_avaliacao: data(2024, 12, 15),
        tipo: TipoAvaliacao::Inicial,
        status: StatusAvaliacao::Realizada,
        peso: 85.5,
        altura: 1.78,
        imc: 27.0,
        circunferencias: circunferencias_joao(),
        composicao_corporal: ComposicaoCorporal {
            percentual_gordura: 18.5,
            massa_gorda: 15.8,
            massa_magra: 69.7,
            massa_muscular: 66.2,
            agua_corporal: 58.2,
            massa_ossea: 3.5,
            taxa_metabolica: 1850.0,
        },
        dobras_cutaneas: Some(DobrasCutaneas {
            triceps: 12.0,
            biceps: 8.0,
            subescapular: 15.0,
            suprailiaca: 18.0,
            abdominal: 22.0,
            coxa: 14.0,
            panturrilha: 10.0,
        }),
        testes_fisicos: TestesFisicos {
            flexibilidade: Flexibilidade {
                sentar_alcancar: 25.0,
                flexao_ombro: 170.0,
                observacoes: Some("Boa flexibilidade geral".to_string()),
            },
            forca: Forca {
                preensao_manual_direita: 45.0,
                preensao_manual_esquerda: 42.0,
                flexao_braco: 25,
                abdominal: 35,
                observacoes: Some("Força adequada para o nível".to_string()),
            },
            resistencia: Resistencia {
                vo2_max: Some(42.0),
                frequencia_cardiaca_repouso: 68,
                frequencia_cardiaca_maxima: Some(185),
                teste_cooper: Some(2800.0),
                observacoes: Some("Bom condicionamento cardiovascular".to_string()),
            },
        },
        pressao_arterial: PressaoArterial {
            sistolica: 125,
            diastolica: 80,
            frequencia_cardiaca: 68,
        },
        anamnese: Anamnese {
            objetivo_principal: "Ganho de massa muscular e redução do percentual de gordura"
                .to_string(),
            historico_lesoes: "Lesão no joelho direito em 2020, totalmente recuperado".to_string(),
            medicamentos: "Nenhum".to_string(),
            restricoes_medicas: "Nenhuma".to_string(),
            nivel_atividade: NivelAtividade::Moderado,
            frequencia_exercicio: 4,
            tempo_exercicio: 60,
            modalidades_preferidas: textos(&["Musculação", "Corrida"]),
            observacoes_gerais: "Motivado e disciplinado".to_string(),
        },
        fotos: Fotos::default(),
        resultados: Resultados {
            classificacao_imc: ClassificacaoImc::Sobrepeso,
            classificacao_gordura: ClassificacaoGordura::Alto,
            pontos_fortes: textos(&["Boa massa muscular", "Excelente motivação"]),
            pontos_melhoria: textos(&["Reduzir percentual de gordura"]),
            recomendacoes: textos(&["Treino de força 4x/semana", "Cardio 2x/semana"]),
        },
        observacoes: Some("Cliente apresenta bom potencial para atingir seus objetivos".to_string()),
        proxima_avaliacao: Some(data(2025, 1, 15)),
    }
}

pub fn tipos_exame() -> Vec<TipoExame> {
    vec![
        TipoExame {
            id: "1".to_string(),
            nome: "Hemograma Completo".to_string(),
            codigo: "HEM001".to_string(),
            categoria: "Hematologia".to_string(),
            descricao: "Análise completa dos elementos sanguíneos".to_string(),
            preparacao: Some("Jejum de 8 horas".to_string()),
            jejum: Some(8),
            restricoes: textos(&["Não consumir álcool 24h antes"]),
        },
        TipoExame {
            id: "2".to_string(),
            nome: "Glicemia de Jejum".to_string(),
            codigo: "BIO001".to_string(),
            categoria: "Bioquímica".to_string(),
            descricao: "Dosagem de glicose no sangue".to_string(),
            preparacao: Some("Jejum de 12 horas".to_string()),
            jejum: Some(12),
            restricoes: textos(&["Não consumir açúcar 24h antes"]),
        },
        TipoExame {
            id: "3".to_string(),
            nome: "Perfil Lipídico".to_string(),
            codigo: "BIO002".to_string(),
            categoria: "Bioquímica".to_string(),
            descricao: "Análise de colesterol e triglicérides".to_string(),
            preparacao: Some("Jejum de 12 horas".to_string()),
            jejum: Some(12),
            restricoes: textos(&["Dieta leve no dia anterior"]),
        },
    ]
}

pub fn laboratorios() -> Vec<Laboratorio> {
    vec![
        Laboratorio {
            id: "1".to_string(),
            nome: "Laboratório Central".to_string(),
            cnpj: "12.345.678/0001-90".to_string(),
            endereco: "Rua das Análises, 123".to_string(),
            telefone: "(11) 3333-4444".to_string(),
            email: "contato@labcentral.com.br".to_string(),
            website: Some("https://labcentral.com.br".to_string()),
            credenciamento: textos(&["ANVISA", "SBPC"]),
            especialidades: textos(&["Hematologia", "Bioquímica", "Microbiologia"]),
            tempo_medio_resultado: 24,
        },
        Laboratorio {
            id: "2".to_string(),
            nome: "Lab Express".to_string(),
            cnpj: "98.765.432/0001-10".to_string(),
            endereco: "Av. Rápida, 456".to_string(),
            telefone: "(11) 5555-6666".to_string(),
            email: "contato@labexpress.com.br".to_string(),
            website: None,
            credenciamento: textos(&["ANVISA"]),
            especialidades: textos(&["Bioquímica", "Hormônios"]),
            tempo_medio_resultado: 12,
        },
    ]
}

fn resultado(
    id: &str,
    parametro: &str,
    valor: f64,
    unidade: &str,
    referencia: &str,
    status: StatusResultado,
) -> ResultadoExame {
    ResultadoExame {
        id: id.to_string(),
        parametro: parametro.to_string(),
        valor: ValorResultado::Numerico(valor),
        unidade: unidade.to_string(),
        valor_referencia: referencia.to_string(),
        status,
        observacao: None,
    }
}

/// Hemograma concluído de João, com leucócitos acima da referência
pub fn hemograma_joao(cliente_id: Uuid) -> Exame {
    let tipos = tipos_exame();
    let laboratorios = laboratorios();
    let mut leucocitos = resultado(
        "3",
        "Leucócitos",
        12500.0,
        "/mm³",
        "4000 - 11000",
        StatusResultado::Alterado,
    );
    leucocitos.observacao = Some("Valor ligeiramente elevado".to_string());

    let coleta = Utc.with_ymd_and_hms(2024, 12, 15, 8, 0, 0).single().unwrap_or_default();
    let entrega = Utc.with_ymd_and_hms(2024, 12, 16, 14, 30, 0).single();

    let mut exame = Exame {
        carimbo: Carimbo::novo(),
        cliente_id,
        cliente: None,
        tipo_exame: tipos[0].clone(),
        categoria: CategoriaExame {
            id: "1".to_string(),
            nome: "Hematologia".to_string(),
            cor: "#ef4444".to_string(),
            icone: "droplet".to_string(),
            descricao: "Exames relacionados ao sangue".to_string(),
        },
        laboratorio: laboratorios[0].clone(),
        medico_solicitante: "Dr. Carlos Medeiros - CRM 123456".to_string(),
        data_coleta: coleta,
        data_resultado: entrega,
        status: StatusExame::Concluido,
        prioridade: PrioridadeExame::Normal,
        resultados: vec![
            resultado("1", "Hemoglobina", 14.2, "g/dL", "12.0 - 16.0", StatusResultado::Normal),
            resultado("2", "Hematócrito", 42.5, "%", "36.0 - 48.0", StatusResultado::Normal),
            leucocitos,
        ],
        arquivos: Vec::new(),
        observacoes: Some("Paciente em acompanhamento pós-cirúrgico".to_string()),
        observacoes_medicas: Some(
            "Leucocitose leve, compatível com processo inflamatório pós-operatório".to_string(),
        ),
        valores_referencia: Vec::new(),
        alertas: Vec::new(),
        proximo_exame: Some(data(2025, 1, 15)),
    };
    exame.derivar_alertas(entrega.unwrap_or(coleta));
    exame
}

fn exercicio(id: &str, nome: &str, grupo: &str, series: u32, repeticoes: &str, descanso: u32) -> Exercicio {
    Exercicio {
        id: id.to_string(),
        nome: nome.to_string(),
        grupo_muscular: grupo.to_string(),
        series,
        repeticoes: repeticoes.to_string(),
        carga: None,
        descanso,
        observacoes: None,
    }
}

pub fn protocolos_pre_definidos() -> Vec<Protocolo> {
    vec![
        Protocolo {
            carimbo: Carimbo::novo(),
            nome: "Full Body Iniciante".to_string(),
            descricao: "Treino de corpo inteiro três vezes por semana".to_string(),
            tipo: TipoProtocolo::PreDefinido,
            nivel: NivelProtocolo::Iniciante,
            duracao_semanas: 8,
            objetivo: "Adaptação e condicionamento geral".to_string(),
            observacoes: None,
            exercicios: vec![
                exercicio("1", "Agachamento livre", "Quadríceps", 3, "12", 60),
                exercicio("2", "Supino reto", "Peitoral", 3, "12", 60),
                exercicio("3", "Remada curvada", "Dorsais", 3, "12", 60),
            ],
            anexos: Vec::new(),
            links: Vec::new(),
            status: StatusProtocolo::Ativo,
        },
        Protocolo {
            carimbo: Carimbo::novo(),
            nome: "Hipertrofia ABC".to_string(),
            descricao: "Divisão em três dias com foco em volume".to_string(),
            tipo: TipoProtocolo::PreDefinido,
            nivel: NivelProtocolo::Intermediario,
            duracao_semanas: 12,
            objetivo: "Hipertrofia muscular".to_string(),
            observacoes: None,
            exercicios: vec![
                exercicio("1", "Supino inclinado", "Peitoral", 4, "8-10", 90),
                exercicio("2", "Puxada frontal", "Dorsais", 4, "8-10", 90),
                exercicio("3", "Leg press", "Quadríceps", 4, "10-12", 90),
            ],
            anexos: Vec::new(),
            links: Vec::new(),
            status: StatusProtocolo::Ativo,
        },
    ]
}
