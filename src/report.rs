//! Caller-facing adapter: turns the forms layer's payload into the
//! document model the layout engine consumes. The section layout of each
//! nursing-process stage lives here as static templates; the engine
//! itself never reflects over form shapes.

use std::collections::HashMap;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;

use crate::error::Error;
use crate::model::{
    Block, DocumentModel, Field, FooterBlock, HeaderBlock, PatientBlock, SectionBlock,
    SignatureBlock,
};

pub const SYSTEM_TITLE: &str = "EvolP - Sistema de Evolução de Enfermagem";
pub const PAGE_LABEL_TEMPLATE: &str = "Página {page} de {pages}";
const PATIENT_HEADING: &str = "Dados do Paciente";

/// Patient identity as registered by the CRUD shell. Optional fields that
/// were never filled in are skipped in the output, never rendered blank.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PatientRecord {
    pub nome: String,
    pub prontuario: String,
    #[serde(default)]
    pub data_admissao: Option<String>,
    #[serde(default)]
    pub leito: Option<String>,
    #[serde(default)]
    pub medico_responsavel: Option<String>,
}

/// Responsible nurse: display name and council registration
/// (e.g. "COREN-SP 123.456").
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Signer {
    pub nome: String,
    pub coren: String,
}

/// The five stages of the nursing-process workflow, one report kind each.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ReportKind {
    Avaliacao,
    Diagnostico,
    Planejamento,
    Implementacao,
    Evolucao,
}

impl ReportKind {
    pub fn title(self) -> &'static str {
        match self {
            ReportKind::Avaliacao => "Avaliação de Enfermagem",
            ReportKind::Diagnostico => "Diagnóstico de Enfermagem",
            ReportKind::Planejamento => "Planejamento de Enfermagem",
            ReportKind::Implementacao => "Implementação de Enfermagem",
            ReportKind::Evolucao => "Evolução de Enfermagem",
        }
    }

    pub fn slug(self) -> &'static str {
        match self {
            ReportKind::Avaliacao => "avaliacao_enfermagem",
            ReportKind::Diagnostico => "diagnostico_enfermagem",
            ReportKind::Planejamento => "planejamento_enfermagem",
            ReportKind::Implementacao => "implementacao_enfermagem",
            ReportKind::Evolucao => "evolucao_enfermagem",
        }
    }

    fn sections(self) -> &'static [SectionTemplate] {
        match self {
            ReportKind::Avaliacao => AVALIACAO,
            ReportKind::Diagnostico => DIAGNOSTICO,
            ReportKind::Planejamento => PLANEJAMENTO,
            ReportKind::Implementacao => IMPLEMENTACAO,
            ReportKind::Evolucao => EVOLUCAO,
        }
    }
}

/// Ordered (form key, printed label) pairs under one section title.
struct SectionTemplate {
    title: &'static str,
    fields: &'static [(&'static str, &'static str)],
}

const AVALIACAO: &[SectionTemplate] = &[
    SectionTemplate {
        title: "Dados Subjetivos",
        fields: &[
            ("queixaPrincipal", "Queixa Principal"),
            ("historicoMedico", "Histórico Médico"),
            ("alergias", "Alergias"),
            ("medicamentosUso", "Medicamentos em Uso"),
            ("observacoesSubjetivas", "Observações"),
        ],
    },
    SectionTemplate {
        title: "Dados Objetivos",
        fields: &[
            ("pressaoArterial", "Pressão Arterial"),
            ("frequenciaCardiaca", "Frequência Cardíaca"),
            ("temperatura", "Temperatura"),
            ("resultadosExames", "Resultados de Exames"),
            ("observacoesExameFisico", "Observações do Exame Físico"),
        ],
    },
];

const DIAGNOSTICO: &[SectionTemplate] = &[
    SectionTemplate {
        title: "Problemas de Saúde Identificados",
        fields: &[
            ("problemasSaude", "Problemas de Saúde"),
            ("gravidade", "Gravidade"),
            ("tipo", "Tipo"),
        ],
    },
    SectionTemplate {
        title: "Necessidades de Cuidado",
        fields: &[
            ("necessidadesCuidado", "Necessidades de Cuidado"),
            ("urgencia", "Urgência"),
            ("observacoesAdicionais", "Observações Adicionais"),
        ],
    },
];

const PLANEJAMENTO: &[SectionTemplate] = &[SectionTemplate {
    title: "Plano de Cuidados",
    fields: &[
        ("intervencoes", "Intervenções"),
        ("observacoesPlanejamento", "Observações"),
    ],
}];

const IMPLEMENTACAO: &[SectionTemplate] = &[SectionTemplate {
    title: "Ações Realizadas",
    fields: &[
        ("acoes", "Ações"),
        ("intercorrencias", "Intercorrências"),
        ("observacoesImplementacao", "Observações"),
    ],
}];

const EVOLUCAO: &[SectionTemplate] = &[SectionTemplate {
    title: "Evolução do Paciente",
    fields: &[
        ("avaliacaoResultados", "Avaliação dos Resultados"),
        ("ajustesPropostos", "Ajustes Propostos"),
    ],
}];

/// One export request from the forms layer. `generated_at` is supplied by
/// the caller so identical inputs produce byte-identical artifacts.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRequest {
    pub kind: ReportKind,
    pub patient: PatientRecord,
    #[serde(default)]
    pub form: HashMap<String, String>,
    pub signer: Signer,
    pub generated_at: NaiveDateTime,
}

impl ReportRequest {
    /// Parse the forms layer's JSON payload. Anything serde rejects is a
    /// validation failure; no layout work has happened yet.
    pub fn from_json_str(payload: &str) -> Result<Self, Error> {
        serde_json::from_str(payload)
            .map_err(|e| Error::Validation(format!("malformed report payload: {e}")))
    }
}

/// Validate the request and build the block sequence for the layout
/// engine. Fails fast with [`Error::Validation`] before any layout work.
pub fn build_document(request: &ReportRequest) -> Result<DocumentModel, Error> {
    if request.patient.nome.trim().is_empty() {
        return Err(Error::Validation("patient name is required".into()));
    }
    if request.patient.prontuario.trim().is_empty() {
        return Err(Error::Validation("patient record number is required".into()));
    }
    if request.signer.nome.trim().is_empty() {
        return Err(Error::Validation("signer name is required".into()));
    }

    let mut blocks = Vec::new();
    blocks.push(Block::Header(HeaderBlock {
        title: SYSTEM_TITLE.to_string(),
        timestamp_line: timestamp_line(request.generated_at),
    }));
    blocks.push(Block::Patient(PatientBlock {
        heading: PATIENT_HEADING.to_string(),
        fields: patient_fields(&request.patient),
    }));
    for template in request.kind.sections() {
        let fields = template
            .fields
            .iter()
            .map(|&(key, label)| Field::new(label, request.form.get(key).cloned()))
            .collect();
        blocks.push(Block::Section(SectionBlock {
            title: template.title.to_string(),
            fields,
        }));
    }
    blocks.push(Block::Signature(SignatureBlock {
        signer_name: request.signer.nome.clone(),
        signer_credential: request.signer.coren.clone(),
    }));
    blocks.push(Block::Footer(FooterBlock {
        page_label_template: PAGE_LABEL_TEMPLATE.to_string(),
    }));

    Ok(DocumentModel { blocks })
}

/// Deterministic artifact name: `{kind_slug}_{YYYY-MM-DD}.pdf`.
pub fn report_file_name(kind: ReportKind, date: NaiveDate) -> String {
    format!("{}_{}.pdf", kind.slug(), date.format("%Y-%m-%d"))
}

fn timestamp_line(at: NaiveDateTime) -> String {
    format!(
        "Data: {} - Hora: {}",
        at.format("%d/%m/%Y"),
        at.format("%H:%M:%S")
    )
}

fn patient_fields(patient: &PatientRecord) -> Vec<Field> {
    vec![
        Field::new("Nome", Some(patient.nome.clone())),
        Field::new("Prontuário", Some(patient.prontuario.clone())),
        Field::new("Data de Admissão", patient.data_admissao.clone()),
        Field::new("Leito", patient.leito.clone()),
        Field::new("Médico Responsável", patient.medico_responsavel.clone()),
    ]
}
