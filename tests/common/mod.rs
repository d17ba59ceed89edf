use std::collections::HashMap;

use chrono::{NaiveDate, NaiveDateTime};
use evolp_report::{PatientRecord, ReportKind, ReportRequest, Signer};

pub fn fixed_timestamp() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 9)
        .unwrap()
        .and_hms_opt(14, 30, 0)
        .unwrap()
}

pub fn sample_patient() -> PatientRecord {
    PatientRecord {
        nome: "Maria da Silva".to_string(),
        prontuario: "12345".to_string(),
        data_admissao: Some("05/03/2024".to_string()),
        leito: Some("12B".to_string()),
        medico_responsavel: Some("Dr. Carlos Andrade".to_string()),
    }
}

pub fn minimal_patient() -> PatientRecord {
    PatientRecord {
        nome: "Maria da Silva".to_string(),
        prontuario: "12345".to_string(),
        data_admissao: None,
        leito: None,
        medico_responsavel: None,
    }
}

pub fn sample_signer() -> Signer {
    Signer {
        nome: "Ana Souza".to_string(),
        coren: "COREN-SP 123.456".to_string(),
    }
}

pub fn avaliacao_form() -> HashMap<String, String> {
    let mut form = HashMap::new();
    form.insert(
        "queixaPrincipal".to_string(),
        "Dor abdominal intensa".to_string(),
    );
    form.insert(
        "historicoMedico".to_string(),
        "Histórico de gastrite".to_string(),
    );
    form.insert("pressaoArterial".to_string(), "120/80 mmHg".to_string());
    form.insert("frequenciaCardiaca".to_string(), "80 bpm".to_string());
    form.insert("temperatura".to_string(), "36.5°C".to_string());
    form
}

pub fn sample_request() -> ReportRequest {
    ReportRequest {
        kind: ReportKind::Avaliacao,
        patient: sample_patient(),
        form: avaliacao_form(),
        signer: sample_signer(),
        generated_at: fixed_timestamp(),
    }
}

pub fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

pub fn count_occurrences(haystack: &[u8], needle: &[u8]) -> usize {
    haystack
        .windows(needle.len())
        .filter(|window| *window == needle)
        .count()
}

/// Decompress the first FlateDecode content stream in the artifact.
pub fn first_content_stream(pdf: &[u8]) -> Vec<u8> {
    let start = find_subslice(pdf, b"stream\n").expect("artifact has a stream") + b"stream\n".len();
    let end = start
        + find_subslice(&pdf[start..], b"\nendstream").expect("stream is terminated");
    miniz_oxide::inflate::decompress_to_vec_zlib(&pdf[start..end])
        .expect("content stream inflates")
}
