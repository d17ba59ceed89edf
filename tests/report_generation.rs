//! End-to-end report generation: request validation, PDF structure,
//! determinism, and renderer failure modes.

mod common;

use evolp_report::{
    DrawInstruction, Error, Measure, PageGeometry, ReportFonts, ReportKind, ReportRequest,
    build_document, generate_pdf, generate_pdf_to_file, layout, render, report_file_name,
};

#[test]
fn same_request_yields_byte_identical_artifacts() {
    let _ = env_logger::try_init();
    let request = common::sample_request();
    let fonts = ReportFonts::builtin();

    let first = generate_pdf(&request, &fonts).unwrap();
    let second = generate_pdf(&request, &fonts).unwrap();
    assert_eq!(first, second);
}

#[test]
fn artifact_has_the_expected_pdf_structure() {
    let request = common::sample_request();
    let fonts = ReportFonts::builtin();
    let bytes = generate_pdf(&request, &fonts).unwrap();

    assert!(bytes.starts_with(b"%PDF-"));
    assert_eq!(common::count_occurrences(&bytes, b"/Type /Pages"), 1);

    // The page tree count matches what the layout pass computed.
    let doc = build_document(&request).unwrap();
    let pass = layout(&doc, &PageGeometry::a4(), &fonts);
    let count_entry = format!("/Count {}", pass.page_count);
    assert!(common::find_subslice(&bytes, count_entry.as_bytes()).is_some());

    // Content streams are Flate-compressed and hold real text operators.
    assert!(common::find_subslice(&bytes, b"/Filter /FlateDecode").is_some());
    let content = common::first_content_stream(&bytes);
    assert!(common::find_subslice(&content, b"BT").is_some());
    assert!(common::find_subslice(&content, b"Tj").is_some());
}

#[test]
fn absent_optional_patient_fields_are_skipped() {
    // Scenario C: only Nome and Prontuário remain.
    let mut request = common::sample_request();
    request.patient = common::minimal_patient();

    let doc = build_document(&request).unwrap();
    let fonts = ReportFonts::builtin();
    let pass = layout(&doc, &PageGeometry::a4(), &fonts);

    let labels: Vec<String> = pass
        .instructions
        .iter()
        .filter_map(|instruction| match instruction {
            DrawInstruction::Text { content, bold: true, .. } if content.ends_with(':') => {
                Some(content.clone())
            }
            _ => None,
        })
        .collect();
    assert!(labels.contains(&"Nome:".to_string()));
    assert!(labels.contains(&"Prontuário:".to_string()));
    assert!(!labels.contains(&"Data de Admissão:".to_string()));
    assert!(!labels.contains(&"Leito:".to_string()));
    assert!(!labels.contains(&"Médico Responsável:".to_string()));
}

#[test]
fn blank_patient_identity_is_rejected_before_layout() {
    let mut request = common::sample_request();
    request.patient.nome = "   ".to_string();

    let err = build_document(&request).unwrap_err();
    assert!(matches!(err, Error::Validation(_)));

    let mut request = common::sample_request();
    request.patient.prontuario = String::new();
    assert!(matches!(
        build_document(&request).unwrap_err(),
        Error::Validation(_)
    ));
}

#[test]
fn malformed_payload_is_a_validation_error() {
    let err = ReportRequest::from_json_str("[1, 2, 3]").unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
}

#[test]
fn json_payload_round_trips_through_the_pipeline() {
    let payload = r#"{
        "kind": "avaliacao",
        "patient": {
            "nome": "Maria da Silva",
            "prontuario": "12345",
            "dataAdmissao": "05/03/2024"
        },
        "form": {
            "queixaPrincipal": "Dor abdominal intensa",
            "pressaoArterial": "120/80 mmHg"
        },
        "signer": { "nome": "Ana Souza", "coren": "COREN-SP 123.456" },
        "generatedAt": "2024-03-09T14:30:00"
    }"#;

    let request = ReportRequest::from_json_str(payload).unwrap();
    assert_eq!(request.kind, ReportKind::Avaliacao);
    assert_eq!(request.kind.title(), "Avaliação de Enfermagem");
    assert_eq!(request.patient.leito, None);

    let bytes = generate_pdf(&request, &ReportFonts::builtin()).unwrap();
    assert!(bytes.starts_with(b"%PDF-"));
}

#[test]
fn writes_the_artifact_under_its_conventional_name() {
    let request = common::sample_request();
    std::fs::create_dir_all("tests/output").unwrap();
    let path = std::path::Path::new("tests/output")
        .join(report_file_name(request.kind, request.generated_at.date()));

    generate_pdf_to_file(&request, &ReportFonts::builtin(), &path).unwrap();

    let bytes = std::fs::read(&path).unwrap();
    assert!(bytes.starts_with(b"%PDF-"));
}

#[test]
fn out_of_order_instruction_aborts_the_render() {
    let fonts = ReportFonts::builtin();
    let instructions = vec![DrawInstruction::Text {
        page: 2,
        x: 50.0,
        y: 700.0,
        content: "fora de ordem".to_string(),
        size: 12.0,
        bold: false,
        color: [0, 0, 0],
    }];

    let err = render(&instructions, &PageGeometry::a4(), &fonts).unwrap_err();
    assert!(matches!(err, Error::Render(_)));
    assert!(err.to_string().contains("out-of-order"));

    // A page index that was already closed is just as invalid.
    let instructions = vec![
        DrawInstruction::PageBreak,
        DrawInstruction::Text {
            page: 1,
            x: 50.0,
            y: 700.0,
            content: "página fechada".to_string(),
            size: 12.0,
            bold: false,
            color: [0, 0, 0],
        },
    ];
    assert!(render(&instructions, &PageGeometry::a4(), &fonts).is_err());
}

#[test]
fn builtin_measurement_covers_winansi_and_degrades_beyond_it() {
    let fonts = ReportFonts::builtin();
    assert!(fonts.text_width("Pressão Arterial", 12.0, false).is_some());
    // Outside WinAnsi: measurement reports unavailable instead of guessing.
    assert!(fonts.text_width("体温", 12.0, false).is_none());
}

#[test]
fn artifact_names_are_deterministic_per_kind_and_date() {
    let date = common::fixed_timestamp().date();
    assert_eq!(
        report_file_name(ReportKind::Avaliacao, date),
        "avaliacao_enfermagem_2024-03-09.pdf"
    );
    assert_eq!(
        report_file_name(ReportKind::Evolucao, date),
        "evolucao_enfermagem_2024-03-09.pdf"
    );
}
