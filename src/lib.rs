//! Report generation engine for the EvolP nursing records system.
//!
//! The forms layer hands over a patient record plus one nursing-process
//! stage's form data; this crate lays the report out as a paginated,
//! styled PDF and hands the bytes back. Layout (positioning, page-break
//! policy, word wrap) and rendering (PDF objects, fonts, serialization)
//! are separate passes joined by a flat instruction stream, so each is
//! testable on its own.

mod error;
mod fonts;
mod layout;
mod model;
mod pdf;
mod report;

pub use error::Error;
pub use fonts::{ReportFont, ReportFonts};
pub use layout::{
    DrawInstruction, FIELD_GAP, FOOTER_RESERVE, LINE_HEIGHT, Layout, LayoutState, Measure,
    SECTION_GAP, SECTION_HEADER_HEIGHT, SIGNATURE_RESERVE, assemble, footer_instructions, layout,
    wrap_text,
};
pub use model::{
    Block, DocumentModel, Field, FooterBlock, HeaderBlock, Margins, PageGeometry, PatientBlock,
    SectionBlock, SignatureBlock,
};
pub use pdf::render;
pub use report::{
    PAGE_LABEL_TEMPLATE, PatientRecord, ReportKind, ReportRequest, SYSTEM_TITLE, Signer,
    build_document, report_file_name,
};

use std::path::Path;
use std::time::Instant;

/// Build one report: validate, lay out, number pages, render. Returns the
/// PDF bytes; saving them is the caller's responsibility.
pub fn generate_pdf(request: &ReportRequest, fonts: &ReportFonts) -> Result<Vec<u8>, Error> {
    let t0 = Instant::now();

    let doc = report::build_document(request)?;
    let geometry = PageGeometry::a4();
    let pass = layout::layout(&doc, &geometry, fonts);
    let page_count = pass.page_count;
    let footers = layout::footer_instructions(&doc, &geometry, fonts, page_count);
    let instructions = layout::assemble(pass.instructions, footers);
    let t_layout = t0.elapsed();

    let bytes = pdf::render(&instructions, &geometry, fonts)?;
    let t_total = t0.elapsed();

    log::info!(
        "Timing: layout={:.1}ms ({} pages, {} instructions), render={:.1}ms, total={:.1}ms (output {} bytes)",
        t_layout.as_secs_f64() * 1000.0,
        page_count,
        instructions.len(),
        (t_total - t_layout).as_secs_f64() * 1000.0,
        t_total.as_secs_f64() * 1000.0,
        bytes.len(),
    );

    Ok(bytes)
}

/// Convenience wrapper around [`generate_pdf`] that writes the artifact
/// to disk. See [`report_file_name`] for the conventional name.
pub fn generate_pdf_to_file(
    request: &ReportRequest,
    fonts: &ReportFonts,
    output: &Path,
) -> Result<(), Error> {
    let bytes = generate_pdf(request, fonts)?;
    std::fs::write(output, &bytes).map_err(Error::Io)?;
    Ok(())
}
