//! Layout engine: walks the document model top-down and computes an
//! absolute baseline position for every emitted line, deciding when to
//! start a new page. Produces a flat instruction stream for the renderer
//! in `pdf`; it knows nothing about PDF objects itself.

use crate::model::{
    Block, DocumentModel, FooterBlock, HeaderBlock, PageGeometry, PatientBlock, SectionBlock,
    SignatureBlock,
};

pub const LINE_HEIGHT: f32 = 20.0;
pub const SECTION_GAP: f32 = 24.0;
pub const FIELD_GAP: f32 = 4.0;
/// Vertical budget checked before a section title: divider + title line.
pub const SECTION_HEADER_HEIGHT: f32 = 30.0;
/// Space above the bottom margin that ordinary content may never enter,
/// so the page-number line always has room.
pub const FOOTER_RESERVE: f32 = 20.0;
/// Bottom region claimed by the signature rule and its two text lines.
pub const SIGNATURE_RESERVE: f32 = 64.0;

const TITLE_SIZE: f32 = 20.0;
const SECTION_TITLE_SIZE: f32 = 16.0;
const BODY_SIZE: f32 = 12.0;
const FOOTER_SIZE: f32 = 10.0;

const PATIENT_VALUE_INDENT: f32 = 100.0;
const FIELD_LABEL_INDENT: f32 = 5.0;
const FIELD_VALUE_INDENT: f32 = 50.0;
const SIGNATURE_RULE_WIDTH: f32 = 180.0;
const SIGNATURE_RULE_RAISE: f32 = 44.0; // above the bottom margin
const FOOTER_BASELINE_Y: f32 = 30.0; // above the page edge

const HEADING_GRAY: [u8; 3] = [51, 51, 51];
const LABEL_GRAY: [u8; 3] = [102, 102, 102];
const BODY_GRAY: [u8; 3] = [51, 51, 51];
const DIVIDER_GRAY: [u8; 3] = [204, 204, 204];
const FOOTER_GRAY: [u8; 3] = [128, 128, 128];

/// Text-width measurement supplied by the font layer. `None` means the
/// run cannot be measured with the active font; callers degrade instead
/// of failing.
pub trait Measure {
    fn text_width(&self, text: &str, size: f32, bold: bool) -> Option<f32>;
}

/// One primitive drawing operation with page-relative PDF coordinates.
/// Immutable once produced; the renderer consumes them in emission order.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawInstruction {
    Text {
        page: usize,
        x: f32,
        y: f32,
        content: String,
        size: f32,
        bold: bool,
        color: [u8; 3],
    },
    Line {
        page: usize,
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        color: [u8; 3],
    },
    PageBreak,
}

/// Cursor over one document build. `y` is a PDF baseline ordinate: it
/// starts just under the top margin and only ever decreases; `page` only
/// grows. Owned exclusively by the engine for the duration of one build.
#[derive(Clone, Debug)]
pub struct LayoutState {
    pub page: usize,
    pub y: f32,
    geometry: PageGeometry,
}

impl LayoutState {
    pub fn new(geometry: &PageGeometry) -> Self {
        Self {
            page: 1,
            y: geometry.height - geometry.margins.top,
            geometry: *geometry,
        }
    }

    /// Lowest baseline ordinary content may occupy on any page.
    pub fn floor(&self) -> f32 {
        self.geometry.margins.bottom + FOOTER_RESERVE
    }

    /// Whether `needed` points of content still fit above the floor.
    pub fn fits(&self, needed: f32) -> bool {
        self.y - needed >= self.floor()
    }

    fn break_page(&mut self, out: &mut Vec<DrawInstruction>) {
        out.push(DrawInstruction::PageBreak);
        self.page += 1;
        self.y = self.geometry.height - self.geometry.margins.top;
    }

    fn ensure(&mut self, needed: f32, out: &mut Vec<DrawInstruction>) {
        if !self.fits(needed) {
            self.break_page(out);
        }
    }
}

/// First-pass result: positioned content without footers, plus the final
/// page count the footer pass needs.
pub struct Layout {
    pub instructions: Vec<DrawInstruction>,
    pub page_count: usize,
}

/// Pass 1: position every block of the model. Footer blocks are skipped
/// here because the page count is unknown until layout finishes; see
/// [`footer_instructions`] and [`assemble`].
pub fn layout(doc: &DocumentModel, geometry: &PageGeometry, measure: &dyn Measure) -> Layout {
    let mut state = LayoutState::new(geometry);
    let mut out = Vec::new();

    for block in &doc.blocks {
        match block {
            Block::Header(header) => layout_header(header, geometry, &mut state, &mut out),
            Block::Patient(patient) => layout_patient(patient, geometry, &mut state, &mut out),
            Block::Section(section) => {
                layout_section(section, geometry, measure, &mut state, &mut out)
            }
            Block::Signature(signature) => {
                layout_signature(signature, geometry, measure, &mut state, &mut out)
            }
            Block::Footer(_) => {}
        }
    }

    Layout {
        page_count: state.page,
        instructions: out,
    }
}

/// Pass 2: one centered page label per page, from the footer template.
/// Pure in the final page count so the two passes stay separate.
pub fn footer_instructions(
    doc: &DocumentModel,
    geometry: &PageGeometry,
    measure: &dyn Measure,
    page_count: usize,
) -> Vec<DrawInstruction> {
    let mut out = Vec::new();
    for block in &doc.blocks {
        let Block::Footer(FooterBlock {
            page_label_template,
        }) = block
        else {
            continue;
        };
        for page in 1..=page_count {
            let content = page_label_template
                .replace("{page}", &page.to_string())
                .replace("{pages}", &page_count.to_string());
            out.push(centered_text(
                page,
                geometry.width / 2.0,
                FOOTER_BASELINE_Y,
                content,
                FOOTER_SIZE,
                false,
                FOOTER_GRAY,
                measure,
            ));
        }
    }
    out
}

/// Splice the per-page footer labels into the layout stream so the
/// combined stream stays page-ordered: each page's footer lands right
/// before the `PageBreak` that closes it, the last page's at the end.
pub fn assemble(pass1: Vec<DrawInstruction>, footers: Vec<DrawInstruction>) -> Vec<DrawInstruction> {
    let mut out = Vec::with_capacity(pass1.len() + footers.len());
    let mut footers = footers.into_iter();
    for instruction in pass1 {
        if matches!(instruction, DrawInstruction::PageBreak) {
            out.extend(footers.next());
        }
        out.push(instruction);
    }
    out.extend(footers);
    out
}

/// Greedy word wrap: pack whitespace-separated words until the next word
/// would exceed `max_width`, then break. A word wider than `max_width`
/// gets a line of its own rather than being split. Returns `None` when
/// any word cannot be measured, so the caller can fall back to a single
/// unwrapped line.
pub fn wrap_text(
    text: &str,
    max_width: f32,
    size: f32,
    measure: &dyn Measure,
) -> Option<Vec<String>> {
    let space = measure.text_width(" ", size, false)?;
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_width = 0.0_f32;

    for word in text.split_whitespace() {
        let word_width = measure.text_width(word, size, false)?;
        if current.is_empty() {
            current.push_str(word);
            current_width = word_width;
        } else if current_width + space + word_width > max_width {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
            current_width = word_width;
        } else {
            current.push(' ');
            current.push_str(word);
            current_width += space + word_width;
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    Some(lines)
}

fn layout_header(
    header: &HeaderBlock,
    geometry: &PageGeometry,
    state: &mut LayoutState,
    out: &mut Vec<DrawInstruction>,
) {
    // Fixed top offset on page 1 only; the header is always the first block.
    out.push(DrawInstruction::Text {
        page: state.page,
        x: geometry.margins.left,
        y: state.y,
        content: header.title.clone(),
        size: TITLE_SIZE,
        bold: true,
        color: HEADING_GRAY,
    });
    out.push(DrawInstruction::Text {
        page: state.page,
        x: geometry.margins.left,
        y: state.y - LINE_HEIGHT,
        content: header.timestamp_line.clone(),
        size: BODY_SIZE,
        bold: false,
        color: LABEL_GRAY,
    });
    state.y -= 2.0 * LINE_HEIGHT;
}

fn layout_patient(
    patient: &PatientBlock,
    geometry: &PageGeometry,
    state: &mut LayoutState,
    out: &mut Vec<DrawInstruction>,
) {
    state.ensure(1.5 * LINE_HEIGHT, out);
    out.push(DrawInstruction::Text {
        page: state.page,
        x: geometry.margins.left,
        y: state.y,
        content: patient.heading.clone(),
        size: SECTION_TITLE_SIZE,
        bold: true,
        color: HEADING_GRAY,
    });
    state.y -= 1.5 * LINE_HEIGHT;

    for field in &patient.fields {
        let Some(value) = field.text() else {
            continue;
        };
        state.ensure(LINE_HEIGHT, out);
        out.push(DrawInstruction::Text {
            page: state.page,
            x: geometry.margins.left,
            y: state.y,
            content: format!("{}:", field.label),
            size: BODY_SIZE,
            bold: true,
            color: LABEL_GRAY,
        });
        out.push(DrawInstruction::Text {
            page: state.page,
            x: geometry.margins.left + PATIENT_VALUE_INDENT,
            y: state.y,
            content: value.to_string(),
            size: BODY_SIZE,
            bold: false,
            color: BODY_GRAY,
        });
        state.y -= LINE_HEIGHT;
    }
}

fn layout_section(
    section: &SectionBlock,
    geometry: &PageGeometry,
    measure: &dyn Measure,
    state: &mut LayoutState,
    out: &mut Vec<DrawInstruction>,
) {
    // An all-empty section still gets its divider and title; the title can
    // therefore still trigger a page break on its own.
    state.ensure(SECTION_HEADER_HEIGHT, out);

    let rule_y = state.y + 15.0;
    out.push(DrawInstruction::Line {
        page: state.page,
        x1: geometry.margins.left,
        y1: rule_y,
        x2: geometry.width - geometry.margins.right,
        y2: rule_y,
        color: DIVIDER_GRAY,
    });
    out.push(DrawInstruction::Text {
        page: state.page,
        x: geometry.margins.left,
        y: state.y,
        content: section.title.clone(),
        size: SECTION_TITLE_SIZE,
        bold: true,
        color: HEADING_GRAY,
    });
    state.y -= SECTION_HEADER_HEIGHT;

    let wrap_width = geometry.text_width() - FIELD_VALUE_INDENT;
    for field in &section.fields {
        let Some(value) = field.text() else {
            continue;
        };
        let lines = match wrap_text(value, wrap_width, BODY_SIZE, measure) {
            Some(lines) => lines,
            None => {
                log::warn!(
                    "text width unavailable for field '{}': leaving value unwrapped",
                    field.label
                );
                vec![value.to_string()]
            }
        };
        for (index, line) in lines.into_iter().enumerate() {
            state.ensure(LINE_HEIGHT, out);
            if index == 0 {
                out.push(DrawInstruction::Text {
                    page: state.page,
                    x: geometry.margins.left + FIELD_LABEL_INDENT,
                    y: state.y,
                    content: format!("{}:", field.label),
                    size: BODY_SIZE,
                    bold: true,
                    color: LABEL_GRAY,
                });
            }
            out.push(DrawInstruction::Text {
                page: state.page,
                x: geometry.margins.left + FIELD_VALUE_INDENT,
                y: state.y,
                content: line,
                size: BODY_SIZE,
                bold: false,
                color: BODY_GRAY,
            });
            state.y -= LINE_HEIGHT;
        }
        state.y -= FIELD_GAP;
    }
    state.y -= SECTION_GAP;
}

fn layout_signature(
    signature: &SignatureBlock,
    geometry: &PageGeometry,
    measure: &dyn Measure,
    state: &mut LayoutState,
    out: &mut Vec<DrawInstruction>,
) {
    if !state.fits(SIGNATURE_RESERVE) {
        state.break_page(out);
    }

    // Anchored to the page bottom on whichever page it lands, never to
    // the running cursor.
    let center_x = geometry.width / 2.0;
    let rule_y = geometry.margins.bottom + SIGNATURE_RULE_RAISE;
    out.push(DrawInstruction::Line {
        page: state.page,
        x1: center_x - SIGNATURE_RULE_WIDTH / 2.0,
        y1: rule_y,
        x2: center_x + SIGNATURE_RULE_WIDTH / 2.0,
        y2: rule_y,
        color: HEADING_GRAY,
    });
    out.push(centered_text(
        state.page,
        center_x,
        rule_y - 16.0,
        signature.signer_name.clone(),
        BODY_SIZE,
        true,
        BODY_GRAY,
        measure,
    ));
    out.push(centered_text(
        state.page,
        center_x,
        rule_y - 30.0,
        signature.signer_credential.clone(),
        FOOTER_SIZE,
        false,
        LABEL_GRAY,
        measure,
    ));
}

fn centered_text(
    page: usize,
    center_x: f32,
    y: f32,
    content: String,
    size: f32,
    bold: bool,
    color: [u8; 3],
    measure: &dyn Measure,
) -> DrawInstruction {
    let x = match measure.text_width(&content, size, bold) {
        Some(width) => center_x - width / 2.0,
        None => {
            log::warn!("text width unavailable: approximating centered placement");
            center_x
        }
    };
    DrawInstruction::Text {
        page,
        x,
        y,
        content,
        size,
        bold,
        color,
    }
}
