/// One labelled value from a submitted form. A `value` of `None` or blank
/// text means the field was left empty: it is skipped at layout time and
/// never occupies vertical space.
#[derive(Clone, Debug, PartialEq)]
pub struct Field {
    pub label: String,
    pub value: Option<String>,
}

impl Field {
    pub fn new(label: impl Into<String>, value: Option<String>) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }

    /// The trimmed value, or `None` for an empty field.
    pub fn text(&self) -> Option<&str> {
        self.value
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }
}

#[derive(Debug)]
pub struct HeaderBlock {
    pub title: String,
    pub timestamp_line: String,
}

#[derive(Debug)]
pub struct PatientBlock {
    pub heading: String,
    pub fields: Vec<Field>,
}

#[derive(Debug)]
pub struct SectionBlock {
    pub title: String,
    pub fields: Vec<Field>,
}

#[derive(Debug)]
pub struct SignatureBlock {
    pub signer_name: String,
    pub signer_credential: String,
}

#[derive(Debug)]
pub struct FooterBlock {
    /// Template with `{page}` / `{pages}` placeholders, expanded once the
    /// final page count is known.
    pub page_label_template: String,
}

#[derive(Debug)]
pub enum Block {
    Header(HeaderBlock),
    Patient(PatientBlock),
    Section(SectionBlock),
    Signature(SignatureBlock),
    Footer(FooterBlock),
}

/// Ordered sequence of blocks for one report. Built fresh per export
/// request by the adapter in `report`; the layout engine never mutates it.
#[derive(Debug)]
pub struct DocumentModel {
    pub blocks: Vec<Block>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Margins {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageGeometry {
    pub width: f32,  // points
    pub height: f32, // points
    pub margins: Margins,
}

impl PageGeometry {
    /// A4 portrait with the report style's 50 pt margins.
    pub fn a4() -> Self {
        Self {
            width: 595.276,
            height: 841.89,
            margins: Margins {
                top: 50.0,
                right: 50.0,
                bottom: 50.0,
                left: 50.0,
            },
        }
    }

    /// Horizontal space available to content between the side margins.
    pub fn text_width(&self) -> f32 {
        self.width - self.margins.left - self.margins.right
    }
}
