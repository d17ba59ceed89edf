use std::io;
use thiserror::Error;

/// Errors surfaced by the report pipeline.
///
/// Validation failures happen before any layout work and leave no partial
/// artifact. Render failures abort the whole build; a failed renderer
/// session must not be reused.
#[derive(Error, Debug)]
pub enum Error {
    /// The report request is structurally invalid (missing required
    /// patient identity, undeserializable payload).
    #[error("invalid report request: {0}")]
    Validation(String),

    /// The PDF backend failed: font parse/embed failure, or an
    /// instruction targeting a page other than the one currently open.
    #[error("render error: {0}")]
    Render(String),

    /// I/O failure from the caller-side helpers (writing the artifact,
    /// loading a font file).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
