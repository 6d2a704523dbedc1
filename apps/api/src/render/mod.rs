//! External rendering collaborators: markup templating and PDF conversion.

pub mod pdf;
pub mod template;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("template error: {0}")]
    Template(#[from] std::io::Error),

    #[error("pdf renderer request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("pdf renderer returned status {status}: {message}")]
    Renderer { status: u16, message: String },

    #[error("pdf renderer returned an empty document")]
    EmptyDocument,
}
