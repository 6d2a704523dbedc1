use std::sync::Arc;

use crate::config::Config;
use crate::llm_client::ModelInvoker;
use crate::render::pdf::PdfRenderer;
use crate::render::template::TemplateCache;
use crate::store::ProfileStore;

/// Shared application state injected into all route handlers via Axum extractors.
///
/// The template cache is the only cross-request mutable state; the model
/// invoker, profile store, and PDF renderer are behind traits so tests can
/// drive the real router with mocks.
#[derive(Clone)]
pub struct AppState {
    pub llm: Arc<dyn ModelInvoker>,
    pub profiles: Arc<dyn ProfileStore>,
    pub templates: Arc<TemplateCache>,
    pub pdf: Arc<dyn PdfRenderer>,
    pub config: Config,
}
