use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Startup fails fast if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub anthropic_api_key: String,
    /// Directory holding stored profile records as `<id>.json`.
    pub profiles_dir: String,
    /// Optional on-disk resume template. Falls back to the built-in template.
    pub template_path: Option<String>,
    /// Endpoint of the headless-browser PDF render service.
    pub pdf_renderer_url: String,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            profiles_dir: std::env::var("PROFILES_DIR").unwrap_or_else(|_| "./profiles".to_string()),
            template_path: std::env::var("TEMPLATE_PATH").ok(),
            pdf_renderer_url: std::env::var("PDF_RENDERER_URL")
                .unwrap_or_else(|_| "http://localhost:3000/pdf".to_string()),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}
