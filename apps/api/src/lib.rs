pub mod config;
pub mod errors;
pub mod generation;
pub mod llm_client;
pub mod models;
pub mod render;
pub mod routes;
pub mod state;
pub mod store;
