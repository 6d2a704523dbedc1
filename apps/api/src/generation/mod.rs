pub mod assembler;
pub mod classifier;
pub mod experience;
pub mod handlers;
pub mod prompts;
pub mod sanitizer;
