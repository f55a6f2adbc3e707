pub mod error;
pub mod model;
pub mod ollama;
pub mod schema;
pub mod summary;
pub mod translate;
pub mod zhipu;

// Re-exports
pub use error::{Error, Result};
pub use model::{build_model, LanguageModel, ModelProvider};
pub use ollama::OllamaModel;
pub use summary::SummaryService;
pub use translate::Translator;
pub use zhipu::ZhipuModel;
