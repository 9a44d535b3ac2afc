//! Bundled executor library
//!
//! Content-pipeline executors exercising the engine contract: LLM text
//! generation, research fetching, brand formatting, markdown export, delay.

mod delay;
mod export;
mod format;
mod research;
mod text_gen;

pub use delay::DelayExecutor;
pub use export::MarkdownExportExecutor;
pub use format::BrandFormatExecutor;
pub use research::ResearchFetchExecutor;
pub use text_gen::TextGenerateExecutor;

use craftruntime::ExecutorRegistry;
use std::sync::Arc;

/// Register all bundled executors with a registry
pub fn register_builtin(registry: &mut ExecutorRegistry) {
    registry.register(Arc::new(BrandFormatExecutor));
    registry.register(Arc::new(DelayExecutor));
    registry.register(Arc::new(MarkdownExportExecutor));
    registry.register(Arc::new(ResearchFetchExecutor::new()));
    registry.register(Arc::new(TextGenerateExecutor::new()));
}
