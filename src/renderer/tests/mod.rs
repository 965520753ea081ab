mod basic;

use crate::config::EngineConfig;
use crate::context::Context;
use crate::engine::Engine;
use crate::errors::Result;
use crate::loader::MemoryLoader;

async fn render_template(content: &str, context: &Context) -> Result<String> {
    let engine = Engine::with_loader(EngineConfig::default(), MemoryLoader::new());
    engine.render_str(content, context).await
}
