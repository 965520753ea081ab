use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use log::debug;
use serde_json::{Map, Value};

use crate::builtins::filters::cycle::CycleRegistry;
use crate::builtins::filters::{Filter, FilterRegistry};
use crate::config::EngineConfig;
use crate::context::Context;
use crate::errors::{Error, Result};
use crate::loader::{FsLoader, TemplateLoader};
use crate::paths;
use crate::renderer::{CallStack, Processor, RenderSession, StackFrame};
use crate::template::Template;

/// The main point of interaction in this library.
///
/// Templates are loaded lazily through the [`TemplateLoader`] on first render and,
/// unless disabled in the config, kept parsed in memory afterwards.
///
/// An `Engine` can be shared between tasks: renders only need `&self`.
pub struct Engine {
    config: EngineConfig,
    loader: Box<dyn TemplateLoader>,
    /// Parsed templates, keyed by resolved path
    templates: RwLock<HashMap<PathBuf, Arc<Template>>>,
    filters: FilterRegistry,
    cycles: Arc<CycleRegistry>,
}

impl Engine {
    /// Create a new instance reading templates from the filesystem with the default config
    pub fn new() -> Engine {
        Engine::with_config(EngineConfig::default())
    }

    /// Create a new instance reading templates from the filesystem
    ///
    /// ```no_run
    /// # use stencil::{Engine, EngineConfig};
    /// let engine = Engine::with_config(EngineConfig::default().with_root("templates"));
    /// ```
    pub fn with_config(config: EngineConfig) -> Engine {
        Engine::with_loader(config, FsLoader)
    }

    /// Create a new instance reading templates with the given loader
    pub fn with_loader(config: EngineConfig, loader: impl TemplateLoader + 'static) -> Engine {
        let cycles = Arc::new(CycleRegistry::new());
        Engine {
            config,
            loader: Box::new(loader),
            templates: RwLock::new(HashMap::new()),
            filters: FilterRegistry::with_builtins(cycles.clone()),
            cycles,
        }
    }

    /// The config this engine was built with
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub(crate) fn filters(&self) -> &FilterRegistry {
        &self.filters
    }

    /// Renders the template at `template_path` with the given context.
    ///
    /// In root mode the path is relative to the root and can't leave it.
    ///
    /// ```no_run
    /// # use stencil::{Context, Engine};
    /// # async fn run() -> stencil::Result<()> {
    /// let engine = Engine::new();
    /// let mut context = Context::new();
    /// context.insert("score", &75);
    /// let html = engine.render("templates/index.html", &context).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn render(&self, template_path: &str, context: &Context) -> Result<String> {
        let path = paths::resolve_entry(template_path, self.config.root.as_deref())?;
        let base_path = match self.config.root {
            Some(ref root) => paths::normalize(root),
            None => path.parent().map(Path::to_path_buf).unwrap_or_default(),
        };

        let template = self.load(&path).await?;
        let mut session = RenderSession::new(base_path);
        session.include_stack.push(path);

        self.render_template(&template, context, session).await
    }

    /// Renders a one off template, for example a template from the database.
    /// Includes are resolved against the root, or the working directory.
    ///
    /// ```rust
    /// # use stencil::{Context, Engine};
    /// # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
    /// let engine = Engine::new();
    /// let mut context = Context::new();
    /// context.insert("greeting", &"Hello");
    /// let string = engine.render_str("{{ greeting }} World!", &context).await.unwrap();
    /// assert_eq!(string, "Hello World!");
    /// # });
    /// ```
    pub async fn render_str(&self, input: &str, context: &Context) -> Result<String> {
        let template = Template::new("__stencil_one_off", None, input)?;
        let base_path = self.config.root.as_deref().map(paths::normalize).unwrap_or_default();

        self.render_template(&template, context, RenderSession::new(base_path)).await
    }

    async fn render_template(
        &self,
        template: &Template,
        context: &Context,
        mut session: RenderSession,
    ) -> Result<String> {
        let output = {
            let call_stack = CallStack::new(context.as_map().clone(), None);
            let mut processor = Processor::new(template, self, call_stack, &mut session);
            processor.render().await?
        };

        if session.raw_html.is_empty() {
            return Ok(output);
        }
        Ok(session.raw_html.substitute(output))
    }

    /// Renders an `#include` of the template currently at the top of `session`
    pub(crate) async fn render_include(
        &self,
        path: &str,
        data: Map<String, Value>,
        frame: Option<StackFrame>,
        session: &mut RenderSession,
    ) -> Result<String> {
        if session.depth() >= self.config.max_include_depth {
            return Err(Error::include_depth(path));
        }

        let resolved = paths::resolve_include(
            path,
            session.current_dir(),
            &session.base_path,
            self.config.root.as_deref(),
        )?;
        debug!("Resolved include '{}' to {}", path, resolved.display());
        let template = self.load(&resolved).await?;

        session.enter_include(resolved);
        let rendered = {
            let mut processor = Processor::new(&template, self, CallStack::new(data, frame), session);
            processor.render().await
        };
        session.leave_include();

        rendered
    }

    async fn load(&self, path: &Path) -> Result<Arc<Template>> {
        if self.config.cache {
            let cached = self.templates.read().unwrap_or_else(PoisonError::into_inner).get(path).cloned();
            if let Some(template) = cached {
                debug!("Template cache hit for {}", path.display());
                return Ok(template);
            }
        }

        let source = self.loader.read(path).await?;
        let name = path.display().to_string();
        let template = Arc::new(Template::new(&name, Some(path.to_path_buf()), &source)?);
        debug!("Loaded template {}", name);

        if self.config.cache {
            self.templates
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(path.to_path_buf(), Arc::clone(&template));
        }

        Ok(template)
    }

    /// Register a filter with Engine.
    ///
    /// If a filter with that name already exists, it will be overwritten
    ///
    /// ```rust
    /// # use stencil::{Engine, Value};
    /// let mut engine = Engine::new();
    /// engine.register_filter("shout", |value: &Value, _: &[Value]| -> stencil::Result<Value> {
    ///     Ok(Value::String(format!("{}!", value.as_str().unwrap_or_default())))
    /// });
    /// ```
    pub fn register_filter<F: Filter + 'static>(&mut self, name: &str, filter: F) {
        self.filters.register(name, filter);
    }

    /// Forgets every parsed template, they will be read again on their next use
    pub fn clear_cache(&self) {
        let mut templates = self.templates.write().unwrap_or_else(PoisonError::into_inner);
        debug!("Clearing {} template(s) from the cache", templates.len());
        templates.clear();
    }

    /// Forgets one parsed template, `template_path` being resolved like in `render`.
    /// Returns whether it was cached.
    pub fn remove_from_cache(&self, template_path: &str) -> bool {
        let path = match paths::resolve_entry(template_path, self.config.root.as_deref()) {
            Ok(path) => path,
            Err(_) => return false,
        };

        let removed =
            self.templates.write().unwrap_or_else(PoisonError::into_inner).remove(&path).is_some();
        if removed {
            debug!("Removed {} from the template cache", path.display());
        }
        removed
    }

    /// Drops every generator created by the `cycle` filter
    pub fn clear_cycles(&self) {
        self.cycles.clear();
    }
}

impl Default for Engine {
    fn default() -> Engine {
        Engine::new()
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let templates = self.templates.read().unwrap_or_else(PoisonError::into_inner);
        let mut cached: Vec<_> = templates.keys().collect();
        cached.sort();
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("cached_templates", &cached)
            .field("cycles", &self.cycles.len())
            .finish()
    }
}
