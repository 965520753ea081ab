#![doc(html_root_url = "https://docs.rs/stencil")]
//! # Stencil
//!
//! A brace-delimited template engine for HTML pages.
//!
//! Templates mix text with `{{ }}` blocks: interpolations of expressions and the
//! `#set`, `#if`/`#elseif`/`#else`, `#not`, `#each` and `#include` tags.
//!
//! ## Features
//!
//! - Expressions with math, comparison, logic and ternary operators
//! - Pipeable filters with arguments, and custom filters
//! - Loops over arrays and objects, with `@index`, `@key` and `this`
//! - Includes relative to the including template, optionally confined to a root directory
//! - Automatic escaping of HTML, with `html_` variables passed through as is
//! - Parsed templates cached in memory by resolved path
//!
//! ## Example
//!
//! ```rust
//! use stencil::{Context, Engine};
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let engine = Engine::new();
//! let mut context = Context::new();
//! context.insert("score", &75);
//!
//! let rendered = engine
//!     .render_str("{{#if score > 50}}Pass{{#else}}Fail{{/if}}", &context)
//!     .await
//!     .unwrap();
//! assert_eq!(rendered, "Pass");
//! # });
//! ```
//!
//! Templates on disk are rendered with [`Engine::render`], includes being loaded as needed
//! through a [`TemplateLoader`].

#![deny(missing_docs)]

#[macro_use]
mod macros;
mod builtins;
mod config;
mod context;
mod engine;
mod errors;
mod loader;
mod parser;
mod paths;
mod renderer;
mod template;
mod utils;

// Library exports.

pub use crate::builtins::filters::Filter;
pub use crate::config::EngineConfig;
pub use crate::context::Context;
pub use crate::engine::Engine;
pub use crate::errors::{Error, ErrorCategory, ErrorKind, Result};
pub use crate::loader::{FsLoader, MemoryLoader, TemplateLoader};
// Template is meant to be used internally only but is exported for tests.
#[doc(hidden)]
pub use crate::template::Template;
pub use crate::utils::escape_html;
// Re-export Value and other useful things from serde
// so apps/tools can encode data in template types
pub use serde_json::value::{from_value, to_value, Map, Number, Value};

// Exposes the AST if one needs it but changing the AST is not considered
// a breaking change so it isn't public
#[doc(hidden)]
pub use crate::parser::ast;
