use std::path::PathBuf;

use crate::errors::Result;
use crate::parser::ast::Node;
use crate::parser::parse;

/// This is the parsed equivalent of a template file.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    /// Name of the template, usually its resolved path
    pub name: String,
    /// Resolved path of the file it came from, `None` for string templates
    pub path: Option<PathBuf>,
    /// Parsed AST
    pub ast: Vec<Node>,
}

impl Template {
    /// Parse the template string given
    pub fn new(name: &str, path: Option<PathBuf>, input: &str) -> Result<Template> {
        let ast = parse(input)?;

        Ok(Template { name: name.to_string(), path, ast })
    }
}
