//! Responsible for rendering templates

use std::path::{Path, PathBuf};

pub use self::call_stack::CallStack;
pub use self::processor::Processor;
pub use self::raw_html::RawHtmlTable;
pub use self::stack_frame::StackFrame;

mod call_stack;
mod operators;
mod processor;
mod raw_html;
mod stack_frame;

#[cfg(test)]
mod tests;

/// State of one top-level render, shared by every template it includes
#[derive(Debug)]
pub struct RenderSession {
    /// Paths of the templates being rendered, innermost include last
    pub include_stack: Vec<PathBuf>,
    /// What non-relative include paths are resolved against
    pub base_path: PathBuf,
    /// Values of the `html_` variables set during this render
    pub raw_html: RawHtmlTable,
    /// How many includes deep we currently are
    includes: usize,
}

impl RenderSession {
    pub fn new(base_path: PathBuf) -> Self {
        RenderSession { include_stack: Vec::new(), base_path, raw_html: RawHtmlTable::new(), includes: 0 }
    }

    /// Directory of the template currently rendering, what `./` and `../` are relative to
    pub fn current_dir(&self) -> &Path {
        self.include_stack.last().and_then(|p| p.parent()).unwrap_or(&self.base_path)
    }

    /// How many templates are being rendered on top of the entry one.
    /// The entry template may or may not have a path, so this isn't the stack length.
    pub fn depth(&self) -> usize {
        self.includes
    }

    pub fn enter_include(&mut self, path: PathBuf) {
        self.include_stack.push(path);
        self.includes += 1;
    }

    pub fn leave_include(&mut self) {
        self.include_stack.pop();
        self.includes -= 1;
    }
}
