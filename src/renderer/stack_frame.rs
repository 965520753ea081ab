use serde_json::Value;

/// State of one iteration of an `#each` loop
#[derive(Debug, Clone, PartialEq)]
pub struct StackFrame {
    /// The current item, what `this` refers to
    pub item: Value,
    /// `@index`, 0-based
    pub index: usize,
    /// `@key`, only set when iterating on an object
    pub key: Option<String>,
}

impl StackFrame {
    pub fn new(item: Value, index: usize, key: Option<String>) -> Self {
        StackFrame { item, index, key }
    }
}
