use serde_json::Value;

use crate::context::ValueRender;

/// Values assigned to `html_` names with `#set`.
///
/// The template only ever sees an opaque marker, which goes through escaping untouched
/// (it only contains `[a-z0-9_]`). The real values are put back in the output once
/// the whole render, includes included, is done.
#[derive(Debug)]
pub struct RawHtmlTable {
    nonce: String,
    entries: Vec<(String, String)>,
}

impl Default for RawHtmlTable {
    fn default() -> Self {
        RawHtmlTable::new()
    }
}

impl RawHtmlTable {
    pub fn new() -> Self {
        RawHtmlTable { nonce: format!("{:016x}", rand::random::<u64>()), entries: Vec::new() }
    }

    /// Keeps the rendered `value` aside and returns the marker standing for it
    pub fn store(&mut self, value: &Value) -> String {
        let marker = format!("__html_{}_{}__", self.nonce, self.entries.len());
        self.entries.push((marker.clone(), value.render().into_owned()));
        marker
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Puts the real values back in a string about to be given to a filter,
    /// so that filters work on the html and not on the marker
    pub fn resolve(&self, value: Value) -> Value {
        match value {
            Value::String(s) if !self.is_empty() && s.contains("__html_") => Value::String(self.substitute(s)),
            _ => value,
        }
    }

    /// Replaces every marker in `output` by its value.
    ///
    /// Newest first: a value stored later can contain the marker of an earlier one.
    pub fn substitute(&self, output: String) -> String {
        let mut output = output;
        for (marker, value) in self.entries.iter().rev() {
            if output.contains(marker.as_str()) {
                output = output.replace(marker.as_str(), value);
            }
        }
        output
    }
}
