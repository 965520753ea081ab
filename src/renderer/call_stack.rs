use std::borrow::Cow;

use serde_json::{Map, Value};

use crate::errors::{Error, Result};
use crate::renderer::stack_frame::StackFrame;

/// Evaluator state of one render: the global data and one frame per active `#each` iteration
#[derive(Debug)]
pub struct CallStack {
    /// Context given to the render, extended by `#set`
    global: Map<String, Value>,
    /// The stack of frames, innermost loop last
    stack: Vec<StackFrame>,
}

impl CallStack {
    /// Create the initial call stack, `parent` being the loop frame an include was rendered from
    pub fn new(global: Map<String, Value>, parent: Option<StackFrame>) -> CallStack {
        CallStack { global, stack: parent.into_iter().collect() }
    }

    pub fn push(&mut self, frame: StackFrame) {
        self.stack.push(frame);
    }

    /// Pop the last frame
    pub fn pop(&mut self) {
        self.stack.pop();
    }

    pub fn current_frame(&self) -> Option<&StackFrame> {
        self.stack.last()
    }

    /// Finds a variable: fields of the current loop item shadow the global data
    pub fn lookup(&self, key: &str) -> Option<&Value> {
        if let Some(Value::Object(item)) = self.current_frame().map(|f| &f.item) {
            if let Some(found) = item.get(key) {
                return Some(found);
            }
        }

        self.global.get(key)
    }

    /// `this`: the current loop item, or the whole global data outside of loops
    pub fn this(&self) -> Cow<'_, Value> {
        match self.current_frame() {
            Some(frame) => Cow::Borrowed(&frame.item),
            None => Cow::Owned(Value::Object(self.global.clone())),
        }
    }

    pub fn index(&self) -> Option<usize> {
        self.current_frame().map(|f| f.index)
    }

    pub fn key(&self) -> Option<&str> {
        self.current_frame().and_then(|f| f.key.as_deref())
    }

    /// The data an included template sees: the global data with the fields
    /// of the current loop item on top
    pub fn include_data(&self) -> Map<String, Value> {
        let mut data = self.global.clone();
        if let Some(Value::Object(item)) = self.current_frame().map(|f| &f.item) {
            for (key, value) in item {
                data.insert(key.clone(), value.clone());
            }
        }
        data
    }

    /// `{{#set name = value}}`
    pub fn set_global(&mut self, name: &str, value: Value) {
        self.global.insert(name.to_string(), value);
    }

    /// `{{#set name.a.b = value}}`: `name` must already be an object (or an array),
    /// missing intermediate levels are created as empty objects
    pub fn set_path(&mut self, name: &str, path: &[String], value: Value) -> Result<()> {
        let (last, parents) = match path.split_last() {
            Some(split) => split,
            None => {
                self.set_global(name, value);
                return Ok(());
            }
        };

        let mut walked = name.to_string();
        let mut current = match self.global.get_mut(name) {
            Some(target) if target.is_object() || target.is_array() => target,
            _ => return Err(Error::invalid_set_target(walked)),
        };

        for key in parents {
            walked.push('.');
            walked.push_str(key);
            current = match current {
                Value::Object(map) => {
                    let entry = map.entry(key.clone()).or_insert(Value::Null);
                    if entry.is_null() {
                        *entry = Value::Object(Map::new());
                    }
                    entry
                }
                Value::Array(arr) => match key.parse::<usize>().ok().and_then(|i| arr.get_mut(i)) {
                    Some(entry) => entry,
                    None => return Err(Error::invalid_set_target(walked)),
                },
                _ => return Err(Error::invalid_set_target(walked)),
            };
            if !(current.is_object() || current.is_array()) {
                return Err(Error::invalid_set_target(walked));
            }
        }

        match current {
            Value::Object(map) => {
                map.insert(last.clone(), value);
                Ok(())
            }
            Value::Array(arr) => match last.parse::<usize>() {
                Ok(i) if i < arr.len() => {
                    arr[i] = value;
                    Ok(())
                }
                Ok(i) if i == arr.len() => {
                    arr.push(value);
                    Ok(())
                }
                _ => Err(Error::msg(format!("Index `{}` is out of bounds of `{}`", last, walked))),
            },
            _ => Err(Error::invalid_set_target(walked)),
        }
    }
}
