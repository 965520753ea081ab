/// The stateful `cycle`/`next` filters, used for zebra striping in loops
///
/// ```text
/// {{#set stripe = null | cycle("odd", "even")}}
/// {{#each rows}}<tr class="{{ stripe | next }}">{{/each}}
/// ```
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use serde_json::value::Value;

use crate::builtins::filters::Filter;
use crate::errors::{Error, Result};

#[derive(Debug)]
struct CycleState {
    values: Vec<Value>,
    position: usize,
}

/// Round-robin generators created by `cycle`, shared by every render of an `Engine`.
/// Nothing is evicted until `clear` is called.
#[derive(Debug, Default)]
pub struct CycleRegistry {
    next_id: AtomicUsize,
    cycles: Mutex<HashMap<String, CycleState>>,
}

impl CycleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new generator over `values` and returns its id
    pub fn start(&self, values: Vec<Value>) -> String {
        let id = format!("__cycle_{}", self.next_id.fetch_add(1, Ordering::Relaxed));
        let mut cycles = self.cycles.lock().unwrap_or_else(PoisonError::into_inner);
        cycles.insert(id.clone(), CycleState { values, position: 0 });
        id
    }

    /// Returns the current value of the generator `id` and moves it forward
    pub fn advance(&self, id: &str) -> Result<Value> {
        let mut cycles = self.cycles.lock().unwrap_or_else(PoisonError::into_inner);
        let state = match cycles.get_mut(id) {
            Some(state) => state,
            None => return Err(Error::msg(format!("Unknown cycle `{}`", id))),
        };
        let value = match state.values.get(state.position) {
            Some(value) => value.clone(),
            None => return Err(Error::msg(format!("Cycle `{}` has no values", id))),
        };
        state.position = (state.position + 1) % state.values.len();
        Ok(value)
    }

    /// Drops every generator
    pub fn clear(&self) {
        self.cycles.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }

    pub fn len(&self) -> usize {
        self.cycles.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// `cycle(a, b, ...)`: the arguments, or the piped array when there are none,
/// become a new generator whose id is returned
pub struct Cycle {
    registry: Arc<CycleRegistry>,
}

impl Cycle {
    pub fn new(registry: Arc<CycleRegistry>) -> Self {
        Cycle { registry }
    }
}

impl Filter for Cycle {
    fn filter(&self, value: &Value, args: &[Value]) -> Result<Value> {
        let values = if args.is_empty() {
            match value {
                Value::Array(arr) => arr.clone(),
                _ => Vec::new(),
            }
        } else {
            args.to_vec()
        };

        if values.is_empty() {
            return Err(Error::msg("Filter `cycle` needs at least one value to cycle through"));
        }

        Ok(Value::String(self.registry.start(values)))
    }
}

/// `id | next` or `next(id)`: the next value of a generator created by `cycle`
pub struct Next {
    registry: Arc<CycleRegistry>,
}

impl Next {
    pub fn new(registry: Arc<CycleRegistry>) -> Self {
        Next { registry }
    }
}

impl Filter for Next {
    fn filter(&self, value: &Value, args: &[Value]) -> Result<Value> {
        let id = match (value, args.first()) {
            (Value::String(id), _) => id.clone(),
            (_, Some(arg)) => try_get_value!("next", "id", String, arg),
            _ => return Err(Error::msg("Filter `next` expected a cycle id")),
        };

        self.registry.advance(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn cycle_goes_round() {
        let registry = Arc::new(CycleRegistry::new());
        let id = Cycle::new(registry.clone()).filter(&json!(null), &[json!("odd"), json!("even")]).unwrap();
        let next = Next::new(registry.clone());

        let seen: Vec<Value> = (0..5).map(|_| next.filter(&id, &[]).unwrap()).collect();
        assert_eq!(seen, vec![json!("odd"), json!("even"), json!("odd"), json!("even"), json!("odd")]);
    }

    #[test]
    fn cycle_over_piped_array() {
        let registry = Arc::new(CycleRegistry::new());
        let id = Cycle::new(registry.clone()).filter(&json!([1, 2]), &[]).unwrap();
        let next = Next::new(registry);
        assert_eq!(next.filter(&json!(null), &[id.clone()]).unwrap(), json!(1));
        assert_eq!(next.filter(&id, &[]).unwrap(), json!(2));
    }

    #[test]
    fn each_cycle_gets_its_own_id() {
        let registry = Arc::new(CycleRegistry::new());
        let cycle = Cycle::new(registry.clone());
        let a = cycle.filter(&json!(null), &[json!("a")]).unwrap();
        let b = cycle.filter(&json!(null), &[json!("b")]).unwrap();
        assert_ne!(a, b);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn empty_cycle_is_an_error() {
        let registry = Arc::new(CycleRegistry::new());
        assert!(Cycle::new(registry).filter(&json!(null), &[]).is_err());
    }

    #[test]
    fn clear_forgets_every_cycle() {
        let registry = Arc::new(CycleRegistry::new());
        let id = registry.start(vec![json!(1)]);
        registry.clear();
        assert!(registry.is_empty());
        let err = registry.advance(&id).unwrap_err();
        assert_eq!(err.to_string(), format!("Unknown cycle `{}`", id.as_str()));
    }
}
