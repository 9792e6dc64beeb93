//! Lexical scopes stored in an arena.
//!
//! Every scope lives in one `Vec` slot and is addressed by a [`ScopeId`];
//! closures hold a `ScopeId`, never a pointer to the scope, so a function
//! stored in the scope it captured is not a reference cycle.
//!
//! A scope is released when execution leaves it, unless some closure
//! captured it (or one of its descendants).  Captured scopes stay until
//! [`Environment::collect`] finds them unreachable from the given roots.

use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use log::debug;

use crate::error::{AxError, Result};
use crate::value::Value;

/// Handle to a scope inside an [`Environment`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(usize);

#[derive(Debug, Default)]
struct Scope {
    values: HashMap<String, Value>,
    enclosing: Option<ScopeId>,
    captured: bool,
}

/// The scope arena.  Slot 0 is the global scope and is never released.
#[derive(Debug)]
pub struct Environment {
    scopes: Vec<Option<Scope>>,
    free: Vec<usize>,
    exited_captured: usize, // captured scopes left since the last collection
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment {
    pub const GLOBAL: ScopeId = ScopeId(0);

    pub fn new() -> Self {
        Environment {
            scopes: vec![Some(Scope::default())],
            free: Vec::new(),
            exited_captured: 0,
        }
    }

    /// Open a new scope whose parent is `enclosing`.
    pub fn push(&mut self, enclosing: ScopeId) -> ScopeId {
        let scope = Scope {
            enclosing: Some(enclosing),
            ..Scope::default()
        };

        match self.free.pop() {
            Some(slot) => {
                self.scopes[slot] = Some(scope);
                ScopeId(slot)
            }
            None => {
                self.scopes.push(Some(scope));
                ScopeId(self.scopes.len() - 1)
            }
        }
    }

    /// Execution has left `id`.  Uncaptured scopes are released at once.
    pub fn pop(&mut self, id: ScopeId) {
        if id == Self::GLOBAL {
            return;
        }

        match self.slot(id).map(|scope| scope.captured) {
            Some(true) => self.exited_captured += 1,
            Some(false) => self.release(id.0),
            None => {}
        }
    }

    /// A closure now refers to `id`; keep it and its ancestors alive on exit.
    pub fn capture(&mut self, id: ScopeId) {
        let mut current = Some(id);

        while let Some(id) = current {
            match self.scopes.get_mut(id.0).and_then(Option::as_mut) {
                Some(scope) if !scope.captured => {
                    scope.captured = true;
                    current = scope.enclosing;
                }
                _ => break,
            }
        }
    }

    /// Bind `name` in scope `id`, shadowing any outer binding.
    pub fn define(&mut self, id: ScopeId, name: &str, value: Value) {
        debug!("define '{}' = {}", name, value);

        if let Some(scope) = self.scopes.get_mut(id.0).and_then(Option::as_mut) {
            scope.values.insert(name.to_string(), value);
        }
    }

    pub fn get(&self, id: ScopeId, name: &str, line: usize) -> Result<Value> {
        let mut current = self.slot(id);

        while let Some(scope) = current {
            if let Some(value) = scope.values.get(name) {
                return Ok(value.clone());
            }
            current = scope.enclosing.and_then(|parent| self.slot(parent));
        }

        Err(AxError::UndefinedVariable {
            name: name.to_string(),
            line,
        })
    }

    /// Overwrite the nearest existing binding of `name`.
    pub fn assign(&mut self, id: ScopeId, name: &str, value: Value, line: usize) -> Result<()> {
        let mut current = Some(id);

        while let Some(id) = current {
            let Some(scope) = self.scopes.get_mut(id.0).and_then(Option::as_mut) else {
                break;
            };

            if let Some(slot) = scope.values.get_mut(name) {
                *slot = value;
                return Ok(());
            }
            current = scope.enclosing;
        }

        Err(AxError::UndefinedVariable {
            name: name.to_string(),
            line,
        })
    }

    /// Is `name` bound in `id` or any enclosing scope?
    pub fn contains(&self, id: ScopeId, name: &str) -> bool {
        let mut current = self.slot(id);

        while let Some(scope) = current {
            if scope.values.contains_key(name) {
                return true;
            }
            current = scope.enclosing.and_then(|parent| self.slot(parent));
        }

        false
    }

    /// Number of scopes currently allocated, the global one included.
    pub fn live(&self) -> usize {
        self.scopes.len() - self.free.len()
    }

    /// Has a captured scope been left since the last collection?
    pub fn needs_collection(&self) -> bool {
        self.exited_captured > 0
    }

    /// Release every scope not reachable from `roots`, following parent
    /// links, closures and array elements.  Returns how many were freed.
    ///
    /// Values held outside the arena are not roots, so only call this when
    /// no evaluation is in progress.
    pub fn collect(&mut self, roots: &[ScopeId]) -> usize {
        let mut marked = vec![false; self.scopes.len()];
        let mut seen_arrays: HashSet<*const ()> = HashSet::new();
        let mut stack: Vec<ScopeId> = roots.to_vec();

        stack.push(Self::GLOBAL);

        while let Some(id) = stack.pop() {
            if marked.get(id.0).copied().unwrap_or(true) {
                continue;
            }
            let Some(scope) = self.slot(id) else {
                continue;
            };
            marked[id.0] = true;

            stack.extend(scope.enclosing);
            for value in scope.values.values() {
                trace(value, &mut stack, &mut seen_arrays);
            }
        }

        let mut freed = 0;
        for (slot, is_marked) in marked.into_iter().enumerate() {
            if !is_marked && self.scopes[slot].is_some() {
                self.release(slot);
                freed += 1;
            }
        }

        self.exited_captured = 0;
        debug!("Collected {} unreachable scopes, {} live", freed, self.live());

        freed
    }

    fn slot(&self, id: ScopeId) -> Option<&Scope> {
        self.scopes.get(id.0).and_then(Option::as_ref)
    }

    fn release(&mut self, slot: usize) {
        if self.scopes[slot].take().is_some() {
            self.free.push(slot);
        }
    }
}

/// Push every scope `value` keeps alive onto `stack`.
fn trace(value: &Value, stack: &mut Vec<ScopeId>, seen_arrays: &mut HashSet<*const ()>) {
    match value {
        Value::Function(closure) => stack.push(closure.env),
        Value::Array(items) => {
            if seen_arrays.insert(Rc::as_ptr(items) as *const ()) {
                for item in items.borrow().iter() {
                    trace(item, stack, seen_arrays);
                }
            }
        }
        _ => {}
    }
}
