//! Runtime scope chain.
//!
//! An [`Environment`] maps names to values and links to the scope that
//! encloses it.  Scopes are shared (`Rc<RefCell<_>>`): a closure, a bound
//! method or an instance keeps its defining scope alive, and mutation through
//! any holder is visible to all of them.

use crate::error::{LoxError, Result};
use crate::token::Token;
use crate::value::Value;
use log::trace;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// A scope as held by closures, instances and the interpreter.
pub type SharedEnv = Rc<RefCell<Environment>>;

#[derive(Debug, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<SharedEnv>,
}

fn undefined(name: &Token) -> LoxError {
    LoxError::runtime(name, format!("Undefined variable '{}'.", name.lexeme))
}

impl Environment {
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    pub fn with_enclosing(enclosing: SharedEnv) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// Wrap this scope for sharing.
    pub fn into_shared(self) -> SharedEnv {
        Rc::new(RefCell::new(self))
    }

    pub fn enclosing(&self) -> Option<SharedEnv> {
        self.enclosing.clone()
    }

    /// Bind `name` in this scope, replacing any existing binding.
    pub fn define(&mut self, name: &str, value: Value) {
        trace!("define '{}' = {}", name, value);
        self.values.insert(name.to_string(), value);
    }

    /// Look `name` up in this scope only.
    pub fn get_local(&self, name: &str) -> Option<Value> {
        self.values.get(name).cloned()
    }

    /// Look `name` up along the whole chain.
    pub fn lookup(&self, name: &str) -> Option<Value> {
        match self.values.get(name) {
            Some(value) => Some(value.clone()),
            None => self
                .enclosing
                .as_ref()
                .and_then(|enclosing| enclosing.borrow().lookup(name)),
        }
    }

    pub fn get(&self, name: &Token) -> Result<Value> {
        self.lookup(&name.lexeme).ok_or_else(|| undefined(name))
    }

    /// Overwrite the nearest existing binding of `name`.  Never creates one.
    pub fn assign(&mut self, name: &Token, value: Value) -> Result<()> {
        if let Some(slot) = self.values.get_mut(&name.lexeme) {
            *slot = value;
            Ok(())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value)
        } else {
            Err(undefined(name))
        }
    }

    /// The scope exactly `distance` parent links above `env`.
    pub fn ancestor(env: &SharedEnv, distance: usize) -> Option<SharedEnv> {
        let mut current: SharedEnv = Rc::clone(env);

        for _ in 0..distance {
            let parent: SharedEnv = current.borrow().enclosing()?;
            current = parent;
        }

        Some(current)
    }

    /// Read `name` from the scope `distance` links up, without walking further.
    pub fn get_at(env: &SharedEnv, distance: usize, name: &Token) -> Result<Value> {
        let scope: SharedEnv = Self::ancestor(env, distance).ok_or_else(|| undefined(name))?;
        let value: Option<Value> = scope.borrow().get_local(&name.lexeme);

        value.ok_or_else(|| undefined(name))
    }

    /// Write `name` in the scope `distance` links up, without walking further.
    pub fn assign_at(env: &SharedEnv, distance: usize, name: &Token, value: Value) -> Result<()> {
        let scope: SharedEnv = Self::ancestor(env, distance).ok_or_else(|| undefined(name))?;
        let mut scope = scope.borrow_mut();

        if let Some(slot) = scope.values.get_mut(&name.lexeme) {
            *slot = value;
            return Ok(());
        }

        Err(undefined(name))
    }
}
