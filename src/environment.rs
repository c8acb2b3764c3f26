use crate::error::{LoxError, Result};
use crate::token::Token;
use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// One lexical scope.  Scopes are shared (`Rc`) by every closure or bound
/// method created while they were current, so they outlive the block that
/// made them.
#[derive(Debug, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    pub enclosing: Option<Rc<RefCell<Environment>>>,
}

impl Environment {
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    pub fn with_enclosing(enclosing: Rc<RefCell<Environment>>) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// Binds `name` in this scope, shadowing or overwriting silently.
    pub fn define(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    /// Looks `name` up here, then outward through the enclosing chain.
    pub fn get(&self, name: &Token) -> Result<Value> {
        if let Some(value) = self.values.get(&name.lexeme) {
            Ok(value.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name)
        } else {
            Err(undefined(name))
        }
    }

    /// Overwrites the nearest enclosing binding of `name`.
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
}

fn undefined(name: &Token) -> LoxError {
    LoxError::runtime(name, format!("Undefined variable '{}'.", name.lexeme))
}

/// Walks `distance` links outward from `env`.
fn ancestor(env: &Rc<RefCell<Environment>>, distance: usize) -> Option<Rc<RefCell<Environment>>> {
    let mut current: Rc<RefCell<Environment>> = Rc::clone(env);

    for _ in 0..distance {
        let next = current.borrow().enclosing.clone()?;
        current = next;
    }

    Some(current)
}

/// Reads `name` from exactly the scope `distance` hops outward.
pub fn get_at(env: &Rc<RefCell<Environment>>, distance: usize, name: &Token) -> Result<Value> {
    ancestor(env, distance)
        .and_then(|scope| scope.borrow().values.get(&name.lexeme).cloned())
        .ok_or_else(|| undefined(name))
}

/// Writes `name` in exactly the scope `distance` hops outward.
pub fn assign_at(
    env: &Rc<RefCell<Environment>>,
    distance: usize,
    name: &Token,
    value: Value,
) -> Result<()> {
    let scope = ancestor(env, distance).ok_or_else(|| undefined(name))?;
    scope.borrow_mut().define(&name.lexeme, value);
    Ok(())
}
