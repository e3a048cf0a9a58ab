use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use log::debug;

use crate::error::{LoxError, Result};
use crate::token::Token;
use crate::value::Value;

/// Shared handle to a scope frame. Closures and active calls may all hold the
/// same frame; mutation through any of them is visible to every holder.
pub type Env = Rc<RefCell<Environment>>;

/// One scope frame: a name→value table plus a link to the enclosing frame.
#[derive(Debug, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    /// Names bound by `const`. Only consulted for the global frame, where no
    /// static resolution exists.
    constants: HashSet<String>,
    enclosing: Option<Env>,
}

fn undefined(name: &Token) -> LoxError {
    LoxError::runtime(name, format!("Undefined variable '{}'.", name.lexeme))
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_enclosing(enclosing: Env) -> Self {
        Environment {
            values: HashMap::new(),
            constants: HashSet::new(),
            enclosing: Some(enclosing),
        }
    }

    /// Wrap a fresh frame enclosed by `enclosing` into a shared handle.
    pub fn child_of(enclosing: &Env) -> Env {
        Rc::new(RefCell::new(Environment::with_enclosing(Rc::clone(enclosing))))
    }

    pub fn enclosing(&self) -> Option<Env> {
        self.enclosing.clone()
    }

    /// Bind `name` in this frame, replacing any previous binding.
    pub fn define(&mut self, name: &str, value: Value) {
        self.constants.remove(name);
        self.values.insert(name.to_string(), value);
    }

    pub fn define_constant(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
        self.constants.insert(name.to_string());
    }

    pub fn is_constant(&self, name: &str) -> bool {
        self.constants.contains(name)
    }

    /// Dynamic lookup by name, walking outward.
    pub fn get(&self, name: &Token) -> Result<Value> {
        if let Some(value) = self.values.get(&name.lexeme) {
            Ok(value.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name)
        } else {
            Err(undefined(name))
        }
    }

    /// Dynamic assignment by name, walking outward.
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

    /// The frame exactly `distance` links out from `env`.
    pub fn ancestor(env: &Env, distance: usize) -> Option<Env> {
        let mut frame = Rc::clone(env);

        for _ in 0..distance {
            let next = frame.borrow().enclosing()?;
            frame = next;
        }

        Some(frame)
    }

    /// Read `name` from the frame `distance` links out. A name missing from
    /// that exact frame is an error, never a silent `nil`.
    pub fn get_at(env: &Env, distance: usize, name: &Token) -> Result<Value> {
        debug!("get_at '{}' distance {}", name.lexeme, distance);

        let frame = Self::ancestor(env, distance).ok_or_else(|| undefined(name))?;
        let value = frame.borrow().values.get(&name.lexeme).cloned();

        value.ok_or_else(|| undefined(name))
    }

    /// Overwrite `name` in the frame `distance` links out.
    pub fn assign_at(env: &Env, distance: usize, name: &Token, value: Value) -> Result<()> {
        debug!("assign_at '{}' distance {}", name.lexeme, distance);

        let frame = Self::ancestor(env, distance).ok_or_else(|| undefined(name))?;
        let mut slots = frame.borrow_mut();

        if let Some(slot) = slots.values.get_mut(&name.lexeme) {
            *slot = value;
            return Ok(());
        }

        Err(undefined(name))
    }
}
