use indexmap::IndexMap;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::value::{Builtin, HostFn, Value};

/// A mutable holder for a value, shared by aliasing between the frame
/// that declared it and every closure that captured it.
pub type Cell = Rc<RefCell<Value>>;

/// A single frame mapping names to cells. Closures hold the frame by
/// reference; `bind_vars` copies the mapping but keeps the cells, so
/// writes through any alias stay visible everywhere.
#[derive(Clone)]
pub struct Env {
    vars: Rc<RefCell<IndexMap<Rc<str>, Cell>>>,
}

impl Env {
    pub fn new() -> Self {
        Self {
            vars: Rc::new(RefCell::new(IndexMap::new())),
        }
    }

    /// Introduce `name` in this frame. If the name is already bound
    /// here, the existing cell is overwritten in place, so captured
    /// aliases observe the new value.
    pub fn define(&self, name: &Rc<str>, value: Value) {
        let mut vars = self.vars.borrow_mut();
        match vars.get(name) {
            Some(cell) => *cell.borrow_mut() = value,
            None => {
                vars.insert(name.clone(), Rc::new(RefCell::new(value)));
            }
        }
    }

    pub fn lookup(&self, name: &str) -> Option<Value> {
        self.vars
            .borrow()
            .get(name)
            .map(|cell| cell.borrow().clone())
    }

    /// Write an existing binding in place. Returns false when the name
    /// is unbound; declaring is `define`'s job.
    pub fn assign(&self, name: &str, value: Value) -> bool {
        match self.vars.borrow().get(name) {
            Some(cell) => {
                *cell.borrow_mut() = value;
                true
            }
            None => false,
        }
    }

    /// Build the frame for a function application: parameter cells
    /// layered over a copy of this frame's mapping. The copied entries
    /// are the same cells, not new ones.
    pub fn bind_vars<I>(&self, pairs: I) -> Env
    where
        I: IntoIterator<Item = (Rc<str>, Value)>,
    {
        let mut vars = self.vars.borrow().clone();
        for (name, value) in pairs {
            vars.insert(name, Rc::new(RefCell::new(value)));
        }
        Env {
            vars: Rc::new(RefCell::new(vars)),
        }
    }

    /// The host hook: wrap a host function as a callable value and bind
    /// it like any other name.
    pub fn register_builtin<F>(&self, name: &str, func: F)
    where
        F: Fn(&[Value]) -> Result<Value, crate::interpreter::error::RuntimeError> + 'static,
    {
        let name: Rc<str> = Rc::from(name);
        let func: HostFn = Rc::new(func);
        let builtin = Value::Builtin(Rc::new(Builtin {
            name: name.clone(),
            func,
        }));
        self.define(&name, builtin);
    }
}

impl Default for Env {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Env {
    // Cells may hold closures that point back at this frame; print
    // names only.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let vars = self.vars.borrow();
        let names: Vec<&str> = vars.keys().map(|k| k.as_ref()).collect();
        write!(f, "Env{:?}", names)
    }
}
