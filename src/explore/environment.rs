// src/explore/environment.rs — Persistent variables and setup capture

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use rhai::{Dynamic, Engine, ImmutableString, Scope};

use crate::infra::errors::HotloopError;
use crate::script;

/// Reserved key marking "setup already ran for this environment".
pub const SETUP_MARKER: &str = "SETUP_DONE";

/// Variables that outlive a single iteration.
///
/// Only the loop itself writes the setup marker; `set` refuses it.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    vars: HashMap<String, Dynamic>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an environment from a JSON object (`{"name": value, ...}`).
    pub fn from_json(value: &serde_json::Value) -> Result<Self, HotloopError> {
        let obj = value.as_object().ok_or_else(|| {
            HotloopError::Config("environment file must contain a JSON object".into())
        })?;
        let mut env = Self::new();
        for (name, v) in obj {
            env.set(name, script::json_to_dynamic(v));
        }
        Ok(env)
    }

    pub fn from_map(map: rhai::Map) -> Self {
        let mut env = Self::new();
        for (name, v) in map {
            env.set(&name, v);
        }
        env
    }

    /// Set a variable. Returns false (and writes nothing) for the marker key.
    pub fn set(&mut self, name: &str, value: Dynamic) -> bool {
        if name == SETUP_MARKER {
            tracing::warn!("'{}' is reserved; write ignored", SETUP_MARKER);
            return false;
        }
        self.vars.insert(name.to_string(), value);
        true
    }

    pub fn get(&self, name: &str) -> Option<&Dynamic> {
        self.vars.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    /// Number of variables, marker included.
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Variable names (marker excluded), sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .vars
            .keys()
            .map(String::as_str)
            .filter(|n| *n != SETUP_MARKER)
            .collect();
        names.sort_unstable();
        names
    }

    pub fn is_setup_done(&self) -> bool {
        self.vars.contains_key(SETUP_MARKER)
    }

    pub(crate) fn mark_setup_done(&mut self) {
        self.vars.insert(SETUP_MARKER.to_string(), Dynamic::TRUE);
    }

    pub(crate) fn merge(&mut self, other: Environment) {
        for (name, value) in other.vars {
            self.set(&name, value);
        }
    }

    /// A fresh evaluation scope holding a copy of every variable. The
    /// marker goes in as a constant so scripts can read but not change it.
    pub fn to_scope(&self) -> Scope<'static> {
        let mut scope = Scope::new();
        for (name, value) in &self.vars {
            if name == SETUP_MARKER {
                scope.push_constant_dynamic(name.clone(), value.clone());
            } else {
                scope.push_dynamic(name.clone(), value.clone());
            }
        }
        scope
    }

    /// Copy back the values a finished evaluation left for variables this
    /// environment already has. Bindings the script introduced itself stay
    /// iteration-local. Returns how many variables changed.
    ///
    /// `scope` must come from [`Environment::to_scope`] on this environment.
    /// Only its leading entries (the ones `to_scope` pushed) are read, so a
    /// `let` that shadows an environment variable is never written back.
    pub fn absorb(&mut self, scope: &Scope) -> usize {
        let mut changed = 0;
        for (name, _, latest) in scope.iter_raw().take(self.vars.len()) {
            if name == SETUP_MARKER {
                continue;
            }
            if let Some(value) = self.vars.get_mut(name) {
                let latest = latest.flatten_clone();
                if !same_value(value, &latest) {
                    changed += 1;
                }
                *value = latest;
            }
        }
        changed
    }
}

fn same_value(a: &Dynamic, b: &Dynamic) -> bool {
    a.type_name() == b.type_name() && format!("{:?}", a) == format!("{:?}", b)
}

// ---------------------------------------------------------------------------
// SetupRecorder
// ---------------------------------------------------------------------------

/// Collects the writes a setup block makes.
///
/// `set(name, value)` and `call(name, args)` both end up in one write.
/// Scripts reach the call form as `env.record("name", args...)`.
/// Clones share the same record, which is what lets a Rhai setup closure
/// receive the recorder by value and still have its writes seen.
#[derive(Debug, Clone, Default)]
pub struct SetupRecorder {
    writes: Rc<RefCell<Environment>>,
}

impl SetupRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// `name = value`
    pub fn set(&mut self, name: &str, value: impl Into<Dynamic>) {
        self.write(name, value.into());
    }

    /// `name(args...)`: a single argument is stored as is, anything else as
    /// an array.
    pub fn call(&mut self, name: &str, mut args: Vec<Dynamic>) {
        let value = if args.len() == 1 {
            args.remove(0)
        } else {
            Dynamic::from_array(args)
        };
        self.write(name, value);
    }

    fn write(&mut self, name: &str, value: Dynamic) {
        tracing::debug!("setup: {} = {}", name, value.type_name());
        self.writes.borrow_mut().set(name, value);
    }

    /// Value recorded so far for `name`.
    pub fn get(&self, name: &str) -> Option<Dynamic> {
        self.writes.borrow().get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.writes.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.borrow().is_empty()
    }

    /// Everything recorded, as an environment.
    pub fn into_environment(self) -> Environment {
        self.writes.borrow().clone()
    }

    /// Expose the recorder to scripts as type `Environment`.
    ///
    /// Only string indexers are registered; Rhai falls back to them for
    /// property syntax, so `env.x = 5` and `env["x"] = 5` are the same write.
    pub fn register(engine: &mut Engine) {
        engine
            .register_type_with_name::<SetupRecorder>("Environment")
            .register_indexer_get(|rec: &mut SetupRecorder, name: ImmutableString| {
                rec.get(name.as_str()).unwrap_or(Dynamic::UNIT)
            })
            .register_indexer_set(
                |rec: &mut SetupRecorder, name: ImmutableString, value: Dynamic| {
                    rec.write(name.as_str(), value);
                },
            )
            .register_fn("set", |rec: &mut SetupRecorder, name: ImmutableString, value: Dynamic| {
                rec.write(name.as_str(), value);
            })
            .register_fn("contains", |rec: &mut SetupRecorder, name: ImmutableString| {
                rec.get(name.as_str()).is_some()
            })
            .register_fn("record", |rec: &mut SetupRecorder, name: ImmutableString| {
                rec.call(name.as_str(), Vec::new());
            })
            .register_fn(
                "record",
                |rec: &mut SetupRecorder, name: ImmutableString, a: Dynamic| {
                    rec.call(name.as_str(), vec![a]);
                },
            )
            .register_fn(
                "record",
                |rec: &mut SetupRecorder, name: ImmutableString, a: Dynamic, b: Dynamic| {
                    rec.call(name.as_str(), vec![a, b]);
                },
            )
            .register_fn(
                "record",
                |rec: &mut SetupRecorder,
                 name: ImmutableString,
                 a: Dynamic,
                 b: Dynamic,
                 c: Dynamic| {
                    rec.call(name.as_str(), vec![a, b, c]);
                },
            );
    }
}
