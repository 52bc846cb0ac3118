// src/cache/unit.rs — Code units, compiled artifacts and live instances

use std::cell::RefCell;
use std::rc::Rc;

use chrono::{DateTime, Utc};
use rhai::{CallFnOptions, Dynamic, Engine, FuncArgs, Scope, AST};
use uuid::Uuid;

use crate::infra::errors::HotloopError;

/// Name of the optional zero-argument constructor function.
pub const CONSTRUCTOR: &str = "init";

/// One cached, hot-reloadable unit of source code.
///
/// The compiled artifact and its instance live in one slot so they are
/// always swapped together.
#[derive(Debug)]
pub struct CodeUnit {
    resource_id: String,
    last_loaded_text: String,
    loaded: Option<Loaded>,
    reload_count: u64,
}

#[derive(Debug)]
struct Loaded {
    artifact: Rc<CompiledUnit>,
    instance: Rc<Instance>,
}

impl CodeUnit {
    pub(crate) fn new(resource_id: &str) -> Self {
        Self {
            resource_id: resource_id.to_string(),
            last_loaded_text: String::new(),
            loaded: None,
            reload_count: 0,
        }
    }

    pub fn resource_id(&self) -> &str {
        &self.resource_id
    }

    /// Text of the last successful load; empty before the first one.
    pub fn last_loaded_text(&self) -> &str {
        &self.last_loaded_text
    }

    pub fn reload_count(&self) -> u64 {
        self.reload_count
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.is_some()
    }

    pub fn artifact(&self) -> Option<&Rc<CompiledUnit>> {
        self.loaded.as_ref().map(|l| &l.artifact)
    }

    pub fn instance(&self) -> Option<&Rc<Instance>> {
        self.loaded.as_ref().map(|l| &l.instance)
    }

    /// The cached instance if `text` is what was last loaded.
    pub(crate) fn cached_for(&self, text: &str) -> Option<Rc<Instance>> {
        match &self.loaded {
            Some(loaded) if self.last_loaded_text == text => Some(loaded.instance.clone()),
            _ => None,
        }
    }

    pub(crate) fn replace(&mut self, text: String, artifact: Rc<CompiledUnit>, instance: Rc<Instance>) {
        self.loaded = Some(Loaded { artifact, instance });
        self.last_loaded_text = text;
        self.reload_count += 1;
    }
}

/// A compiled unit. Never mutated after compilation.
#[derive(Debug)]
pub struct CompiledUnit {
    name: String,
    ast: AST,
    compiled_at: DateTime<Utc>,
}

impl CompiledUnit {
    pub fn new(name: &str, ast: AST) -> Self {
        Self {
            name: name.to_string(),
            ast,
            compiled_at: Utc::now(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ast(&self) -> &AST {
        &self.ast
    }

    pub fn compiled_at(&self) -> DateTime<Utc> {
        self.compiled_at
    }

    fn has_constructor(&self) -> bool {
        self.ast
            .iter_functions()
            .any(|f| f.name == CONSTRUCTOR && f.params.is_empty())
    }
}

/// A live object built from a compiled unit.
///
/// The object's state is a Rhai value bound as `this` for every method
/// call, so unit functions can read and update it (`this.count += 1`).
pub struct Instance {
    id: Uuid,
    created_at: DateTime<Utc>,
    unit: Rc<CompiledUnit>,
    engine: Rc<Engine>,
    this: RefCell<Dynamic>,
}

impl Instance {
    /// Build an instance through the no-argument construction path.
    ///
    /// Top-level statements always run. If the unit defines `fn init()`,
    /// its return value is the instance state; otherwise the value of the
    /// top-level statements is used, with `()` replaced by an empty map.
    pub fn construct(engine: Rc<Engine>, unit: Rc<CompiledUnit>) -> Result<Self, HotloopError> {
        let mut scope = Scope::new();
        let result = if unit.has_constructor() {
            engine.call_fn_with_options::<Dynamic>(
                CallFnOptions::new().eval_ast(true),
                &mut scope,
                unit.ast(),
                CONSTRUCTOR,
                (),
            )
        } else {
            engine.eval_ast_with_scope::<Dynamic>(&mut scope, unit.ast())
        };

        let state = result.map_err(|e| HotloopError::Instantiation {
            resource: unit.name().to_string(),
            message: e.to_string(),
        })?;
        let state = if state.is_unit() {
            Dynamic::from(rhai::Map::new())
        } else {
            state
        };

        Ok(Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            unit,
            engine,
            this: RefCell::new(state),
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn unit(&self) -> &Rc<CompiledUnit> {
        &self.unit
    }

    /// Snapshot of the instance state.
    pub fn state(&self) -> Dynamic {
        self.this.borrow().clone()
    }

    /// Whether the unit defines a function named `method`.
    pub fn responds_to(&self, method: &str) -> bool {
        self.unit.ast().iter_functions().any(|f| f.name == method)
    }

    /// Call a unit function with `this` bound to the instance state.
    pub fn call(&self, method: &str, args: impl FuncArgs) -> Result<Dynamic, HotloopError> {
        let mut this = self.this.borrow_mut();
        let options = CallFnOptions::new().eval_ast(false).bind_this_ptr(&mut *this);
        self.engine
            .call_fn_with_options::<Dynamic>(options, &mut Scope::new(), self.unit.ast(), method, args)
            .map_err(|e| HotloopError::Invocation {
                resource: self.unit.name().to_string(),
                method: method.to_string(),
                message: e.to_string(),
            })
    }
}

impl std::fmt::Debug for Instance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Instance")
            .field("id", &self.id)
            .field("unit", &self.unit.name())
            .field("created_at", &self.created_at)
            .finish()
    }
}

impl std::fmt::Display for Instance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.unit.name(), self.id)
    }
}
