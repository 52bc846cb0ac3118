// src/cache/mod.rs — Dynamic code cache
//
// Hands out the current instance of a script unit. Every request re-reads
// the source; only a change in content (compared by value, byte for byte)
// triggers a recompile and a fresh instance. A broken edit leaves the last
// good artifact, instance and text in place.

pub mod resource;
pub mod unit;

use std::rc::Rc;

use rhai::Engine;

use crate::infra::errors::HotloopError;
use crate::script;

pub use resource::{FileSystemProvider, MemoryProvider, ResourceProvider};
pub use unit::{CodeUnit, CompiledUnit, Instance};

type ReloadHook = Box<dyn FnMut(&Instance)>;

pub struct DynamicCodeCache<P: ResourceProvider> {
    engine: Rc<Engine>,
    provider: P,
    on_reload: Option<ReloadHook>,
}

impl<P: ResourceProvider> DynamicCodeCache<P> {
    pub fn new(engine: Rc<Engine>, provider: P) -> Self {
        Self {
            engine,
            provider,
            on_reload: None,
        }
    }

    /// Called once per successful reload with the new instance.
    pub fn with_reload_hook(mut self, hook: impl FnMut(&Instance) + 'static) -> Self {
        self.on_reload = Some(Box::new(hook));
        self
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn engine(&self) -> &Rc<Engine> {
        &self.engine
    }

    /// Resolve a resource id into an (unloaded) unit.
    ///
    /// Fails right away when the resource cannot be located, so a bad id
    /// shows up before the first use.
    pub fn open(&self, resource_id: &str) -> Result<CodeUnit, HotloopError> {
        if !self.provider.exists(resource_id) {
            let suggestions = resource::suggest(resource_id, &self.provider.known_ids());
            return Err(HotloopError::ResourceNotFound {
                resource: resource_id.to_string(),
                suggestions,
            });
        }
        tracing::debug!("Opened unit '{}'", resource_id);
        Ok(CodeUnit::new(resource_id))
    }

    /// Current instance of `unit`, reloading it if its source changed.
    pub fn get_instance(&mut self, unit: &mut CodeUnit) -> Result<Rc<Instance>, HotloopError> {
        let text = self.provider.read(unit.resource_id())?;

        if let Some(instance) = unit.cached_for(&text) {
            tracing::debug!("Unit '{}' unchanged", unit.resource_id());
            return Ok(instance);
        }

        let ast = script::compile(&self.engine, unit.resource_id(), &text)?;
        let artifact = Rc::new(CompiledUnit::new(unit.resource_id(), ast));
        let instance = Rc::new(Instance::construct(self.engine.clone(), artifact.clone())?);

        unit.replace(text, artifact, instance.clone());
        tracing::info!(
            "Reloaded unit '{}' (instance {}, reload #{})",
            unit.resource_id(),
            instance.id(),
            unit.reload_count()
        );
        if let Some(hook) = self.on_reload.as_mut() {
            hook(&instance);
        }

        Ok(instance)
    }
}
