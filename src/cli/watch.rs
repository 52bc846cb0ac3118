// src/cli/watch.rs — `hotloop watch`: polling consumer of the code cache
//
// Every tick asks the cache for the current instance and calls one method
// on it. Broken edits are reported and the last good instance keeps
// serving until the source compiles again.

use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

use rhai::Dynamic;

use crate::cache::{CodeUnit, DynamicCodeCache, FileSystemProvider, ResourceProvider};
use crate::infra::config::Config;
use crate::infra::errors::HotloopError;
use crate::script;

#[derive(Debug, Clone)]
pub struct WatchOptions {
    pub resource: String,
    pub method: String,
    pub interval: Duration,
    pub roots: Vec<PathBuf>,
    /// Stop after this many polls; `None` polls until Ctrl-C.
    pub times: Option<u64>,
}

impl WatchOptions {
    /// CLI values override the `[watch]` config section.
    pub fn resolve(
        resource: String,
        method: Option<String>,
        interval_ms: Option<u64>,
        roots: Vec<PathBuf>,
        times: Option<u64>,
        config: &Config,
    ) -> Self {
        Self {
            resource,
            method: method.unwrap_or_else(|| config.watch.method.clone()),
            interval: Duration::from_millis(interval_ms.unwrap_or(config.watch.interval_ms).max(1)),
            roots: if roots.is_empty() {
                config.watch.roots.clone()
            } else {
                roots
            },
            times,
        }
    }
}

pub async fn run_watch(opts: WatchOptions, config: &Config) -> anyhow::Result<()> {
    let engine = Rc::new(script::create_engine(&config.engine));
    let provider = FileSystemProvider::new(opts.roots.clone());
    let mut cache = DynamicCodeCache::new(engine, provider).with_reload_hook(|instance| {
        eprintln!("[reload] {} -> instance {}", instance.unit().name(), instance.id());
    });

    // Bad ids fail here, before the first tick
    let mut unit = cache.open(&opts.resource)?;

    let mut ticker = tokio::time::interval(opts.interval);
    let mut polls: u64 = 0;
    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                eprintln!("[watch] interrupted after {} poll(s)", polls);
                break;
            }
        }

        match poll_once(&mut cache, &mut unit, &opts.method) {
            Ok(value) => {
                if !value.is_unit() {
                    println!("{}", script::describe(&value));
                }
            }
            Err(e) => eprintln!("[watch] {}", e),
        }

        polls += 1;
        if opts.times.is_some_and(|limit| polls >= limit) {
            break;
        }
    }

    tracing::info!(
        "Stopped watching '{}' after {} poll(s), {} reload(s)",
        unit.resource_id(),
        polls,
        unit.reload_count()
    );
    Ok(())
}

/// Fetch the current instance and call `method` on it.
///
/// If the latest source fails to compile or construct, the previous
/// instance is used and the failure is only logged. With no previous
/// instance the failure is returned.
pub fn poll_once<P: ResourceProvider>(
    cache: &mut DynamicCodeCache<P>,
    unit: &mut CodeUnit,
    method: &str,
) -> Result<Dynamic, HotloopError> {
    let instance = match cache.get_instance(unit) {
        Ok(instance) => instance,
        Err(e) if e.is_recoverable() => match unit.instance() {
            Some(last_good) => {
                tracing::warn!("{}; keeping instance {}", e, last_good.id());
                last_good.clone()
            }
            None => return Err(e),
        },
        Err(e) => return Err(e),
    };
    instance.call(method, ())
}
