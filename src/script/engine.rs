// src/script/engine.rs — Rhai engine factory and compile helpers
//
// Both the code cache and the exploratory loop evaluate Rhai source.
// The host exposes logging on top of Rhai's standard package; scripts get no
// filesystem or process access beyond Rhai's own `print`/`debug`.

use rhai::{Dynamic, Engine, AST};

use crate::infra::config::EngineConfig;
use crate::infra::errors::HotloopError;

// ---------------------------------------------------------------------------
// Engine factory
// ---------------------------------------------------------------------------

/// Create a Rhai engine with the configured limits and host functions.
pub fn create_engine(config: &EngineConfig) -> Engine {
    let mut engine = Engine::new();

    engine.set_max_expr_depths(config.max_expr_depth, config.max_function_expr_depth);
    engine.set_max_operations(config.max_operations);
    engine.set_max_call_levels(config.max_call_levels);
    engine.set_max_string_size(config.max_string_size);
    engine.set_max_array_size(config.max_array_size);
    engine.set_max_map_size(config.max_map_size);

    if config.allow_log {
        engine.register_fn("log", |msg: &str| {
            tracing::info!(target: "hotloop_script", "{}", msg);
        });
        engine.register_fn("log_debug", |msg: &str| {
            tracing::debug!(target: "hotloop_script", "{}", msg);
        });
        engine.register_fn("log_warn", |msg: &str| {
            tracing::warn!(target: "hotloop_script", "{}", msg);
        });
    }

    engine
}

// ---------------------------------------------------------------------------
// Compilation
// ---------------------------------------------------------------------------

/// Compile `source` into an AST whose source name is `name`, so runtime
/// diagnostics point back at the resource they came from.
pub fn compile(engine: &Engine, name: &str, source: &str) -> Result<AST, HotloopError> {
    let mut ast = engine
        .compile(source)
        .map_err(|e| HotloopError::Compilation {
            resource: name.to_string(),
            message: e.to_string(),
        })?;
    ast.set_source(name);
    Ok(ast)
}

/// Names of the zero-argument functions an AST defines.
pub fn nullary_functions(ast: &AST) -> Vec<String> {
    ast.iter_functions()
        .filter(|f| f.params.is_empty())
        .map(|f| f.name.to_string())
        .collect()
}

// ---------------------------------------------------------------------------
// Value helpers
// ---------------------------------------------------------------------------

/// Render a script value for console output. Strings are shown without
/// quotes; everything else uses Rhai's debug form so maps and arrays read
/// the way they are written in scripts.
pub fn describe(value: &Dynamic) -> String {
    if value.is_string() {
        value.to_string()
    } else {
        format!("{:?}", value)
    }
}

/// Convert a serde_json::Value to a Rhai Dynamic.
pub fn json_to_dynamic(value: &serde_json::Value) -> Dynamic {
    match value {
        serde_json::Value::Null => Dynamic::UNIT,
        serde_json::Value::Bool(b) => Dynamic::from(*b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Dynamic::from(i)
            } else if let Some(f) = n.as_f64() {
                Dynamic::from(f)
            } else {
                Dynamic::UNIT
            }
        }
        serde_json::Value::String(s) => Dynamic::from(s.clone()),
        serde_json::Value::Array(arr) => {
            let rhai_arr: Vec<Dynamic> = arr.iter().map(json_to_dynamic).collect();
            Dynamic::from(rhai_arr)
        }
        serde_json::Value::Object(obj) => {
            let mut map = rhai::Map::new();
            for (k, v) in obj {
                map.insert(k.clone().into(), json_to_dynamic(v));
            }
            Dynamic::from(map)
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
