// src/script/mod.rs — Embedded Rhai evaluator shared by the cache and the loop

pub mod engine;

pub use engine::{compile, create_engine, describe, json_to_dynamic};
