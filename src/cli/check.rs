// src/cli/check.rs — `hotloop check`: compile scripts without running them

use std::path::{Path, PathBuf};

use crate::infra::config::Config;
use crate::infra::errors::HotloopError;
use crate::script;

pub fn run_check(files: &[PathBuf], config: &Config) -> anyhow::Result<()> {
    let engine = script::create_engine(&config.engine);
    let mut failed = 0usize;

    for path in files {
        match check_file(&engine, path) {
            Ok(summary) => println!("ok    {} {}", path.display(), summary),
            Err(e) => {
                failed += 1;
                println!("error {}: {}", path.display(), e);
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{} of {} file(s) failed to compile", failed, files.len());
    }
    Ok(())
}

/// What a successfully compiled file defines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckSummary {
    pub functions: usize,
    /// Zero-argument functions, i.e. what `watch --method` can call.
    pub entry_points: Vec<String>,
}

impl std::fmt::Display for CheckSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({} function(s)", self.functions)?;
        if !self.entry_points.is_empty() {
            write!(f, "; callable: {}", self.entry_points.join(", "))?;
        }
        write!(f, ")")
    }
}

/// Compile one file and summarize the functions it defines.
pub fn check_file(engine: &rhai::Engine, path: &Path) -> Result<CheckSummary, HotloopError> {
    let name = path.display().to_string();
    let source = std::fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => HotloopError::not_found(name.clone()),
        _ => HotloopError::Io(e),
    })?;
    let ast = script::compile(engine, &name, &source)?;
    let mut entry_points = script::engine::nullary_functions(&ast);
    entry_points.sort();
    entry_points.dedup();
    Ok(CheckSummary {
        functions: ast.iter_functions().count(),
        entry_points,
    })
}
