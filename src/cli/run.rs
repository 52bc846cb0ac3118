// src/cli/run.rs — `hotloop run`: the exploratory loop driver

use std::path::Path;
use std::rc::Rc;

use crate::explore::bindings::{self, Bootstrap};
use crate::explore::report::format_elapsed;
use crate::explore::{
    Console, Entry, Environment, ExploratoryLoop, LoopSession, Setup, TerminalConsole,
};
use crate::infra::config::Config;
use crate::infra::errors::HotloopError;
use crate::script;

/// Run `script` in the loop until the user exits.
///
/// Without `env_file` the script's own `explore(...)` call does the setup.
/// With it, the JSON object is the environment and the loop starts here.
pub fn run_script(
    script: &Path,
    env_file: Option<&Path>,
    runs: Option<u64>,
    config: &Config,
) -> anyhow::Result<()> {
    if !script.is_file() {
        return Err(HotloopError::not_found(script.display().to_string()).into());
    }

    let mut terminal = TerminalConsole::new(config.explore.show_unit_results);
    if let Some(runs) = runs {
        terminal = terminal.with_runs(runs);
    }
    let console: Rc<dyn Console> = Rc::new(terminal);
    let session = Rc::new(LoopSession::new());
    let lp = ExploratoryLoop::new(script, session.clone(), console.clone())
        .with_exit_word(config.explore.exit_word.clone());

    let mut engine = script::create_engine(&config.engine);
    bindings::register(&mut engine, &lp);

    match env_file {
        Some(path) => {
            let env = load_environment(path)?;
            if let Entry::Reentered = lp.start(&engine, Setup::Environment(env))? {
                anyhow::bail!("session was already set up");
            }
        }
        None => {
            if let Bootstrap::Completed(value) = bindings::bootstrap(&engine, &lp)? {
                console.notice("script did not call explore(); ran it once");
                if !value.is_unit() {
                    println!("{}", script::describe(&value));
                }
                return Ok(());
            }
        }
    }

    console.notice(&summary(&session));
    Ok(())
}

/// Read a JSON object into an environment.
pub fn load_environment(path: &Path) -> anyhow::Result<Environment> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("cannot read environment file {}: {}", path.display(), e))?;
    let value: serde_json::Value = serde_json::from_str(&content)?;
    Ok(Environment::from_json(&value)?)
}

fn summary(session: &LoopSession) -> String {
    let env = session.environment();
    let last = session
        .last_duration()
        .map(format_elapsed)
        .unwrap_or_else(|| "-".into());
    format!(
        "{} iteration(s), last took {}; environment: [{}]",
        session.iteration_count(),
        last,
        env.names().join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rhai::Dynamic;
    use std::time::Duration;

    #[test]
    fn test_load_environment() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("env.json");
        std::fs::write(&path, r#"{"x": 5, "tags": ["a", "b"]}"#).unwrap();

        let env = load_environment(&path).unwrap();
        assert_eq!(env.names(), vec!["tags", "x"]);
    }

    #[test]
    fn test_load_environment_bad_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("env.json");
        std::fs::write(&path, "{ nope").unwrap();
        assert!(load_environment(&path).is_err());
    }

    #[test]
    fn test_summary_lists_variables() {
        let session = LoopSession::new();
        let mut env = Environment::new();
        env.set("rows", Dynamic::from(3_i64));
        session.install(env);
        session.record_iteration(Duration::from_millis(4));

        assert_eq!(
            summary(&session),
            "1 iteration(s), last took 4.0 ms; environment: [rows]"
        );
    }

    #[test]
    fn test_run_script_missing_file() {
        let err = run_script(
            Path::new("/no/such/script.rhai"),
            None,
            Some(1),
            &Config::default(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_run_script_with_env_file() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("s.rhai");
        let env = dir.path().join("env.json");
        std::fs::write(&script, "explore(|env| { throw \"must not run\"; });\nx * 3").unwrap();
        std::fs::write(&env, r#"{"x": 5}"#).unwrap();

        run_script(&script, Some(&env), Some(2), &Config::default()).unwrap();
    }

    #[test]
    fn test_run_script_bootstrap() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("s.rhai");
        std::fs::write(&script, "explore(|env| { env.x = 5; });\nx * 2").unwrap();

        run_script(&script, None, Some(1), &Config::default()).unwrap();
    }
}
