// src/explore/mod.rs — Exploratory re-evaluation loop
//
// Runs one script file again and again against an environment built once
// by a setup step. The loop-start call (`ExploratoryLoop::start`, or
// `explore(...)` inside the script) is reached on every iteration because
// the whole file is re-evaluated; after the first time it returns at once.
//
// State per session: Uninitialized -> SettingUp -> Looping, with every
// later loop-start call short-circuiting (Reentered).

pub mod bindings;
pub mod console;
pub mod environment;
pub mod report;
pub mod session;

use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Instant;

use rhai::{Dynamic, Engine};

use crate::infra::errors::HotloopError;
use crate::script;

pub use console::{Console, Decision, ScriptedConsole, TerminalConsole};
pub use environment::{Environment, SetupRecorder, SETUP_MARKER};
pub use report::{IterationOutcome, IterationReport};
pub use session::LoopSession;

type SetupBlock<'a> = Box<dyn FnOnce(&mut SetupRecorder) -> Result<(), HotloopError> + 'a>;

/// How the environment gets populated the first time round.
pub enum Setup<'a> {
    /// A block whose writes through the recorder become the environment.
    Block(SetupBlock<'a>),
    /// A ready-made environment.
    Environment(Environment),
}

impl<'a> Setup<'a> {
    pub fn block(
        block: impl FnOnce(&mut SetupRecorder) -> Result<(), HotloopError> + 'a,
    ) -> Self {
        Setup::Block(Box::new(block))
    }

    /// No setup work; the environment starts empty.
    pub fn none() -> Self {
        Setup::Environment(Environment::new())
    }
}

/// What a loop-start call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entry {
    /// Setup had already happened; returned without doing anything.
    Reentered,
    /// Ran setup and the loop until the user asked to exit.
    Exited { iterations: u64 },
}

#[derive(Clone)]
pub struct ExploratoryLoop {
    script: PathBuf,
    session: Rc<LoopSession>,
    console: Rc<dyn Console>,
    exit_word: String,
}

impl ExploratoryLoop {
    pub fn new(script: impl Into<PathBuf>, session: Rc<LoopSession>, console: Rc<dyn Console>) -> Self {
        Self {
            script: script.into(),
            session,
            console,
            exit_word: "exit".into(),
        }
    }

    pub fn with_exit_word(mut self, exit_word: impl Into<String>) -> Self {
        self.exit_word = exit_word.into();
        self
    }

    pub fn script(&self) -> &Path {
        &self.script
    }

    pub fn session(&self) -> &Rc<LoopSession> {
        &self.session
    }

    pub fn console(&self) -> &Rc<dyn Console> {
        &self.console
    }

    /// The loop-start call.
    ///
    /// First time in a session: run setup, write the marker, then loop until
    /// the user exits. Any later call returns `Entry::Reentered` right away.
    /// A failing setup is returned as an error and is not retried.
    pub fn start(&self, engine: &Engine, setup: Setup<'_>) -> Result<Entry, HotloopError> {
        if self.session.is_setup_done() {
            tracing::debug!("Setup already done for {}; continuing", self.script.display());
            return Ok(Entry::Reentered);
        }
        self.session.begin_setup();

        let started = Instant::now();
        let env = match setup {
            Setup::Block(block) => {
                let mut recorder = SetupRecorder::new();
                block(&mut recorder)?;
                recorder.into_environment()
            }
            Setup::Environment(env) => env,
        };
        let vars = env.names().len();
        self.session.install(env);

        let elapsed = started.elapsed();
        tracing::info!(
            "Setup for {} finished in {:?} ({} variable(s))",
            self.script.display(),
            elapsed,
            vars
        );
        self.console.notice(&format!(
            "setup done in {} ({} variable(s))",
            report::format_elapsed(elapsed),
            vars
        ));

        Ok(self.run(engine))
    }

    fn run(&self, engine: &Engine) -> Entry {
        loop {
            let report = self.iterate(engine);
            self.console.report(&report);
            if self.console.confirm(&self.exit_word) == Decision::Exit {
                self.session.request_exit();
                return Entry::Exited {
                    iterations: self.session.iteration_count(),
                };
            }
        }
    }

    /// Evaluate the script file once. Never fails: every error ends up in
    /// the report, and a failed iteration leaves the environment as it was.
    pub fn iterate(&self, engine: &Engine) -> IterationReport {
        let iteration = self.session.iteration_count() + 1;
        let started = Instant::now();

        let outcome = match self.evaluate(engine) {
            Ok(value) => IterationOutcome::Completed(value),
            Err(e) => {
                tracing::debug!("Iteration {} failed: {}", iteration, e);
                IterationOutcome::Failed(e)
            }
        };

        let elapsed = started.elapsed();
        self.session.record_iteration(elapsed);
        IterationReport {
            iteration,
            elapsed,
            outcome,
        }
    }

    fn evaluate(&self, engine: &Engine) -> Result<Dynamic, HotloopError> {
        let name = self.script.display().to_string();
        let source =
            std::fs::read_to_string(&self.script).map_err(|e| HotloopError::Evaluation {
                resource: name.clone(),
                message: format!("cannot read script: {e}"),
            })?;
        let ast = script::compile(engine, &name, &source)?;

        let mut scope = self.session.scope();
        let value = engine
            .eval_ast_with_scope::<Dynamic>(&mut scope, &ast)
            .map_err(|e| HotloopError::Evaluation {
                resource: name,
                message: e.to_string(),
            })?;

        let changed = self.session.absorb(&scope);
        if changed > 0 {
            tracing::debug!("Iteration updated {} environment variable(s)", changed);
        }
        Ok(value)
    }
}
