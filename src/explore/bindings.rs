// src/explore/bindings.rs — `explore(...)` for scripts
//
// A script opts into the loop with its first statement:
//
//     explore(|env| {
//         env.rows = load_rows();     // expensive, runs once
//     });
//     rows.len()                      // edited and re-run freely
//
// `bootstrap` evaluates the file once from the top. Its `explore` call runs
// setup and then the loop, which re-evaluates the whole file; there the
// same call finds setup done and returns, letting the body run.

use rhai::{Dynamic, Engine, EvalAltResult, FnPtr, NativeCallContext, Position, Scope};

use super::{Entry, Environment, ExploratoryLoop, Setup, SetupRecorder};
use crate::infra::errors::HotloopError;
use crate::script;

/// How a bootstrap run ended.
#[derive(Debug)]
pub enum Bootstrap {
    /// The script entered the loop and the user exited it.
    Exited { iterations: u64 },
    /// The script never called `explore`; it ran once to completion.
    Completed(Dynamic),
}

/// Register `explore()`, `explore(|env| ...)` and `explore(#{...})`,
/// all bound to `lp`.
pub fn register(engine: &mut Engine, lp: &ExploratoryLoop) {
    SetupRecorder::register(engine);

    let l = lp.clone();
    engine.register_fn(
        "explore",
        move |ctx: NativeCallContext, setup: FnPtr| -> Result<(), Box<EvalAltResult>> {
            let block = Setup::block(|recorder| {
                setup
                    .call_within_context::<Dynamic>(&ctx, (recorder.clone(),))
                    .map(|_| ())
                    .map_err(|e| HotloopError::Setup(e.to_string()))
            });
            into_script_result(l.start(ctx.engine(), block))
        },
    );

    let l = lp.clone();
    engine.register_fn(
        "explore",
        move |ctx: NativeCallContext, env: rhai::Map| -> Result<(), Box<EvalAltResult>> {
            let setup = Setup::Environment(Environment::from_map(env));
            into_script_result(l.start(ctx.engine(), setup))
        },
    );

    let l = lp.clone();
    engine.register_fn(
        "explore",
        move |ctx: NativeCallContext| -> Result<(), Box<EvalAltResult>> {
            into_script_result(l.start(ctx.engine(), Setup::none()))
        },
    );
}

fn into_script_result(entry: Result<Entry, HotloopError>) -> Result<(), Box<EvalAltResult>> {
    match entry {
        Ok(Entry::Reentered) => Ok(()),
        // Unwind the bootstrap evaluation; the driver checks the session.
        Ok(Entry::Exited { .. }) => {
            Err(EvalAltResult::ErrorTerminated(Dynamic::UNIT, Position::NONE).into())
        }
        Err(e) => {
            let message = match e {
                HotloopError::Setup(message) => message,
                other => other.to_string(),
            };
            Err(EvalAltResult::ErrorRuntime(Dynamic::from(message), Position::NONE).into())
        }
    }
}

/// Evaluate the loop's script once from the top. `engine` must have been
/// passed through [`register`] for the same loop.
pub fn bootstrap(engine: &Engine, lp: &ExploratoryLoop) -> Result<Bootstrap, HotloopError> {
    let name = lp.script().display().to_string();
    let source = std::fs::read_to_string(lp.script())?;
    let ast = script::compile(engine, &name, &source)?;

    let result = engine.eval_ast_with_scope::<Dynamic>(&mut Scope::new(), &ast);

    let session = lp.session();
    if session.exit_requested() {
        return Ok(Bootstrap::Exited {
            iterations: session.iteration_count(),
        });
    }
    match result {
        // Setup began but the loop never ended with an exit: the script
        // caught the setup error itself.
        Ok(_) if session.already_invoked() => Err(HotloopError::Setup(
            "setup failed and its error was caught by the script".into(),
        )),
        Ok(value) => Ok(Bootstrap::Completed(value)),
        // Once the loop is running nothing escapes it but an exit, so an
        // error after setup began came out of setup.
        Err(e) if session.already_invoked() => Err(HotloopError::Setup(e.to_string())),
        Err(e) => Err(HotloopError::Evaluation {
            resource: name,
            message: e.to_string(),
        }),
    }
}
