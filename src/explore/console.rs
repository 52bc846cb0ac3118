// src/explore/console.rs — Line-oriented console the loop talks to
//
// Values go to stdout, status and diagnostics to stderr, so the output of
// a script can be piped without the loop chatter.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::io::{BufRead, IsTerminal};

use super::report::{IterationOutcome, IterationReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Continue,
    Exit,
}

/// Decide from a raw input line. Only the exit word ends the loop; any
/// other input, including an empty line, means "run again".
pub fn decide(input: &str, exit_word: &str) -> Decision {
    if input.trim() == exit_word {
        Decision::Exit
    } else {
        Decision::Continue
    }
}

pub trait Console {
    /// Status message (setup progress, summaries).
    fn notice(&self, message: &str);

    /// Result of one iteration, with its elapsed time.
    fn report(&self, report: &IterationReport);

    /// Block until the user says whether to run again.
    fn confirm(&self, exit_word: &str) -> Decision;
}

// ---------------------------------------------------------------------------
// Terminal
// ---------------------------------------------------------------------------

pub struct TerminalConsole {
    show_unit_results: bool,
    /// Remaining automatic re-runs; `None` means ask the user.
    remaining_runs: Cell<Option<u64>>,
}

impl TerminalConsole {
    pub fn new(show_unit_results: bool) -> Self {
        Self {
            show_unit_results,
            remaining_runs: Cell::new(None),
        }
    }

    /// Run `runs` iterations in total without prompting, then exit.
    pub fn with_runs(mut self, runs: u64) -> Self {
        self.remaining_runs = Cell::new(Some(runs.saturating_sub(1)));
        self
    }

    fn prompt_line(&self, exit_word: &str) -> Decision {
        let stdin = std::io::stdin();
        if stdin.is_terminal() {
            let message = format!("Enter to run again, '{}' to quit:", exit_word);
            match inquire::Text::new(&message).prompt() {
                Ok(answer) => decide(&answer, exit_word),
                // Esc / Ctrl-C
                Err(_) => Decision::Exit,
            }
        } else {
            let mut line = String::new();
            match stdin.lock().read_line(&mut line) {
                Ok(0) => Decision::Exit,
                Ok(_) => decide(&line, exit_word),
                Err(e) => {
                    tracing::warn!("Could not read from stdin: {}", e);
                    Decision::Exit
                }
            }
        }
    }
}

impl Console for TerminalConsole {
    fn notice(&self, message: &str) {
        eprintln!("[hotloop] {}", message);
    }

    fn report(&self, report: &IterationReport) {
        match &report.outcome {
            IterationOutcome::Completed(value) => {
                if self.show_unit_results || !value.is_unit() {
                    println!("{}", report.body());
                }
                eprintln!("{}", report.status_line());
            }
            IterationOutcome::Failed(_) => {
                eprintln!("{}", report.status_line());
                eprintln!("{}", report.body());
            }
        }
    }

    fn confirm(&self, exit_word: &str) -> Decision {
        match self.remaining_runs.get() {
            Some(0) => Decision::Exit,
            Some(n) => {
                self.remaining_runs.set(Some(n - 1));
                Decision::Continue
            }
            None => self.prompt_line(exit_word),
        }
    }
}

// ---------------------------------------------------------------------------
// Scripted
// ---------------------------------------------------------------------------

type PromptHook = Box<dyn FnMut(usize)>;

/// Answers prompts from a fixed queue and keeps a transcript.
///
/// When the queue runs dry every further prompt answers "exit". A hook can
/// run before each prompt, e.g. to edit the script between iterations.
#[derive(Default)]
pub struct ScriptedConsole {
    answers: RefCell<VecDeque<String>>,
    notices: RefCell<Vec<String>>,
    results: RefCell<Vec<Result<String, String>>>,
    prompts: Cell<usize>,
    before_prompt: RefCell<Option<PromptHook>>,
}

impl ScriptedConsole {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: RefCell::new(answers.into_iter().map(Into::into).collect()),
            ..Default::default()
        }
    }

    /// Run `hook(n)` before the n-th prompt (1-based).
    pub fn before_prompt(self, hook: impl FnMut(usize) + 'static) -> Self {
        *self.before_prompt.borrow_mut() = Some(Box::new(hook));
        self
    }

    /// Per iteration: `Ok(value)` or `Err(diagnostic)`.
    pub fn results(&self) -> Vec<Result<String, String>> {
        self.results.borrow().clone()
    }

    pub fn notices(&self) -> Vec<String> {
        self.notices.borrow().clone()
    }

    pub fn prompts(&self) -> usize {
        self.prompts.get()
    }
}

impl Console for ScriptedConsole {
    fn notice(&self, message: &str) {
        self.notices.borrow_mut().push(message.to_string());
    }

    fn report(&self, report: &IterationReport) {
        let entry = if report.is_success() {
            Ok(report.body())
        } else {
            Err(report.body())
        };
        self.results.borrow_mut().push(entry);
    }

    fn confirm(&self, exit_word: &str) -> Decision {
        let n = self.prompts.get() + 1;
        self.prompts.set(n);
        if let Some(hook) = self.before_prompt.borrow_mut().as_mut() {
            hook(n);
        }
        match self.answers.borrow_mut().pop_front() {
            Some(answer) => decide(&answer, exit_word),
            None => Decision::Exit,
        }
    }
}
