// src/explore/session.rs — Per-run loop state
//
// A session lives behind an `Rc`, so it never crosses threads: another
// thread running the same script builds its own session and does its own
// setup.

use std::cell::{Cell, RefCell};
use std::time::Duration;

use rhai::{Dynamic, Scope};

use super::environment::Environment;

#[derive(Debug, Default)]
pub struct LoopSession {
    already_invoked: Cell<bool>,
    exit_requested: Cell<bool>,
    environment: RefCell<Environment>,
    iteration_count: Cell<u64>,
    last_duration: Cell<Option<Duration>>,
}

impl LoopSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// True once the loop-start call has run setup, or the environment
    /// already carries the setup marker.
    pub fn is_setup_done(&self) -> bool {
        self.already_invoked.get() || self.environment.borrow().is_setup_done()
    }

    pub fn already_invoked(&self) -> bool {
        self.already_invoked.get()
    }

    pub fn exit_requested(&self) -> bool {
        self.exit_requested.get()
    }

    pub fn iteration_count(&self) -> u64 {
        self.iteration_count.get()
    }

    pub fn last_duration(&self) -> Option<Duration> {
        self.last_duration.get()
    }

    /// Copy of the current environment.
    pub fn environment(&self) -> Environment {
        self.environment.borrow().clone()
    }

    /// Current value of one environment variable.
    pub fn get(&self, name: &str) -> Option<Dynamic> {
        self.environment.borrow().get(name).cloned()
    }

    pub(crate) fn begin_setup(&self) {
        self.already_invoked.set(true);
    }

    /// Store what setup produced and write the marker.
    pub(crate) fn install(&self, env: Environment) {
        let mut current = self.environment.borrow_mut();
        current.merge(env);
        current.mark_setup_done();
    }

    pub(crate) fn scope(&self) -> Scope<'static> {
        self.environment.borrow().to_scope()
    }

    pub(crate) fn absorb(&self, scope: &Scope) -> usize {
        self.environment.borrow_mut().absorb(scope)
    }

    pub(crate) fn record_iteration(&self, elapsed: Duration) {
        self.iteration_count.set(self.iteration_count.get() + 1);
        self.last_duration.set(Some(elapsed));
    }

    pub(crate) fn request_exit(&self) {
        self.exit_requested.set(true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_is_uninitialized() {
        let session = LoopSession::new();
        assert!(!session.is_setup_done());
        assert!(!session.already_invoked());
        assert_eq!(session.iteration_count(), 0);
        assert!(session.last_duration().is_none());
    }

    #[test]
    fn test_begin_setup_marks_invoked() {
        let session = LoopSession::new();
        session.begin_setup();
        assert!(session.is_setup_done());
        // Marker is only written by install
        assert!(!session.environment().is_setup_done());
    }

    #[test]
    fn test_install_writes_marker_and_vars() {
        let session = LoopSession::new();
        let mut env = Environment::new();
        env.set("x", Dynamic::from(5_i64));
        session.install(env);

        let env = session.environment();
        assert!(env.is_setup_done());
        assert_eq!(session.get("x").unwrap().as_int().unwrap(), 5);
    }

    #[test]
    fn test_record_iteration() {
        let session = LoopSession::new();
        session.record_iteration(Duration::from_millis(3));
        session.record_iteration(Duration::from_millis(7));
        assert_eq!(session.iteration_count(), 2);
        assert_eq!(session.last_duration(), Some(Duration::from_millis(7)));
    }
}
