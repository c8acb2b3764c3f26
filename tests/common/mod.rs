#![allow(dead_code)]

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;
use std::thread;

use rox::lox::{Lox, STACK_SIZE};

/// In-memory writer whose contents stay readable after being boxed.
#[derive(Clone, Default)]
pub struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8(self.0.borrow().clone()).expect("output is UTF-8")
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Everything observable about one run.
pub struct Outcome {
    pub stdout: String,
    pub stderr: String,
    pub had_error: bool,
    pub had_runtime_error: bool,
}

/// Runs `source` as a script in a fresh session.
pub fn run(source: &str) -> Outcome {
    let out = SharedBuffer::default();
    let err = SharedBuffer::default();

    let mut lox = Lox::with_writers(Box::new(out.clone()), Box::new(err.clone()));
    lox.run(source);

    Outcome {
        stdout: out.contents(),
        stderr: err.contents(),
        had_error: lox.had_error,
        had_runtime_error: lox.had_runtime_error,
    }
}

/// Runs `source` and returns stdout, asserting nothing went to stderr.
pub fn run_ok(source: &str) -> String {
    let outcome = run(source);

    assert!(
        outcome.stderr.is_empty(),
        "unexpected diagnostics:\n{}",
        outcome.stderr
    );
    assert!(!outcome.had_error && !outcome.had_runtime_error);

    outcome.stdout
}

/// Runs `f` on a thread with the interpreter's native stack size, for
/// programs that recurse close to the interpreter's limits.
pub fn on_interpreter_stack<T, F>(f: F) -> T
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    thread::Builder::new()
        .stack_size(STACK_SIZE)
        .spawn(f)
        .expect("spawn interpreter thread")
        .join()
        .expect("interpreter thread finished")
}

/// [`run`] on the interpreter's native stack size.
pub fn run_deep(source: &str) -> Outcome {
    let source = source.to_string();

    on_interpreter_stack(move || run(&source))
}
