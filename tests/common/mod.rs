#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use rox::host::Host;
use rox::lox::{Lox, RunStatus};

/// The fixed value every `clock()` call returns under test.
pub const CLOCK: f64 = 42.5;

/// Everything a program sent to its host.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Output {
    pub printed: Vec<String>,
    pub errors: Vec<String>,
    pub runtime_errors: Vec<String>,
}

/// Host that records output in memory, shared with the test body.
#[derive(Debug, Default, Clone)]
pub struct CaptureHost {
    output: Rc<RefCell<Output>>,
}

impl CaptureHost {
    pub fn output(&self) -> Rc<RefCell<Output>> {
        Rc::clone(&self.output)
    }
}

impl Host for CaptureHost {
    fn print(&mut self, text: &str) {
        self.output.borrow_mut().printed.push(text.to_string());
    }

    fn error(&mut self, line: usize, location: Option<&str>, message: &str) {
        self.output.borrow_mut().errors.push(format!(
            "[line {}] Error{}: {}",
            line,
            location.unwrap_or(""),
            message
        ));
    }

    fn runtime_error(&mut self, message: &str, line: usize) {
        self.output
            .borrow_mut()
            .runtime_errors
            .push(format!("{}\n[line {}]", message, line));
    }

    fn clock(&self) -> f64 {
        CLOCK
    }
}

/// A fresh session plus a handle on what it outputs.
pub fn session() -> (Lox, Rc<RefCell<Output>>) {
    let host = CaptureHost::default();
    let output = host.output();
    (Lox::new(Box::new(host)), output)
}

/// Run one program in a fresh session.
pub fn run(source: &str) -> (RunStatus, Output) {
    let (mut lox, output) = session();
    let status = lox.run(source);
    let captured = output.borrow().clone();
    (status, captured)
}

/// Run a program that must succeed and return its printed lines.
pub fn printed(source: &str) -> Vec<String> {
    let (status, output) = run(source);
    assert_eq!(
        status,
        RunStatus::Ok,
        "program failed: {:?}\n{}",
        output,
        source
    );
    output.printed
}
