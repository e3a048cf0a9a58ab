//! A Rox session: one interpreter, one id allocator and one host, driven one
//! program (file or interactive line) at a time.
//!
//! ```
//! use rox::host::ConsoleHost;
//! use rox::lox::{Lox, RunStatus};
//!
//! let mut lox = Lox::new(Box::new(ConsoleHost));
//! assert_eq!(lox.run("var a = 1;"), RunStatus::Ok);
//! assert_eq!(lox.run("print a + 1;"), RunStatus::Ok);
//! ```

use log::{debug, info};

use crate::ast::NodeIds;
use crate::error::LoxError;
use crate::host::Host;
use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::resolver::Resolver;
use crate::scanner::scan_tokens;
use crate::value::Value;

/// Outcome of a single [`Lox::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Ok,
    /// A scan, parse or resolve error was reported; nothing was executed.
    CompileError,
    /// Execution started and was aborted by a runtime error.
    RuntimeError,
}

impl RunStatus {
    /// Process exit code for a script run.
    pub fn exit_code(self) -> i32 {
        match self {
            RunStatus::Ok => 0,
            RunStatus::CompileError => 65,
            RunStatus::RuntimeError => 70,
        }
    }
}

pub struct Lox {
    interpreter: Interpreter,
    ids: NodeIds,
}

impl Lox {
    pub fn new(host: Box<dyn Host>) -> Self {
        info!("Starting Rox session");

        let mut interpreter = Interpreter::new(host);
        interpreter.define_global("current_state", Value::Number(0.0));
        interpreter.define_global("last_state", Value::Number(0.0));

        Self {
            interpreter,
            ids: NodeIds::new(),
        }
    }

    /// Register an extra global before (or between) runs.
    pub fn define_global(&mut self, name: &str, value: Value) {
        self.interpreter.define_global(name, value);
    }

    pub fn global(&self, name: &str) -> Option<Value> {
        self.interpreter.global(name)
    }

    /// Scan, parse, resolve and execute `source` against this session's
    /// globals. Errors are reported to the host as they are found.
    pub fn run(&mut self, source: &str) -> RunStatus {
        debug!("Running source:\n{}", source);

        let (tokens, scan_errors) = scan_tokens(source);
        self.report_all(&scan_errors);

        let statements = match Parser::new(tokens, &mut self.ids).parse() {
            Ok(statements) => statements,
            Err(errors) => {
                self.report_all(&errors);
                return RunStatus::CompileError;
            }
        };

        if !scan_errors.is_empty() {
            return RunStatus::CompileError;
        }

        match Resolver::new().resolve(&statements) {
            Ok(resolution) => self.interpreter.resolve(resolution),
            Err(errors) => {
                self.report_all(&errors);
                return RunStatus::CompileError;
            }
        }

        match self.interpreter.interpret(&statements) {
            Ok(()) => RunStatus::Ok,
            Err(_) => RunStatus::RuntimeError,
        }
    }

    fn report_all(&mut self, errors: &[LoxError]) {
        let host = self.interpreter.host_mut();
        for error in errors {
            debug!("Compile error: {}", error);
            host.error(error.line(), error.location(), &error.message());
        }
    }
}
