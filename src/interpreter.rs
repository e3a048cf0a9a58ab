use std::cell::RefCell;
use std::collections::HashMap;
use std::mem;
use std::rc::Rc;

use log::{debug, info};

use crate::ast::{Expr, ExprId, LiteralValue, Stmt};
use crate::callable::{Callable, LoxFunction, NativeFunction};
use crate::class::{LoxClass, LoxInstance};
use crate::environment::{Env, Environment};
use crate::error::{LoxError, Result};
use crate::host::Host;
use crate::resolver::Resolution;
use crate::token::{Token, TokenType};
use crate::value::Value;

/// How a statement finished. `Return` travels up through blocks and loops
/// until the enclosing call consumes it; it never escapes a call.
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    Normal,
    Return(Value),
}

/// Tree‑walking evaluator. Owns the global frame, the active frame pointer,
/// the resolution tables and the host for a whole session.
pub struct Interpreter {
    globals: Env,
    environment: Env,
    resolution: Resolution,
    host: Box<dyn Host>,
}

fn clock(interpreter: &Interpreter, _args: &[Value]) -> std::result::Result<Value, String> {
    Ok(Value::Number(interpreter.host().clock()))
}

impl Interpreter {
    /// Creates a new Interpreter and defines native functions such as `clock`.
    pub fn new(host: Box<dyn Host>) -> Self {
        info!("Initializing Interpreter");

        let globals: Env = Rc::new(RefCell::new(Environment::new()));

        debug!("Defining native function 'clock'");

        globals.borrow_mut().define(
            "clock",
            Value::Callable(Callable::Native(Rc::new(NativeFunction {
                name: "clock".to_string(),
                arity: 0,
                func: clock,
            }))),
        );

        Self {
            environment: Rc::clone(&globals),
            globals,
            resolution: Resolution::default(),
            host,
        }
    }

    pub fn host(&self) -> &dyn Host {
        self.host.as_ref()
    }

    pub fn host_mut(&mut self) -> &mut dyn Host {
        self.host.as_mut()
    }

    /// Bind a value in the global frame.
    pub fn define_global(&mut self, name: &str, value: Value) {
        debug!("Defining global '{}'", name);
        self.globals.borrow_mut().define(name, value);
    }

    /// Read a global by name, if it exists.
    pub fn global(&self, name: &str) -> Option<Value> {
        self.globals
            .borrow()
            .get(&Token::synthetic(name, 0))
            .ok()
    }

    /// Accept the side tables of a resolver pass.
    pub fn resolve(&mut self, resolution: Resolution) {
        debug!(
            "Recording {} local(s), {} constant assignment(s)",
            resolution.locals.len(),
            resolution.constants.len()
        );
        self.resolution.merge(resolution);
    }

    /// Interprets a list of statements (a "program").
    ///
    /// A runtime error aborts the rest of the list, is reported to the host,
    /// and is returned; the active frame is reset to the globals so the
    /// session can go on.
    pub fn interpret(&mut self, statements: &[Stmt]) -> Result<()> {
        debug!("Interpreting {} statements", statements.len());

        for stmt in statements {
            if let Err(e) = self.execute(stmt) {
                debug!("Runtime error: {}", e);
                self.environment = Rc::clone(&self.globals);
                if let LoxError::Runtime { message, line } = &e {
                    self.host.runtime_error(message, *line);
                }
                return Err(e);
            }
        }

        info!("Interpretation completed successfully");
        Ok(())
    }

    // ───────────────────────────── statements ──────────────────────────────

    /// Executes a single statement.
    pub fn execute(&mut self, stmt: &Stmt) -> Result<Flow> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
                Ok(Flow::Normal)
            }

            Stmt::Print(expr) => {
                let value = self.evaluate(expr)?;
                debug!("Printing value: {}", value);
                self.host.print(&value.to_string());
                Ok(Flow::Normal)
            }

            Stmt::Var { name, initializer } => {
                let value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                debug!("Variable '{}' defined with value: {}", name.lexeme, value);
                self.environment.borrow_mut().define(&name.lexeme, value);
                Ok(Flow::Normal)
            }

            Stmt::Const { name, initializer } => {
                let value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                debug!("Constant '{}' defined with value: {}", name.lexeme, value);
                self.environment
                    .borrow_mut()
                    .define_constant(&name.lexeme, value);
                Ok(Flow::Normal)
            }

            Stmt::Block(statements) => {
                let environment = Environment::child_of(&self.environment);
                self.execute_block(statements, environment)
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.execute(then_branch)
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch)
                } else {
                    Ok(Flow::Normal)
                }
            }

            Stmt::While { condition, body } => {
                while self.evaluate(condition)?.is_truthy() {
                    if let Flow::Return(value) = self.execute(body)? {
                        return Ok(Flow::Return(value));
                    }
                }
                Ok(Flow::Normal)
            }

            Stmt::Function(declaration) => {
                debug!("Defining function '{}'", declaration.name.lexeme);
                let function = LoxFunction::new(
                    Rc::clone(declaration),
                    Rc::clone(&self.environment),
                    false,
                );
                self.environment.borrow_mut().define(
                    &declaration.name.lexeme,
                    Value::Callable(Callable::Function(Rc::new(function))),
                );
                Ok(Flow::Normal)
            }

            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                debug!("Returning value: {}", value);
                Ok(Flow::Return(value))
            }

            Stmt::Class {
                name,
                superclass,
                methods,
            } => {
                let superclass: Option<Rc<LoxClass>> = match superclass {
                    Some(expr) => match self.evaluate(expr)? {
                        Value::Callable(Callable::Class(class)) => Some(class),
                        _ => {
                            let at = match expr {
                                Expr::Variable { name, .. } => name,
                                _ => name,
                            };
                            return Err(LoxError::runtime(at, "Superclass must be a class."));
                        }
                    },
                    None => None,
                };

                self.environment
                    .borrow_mut()
                    .define(&name.lexeme, Value::Nil);

                // Methods of a subclass close over a frame holding `super`.
                let method_env: Env = match &superclass {
                    Some(superclass) => {
                        let env = Environment::child_of(&self.environment);
                        env.borrow_mut().define(
                            "super",
                            Value::Callable(Callable::Class(Rc::clone(superclass))),
                        );
                        env
                    }
                    None => Rc::clone(&self.environment),
                };

                let methods = methods
                    .iter()
                    .map(|method| {
                        let function = LoxFunction::new(
                            Rc::clone(method),
                            Rc::clone(&method_env),
                            method.name.lexeme == "init",
                        );
                        (method.name.lexeme.clone(), Rc::new(function))
                    })
                    .collect::<HashMap<_, _>>();

                let class = LoxClass::new(name.lexeme.clone(), superclass, methods);
                info!("Class '{}' defined", name.lexeme);

                self.environment
                    .borrow_mut()
                    .assign(name, Value::Callable(Callable::Class(Rc::new(class))))?;
                Ok(Flow::Normal)
            }
        }
    }

    /// Run `statements` with `environment` as the active frame, restoring
    /// the previous frame afterwards even if a statement fails.
    pub fn execute_block(&mut self, statements: &[Stmt], environment: Env) -> Result<Flow> {
        debug!("Entering block with {} statements", statements.len());

        let previous = mem::replace(&mut self.environment, environment);
        let result = self.execute_all(statements);
        self.environment = previous;

        result
    }

    fn execute_all(&mut self, statements: &[Stmt]) -> Result<Flow> {
        for stmt in statements {
            if let Flow::Return(value) = self.execute(stmt)? {
                return Ok(Flow::Return(value));
            }
        }
        Ok(Flow::Normal)
    }

    // ───────────────────────────── expressions ─────────────────────────────

    /// Evaluates an expression and returns a Value.
    pub fn evaluate(&mut self, expr: &Expr) -> Result<Value> {
        match expr {
            Expr::Literal(literal) => Ok(match literal {
                LiteralValue::Number(n) => Value::Number(*n),
                LiteralValue::Str(s) => Value::String(s.clone()),
                LiteralValue::True => Value::Bool(true),
                LiteralValue::False => Value::Bool(false),
                LiteralValue::Nil => Value::Nil,
            }),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Unary { operator, right } => {
                let right = self.evaluate(right)?;
                match operator.token_type {
                    TokenType::MINUS => match right {
                        Value::Number(n) => Ok(Value::Number(-n)),
                        _ => Err(LoxError::runtime(operator, "Operand must be a number.")),
                    },
                    TokenType::BANG => Ok(Value::Bool(!right.is_truthy())),
                    _ => Err(LoxError::runtime(operator, "Invalid unary operator.")),
                }
            }

            Expr::Binary {
                left,
                operator,
                right,
            } => {
                let left = self.evaluate(left)?;
                let right = self.evaluate(right)?;
                self.evaluate_binary(operator, left, right)
            }

            Expr::Logical {
                left,
                operator,
                right,
            } => {
                let left = self.evaluate(left)?;

                let decided = if operator.token_type == TokenType::OR {
                    left.is_truthy()
                } else {
                    !left.is_truthy()
                };

                if decided {
                    Ok(left)
                } else {
                    self.evaluate(right)
                }
            }

            Expr::Variable { id, name } | Expr::Const { id, name } => {
                self.look_up_variable(*id, name)
            }

            Expr::Assign { id, name, value } => {
                if self.is_constant_target(*id, name) {
                    return Err(LoxError::runtime(
                        name,
                        "You cannot assign a value to a constant.",
                    ));
                }

                let value = self.evaluate(value)?;

                match self.resolution.locals.get(id) {
                    Some(&distance) => {
                        Environment::assign_at(&self.environment, distance, name, value.clone())?
                    }
                    None => self.globals.borrow_mut().assign(name, value.clone())?,
                }

                Ok(value)
            }

            Expr::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee = self.evaluate(callee)?;

                let mut values = Vec::with_capacity(arguments.len());
                for argument in arguments {
                    values.push(self.evaluate(argument)?);
                }

                let Value::Callable(callable) = callee else {
                    return Err(LoxError::runtime(
                        paren,
                        "Can only call functions and classes.",
                    ));
                };

                if values.len() != callable.arity() {
                    return Err(LoxError::runtime(
                        paren,
                        format!(
                            "Expected {} arguments but got {}.",
                            callable.arity(),
                            values.len()
                        ),
                    ));
                }

                callable.call(self, paren, values)
            }

            Expr::Get { object, name } => match self.evaluate(object)? {
                Value::Instance(instance) => LoxInstance::get(&instance, name),
                _ => Err(LoxError::runtime(name, "Only instances have properties.")),
            },

            Expr::Set {
                object,
                name,
                value,
            } => {
                let Value::Instance(instance) = self.evaluate(object)? else {
                    return Err(LoxError::runtime(name, "Only instances have fields."));
                };

                let value = self.evaluate(value)?;
                instance.borrow_mut().set(name, value.clone());
                Ok(value)
            }

            Expr::This { id, keyword } => self.look_up_variable(*id, keyword),

            Expr::Super {
                id,
                keyword,
                method,
            } => self.evaluate_super(*id, keyword, method),
        }
    }

    fn evaluate_binary(&self, operator: &Token, left: Value, right: Value) -> Result<Value> {
        debug!(
            "Binary '{}' on {} and {}",
            operator.lexeme,
            left.type_name(),
            right.type_name()
        );

        let numbers = |left: &Value, right: &Value| match (left, right) {
            (Value::Number(a), Value::Number(b)) => Ok((*a, *b)),
            _ => Err(LoxError::runtime(operator, "Operands must be numbers.")),
        };

        match operator.token_type {
            TokenType::PLUS => match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
                (Value::String(a), Value::String(b)) => Ok(Value::String(a + &b)),
                (Value::String(a), n @ Value::Number(_)) => Ok(Value::String(format!("{}{}", a, n))),
                (n @ Value::Number(_), Value::String(b)) => Ok(Value::String(format!("{}{}", n, b))),
                _ => Err(LoxError::runtime(
                    operator,
                    "Operands must be numbers or strings.",
                )),
            },
            TokenType::MINUS => numbers(&left, &right).map(|(a, b)| Value::Number(a - b)),
            TokenType::STAR => numbers(&left, &right).map(|(a, b)| Value::Number(a * b)),
            TokenType::SLASH => numbers(&left, &right).map(|(a, b)| Value::Number(a / b)),
            TokenType::GREATER => numbers(&left, &right).map(|(a, b)| Value::Bool(a > b)),
            TokenType::GREATER_EQUAL => numbers(&left, &right).map(|(a, b)| Value::Bool(a >= b)),
            TokenType::LESS => numbers(&left, &right).map(|(a, b)| Value::Bool(a < b)),
            TokenType::LESS_EQUAL => numbers(&left, &right).map(|(a, b)| Value::Bool(a <= b)),
            TokenType::EQUAL_EQUAL => Ok(Value::Bool(left == right)),
            TokenType::BANG_EQUAL => Ok(Value::Bool(left != right)),
            _ => Err(LoxError::runtime(operator, "Invalid binary operator.")),
        }
    }

    fn evaluate_super(&mut self, id: ExprId, keyword: &Token, method: &Token) -> Result<Value> {
        let undefined_property = || {
            LoxError::runtime(method, format!("Undefined property '{}'.", method.lexeme))
        };

        let distance = *self.resolution.locals.get(&id).ok_or_else(undefined_property)?;

        // `this` always lives one frame inside the frame holding `super`.
        let this_distance = distance.checked_sub(1).ok_or_else(undefined_property)?;

        let superclass = Environment::get_at(&self.environment, distance, keyword)?;
        let object = Environment::get_at(
            &self.environment,
            this_distance,
            &Token::synthetic("this", keyword.line),
        )?;

        let (Value::Callable(Callable::Class(superclass)), Value::Instance(instance)) =
            (superclass, object)
        else {
            return Err(undefined_property());
        };

        let method = superclass
            .find_method(&method.lexeme)
            .ok_or_else(undefined_property)?;

        Ok(Value::Callable(Callable::Function(Rc::new(
            method.bind(&instance),
        ))))
    }

    fn look_up_variable(&self, id: ExprId, name: &Token) -> Result<Value> {
        match self.resolution.locals.get(&id) {
            Some(&distance) => Environment::get_at(&self.environment, distance, name),
            None => self.globals.borrow().get(name),
        }
    }

    /// Local constants are known statically; globals are checked by name.
    fn is_constant_target(&self, id: ExprId, name: &Token) -> bool {
        if self.resolution.constants.contains_key(&id) {
            return true;
        }

        !self.resolution.locals.contains_key(&id) && self.globals.borrow().is_constant(&name.lexeme)
    }
}
