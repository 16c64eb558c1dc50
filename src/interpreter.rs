use std::io::{self, Write};
use std::mem;
use std::rc::Rc;

use chrono::Utc;
use log::{debug, info};

use crate::ast::{Expr, ExprId, FunctionDecl, Stmt};
use crate::environment::{Environment, SharedEnv};
use crate::error::{LoxError, Reporter, Result};
use crate::resolver::Locals;
use crate::token::{Token, TokenType};
use crate::value::{Class, Instance, NativeFunction, UserFunction, Value};

/// How a statement finished.  `return` travels up through blocks and loops
/// as `Flow::Return` until the enclosing call consumes it.
#[derive(Debug)]
pub enum Flow {
    Normal,
    Return(Value),
}

/// Tree-walking evaluator.
///
/// `print` output (and, in interactive mode, the value of every top-level
/// expression statement) goes to `out`, which is stdout unless a caller
/// supplies its own sink.
pub struct Interpreter<W: Write = io::Stdout> {
    globals: SharedEnv,
    environment: SharedEnv,
    locals: Locals,
    interactive: bool,
    out: W,
}

fn clock(_args: &[Value]) -> std::result::Result<Value, String> {
    let seconds: f64 = Utc::now().timestamp_millis() as f64 / 1000.0;

    debug!("Native 'clock' returned {}", seconds);

    Ok(Value::Number(seconds))
}

impl Interpreter<io::Stdout> {
    pub fn new(interactive: bool) -> Self {
        Self::with_output(io::stdout(), interactive)
    }
}

impl<W: Write> Interpreter<W> {
    /// Creates an interpreter writing to `out`, with the natives defined in
    /// its global scope.
    pub fn with_output(out: W, interactive: bool) -> Self {
        info!("Initializing Interpreter (interactive={})", interactive);

        let globals: SharedEnv = Environment::new().into_shared();

        globals.borrow_mut().define(
            "clock",
            Value::Native(Rc::new(NativeFunction {
                name: "clock",
                arity: 0,
                func: clock,
            })),
        );

        Self {
            environment: Rc::clone(&globals),
            globals,
            locals: Locals::new(),
            interactive,
            out,
        }
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    /// Record binding depths computed by the resolver.  Entries accumulate,
    /// so earlier REPL lines keep working.
    pub fn resolve(&mut self, locals: Locals) {
        debug!("Recording {} resolved local(s)", locals.len());
        self.locals.extend(locals);
    }

    /// Executes a program.  The first runtime error is reported and the
    /// remaining statements are skipped.
    pub fn interpret(&mut self, statements: &[Stmt], reporter: &mut Reporter) {
        info!("Interpreting {} statement(s)", statements.len());

        for statement in statements {
            if let Err(error) = self.execute_top_level(statement) {
                debug!("Runtime error: {}", error);
                reporter.runtime_error(error);
                self.environment = Rc::clone(&self.globals);
                return;
            }
        }

        info!("Interpretation completed successfully");
    }

    fn execute_top_level(&mut self, stmt: &Stmt) -> Result<()> {
        match stmt {
            Stmt::Expression(expr) if self.interactive => {
                let value: Value = self.evaluate(expr)?;
                writeln!(self.out, "{}", value)?;
            }

            _ => {
                self.execute(stmt)?;
            }
        }

        Ok(())
    }

    /// Executes a single statement.
    pub fn execute(&mut self, stmt: &Stmt) -> Result<Flow> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
            }

            Stmt::Print(expr) => match expr {
                Some(expr) => {
                    let value: Value = self.evaluate(expr)?;
                    debug!("print {}", value);
                    writeln!(self.out, "{}", value)?;
                }
                None => writeln!(self.out)?,
            },

            Stmt::Var { name, initializer } => {
                let value: Value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                debug!("Defining variable '{}' = {}", name.lexeme, value);
                self.environment.borrow_mut().define(&name.lexeme, value);
            }

            Stmt::Block(statements) => {
                let scope: Environment = Environment::with_enclosing(Rc::clone(&self.environment));
                return self.execute_block(statements, scope);
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    return self.execute(then_branch);
                } else if let Some(else_branch) = else_branch {
                    return self.execute(else_branch);
                }
            }

            Stmt::While { condition, body } => {
                while self.evaluate(condition)?.is_truthy() {
                    if let Flow::Return(value) = self.execute(body)? {
                        return Ok(Flow::Return(value));
                    }
                }
            }

            Stmt::Function(declaration) => {
                debug!("Defining function '{}'", declaration.name.lexeme);

                let function: UserFunction = UserFunction::new(
                    Rc::clone(declaration),
                    Rc::clone(&self.environment),
                    false,
                );

                self.environment
                    .borrow_mut()
                    .define(&declaration.name.lexeme, Value::Function(Rc::new(function)));
            }

            Stmt::Return { value, .. } => {
                let value: Value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                debug!("Returning {}", value);
                return Ok(Flow::Return(value));
            }

            Stmt::Class {
                name,
                superclass,
                methods,
            } => self.define_class(name, superclass.as_ref(), methods)?,
        }

        Ok(Flow::Normal)
    }

    /// Runs `statements` with `scope` as the active environment, restoring
    /// the previous one on every exit path.
    pub fn execute_block(&mut self, statements: &[Stmt], scope: Environment) -> Result<Flow> {
        let previous: SharedEnv = mem::replace(&mut self.environment, scope.into_shared());

        let result: Result<Flow> = self.execute_all(statements);

        self.environment = previous;
        result
    }

    fn execute_all(&mut self, statements: &[Stmt]) -> Result<Flow> {
        for statement in statements {
            if let Flow::Return(value) = self.execute(statement)? {
                return Ok(Flow::Return(value));
            }
        }

        Ok(Flow::Normal)
    }

    fn define_class(
        &mut self,
        name: &Token,
        superclass: Option<&Expr>,
        methods: &[Rc<FunctionDecl>],
    ) -> Result<()> {
        debug!("Defining class '{}'", name.lexeme);

        let superclass: Option<Rc<Class>> = match superclass {
            Some(expr) => match self.evaluate(expr)? {
                Value::Class(class) => Some(class),
                _ => {
                    let token: &Token = match expr {
                        Expr::Variable { name, .. } => name,
                        _ => name,
                    };
                    return Err(LoxError::runtime(token, "Superclass must be a class."));
                }
            },
            None => None,
        };

        self.environment.borrow_mut().define(&name.lexeme, Value::Nil);

        let enclosing: SharedEnv = Rc::clone(&self.environment);

        if let Some(superclass) = &superclass {
            let mut scope: Environment = Environment::with_enclosing(Rc::clone(&self.environment));
            scope.define("super", Value::Class(Rc::clone(superclass)));
            self.environment = scope.into_shared();
        }

        let mut table: Environment = match &superclass {
            Some(superclass) => Environment::with_enclosing(Rc::clone(&superclass.methods)),
            None => Environment::new(),
        };

        for method in methods {
            let function: UserFunction = UserFunction::new(
                Rc::clone(method),
                Rc::clone(&self.environment),
                method.name.lexeme == "init",
            );
            table.define(&method.name.lexeme, Value::Function(Rc::new(function)));
        }

        let class: Class = Class::new(name.lexeme.clone(), superclass, table.into_shared());

        self.environment = enclosing;
        self.environment
            .borrow_mut()
            .assign(name, Value::Class(Rc::new(class)))?;

        info!("Class '{}' defined with {} method(s)", name.lexeme, methods.len());
        Ok(())
    }

    /// Evaluates an expression to exactly one value.
    pub fn evaluate(&mut self, expr: &Expr) -> Result<Value> {
        match expr {
            Expr::Literal(literal) => Ok(Value::from(literal)),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Unary { operator, right } => {
                let right: Value = self.evaluate(right)?;

                match (&operator.token_type, right) {
                    (TokenType::MINUS, Value::Number(n)) => Ok(Value::Number(-n)),
                    (TokenType::MINUS, _) => {
                        Err(LoxError::runtime(operator, "Operand must be a number."))
                    }
                    (TokenType::BANG, value) => Ok(Value::Bool(!value.is_truthy())),
                    _ => Err(LoxError::runtime(operator, "Invalid unary operator.")),
                }
            }

            Expr::Binary {
                left,
                operator,
                right,
            } => self.evaluate_binary(left, operator, right),

            Expr::Logical {
                left,
                operator,
                right,
            } => {
                let left: Value = self.evaluate(left)?;

                let short_circuit: bool = if operator.token_type == TokenType::OR {
                    left.is_truthy()
                } else {
                    !left.is_truthy()
                };

                if short_circuit {
                    Ok(left)
                } else {
                    self.evaluate(right)
                }
            }

            Expr::Variable { id, name } => self.look_up_variable(*id, name),

            Expr::Assign { id, name, value } => {
                let value: Value = self.evaluate(value)?;

                match self.locals.get(id) {
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
                let callee: Value = self.evaluate(callee)?;

                let mut values: Vec<Value> = Vec::with_capacity(arguments.len());
                for argument in arguments {
                    values.push(self.evaluate(argument)?);
                }

                self.call(callee, paren, values)
            }

            Expr::Get { object, name } => match self.evaluate(object)? {
                Value::Instance(instance) => instance.get(name),
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

                let value: Value = self.evaluate(value)?;
                instance.set(name, value.clone());

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

    fn evaluate_binary(&mut self, left: &Expr, operator: &Token, right: &Expr) -> Result<Value> {
        match operator.token_type {
            // c ? a : b arrives as Binary(c, ?, Binary(a, :, b))
            TokenType::QUESTION => {
                let Expr::Binary {
                    left: then_branch,
                    right: else_branch,
                    ..
                } = right
                else {
                    return Err(LoxError::runtime(operator, "Malformed conditional expression."));
                };

                return if self.evaluate(left)?.is_truthy() {
                    self.evaluate(then_branch)
                } else {
                    self.evaluate(else_branch)
                };
            }

            TokenType::COMMA => {
                self.evaluate(left)?;
                return self.evaluate(right);
            }

            _ => {}
        }

        let left: Value = self.evaluate(left)?;
        let right: Value = self.evaluate(right)?;

        match operator.token_type {
            TokenType::PLUS => match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
                (Value::String(a), Value::String(b)) => Ok(Value::String(a + &b)),
                _ => Err(LoxError::runtime(
                    operator,
                    "Operands must be two numbers or two strings.",
                )),
            },

            TokenType::MINUS => {
                let (a, b) = number_operands(operator, &left, &right)?;
                Ok(Value::Number(a - b))
            }

            TokenType::STAR => {
                let (a, b) = number_operands(operator, &left, &right)?;
                Ok(Value::Number(a * b))
            }

            TokenType::SLASH => {
                let (a, b) = number_operands(operator, &left, &right)?;

                if b == 0.0 {
                    return Err(LoxError::runtime(operator, "Division by zero."));
                }

                Ok(Value::Number(a / b))
            }

            TokenType::CARET => {
                let (a, b) = number_operands(operator, &left, &right)?;
                Ok(Value::Number(a.powf(b)))
            }

            TokenType::GREATER => {
                let (a, b) = number_operands(operator, &left, &right)?;
                Ok(Value::Bool(a > b))
            }

            TokenType::GREATER_EQUAL => {
                let (a, b) = number_operands(operator, &left, &right)?;
                Ok(Value::Bool(a >= b))
            }

            TokenType::LESS => {
                let (a, b) = number_operands(operator, &left, &right)?;
                Ok(Value::Bool(a < b))
            }

            TokenType::LESS_EQUAL => {
                let (a, b) = number_operands(operator, &left, &right)?;
                Ok(Value::Bool(a <= b))
            }

            TokenType::EQUAL_EQUAL => Ok(Value::Bool(left.is_equal(&right))),

            TokenType::BANG_EQUAL => Ok(Value::Bool(!left.is_equal(&right))),

            _ => Err(LoxError::runtime(operator, "Invalid binary operator.")),
        }
    }

    fn evaluate_super(&mut self, id: ExprId, keyword: &Token, method: &Token) -> Result<Value> {
        let distance: usize = match self.locals.get(&id) {
            Some(&distance) if distance > 0 => distance,
            _ => {
                return Err(LoxError::runtime(
                    keyword,
                    "Can't use 'super' outside of a class.",
                ))
            }
        };

        let Value::Class(superclass) = Environment::get_at(&self.environment, distance, keyword)?
        else {
            return Err(LoxError::runtime(keyword, "Superclass must be a class."));
        };

        let this: Token = Token::new(TokenType::THIS, "this", keyword.line);
        let object: Value = Environment::get_at(&self.environment, distance - 1, &this)?;

        match superclass.find_method(&method.lexeme) {
            Some(found) => Ok(Value::Function(Rc::new(found.bind(object)))),
            None => Err(LoxError::runtime(
                method,
                format!("Undefined property '{}'.", method.lexeme),
            )),
        }
    }

    fn look_up_variable(&self, id: ExprId, name: &Token) -> Result<Value> {
        match self.locals.get(&id) {
            Some(&distance) => Environment::get_at(&self.environment, distance, name),
            None => self.globals.borrow().get(name),
        }
    }

    fn call(&mut self, callee: Value, paren: &Token, arguments: Vec<Value>) -> Result<Value> {
        let arity: usize = match &callee {
            Value::Native(native) => native.arity,
            Value::Function(function) => function.arity(),
            Value::Class(class) => class.arity(),
            Value::Number(_)
            | Value::String(_)
            | Value::Bool(_)
            | Value::Nil
            | Value::Instance(_) => {
                return Err(LoxError::runtime(
                    paren,
                    "Can only call functions and classes.",
                ))
            }
        };

        if arguments.len() != arity {
            return Err(LoxError::runtime(
                paren,
                format!("Expected {} arguments but got {}.", arity, arguments.len()),
            ));
        }

        match callee {
            Value::Native(native) => {
                debug!("Calling native '{}'", native.name);
                (native.func)(&arguments).map_err(|message| LoxError::runtime(paren, message))
            }

            Value::Function(function) => self.call_function(&function, arguments),

            Value::Class(class) => {
                debug!("Instantiating class '{}'", class.name);

                let instance: Value = Value::Instance(Rc::new(Instance::new(Rc::clone(&class))));

                if let Some(init) = class.find_method("init") {
                    self.call_function(&init.bind(instance.clone()), arguments)?;
                }

                Ok(instance)
            }

            Value::Number(_)
            | Value::String(_)
            | Value::Bool(_)
            | Value::Nil
            | Value::Instance(_) => Err(LoxError::runtime(
                paren,
                "Can only call functions and classes.",
            )),
        }
    }

    /// Parameters live in a child of the closure; the body runs one block
    /// further in.
    fn call_function(&mut self, function: &UserFunction, arguments: Vec<Value>) -> Result<Value> {
        let declaration = &function.declaration;

        debug!(
            "Calling '{}' with {} argument(s)",
            declaration.name.lexeme,
            arguments.len()
        );

        let mut parameters: Environment = Environment::with_enclosing(Rc::clone(&function.closure));
        for (param, argument) in declaration.params.iter().zip(arguments) {
            parameters.define(&param.lexeme, argument);
        }

        let body: Environment = Environment::with_enclosing(parameters.into_shared());
        let flow: Flow = self.execute_block(&declaration.body, body)?;

        if function.is_initializer {
            let this: Option<Value> = function.closure.borrow().get_local("this");
            return this.ok_or_else(|| {
                LoxError::runtime(&declaration.name, "Undefined variable 'this'.")
            });
        }

        match flow {
            Flow::Return(value) => Ok(value),
            Flow::Normal => Ok(Value::Nil),
        }
    }
}

fn number_operands(operator: &Token, left: &Value, right: &Value) -> Result<(f64, f64)> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok((*a, *b)),
        _ => Err(LoxError::runtime(operator, "Operands must be numbers.")),
    }
}
