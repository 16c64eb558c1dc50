//! Runtime values and the object model (functions, classes, instances).

use std::fmt;
use std::rc::Rc;

use crate::ast::{FunctionDecl, LiteralValue};
use crate::environment::{Environment, SharedEnv};
use crate::error::{LoxError, Result};
use crate::token::Token;

/// Signature of a built-in function.  Errors are plain messages; the caller
/// anchors them at the call site.
pub type NativeFn = fn(&[Value]) -> std::result::Result<Value, String>;

/// Every value a Lox program can produce.
///
/// `Number`, `String`, `Bool` and `Nil` are plain data.  The remaining
/// variants are reference types: cloning a `Value` shares the underlying
/// object.
#[derive(Clone)]
pub enum Value {
    Number(f64),
    String(String),
    Bool(bool),
    Nil,
    Native(Rc<NativeFunction>),
    Function(Rc<UserFunction>),
    Class(Rc<Class>),
    Instance(Rc<Instance>),
}

/// Numbers print without a fraction when they are integral.
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        let mut buf: itoa::Buffer = itoa::Buffer::new();
        buf.format(n as i64).to_string()
    } else {
        n.to_string()
    }
}

impl Value {
    /// `nil` and `false` are falsy, as are numbers `<= 0` and the empty
    /// string.  Everything else is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Nil => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n > 0.0,
            Value::String(s) => !s.is_empty(),
            Value::Native(_) | Value::Function(_) | Value::Class(_) | Value::Instance(_) => true,
        }
    }

    /// Language-level `==`.  Reference types never compare equal.
    pub fn is_equal(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Nil, Value::Nil) => true,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => f.write_str(&format_number(*n)),

            Value::String(s) => write!(f, "{}", s),

            Value::Bool(b) => write!(f, "{}", b),

            Value::Nil => write!(f, "nil"),

            Value::Native(_) => write!(f, "<native fn>"),

            Value::Function(function) => write!(f, "<fn {}>", function.declaration.name.lexeme),

            Value::Class(class) => write!(f, "{}", class.name),

            Value::Instance(instance) => write!(f, "<{} instance>", instance.class.name),
        }
    }
}

impl From<&LiteralValue> for Value {
    fn from(literal: &LiteralValue) -> Self {
        match literal {
            LiteralValue::Number(n) => Value::Number(*n),
            LiteralValue::Str(s) => Value::String(s.clone()),
            LiteralValue::True => Value::Bool(true),
            LiteralValue::False => Value::Bool(false),
            LiteralValue::Nil => Value::Nil,
        }
    }
}

// Reference types can be reachable from their own scopes; Debug stays shallow.
impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{:?}", s),
            other => write!(f, "{}", other),
        }
    }
}

/// A function implemented in Rust.
pub struct NativeFunction {
    pub name: &'static str,
    pub arity: usize,
    pub func: NativeFn,
}

/// A function or method declared in Lox, paired with the scope it closes over.
pub struct UserFunction {
    pub declaration: Rc<FunctionDecl>,
    pub closure: SharedEnv,
    pub is_initializer: bool,
}

impl UserFunction {
    pub fn new(declaration: Rc<FunctionDecl>, closure: SharedEnv, is_initializer: bool) -> Self {
        Self {
            declaration,
            closure,
            is_initializer,
        }
    }

    pub fn arity(&self) -> usize {
        self.declaration.params.len()
    }

    /// A copy of this method whose closure additionally defines `this`.
    pub fn bind(&self, instance: Value) -> UserFunction {
        let mut scope: Environment = Environment::with_enclosing(Rc::clone(&self.closure));
        scope.define("this", instance);

        UserFunction::new(
            Rc::clone(&self.declaration),
            scope.into_shared(),
            self.is_initializer,
        )
    }
}

/// A class: its methods live in an environment whose parent is the
/// superclass's method table, so method lookup walks the inheritance chain
/// the same way variable lookup walks scopes.
pub struct Class {
    pub name: String,
    pub superclass: Option<Rc<Class>>,
    pub methods: SharedEnv,
}

impl Class {
    pub fn new(name: String, superclass: Option<Rc<Class>>, methods: SharedEnv) -> Self {
        Self {
            name,
            superclass,
            methods,
        }
    }

    /// Find `name` on this class or the nearest ancestor defining it.
    pub fn find_method(&self, name: &str) -> Option<Rc<UserFunction>> {
        match self.methods.borrow().lookup(name) {
            Some(Value::Function(method)) => Some(method),
            _ => None,
        }
    }

    /// A class takes the arguments of its initializer, or none.
    pub fn arity(&self) -> usize {
        self.find_method("init").map_or(0, |init| init.arity())
    }
}

/// An object created by calling a class.
pub struct Instance {
    pub class: Rc<Class>,
    fields: SharedEnv,
}

impl Instance {
    pub fn new(class: Rc<Class>) -> Self {
        let fields: SharedEnv = Environment::with_enclosing(Rc::clone(&class.methods)).into_shared();

        Self { class, fields }
    }

    /// Property read: own fields first, then methods, which come back bound
    /// to this instance (a fresh bound method per access).
    pub fn get(self: &Rc<Self>, name: &Token) -> Result<Value> {
        let field: Option<Value> = self.fields.borrow().get_local(&name.lexeme);

        if let Some(value) = field {
            return Ok(value);
        }

        match self.class.find_method(&name.lexeme) {
            Some(method) => Ok(Value::Function(Rc::new(
                method.bind(Value::Instance(Rc::clone(self))),
            ))),
            None => Err(LoxError::runtime(
                name,
                format!("Undefined property '{}'.", name.lexeme),
            )),
        }
    }

    /// Property write: always lands in the instance's own fields, shadowing
    /// any method of the same name.
    pub fn set(&self, name: &Token, value: Value) {
        self.fields.borrow_mut().define(&name.lexeme, value);
    }
}
