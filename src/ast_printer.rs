use crate::ast::{Expr, LiteralValue};
use crate::token::TokenType;
use crate::value::format_number;

/// Renders an expression back into Lox source text.
///
/// The output re-lexes and re-parses into an equivalent tree: parentheses
/// appear only where the tree has a `Grouping`, which is exactly where the
/// parser needed them.  Comma expressions used as call arguments are the one
/// exception and are always wrapped, since a bare `,` would split the
/// argument.
pub struct AstPrinter;

impl AstPrinter {
    pub fn print(expr: &Expr) -> String {
        match expr {
            // ── literals ────────────────────────────────────────────────
            Expr::Literal(lit) => match lit {
                LiteralValue::True => "true".into(),

                LiteralValue::False => "false".into(),

                LiteralValue::Nil => "nil".into(),

                LiteralValue::Str(s) => format!("\"{}\"", s),

                LiteralValue::Number(n) => format_number(*n),
            },

            // ── grouping ────────────────────────────────────────────────
            Expr::Grouping(inner) => format!("({})", Self::print(inner)),

            // ── unary operator ──────────────────────────────────────────
            Expr::Unary { operator, right } => {
                format!("{}{}", operator.lexeme, Self::print(right))
            }

            // ── ternary, encoded as nested binaries ─────────────────────
            Expr::Binary {
                left,
                operator,
                right,
            } if operator.token_type == TokenType::QUESTION => match right.as_ref() {
                Expr::Binary {
                    left: then_branch,
                    right: else_branch,
                    ..
                } => format!(
                    "{} ? {} : {}",
                    Self::print(left),
                    Self::print(then_branch),
                    Self::print(else_branch)
                ),
                other => format!("{} ? {}", Self::print(left), Self::print(other)),
            },

            // ── comma operator ──────────────────────────────────────────
            Expr::Binary {
                left,
                operator,
                right,
            } if operator.token_type == TokenType::COMMA => {
                format!("{}, {}", Self::print(left), Self::print(right))
            }

            // ── binary / logical operators ──────────────────────────────
            Expr::Binary {
                left,
                operator,
                right,
            }
            | Expr::Logical {
                left,
                operator,
                right,
            } => format!(
                "{} {} {}",
                Self::print(left),
                operator.lexeme,
                Self::print(right)
            ),

            Expr::Variable { name, .. } => name.lexeme.clone(),

            Expr::Assign { name, value, .. } => {
                format!("{} = {}", name.lexeme, Self::print(value))
            }

            Expr::Call {
                callee, arguments, ..
            } => {
                let args: Vec<String> = arguments.iter().map(Self::print_argument).collect();

                format!("{}({})", Self::print(callee), args.join(", "))
            }

            Expr::Get { object, name } => format!("{}.{}", Self::print(object), name.lexeme),

            Expr::Set {
                object,
                name,
                value,
            } => format!(
                "{}.{} = {}",
                Self::print(object),
                name.lexeme,
                Self::print(value)
            ),

            Expr::This { .. } => "this".into(),

            Expr::Super { method, .. } => format!("super.{}", method.lexeme),
        }
    }

    fn print_argument(arg: &Expr) -> String {
        match arg {
            Expr::Binary { operator, .. } if operator.token_type == TokenType::COMMA => {
                format!("({})", Self::print(arg))
            }
            _ => Self::print(arg),
        }
    }
}
