//! Tree-walking evaluator for expression text
//!
//! Text is trimmed, its quotes normalized, then looked up in the context's
//! expression cache before being parsed. The tree is walked with a [`Stack`]
//! that tells name resolution whether an enclosing call wants a callable.

use std::cmp::Ordering;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::lexer::normalize_quotes;
use crate::parser::{parse_expr, BinaryOp, Expr, UnaryOp};
use crate::runtime::access::{
    indirect, is_func, is_general_int, is_number, is_string, method_of, prop_of,
};
use crate::runtime::coerce::{as_bool, as_f64, as_i64, as_string, as_u64};
use crate::runtime::environment::{Context, Scope};
use crate::runtime::structural::cmp;
use crate::runtime::value::{FloatWidth, IntWidth, Value};

/// What an enclosing node expects a name to resolve to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Target {
    /// A plain value
    #[default]
    Property,
    /// A callable; methods win over fields of the same name
    Method,
}

/// Per-evaluation state
pub struct Stack<'a> {
    ctx: &'a dyn Context,
    targets: Vec<Target>,
    x: Value,
    y: Value,
}

impl<'a> Stack<'a> {
    /// Fresh stack resolving names through `ctx`
    pub fn new(ctx: &'a dyn Context) -> Self {
        Stack {
            ctx,
            targets: Vec::new(),
            x: Value::Invalid,
            y: Value::Invalid,
        }
    }

    /// Context names are resolved against
    pub fn context(&self) -> &'a dyn Context {
        self.ctx
    }

    /// Announces what the next resolved name should be
    pub fn push_target(&mut self, target: Target) {
        self.targets.push(target);
    }

    /// Takes the pending target, `Property` when none is pending
    pub fn pop_target(&mut self) -> Target {
        self.targets.pop().unwrap_or_default()
    }

    /// Operands of the last binary operator
    pub fn operands(&self) -> (&Value, &Value) {
        (&self.x, &self.y)
    }

    /// Evaluates one tree node
    pub fn eval(&mut self, expr: &Expr) -> Result<Value> {
        match expr {
            Expr::Ident(name) => self.eval_ident(name, false),
            Expr::Selector { object, field } => self.eval_selector(object, field),
            Expr::Index { object, index } => self.eval_index(object, index),
            Expr::Paren(inner) => self.eval(inner),
            Expr::Call { callee, args } => {
                self.pop_target();
                self.eval_call(callee, args)
            }
            Expr::Unary { op, operand } => {
                self.pop_target();
                self.eval_unary(*op, operand)
            }
            Expr::Binary { op, left, right } => {
                self.pop_target();
                self.eval_binary(*op, left, right)
            }
            Expr::IntLiteral(n) => {
                self.pop_target();
                Ok(Value::Int(IntWidth::W64, *n))
            }
            Expr::FloatLiteral(x) => {
                self.pop_target();
                Ok(Value::Float(FloatWidth::F64, *x))
            }
            Expr::StringLiteral(s) => {
                self.pop_target();
                Ok(Value::String(s.clone()))
            }
        }
    }

    fn eval_ident(&mut self, name: &str, selected: bool) -> Result<Value> {
        let target = self.pop_target();
        if !selected {
            match name {
                "nil" | "null" => return Ok(Value::Invalid),
                "true" => return Ok(Value::Bool(true)),
                "false" => return Ok(Value::Bool(false)),
                _ => {}
            }
        }
        if target == Target::Method {
            if let Some(method) = self.ctx.method_of(name) {
                return Ok(method);
            }
        }
        Ok(self
            .ctx
            .value_of(name)
            .and_then(|val| wanted(target, val))
            .unwrap_or(Value::Invalid))
    }

    fn eval_selector(&mut self, object: &Expr, field: &str) -> Result<Value> {
        let target = self.pop_target();
        let parent = match object {
            Expr::Ident(name) => self.eval_ident(name, true)?,
            other => self.eval(other)?,
        };
        Ok(resolve(target, &parent, &Value::from(field)))
    }

    fn eval_index(&mut self, object: &Expr, index: &Expr) -> Result<Value> {
        let target = self.pop_target();
        let parent = self.eval(object)?;
        let key = self.eval(index)?;
        Ok(resolve(target, &parent, &key))
    }

    fn eval_call(&mut self, callee: &Expr, args: &[Expr]) -> Result<Value> {
        let depth = self.targets.len();
        self.push_target(Target::Method);
        let func = self.eval(callee);
        self.targets.truncate(depth);
        let func = match indirect(&func?) {
            Value::Func(func) => func,
            Value::Invalid => {
                return Err(Error::UndefinedMethod {
                    name: callee.to_string(),
                })
            }
            other => {
                return Err(Error::NotCallable {
                    type_name: other.type_name(),
                })
            }
        };
        let args = args
            .iter()
            .map(|arg| self.eval(arg))
            .collect::<Result<Vec<_>>>()?;
        func.call(&args)
    }

    fn eval_unary(&mut self, op: UnaryOp, operand: &Expr) -> Result<Value> {
        let val = self.eval(operand)?;
        let invalid = |val: &Value| Error::InvalidUnary {
            op: op.to_string(),
            type_name: val.type_name(),
        };
        match op {
            UnaryOp::Not => Ok(Value::Bool(!as_bool(&val))),
            UnaryOp::Neg => match indirect(&val) {
                Value::Int(_, n) => Ok(Value::Int(IntWidth::W64, n.wrapping_neg())),
                Value::Uint(_, n) => Ok(Value::Uint(IntWidth::W64, n.wrapping_neg())),
                Value::Float(_, x) => Ok(Value::Float(FloatWidth::F64, -x)),
                _ => Err(invalid(&val)),
            },
            UnaryOp::Plus => {
                if is_number(&val) {
                    Ok(val)
                } else {
                    Err(invalid(&val))
                }
            }
        }
    }

    fn eval_binary(&mut self, op: BinaryOp, left: &Expr, right: &Expr) -> Result<Value> {
        let mut x = self.eval(left)?;
        if op == BinaryOp::Or && as_bool(&x) {
            return Ok(Value::Bool(true));
        }
        let y = if op == BinaryOp::Add {
            if is_string(&x) {
                Value::String(self.eval_string(right)?)
            } else {
                let y = self.eval(right)?;
                if is_string(&y) {
                    x = Value::String(self.eval_string(left)?);
                }
                y
            }
        } else {
            self.eval(right)?
        };
        self.x = x;
        self.y = y;

        let (x, y) = (&self.x, &self.y);
        match op {
            BinaryOp::Or => Ok(Value::Bool(as_bool(y))),
            BinaryOp::And => Ok(Value::Bool(as_bool(x) && as_bool(y))),
            op if op.is_comparison() => Ok(Value::Bool(compare(op, x, y))),
            op if op.is_bitwise() => bitwise(op, x, y),
            op => arithmetic(op, x, y),
        }
    }

    /// Flattens a `+` chain into concatenated string forms
    fn eval_string(&mut self, expr: &Expr) -> Result<String> {
        if let Expr::Binary {
            op: BinaryOp::Add,
            left,
            right,
        } = expr
        {
            let mut text = self.eval_string(left)?;
            text.push_str(&self.eval_string(right)?);
            return Ok(text);
        }
        Ok(as_string(&self.eval(expr)?))
    }
}

/// Keeps `val` only if it fits what the target asks for
fn wanted(target: Target, val: Value) -> Option<Value> {
    match target {
        Target::Method if !is_func(&val) => None,
        _ => Some(val),
    }
}

/// Member or element lookup on an evaluated parent
fn resolve(target: Target, parent: &Value, key: &Value) -> Value {
    if matches!(parent, Value::Invalid) {
        return Value::Invalid;
    }
    let path = std::slice::from_ref(key);
    if target == Target::Method {
        if let Some(method) = method_of(parent, path) {
            return method;
        }
    }
    prop_of(parent, path)
        .and_then(|val| wanted(target, val))
        .unwrap_or(Value::Invalid)
}

fn compare(op: BinaryOp, x: &Value, y: &Value) -> bool {
    let ord = cmp(x, y);
    match op {
        BinaryOp::Eq => ord == Some(Ordering::Equal),
        BinaryOp::NotEq => ord != Some(Ordering::Equal),
        BinaryOp::Gt => ord == Some(Ordering::Greater),
        BinaryOp::Lt => ord == Some(Ordering::Less),
        BinaryOp::GtEq => matches!(ord, Some(Ordering::Greater | Ordering::Equal)),
        BinaryOp::LtEq => matches!(ord, Some(Ordering::Less | Ordering::Equal)),
        _ => false,
    }
}

fn invalid_operation(op: BinaryOp, x: &Value, y: &Value) -> Error {
    Error::InvalidOperation {
        op: op.to_string(),
        left_type: x.type_name(),
        right_type: y.type_name(),
    }
}

fn arithmetic(op: BinaryOp, x: &Value, y: &Value) -> Result<Value> {
    if op == BinaryOp::Add && (is_string(x) || is_string(y)) {
        return Ok(Value::String(as_string(x) + &as_string(y)));
    }
    if !is_number(x) || !is_number(y) {
        return Err(invalid_operation(op, x, y));
    }
    if is_general_int(x) && is_general_int(y) {
        let (a, b) = (as_i64(x)?, as_i64(y)?);
        let n = match op {
            BinaryOp::Add => a.wrapping_add(b),
            BinaryOp::Sub => a.wrapping_sub(b),
            BinaryOp::Mul => a.wrapping_mul(b),
            BinaryOp::Div | BinaryOp::Rem if b == 0 => return Err(Error::DivisionByZero),
            BinaryOp::Div => a.wrapping_div(b),
            BinaryOp::Rem => a.wrapping_rem(b),
            _ => return Err(invalid_operation(op, x, y)),
        };
        return Ok(Value::Int(IntWidth::W64, n));
    }
    let (a, b) = (as_f64(x)?, as_f64(y)?);
    let r = match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div => a / b,
        _ => return Err(invalid_operation(op, x, y)),
    };
    Ok(Value::Float(FloatWidth::F64, r))
}

fn bitwise(op: BinaryOp, x: &Value, y: &Value) -> Result<Value> {
    if !is_general_int(x) || !is_general_int(y) {
        return Err(invalid_operation(op, x, y));
    }
    let (a, b) = (as_u64(x)?, as_u64(y)?);
    let n = match op {
        BinaryOp::BitAnd => a & b,
        BinaryOp::BitOr => a | b,
        BinaryOp::BitXor => a ^ b,
        BinaryOp::AndNot => a & !b,
        BinaryOp::Shl => a.checked_shl(shift(b)).unwrap_or(0),
        BinaryOp::Shr => a.checked_shr(shift(b)).unwrap_or(0),
        _ => return Err(invalid_operation(op, x, y)),
    };
    Ok(Value::Uint(IntWidth::W64, n))
}

/// Shift amount; anything from 64 up shifts every bit out
fn shift(b: u64) -> u32 {
    u32::try_from(b).unwrap_or(u32::MAX)
}

/// Walks an already parsed tree against `ctx`, bypassing the expression cache
pub fn eval_expr(expr: &Expr, ctx: &dyn Context) -> Result<Value> {
    Stack::new(ctx).eval(expr)
}

/// Evaluates expression text.
///
/// Without a context, a fresh scope chained to the default root is used.
/// Failures anywhere in the walk abort the whole evaluation.
pub fn eval(text: &str, ctx: Option<&dyn Context>) -> Result<Value> {
    let text = text.trim();
    if text.is_empty() {
        return Err(Error::EmptyExpression);
    }
    let source = normalize_quotes(text);
    let result = match ctx {
        Some(ctx) => eval_in(&source, ctx),
        None => eval_in(&source, &Scope::new()),
    };
    if let Err(err) = &result {
        tracing::debug!(expression = %source, error = %err, "evaluation failed");
    }
    result
}

fn eval_in(source: &str, ctx: &dyn Context) -> Result<Value> {
    let expr = match ctx.cache_of(source) {
        Some(expr) => {
            tracing::trace!(expression = %source, "expression cache hit");
            expr
        }
        None => {
            tracing::debug!(expression = %source, "parsing expression");
            let expr = Arc::new(parse_expr(source)?);
            ctx.cache(source, expr.clone());
            expr
        }
    };
    eval_expr(&expr, ctx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::environment::{Root, RootConfig};

    fn scope() -> Scope {
        Scope::with_root(&Arc::new(Root::new(RootConfig::default())))
    }

    fn run(text: &str) -> Result<Value> {
        eval(text, Some(&scope()))
    }

    #[test]
    fn test_literals() {
        assert_eq!(run("42").unwrap(), Value::Int(IntWidth::W64, 42));
        assert_eq!(run("0x10").unwrap(), Value::Int(IntWidth::W64, 16));
        assert_eq!(run("1.5").unwrap(), Value::float(1.5));
        assert_eq!(run("'a\"b'").unwrap(), Value::from("a\"b"));
        assert_eq!(run("nil").unwrap(), Value::Invalid);
        assert_eq!(run("true").unwrap(), Value::Bool(true));
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(run("1 + 2 * 3").unwrap(), Value::Int(IntWidth::W64, 7));
        assert_eq!(run("-7 / 2").unwrap(), Value::Int(IntWidth::W64, -3));
        assert_eq!(run("-7 % 2").unwrap(), Value::Int(IntWidth::W64, -1));
        assert_eq!(run("1 + 0.5").unwrap(), Value::float(1.5));
        assert_eq!(run("(1 + 2) * 3").unwrap(), Value::Int(IntWidth::W64, 9));
    }

    #[test]
    fn test_arithmetic_faults() {
        assert_eq!(run("1 / 0"), Err(Error::DivisionByZero));
        assert!(matches!(run("1.5 % 2"), Err(Error::InvalidOperation { .. })));
        assert!(matches!(run("true - 1"), Err(Error::InvalidOperation { .. })));
    }

    #[test]
    fn test_bitwise() {
        assert_eq!(run("6 & 3").unwrap(), Value::Uint(IntWidth::W64, 2));
        assert_eq!(run("6 | 3").unwrap(), Value::Uint(IntWidth::W64, 7));
        assert_eq!(run("6 ^ 3").unwrap(), Value::Uint(IntWidth::W64, 5));
        assert_eq!(run("6 &^ 3").unwrap(), Value::Uint(IntWidth::W64, 4));
        assert_eq!(run("1 << 4").unwrap(), Value::Uint(IntWidth::W64, 16));
        assert_eq!(run("1 << 64").unwrap(), Value::Uint(IntWidth::W64, 0));
        assert!(matches!(run("1.0 & 1"), Err(Error::InvalidOperation { .. })));
    }

    #[test]
    fn test_comparisons() {
        assert_eq!(run("1 < 2").unwrap(), Value::Bool(true));
        assert_eq!(run("2 >= 2.0").unwrap(), Value::Bool(true));
        assert_eq!(run("'a' != 'b'").unwrap(), Value::Bool(true));
        assert_eq!(run("'1' == 1").unwrap(), Value::Bool(false));
    }

    #[test]
    fn test_logic() {
        assert_eq!(run("0 || 'x'").unwrap(), Value::Bool(true));
        assert_eq!(run("1 && 0").unwrap(), Value::Bool(false));
        assert_eq!(run("!0").unwrap(), Value::Bool(true));
    }

    #[test]
    fn test_or_short_circuits() {
        let mut scope = scope();
        scope.bind(
            "boom",
            Value::func("boom", |_| Err(Error::runtime("evaluated"))),
        );
        assert_eq!(eval("1 || boom()", Some(&scope)).unwrap(), Value::Bool(true));
        assert!(eval("0 || boom()", Some(&scope)).is_err());
    }

    #[test]
    fn test_unary() {
        assert_eq!(run("-(2.5)").unwrap(), Value::float(-2.5));
        assert_eq!(run("+3").unwrap(), Value::Int(IntWidth::W64, 3));
        assert!(matches!(run("+'a'"), Err(Error::InvalidUnary { .. })));
        assert!(matches!(run("-'a'"), Err(Error::InvalidUnary { .. })));
    }

    #[test]
    fn test_string_concatenation() {
        let mut scope = scope();
        scope.bind("n", 25i64);
        assert_eq!(eval("'a' + n", Some(&scope)).unwrap(), Value::from("a25"));
        assert_eq!(eval("n + 'a'", Some(&scope)).unwrap(), Value::from("25a"));
        // The left chain is re-read as strings once the right side is one
        assert_eq!(eval("1 + 2 + 'a'", Some(&scope)).unwrap(), Value::from("12a"));
    }

    #[test]
    fn test_call_errors() {
        let mut scope = scope();
        scope.bind("x", 1i64);
        assert_eq!(
            eval("missing()", Some(&scope)),
            Err(Error::UndefinedMethod {
                name: "missing".into()
            })
        );
        assert!(matches!(
            eval("(1)()", Some(&scope)),
            Err(Error::NotCallable { .. })
        ));
    }

    #[test]
    fn test_curried_call_args_resolve_as_values() {
        let mut scope = scope();
        scope
            .bind("x", 5i64)
            .bind(
                "mk",
                Value::func("mk", |_| {
                    Ok(Value::func("inner", |args| Ok(args[0].clone())))
                }),
            );
        assert_eq!(eval("mk()(x)", Some(&scope)).unwrap(), Value::from(5i64));
    }

    #[test]
    fn test_nested_selectors() {
        let mut scope = scope();
        scope.bind(
            "a",
            Value::str_map(vec![(
                "b",
                Value::str_map(vec![("c", Value::from("deep"))]),
            )]),
        );
        assert_eq!(eval("a.b.c", Some(&scope)).unwrap(), Value::from("deep"));
        assert_eq!(eval("a['b'].c", Some(&scope)).unwrap(), Value::from("deep"));
        assert_eq!(eval("a.x.c", Some(&scope)).unwrap(), Value::Invalid);
    }

    #[test]
    fn test_empty_expression() {
        assert_eq!(run("   "), Err(Error::EmptyExpression));
    }

    #[test]
    fn test_parse_failure_is_reported() {
        assert!(run("1 +").is_err());
    }

    #[test]
    fn test_stack_targets() {
        let scope = scope();
        let mut stack = Stack::new(&scope);
        assert_eq!(stack.pop_target(), Target::Property);
        stack.push_target(Target::Method);
        assert_eq!(stack.pop_target(), Target::Method);
        stack.eval(&parse_expr("1 + 2").unwrap()).unwrap();
        assert_eq!(
            stack.operands(),
            (&Value::Int(IntWidth::W64, 1), &Value::Int(IntWidth::W64, 2))
        );
    }
}
