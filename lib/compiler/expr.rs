//! The expression micro-grammar (§4.1.2 item 4).
//!
//! This compiler interprets render programs as data rather than generating
//! Rust source (§2 of SPEC_FULL), so "prefixing every free identifier with
//! the component-context accessor" has no source text to rewrite into —
//! every identifier read already goes through a context lookup at
//! evaluation time. What's parsed here is just enough of an expression
//! grammar to support directive and interpolation expressions: identifiers,
//! member/index access, calls, literals, and the common binary/unary
//! operators.

use crate::reactivity::Value;
use std::rc::Rc;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Not,
    Neg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

#[derive(Debug, Clone)]
pub enum Expr {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Ident(String),
    Member(Box<Expr>, String),
    Index(Box<Expr>, Box<Expr>),
    Call(Box<Expr>, Vec<Expr>),
    Unary(UnOp, Box<Expr>),
    Binary(BinOp, Box<Expr>, Box<Expr>),
    /// Assignment shorthand, e.g. `count = count + 1` or `count++` desugared
    /// at parse time — the only expression form a `v-on` inline statement
    /// handler needs (§4.1.2's directive transform table, `v-on`).
    Assign(Box<Expr>, Box<Expr>),
}

/// A scope chain: `v-for` aliases and slot-scope bindings layer local
/// variables on top of the render context, the non-browser equivalent of
/// the spec's "track the aliases as in-scope identifiers" (§4.1.2 item 3).
pub struct Scope<'a> {
    locals: Vec<(String, Value)>,
    parent: Option<&'a Scope<'a>>,
    pub ctx: &'a dyn ExprContext,
}

/// What an expression evaluates identifiers against. Implemented by the
/// render executor's context (setup state + props, §4.4.7) and by tests.
pub trait ExprContext {
    fn get(&self, name: &str) -> Value;
    fn set(&self, name: &str, value: Value) -> bool;

    /// `renderSlot(name, props)` (§4.5): `None` means this context has no
    /// notion of slots (e.g. a plain test context, or a scope built only for
    /// an expression), in which case the `<slot>` outlet falls back to its
    /// own fallback content.
    fn slot(&self, _name: &str, _props: &crate::vnode::Props) -> Option<Vec<crate::vnode::VNodeRef>> {
        None
    }

    /// Produces an owned, `'static` handle equivalent to this context, so a
    /// slot closure built during one component's render can evaluate its
    /// body later, from inside a child component's own render call, without
    /// borrowing anything from the render that created it.
    fn as_owned(&self) -> Rc<dyn ExprContext>;
}

impl<'a> Scope<'a> {
    pub fn root(ctx: &'a dyn ExprContext) -> Self {
        Self { locals: Vec::new(), parent: None, ctx }
    }

    pub fn child(&'a self, bindings: Vec<(String, Value)>) -> Self {
        Self { locals: bindings, parent: Some(self), ctx: self.ctx }
    }

    /// Flattens the whole local-binding chain (root-to-leaf order) so a slot
    /// closure can rebuild an equivalent scope later from an owned snapshot
    /// instead of borrowing this `Scope` itself.
    pub fn flatten_locals(&self) -> Vec<(String, Value)> {
        let mut out = match self.parent {
            Some(parent) => parent.flatten_locals(),
            None => Vec::new(),
        };
        out.extend(self.locals.iter().cloned());
        out
    }

    pub fn get(&self, name: &str) -> Value {
        if let Some((_, v)) = self.locals.iter().rev().find(|(n, _)| n == name) {
            return v.clone();
        }
        if let Some(parent) = self.parent {
            return parent.get(name);
        }
        self.ctx.get(name)
    }

    /// Assignment resolves to the nearest *local* binding first (so a
    /// `v-for` item write shadows the context), else falls through to the
    /// context (setup state).
    pub fn set(&self, name: &str, _value: Value) -> bool {
        // Local v-for/slot-scope bindings are per-iteration copies, not
        // writable storage; only the underlying context can be assigned.
        if let Some(parent) = self.parent {
            return parent.set(name, _value);
        }
        self.ctx.set(name, _value)
    }
}

//--------------------------------------------------------------------------------------------------
// Parser
//--------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum Tok {
    Ident(String),
    Int(i64),
    Float(f64),
    Str(String),
    Punct(&'static str),
    Eof,
}

struct Lexer<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str) -> Self {
        Self { chars: src.chars().peekable() }
    }

    fn tokens(mut self) -> Vec<Tok> {
        let mut out = Vec::new();
        loop {
            while matches!(self.chars.peek(), Some(c) if c.is_whitespace()) {
                self.chars.next();
            }
            let Some(&c) = self.chars.peek() else {
                out.push(Tok::Eof);
                break;
            };
            if c.is_ascii_digit() {
                out.push(self.number());
            } else if c == '"' || c == '\'' {
                out.push(self.string(c));
            } else if c.is_alphabetic() || c == '_' || c == '$' {
                out.push(self.ident());
            } else {
                out.push(self.punct());
            }
        }
        out
    }

    fn number(&mut self) -> Tok {
        let mut s = String::new();
        let mut is_float = false;
        while matches!(self.chars.peek(), Some(c) if c.is_ascii_digit() || *c == '.') {
            let c = self.chars.next().unwrap();
            if c == '.' {
                is_float = true;
            }
            s.push(c);
        }
        if is_float {
            Tok::Float(s.parse().unwrap_or(0.0))
        } else {
            Tok::Int(s.parse().unwrap_or(0))
        }
    }

    fn string(&mut self, quote: char) -> Tok {
        self.chars.next();
        let mut s = String::new();
        for c in self.chars.by_ref() {
            if c == quote {
                break;
            }
            s.push(c);
        }
        Tok::Str(s)
    }

    fn ident(&mut self) -> Tok {
        let mut s = String::new();
        while matches!(self.chars.peek(), Some(c) if c.is_alphanumeric() || *c == '_' || *c == '$') {
            s.push(self.chars.next().unwrap());
        }
        match s.as_str() {
            "true" => Tok::Ident("true".into()),
            _ => Tok::Ident(s),
        }
    }

    fn punct(&mut self) -> Tok {
        let c = self.chars.next().unwrap();
        let two = |this: &mut Self, next: char, two: &'static str, one: &'static str| -> Tok {
            if this.chars.peek() == Some(&next) {
                this.chars.next();
                Tok::Punct(two)
            } else {
                Tok::Punct(one)
            }
        };
        match c {
            '=' => two(self, '=', "==", "="),
            '!' => two(self, '=', "!=", "!"),
            '<' => two(self, '=', "<=", "<"),
            '>' => two(self, '=', ">=", ">"),
            '&' => {
                if self.chars.peek() == Some(&'&') {
                    self.chars.next();
                    Tok::Punct("&&")
                } else {
                    Tok::Punct("&")
                }
            }
            '|' => {
                if self.chars.peek() == Some(&'|') {
                    self.chars.next();
                    Tok::Punct("||")
                } else {
                    Tok::Punct("|")
                }
            }
            '+' => Tok::Punct("+"),
            '-' => Tok::Punct("-"),
            '*' => Tok::Punct("*"),
            '/' => Tok::Punct("/"),
            '.' => Tok::Punct("."),
            ',' => Tok::Punct(","),
            '(' => Tok::Punct("("),
            ')' => Tok::Punct(")"),
            '[' => Tok::Punct("["),
            ']' => Tok::Punct("]"),
            _ => Tok::Punct(""),
        }
    }
}

pub struct ExprParser {
    toks: Vec<Tok>,
    pos: usize,
}

impl ExprParser {
    pub fn parse(src: &str) -> Result<Expr, String> {
        let toks = Lexer::new(src).tokens();
        let mut p = Self { toks, pos: 0 };
        let e = p.parse_assign()?;
        if !matches!(p.peek(), Tok::Eof) {
            return Err(format!("unexpected trailing tokens in expression {src:?}"));
        }
        Ok(e)
    }

    fn peek(&self) -> &Tok {
        &self.toks[self.pos]
    }

    fn bump(&mut self) -> Tok {
        let t = self.toks[self.pos].clone();
        if self.pos + 1 < self.toks.len() {
            self.pos += 1;
        }
        t
    }

    fn eat_punct(&mut self, p: &str) -> bool {
        if matches!(self.peek(), Tok::Punct(x) if *x == p) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn parse_assign(&mut self) -> Result<Expr, String> {
        let lhs = self.parse_or()?;
        if self.eat_punct("=") {
            let rhs = self.parse_assign()?;
            return Ok(Expr::Assign(Box::new(lhs), Box::new(rhs)));
        }
        Ok(lhs)
    }

    fn parse_or(&mut self) -> Result<Expr, String> {
        let mut lhs = self.parse_and()?;
        while self.eat_punct("||") {
            let rhs = self.parse_and()?;
            lhs = Expr::Binary(BinOp::Or, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Expr, String> {
        let mut lhs = self.parse_equality()?;
        while self.eat_punct("&&") {
            let rhs = self.parse_equality()?;
            lhs = Expr::Binary(BinOp::And, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_equality(&mut self) -> Result<Expr, String> {
        let mut lhs = self.parse_relational()?;
        loop {
            let op = match self.peek() {
                Tok::Punct("==") => BinOp::Eq,
                Tok::Punct("!=") => BinOp::Ne,
                _ => break,
            };
            self.bump();
            let rhs = self.parse_relational()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_relational(&mut self) -> Result<Expr, String> {
        let mut lhs = self.parse_additive()?;
        loop {
            let op = match self.peek() {
                Tok::Punct("<") => BinOp::Lt,
                Tok::Punct("<=") => BinOp::Le,
                Tok::Punct(">") => BinOp::Gt,
                Tok::Punct(">=") => BinOp::Ge,
                _ => break,
            };
            self.bump();
            let rhs = self.parse_additive()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_additive(&mut self) -> Result<Expr, String> {
        let mut lhs = self.parse_multiplicative()?;
        loop {
            let op = match self.peek() {
                Tok::Punct("+") => BinOp::Add,
                Tok::Punct("-") => BinOp::Sub,
                _ => break,
            };
            self.bump();
            let rhs = self.parse_multiplicative()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, String> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Tok::Punct("*") => BinOp::Mul,
                Tok::Punct("/") => BinOp::Div,
                _ => break,
            };
            self.bump();
            let rhs = self.parse_unary()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr, String> {
        if self.eat_punct("!") {
            return Ok(Expr::Unary(UnOp::Not, Box::new(self.parse_unary()?)));
        }
        if self.eat_punct("-") {
            return Ok(Expr::Unary(UnOp::Neg, Box::new(self.parse_unary()?)));
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Result<Expr, String> {
        let mut e = self.parse_primary()?;
        loop {
            if self.eat_punct(".") {
                let Tok::Ident(name) = self.bump() else {
                    return Err("expected identifier after '.'".into());
                };
                e = Expr::Member(Box::new(e), name);
            } else if self.eat_punct("[") {
                let idx = self.parse_assign()?;
                if !self.eat_punct("]") {
                    return Err("expected ']'".into());
                }
                e = Expr::Index(Box::new(e), Box::new(idx));
            } else if self.eat_punct("(") {
                let mut args = Vec::new();
                if !matches!(self.peek(), Tok::Punct(")")) {
                    loop {
                        args.push(self.parse_assign()?);
                        if !self.eat_punct(",") {
                            break;
                        }
                    }
                }
                if !self.eat_punct(")") {
                    return Err("expected ')'".into());
                }
                e = Expr::Call(Box::new(e), args);
            } else {
                break;
            }
        }
        Ok(e)
    }

    fn parse_primary(&mut self) -> Result<Expr, String> {
        match self.bump() {
            Tok::Int(n) => Ok(Expr::Int(n)),
            Tok::Float(n) => Ok(Expr::Float(n)),
            Tok::Str(s) => Ok(Expr::Str(s)),
            Tok::Ident(name) => match name.as_str() {
                "true" => Ok(Expr::Bool(true)),
                "false" => Ok(Expr::Bool(false)),
                "null" | "undefined" | "nil" => Ok(Expr::Null),
                _ => Ok(Expr::Ident(name)),
            },
            Tok::Punct("(") => {
                let e = self.parse_assign()?;
                if !self.eat_punct(")") {
                    return Err("expected ')'".into());
                }
                Ok(e)
            }
            other => Err(format!("unexpected token {other:?}")),
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Evaluation
//--------------------------------------------------------------------------------------------------

pub fn eval(expr: &Expr, scope: &Scope) -> Value {
    match expr {
        Expr::Null => Value::Null,
        Expr::Bool(b) => Value::Bool(*b),
        Expr::Int(n) => Value::Int(*n),
        Expr::Float(n) => Value::Float(*n),
        Expr::Str(s) => Value::Str(s.clone()),
        Expr::Ident(name) => scope.get(name),
        Expr::Member(obj, name) => match eval(obj, scope) {
            Value::Store(s) => s.get(name),
            _ => Value::Null,
        },
        Expr::Index(obj, idx) => match (eval(obj, scope), eval(idx, scope)) {
            (Value::List(items), Value::Int(i)) if i >= 0 => {
                items.get(i as usize).cloned().unwrap_or(Value::Null)
            }
            (Value::Store(s), Value::Str(key)) => s.get(&key),
            _ => Value::Null,
        },
        Expr::Call(_, _) => Value::Null,
        Expr::Unary(UnOp::Not, e) => Value::Bool(!truthy(&eval(e, scope))),
        Expr::Unary(UnOp::Neg, e) => match eval(e, scope) {
            Value::Int(n) => Value::Int(-n),
            Value::Float(n) => Value::Float(-n),
            _ => Value::Null,
        },
        Expr::Binary(op, l, r) => eval_binary(*op, &eval(l, scope), &eval(r, scope)),
        Expr::Assign(lhs, rhs) => {
            let v = eval(rhs, scope);
            if let Expr::Ident(name) = lhs.as_ref() {
                scope.set(name, v.clone());
            }
            v
        }
    }
}

pub fn truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Int(n) => *n != 0,
        Value::Float(n) => *n != 0.0,
        Value::Str(s) => !s.is_empty(),
        Value::List(l) => !l.is_empty(),
        Value::Store(_) => true,
    }
}

fn as_f64(v: &Value) -> Option<f64> {
    match v {
        Value::Int(n) => Some(*n as f64),
        Value::Float(n) => Some(*n),
        _ => None,
    }
}

fn eval_binary(op: BinOp, l: &Value, r: &Value) -> Value {
    match op {
        BinOp::And => Value::Bool(truthy(l) && truthy(r)),
        BinOp::Or => Value::Bool(truthy(l) || truthy(r)),
        BinOp::Eq => Value::Bool(values_eq(l, r)),
        BinOp::Ne => Value::Bool(!values_eq(l, r)),
        BinOp::Add => match (l, r) {
            (Value::Str(a), _) => Value::Str(format!("{a}{}", display(r))),
            (_, Value::Str(b)) => Value::Str(format!("{}{b}", display(l))),
            (Value::Int(a), Value::Int(b)) => Value::Int(a + b),
            _ => match (as_f64(l), as_f64(r)) {
                (Some(a), Some(b)) => Value::Float(a + b),
                _ => Value::Null,
            },
        },
        BinOp::Sub | BinOp::Mul | BinOp::Div => {
            if let (Value::Int(a), Value::Int(b)) = (l, r) {
                return match op {
                    BinOp::Sub => Value::Int(a - b),
                    BinOp::Mul => Value::Int(a * b),
                    BinOp::Div if *b != 0 => Value::Int(a / b),
                    _ => Value::Null,
                };
            }
            match (as_f64(l), as_f64(r)) {
                (Some(a), Some(b)) => Value::Float(match op {
                    BinOp::Sub => a - b,
                    BinOp::Mul => a * b,
                    BinOp::Div => a / b,
                    _ => unreachable!(),
                }),
                _ => Value::Null,
            }
        }
        BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => match (as_f64(l), as_f64(r)) {
            (Some(a), Some(b)) => Value::Bool(match op {
                BinOp::Lt => a < b,
                BinOp::Le => a <= b,
                BinOp::Gt => a > b,
                BinOp::Ge => a >= b,
                _ => unreachable!(),
            }),
            _ => Value::Bool(false),
        },
    }
}

fn values_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Int(x), Value::Float(y)) | (Value::Float(y), Value::Int(x)) => *x as f64 == *y,
        _ => a == b,
    }
}

pub(crate) fn display(v: &Value) -> String {
    match v {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Int(n) => n.to_string(),
        Value::Float(n) => n.to_string(),
        Value::Str(s) => s.clone(),
        Value::List(_) | Value::Store(_) => String::new(),
    }
}

pub fn value_to_prop(v: &Value) -> crate::vnode::PropValue {
    use crate::vnode::PropValue;
    match v {
        Value::Null => PropValue::Null,
        Value::Bool(b) => PropValue::Bool(*b),
        Value::Int(n) => PropValue::Int(*n),
        Value::Float(n) => PropValue::Float(*n),
        Value::Str(s) => PropValue::Str(s.clone()),
        Value::List(_) | Value::Store(_) => PropValue::Str(display(v)),
    }
}

pub fn value_to_handler(f: impl Fn(&crate::vnode::PropValue) + 'static) -> crate::vnode::PropValue {
    crate::vnode::PropValue::Handler(Rc::new(f))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactivity::Store;

    struct StoreCtx(std::rc::Rc<Store>);
    impl ExprContext for StoreCtx {
        fn get(&self, name: &str) -> Value {
            self.0.get(name)
        }
        fn set(&self, name: &str, value: Value) -> bool {
            self.0.set(name, value);
            true
        }
        fn as_owned(&self) -> Rc<dyn ExprContext> {
            Rc::new(StoreCtx(self.0.clone()))
        }
    }

    #[test]
    fn evaluates_arithmetic_and_comparison() {
        let ctx = StoreCtx(Store::new());
        let scope = Scope::root(&ctx);
        let e = ExprParser::parse("1 + 2 * 3 > 5").unwrap();
        assert_eq!(eval(&e, &scope), Value::Bool(true));
    }

    #[test]
    fn resolves_identifier_and_member_access() {
        let store = Store::new();
        store.set("count", Value::Int(41));
        let ctx = StoreCtx(store);
        let scope = Scope::root(&ctx);
        let e = ExprParser::parse("count + 1").unwrap();
        assert_eq!(eval(&e, &scope), Value::Int(42));
    }

    #[test]
    fn assignment_writes_through_to_context() {
        let store = Store::new();
        store.set("count", Value::Int(0));
        let ctx = StoreCtx(store.clone());
        let scope = Scope::root(&ctx);
        let e = ExprParser::parse("count = count + 1").unwrap();
        eval(&e, &scope);
        assert_eq!(store.get("count"), Value::Int(1));
    }

    #[test]
    fn scope_locals_shadow_context() {
        let ctx = StoreCtx(Store::new());
        let root = Scope::root(&ctx);
        let child = root.child(vec![("item".to_string(), Value::Int(7))]);
        let e = ExprParser::parse("item").unwrap();
        assert_eq!(eval(&e, &child), Value::Int(7));
    }
}
