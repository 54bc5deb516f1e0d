use crate::error::{CalcError, CalcResult};
use crate::units::round_half_up;
use anyhow::{anyhow, bail, Result};
use std::collections::HashMap;

/// Names of the soil variables an equation may reference, in slot order.
pub const SOIL_VARIABLES: [&str; 2] = ["BpH", "WpH"];

const MATH_PREFIX: &str = "Math.";

/// Functions reachable through the `Math.` namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MathFn {
    Abs,
    Sqrt,
    Exp,
    Log,
    Log10,
    Floor,
    Ceil,
    Round,
    Pow,
    Min,
    Max,
}

impl MathFn {
    fn from_name(name: &str) -> Option<Self> {
        let func = match name {
            "abs" => MathFn::Abs,
            "sqrt" => MathFn::Sqrt,
            "exp" => MathFn::Exp,
            "log" => MathFn::Log,
            "log10" => MathFn::Log10,
            "floor" => MathFn::Floor,
            "ceil" => MathFn::Ceil,
            "round" => MathFn::Round,
            "pow" => MathFn::Pow,
            "min" => MathFn::Min,
            "max" => MathFn::Max,
            _ => return None,
        };
        Some(func)
    }

    fn accepts(self, argc: usize) -> bool {
        match self {
            MathFn::Pow => argc == 2,
            MathFn::Min | MathFn::Max => argc >= 1,
            _ => argc == 1,
        }
    }

    fn apply_unary(self, a: f64) -> f64 {
        match self {
            MathFn::Abs => a.abs(),
            MathFn::Sqrt => a.sqrt(),
            MathFn::Exp => a.exp(),
            MathFn::Log => a.ln(),
            MathFn::Log10 => a.log10(),
            MathFn::Floor => a.floor(),
            MathFn::Ceil => a.ceil(),
            MathFn::Round => round_half_up(a),
            MathFn::Pow | MathFn::Min | MathFn::Max => f64::NAN,
        }
    }
}

/// OpCodes for the stack machine. Every value on the stack is an `f64`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OpCode {
    /// Pushes a constant onto the stack.
    LoadConst(f64),
    /// Pushes the value of a soil variable by slot index (0 = BpH, 1 = WpH).
    LoadVar(usize),
    /// Pops (b, a), pushes (a + b).
    Add,
    /// Pops (b, a), pushes (a - b).
    Sub,
    /// Pops (b, a), pushes (a * b).
    Mul,
    /// Pops (b, a), pushes (a / b).
    Div,
    /// Pops a, pushes -a.
    Neg,
    /// Pops `argc` values and pushes the result of the math call.
    Call(MathFn, usize),
}

/// A compiled sequence of operations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bytecode {
    pub ops: Vec<OpCode>,
}

/// Stateless stack machine.
///
/// A malformed program (stack underflow, leftover values) evaluates to NaN so
/// the caller's finiteness check rejects it.
pub struct VM;

impl VM {
    pub fn execute(bytecode: &Bytecode, vars: &[f64], stack: &mut Vec<f64>) -> f64 {
        stack.clear();

        for op in &bytecode.ops {
            match *op {
                OpCode::LoadConst(val) => stack.push(val),
                OpCode::LoadVar(idx) => stack.push(vars.get(idx).copied().unwrap_or(f64::NAN)),
                OpCode::Add => binary(stack, |a, b| a + b),
                OpCode::Sub => binary(stack, |a, b| a - b),
                OpCode::Mul => binary(stack, |a, b| a * b),
                OpCode::Div => binary(stack, |a, b| a / b),
                OpCode::Neg => {
                    let a = stack.pop().unwrap_or(f64::NAN);
                    stack.push(-a);
                }
                OpCode::Call(func, argc) => {
                    if argc == 0 || stack.len() < argc || !func.accepts(argc) {
                        return f64::NAN;
                    }
                    let args = stack.split_off(stack.len() - argc);
                    let value = match func {
                        MathFn::Pow => args[0].powf(args[1]),
                        MathFn::Min => args.iter().copied().fold(f64::INFINITY, f64::min),
                        MathFn::Max => args.iter().copied().fold(f64::NEG_INFINITY, f64::max),
                        _ => func.apply_unary(args[0]),
                    };
                    stack.push(value);
                }
            }
        }

        if stack.len() == 1 {
            stack.pop().unwrap_or(f64::NAN)
        } else {
            f64::NAN
        }
    }
}

fn binary(stack: &mut Vec<f64>, f: impl Fn(f64, f64) -> f64) {
    let b = stack.pop().unwrap_or(f64::NAN);
    let a = stack.pop().unwrap_or(f64::NAN);
    stack.push(f(a, b));
}

// --- AST & Compiler ---

/// Abstract Syntax Tree nodes for expressions.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Variable(String),
    Binary(Box<Expr>, char, Box<Expr>), // char is operator +, -, *, /
    Unary(char, Box<Expr>),
    Call(String, Vec<Expr>), // `Math.` prefix already stripped
}

/// Compiles an AST (`Expr`) into `Bytecode`, resolving variable names to slots.
pub struct Compiler {
    pub var_map: HashMap<String, usize>,
}

impl Compiler {
    pub fn new(var_names: &[&str]) -> Self {
        let var_map = var_names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.to_string(), i))
            .collect();
        Self { var_map }
    }

    pub fn compile(&self, expr: &Expr) -> Result<Bytecode> {
        let mut ops = Vec::new();
        self.compile_recursive(expr, &mut ops)?;
        Ok(Bytecode { ops })
    }

    fn compile_recursive(&self, expr: &Expr, ops: &mut Vec<OpCode>) -> Result<()> {
        match expr {
            Expr::Number(n) => ops.push(OpCode::LoadConst(*n)),
            Expr::Variable(name) => {
                let idx = self
                    .var_map
                    .get(name)
                    .ok_or_else(|| anyhow!("unknown variable `{name}`"))?;
                ops.push(OpCode::LoadVar(*idx));
            }
            Expr::Binary(left, op, right) => {
                self.compile_recursive(left, ops)?;
                self.compile_recursive(right, ops)?;
                match op {
                    '+' => ops.push(OpCode::Add),
                    '-' => ops.push(OpCode::Sub),
                    '*' => ops.push(OpCode::Mul),
                    '/' => ops.push(OpCode::Div),
                    _ => bail!("unknown binary operator `{op}`"),
                }
            }
            Expr::Unary(op, operand) => {
                self.compile_recursive(operand, ops)?;
                match op {
                    '-' => ops.push(OpCode::Neg),
                    _ => bail!("unknown unary operator `{op}`"),
                }
            }
            Expr::Call(name, args) => {
                let func = MathFn::from_name(name)
                    .ok_or_else(|| anyhow!("unknown function `Math.{name}`"))?;
                if !func.accepts(args.len()) {
                    bail!("`Math.{name}` does not take {} argument(s)", args.len());
                }
                for arg in args {
                    self.compile_recursive(arg, ops)?;
                }
                ops.push(OpCode::Call(func, args.len()));
            }
        }
        Ok(())
    }
}

// --- Parser ---

/// Parses a string expression into an AST. Any character outside the
/// arithmetic grammar is rejected rather than skipped.
pub fn parse(input: &str) -> Result<Expr> {
    let tokens = tokenize(input)?;
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.parse_expression()?;
    if let Some(token) = parser.peek() {
        bail!("unexpected trailing token {token:?}");
    }
    Ok(expr)
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Identifier(String),
    Plus,
    Minus,
    Star,
    Slash,
    Comma,
    LParen,
    RParen,
}

fn tokenize(input: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
        } else if c.is_ascii_digit() || c == '.' {
            let mut num_str = String::new();
            while let Some(&d) = chars.peek() {
                if d.is_ascii_digit() || d == '.' {
                    num_str.push(d);
                    chars.next();
                } else {
                    break;
                }
            }
            let value: f64 = num_str
                .parse()
                .map_err(|_| anyhow!("malformed number `{num_str}`"))?;
            tokens.push(Token::Number(value));
        } else if c.is_ascii_alphabetic() {
            let mut ident = String::new();
            while let Some(&d) = chars.peek() {
                if d.is_ascii_alphanumeric() || d == '_' || d == '.' {
                    ident.push(d);
                    chars.next();
                } else {
                    break;
                }
            }
            tokens.push(Token::Identifier(ident));
        } else {
            let token = match c {
                '+' => Token::Plus,
                '-' => Token::Minus,
                '*' => Token::Star,
                '/' => Token::Slash,
                ',' => Token::Comma,
                '(' => Token::LParen,
                ')' => Token::RParen,
                other => bail!("unexpected character `{other}`"),
            };
            tokens.push(token);
            chars.next();
        }
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn consume(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expect_rparen(&mut self) -> Result<()> {
        match self.consume() {
            Some(Token::RParen) => Ok(()),
            _ => bail!("expected ')'"),
        }
    }

    fn parse_expression(&mut self) -> Result<Expr> {
        let mut left = self.parse_term()?;

        while let Some(token) = self.peek() {
            let op = match token {
                Token::Plus => '+',
                Token::Minus => '-',
                _ => break,
            };
            self.consume();
            let right = self.parse_term()?;
            left = Expr::Binary(Box::new(left), op, Box::new(right));
        }
        Ok(left)
    }

    fn parse_term(&mut self) -> Result<Expr> {
        let mut left = self.parse_unary()?;

        while let Some(token) = self.peek() {
            let op = match token {
                Token::Star => '*',
                Token::Slash => '/',
                _ => break,
            };
            self.consume();
            let right = self.parse_unary()?;
            left = Expr::Binary(Box::new(left), op, Box::new(right));
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr> {
        if let Some(Token::Minus) = self.peek() {
            self.consume();
            let expr = self.parse_unary()?;
            return Ok(Expr::Unary('-', Box::new(expr)));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        match self.consume() {
            Some(Token::Number(n)) => Ok(Expr::Number(n)),
            Some(Token::Identifier(name)) => {
                if let Some(Token::LParen) = self.peek() {
                    self.consume(); // eat '('
                    let func = name
                        .strip_prefix(MATH_PREFIX)
                        .ok_or_else(|| anyhow!("call to `{name}` outside the Math namespace"))?
                        .to_string();
                    let mut args = vec![self.parse_expression()?];
                    while let Some(Token::Comma) = self.peek() {
                        self.consume();
                        args.push(self.parse_expression()?);
                    }
                    self.expect_rparen()?;
                    Ok(Expr::Call(func, args))
                } else if name.contains('.') {
                    bail!("unknown identifier `{name}`")
                } else {
                    Ok(Expr::Variable(name))
                }
            }
            Some(Token::LParen) => {
                let expr = self.parse_expression()?;
                self.expect_rparen()?;
                Ok(expr)
            }
            Some(token) => bail!("unexpected token {token:?}"),
            None => bail!("unexpected end of expression"),
        }
    }
}

// --- Formula ---

/// A lime-requirement equation compiled once over `[BpH, WpH]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Formula {
    source: String,
    bytecode: Bytecode,
}

impl Formula {
    pub fn compile(source: &str) -> CalcResult<Self> {
        let unsafe_expression = |err: anyhow::Error| CalcError::UnsafeExpression {
            expression: source.to_string(),
            reason: err.to_string(),
        };
        let expr = parse(source).map_err(unsafe_expression)?;
        let bytecode = Compiler::new(&SOIL_VARIABLES)
            .compile(&expr)
            .map_err(unsafe_expression)?;
        Ok(Self {
            source: source.to_string(),
            bytecode,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn evaluate(&self, buffer_ph: f64, soil_ph: f64) -> CalcResult<f64> {
        let mut stack = Vec::with_capacity(16);
        let value = VM::execute(&self.bytecode, &[buffer_ph, soil_ph], &mut stack);
        if value.is_finite() {
            Ok(value)
        } else {
            Err(CalcError::NonFiniteResult {
                expression: self.source.clone(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(source: &str, bph: f64, wph: f64) -> CalcResult<f64> {
        Formula::compile(source)?.evaluate(bph, wph)
    }

    fn assert_unsafe(source: &str) {
        match Formula::compile(source) {
            Err(CalcError::UnsafeExpression { expression, .. }) => assert_eq!(expression, source),
            other => panic!("expected UnsafeExpression for `{source}`, got {other:?}"),
        }
    }

    #[test]
    fn respects_operator_precedence() {
        assert_eq!(eval("1 + 2 * 3", 0.0, 0.0).unwrap(), 7.0);
        assert_eq!(eval("(1 + 2) * 3", 0.0, 0.0).unwrap(), 9.0);
        assert_eq!(eval("8 / 4 / 2", 0.0, 0.0).unwrap(), 1.0);
        assert_eq!(eval("10 - 4 - 3", 0.0, 0.0).unwrap(), 3.0);
        assert_eq!(eval("-2 * -3", 0.0, 0.0).unwrap(), 6.0);
    }

    #[test]
    fn substitutes_buffer_and_water_ph() {
        let value = eval("(36.1 - (3.29 * BpH) - (2.67 * WpH))", 6.4, 5.7).unwrap();
        let expected = 36.1 - 3.29 * 6.4 - 2.67 * 5.7;
        assert!((value - expected).abs() < 1e-12);
    }

    #[test]
    fn evaluates_math_namespace_calls() {
        assert_eq!(eval("Math.max(1, BpH, 3)", 7.0, 0.0).unwrap(), 7.0);
        assert_eq!(eval("Math.min(WpH, 2)", 0.0, 5.0).unwrap(), 2.0);
        assert_eq!(eval("Math.pow(2, 3)", 0.0, 0.0).unwrap(), 8.0);
        assert_eq!(eval("Math.abs(-4.5)", 0.0, 0.0).unwrap(), 4.5);
        assert_eq!(eval("Math.round(2.5)", 0.0, 0.0).unwrap(), 3.0);
        assert_eq!(eval("Math.round(-2.5)", 0.0, 0.0).unwrap(), -2.0);
    }

    #[test]
    fn rejects_tokens_outside_the_grammar() {
        assert_unsafe("BpH; alert(1)");
        assert_unsafe("window.location");
        assert_unsafe("x + 1");
        assert_unsafe("Math.random2(1)");
        assert_unsafe("eval(1)");
        assert_unsafe("1 2");
        assert_unsafe("1.2.3 + BpH");
        assert_unsafe("(1 + 2");
        assert_unsafe("Math.pow(2)");
        assert_unsafe("2 ^ 3");
        assert_unsafe("");
    }

    #[test]
    fn non_finite_results_are_errors() {
        assert!(matches!(
            eval("1 / (BpH - 6)", 6.0, 0.0),
            Err(CalcError::NonFiniteResult { .. })
        ));
        assert!(matches!(
            eval("Math.sqrt(WpH - 7)", 0.0, 5.0),
            Err(CalcError::NonFiniteResult { .. })
        ));
    }

    #[test]
    fn vm_returns_nan_for_unbalanced_programs() {
        let mut stack = Vec::new();
        let underflow = Bytecode {
            ops: vec![OpCode::LoadConst(1.0), OpCode::Add],
        };
        assert!(VM::execute(&underflow, &[], &mut stack).is_nan());

        let leftover = Bytecode {
            ops: vec![OpCode::LoadConst(1.0), OpCode::LoadConst(2.0)],
        };
        assert!(VM::execute(&leftover, &[], &mut stack).is_nan());
    }
}
