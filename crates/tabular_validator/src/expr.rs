//! Restricted expression evaluation for row constraints.
//!
//! The evaluator supports exactly the subset a row constraint needs:
//! literals, the row's own named values, arithmetic, comparisons, boolean
//! operators, and list membership. There is no access to the surrounding
//! environment, no function calls, and no assignment.
//!
//! Grammar (by precedence, loosest first):
//!
//! ```text
//! or        = and ("or" and)*
//! and       = not ("and" not)*
//! not       = "not" not | comparison
//! compare   = additive (("=="|"!="|"<"|"<="|">"|">="|"in") additive)?
//! additive  = term (("+"|"-") term)*
//! term      = unary (("*"|"/"|"%") unary)*
//! unary     = "-" unary | primary
//! primary   = number | string | "true" | "false" | "null" | identifier
//!           | "(" or ")" | "[" (or ("," or)*)? "]"
//! ```

use tabular_core::CellValue;
use thiserror::Error;

/// Errors from parsing or evaluating a constraint expression.
#[derive(Debug, Error)]
pub enum ExprError {
    /// The expression text is not valid
    #[error("parse error: {0}")]
    Parse(String),

    /// The expression could not be evaluated against the row
    #[error("evaluation error: {0}")]
    Eval(String),
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Integer(i64),
    Number(f64),
    Text(String),
    Ident(String),
    True,
    False,
    Null,
    And,
    Or,
    Not,
    In,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    In,
}

#[derive(Debug, Clone)]
enum Expr {
    Literal(CellValue),
    Ident(String),
    List(Vec<Expr>),
    Neg(Box<Expr>),
    Not(Box<Expr>),
    Binary(BinOp, Box<Expr>, Box<Expr>),
}

/// A parsed row-constraint expression.
#[derive(Debug, Clone)]
pub struct Expression {
    root: Expr,
}

impl Expression {
    /// Parses an expression from text.
    pub fn parse(text: &str) -> Result<Self, ExprError> {
        let tokens = tokenize(text)?;
        let mut parser = Parser { tokens, cursor: 0 };
        let root = parser.parse_or()?;
        if parser.cursor != parser.tokens.len() {
            return Err(ExprError::Parse("unexpected trailing input".to_string()));
        }
        Ok(Self { root })
    }

    /// Evaluates the expression; identifiers resolve through `lookup`.
    pub fn evaluate(
        &self,
        lookup: &dyn Fn(&str) -> Option<CellValue>,
    ) -> Result<CellValue, ExprError> {
        eval(&self.root, lookup)
    }

    /// Evaluates the expression and reduces the result to truthiness.
    pub fn evaluate_bool(
        &self,
        lookup: &dyn Fn(&str) -> Option<CellValue>,
    ) -> Result<bool, ExprError> {
        Ok(truthy(&self.evaluate(lookup)?))
    }
}

fn tokenize(text: &str) -> Result<Vec<Token>, ExprError> {
    let mut tokens = Vec::new();
    let mut chars = text.chars().peekable();
    while let Some(&ch) = chars.peek() {
        match ch {
            ' ' | '\t' | '\n' | '\r' => {
                chars.next();
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            '[' => {
                chars.next();
                tokens.push(Token::LBracket);
            }
            ']' => {
                chars.next();
                tokens.push(Token::RBracket);
            }
            ',' => {
                chars.next();
                tokens.push(Token::Comma);
            }
            '+' => {
                chars.next();
                tokens.push(Token::Plus);
            }
            '-' => {
                chars.next();
                tokens.push(Token::Minus);
            }
            '*' => {
                chars.next();
                tokens.push(Token::Star);
            }
            '/' => {
                chars.next();
                tokens.push(Token::Slash);
            }
            '%' => {
                chars.next();
                tokens.push(Token::Percent);
            }
            '=' => {
                chars.next();
                if chars.next_if_eq(&'=').is_none() {
                    return Err(ExprError::Parse("expected \"==\"".to_string()));
                }
                tokens.push(Token::Eq);
            }
            '!' => {
                chars.next();
                if chars.next_if_eq(&'=').is_none() {
                    return Err(ExprError::Parse("expected \"!=\"".to_string()));
                }
                tokens.push(Token::Ne);
            }
            '<' => {
                chars.next();
                if chars.next_if_eq(&'=').is_some() {
                    tokens.push(Token::Le);
                } else {
                    tokens.push(Token::Lt);
                }
            }
            '>' => {
                chars.next();
                if chars.next_if_eq(&'=').is_some() {
                    tokens.push(Token::Ge);
                } else {
                    tokens.push(Token::Gt);
                }
            }
            '\'' | '"' => {
                let quote = ch;
                chars.next();
                let mut value = String::new();
                let mut closed = false;
                while let Some(inner) = chars.next() {
                    if inner == quote {
                        closed = true;
                        break;
                    }
                    if inner == '\\' {
                        match chars.next() {
                            Some(escaped) => value.push(escaped),
                            None => break,
                        }
                        continue;
                    }
                    value.push(inner);
                }
                if !closed {
                    return Err(ExprError::Parse("unterminated string".to_string()));
                }
                tokens.push(Token::Text(value));
            }
            '0'..='9' | '.' => {
                let mut literal = String::new();
                while let Some(&digit) = chars.peek() {
                    if digit.is_ascii_digit() || digit == '.' {
                        literal.push(digit);
                        chars.next();
                    } else {
                        break;
                    }
                }
                if literal.contains('.') {
                    let number = literal
                        .parse::<f64>()
                        .map_err(|_| ExprError::Parse(format!("bad number \"{}\"", literal)))?;
                    tokens.push(Token::Number(number));
                } else {
                    let integer = literal
                        .parse::<i64>()
                        .map_err(|_| ExprError::Parse(format!("bad number \"{}\"", literal)))?;
                    tokens.push(Token::Integer(integer));
                }
            }
            _ if ch.is_alphabetic() || ch == '_' => {
                let mut word = String::new();
                while let Some(&letter) = chars.peek() {
                    if letter.is_alphanumeric() || letter == '_' {
                        word.push(letter);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(match word.as_str() {
                    "and" => Token::And,
                    "or" => Token::Or,
                    "not" => Token::Not,
                    "in" => Token::In,
                    "true" => Token::True,
                    "false" => Token::False,
                    "null" => Token::Null,
                    _ => Token::Ident(word),
                });
            }
            other => {
                return Err(ExprError::Parse(format!("unexpected character \"{}\"", other)));
            }
        }
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    cursor: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.cursor)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.cursor).cloned();
        if token.is_some() {
            self.cursor += 1;
        }
        token
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.cursor += 1;
            true
        } else {
            false
        }
    }

    fn parse_or(&mut self) -> Result<Expr, ExprError> {
        let mut left = self.parse_and()?;
        while self.eat(&Token::Or) {
            let right = self.parse_and()?;
            left = Expr::Binary(BinOp::Or, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, ExprError> {
        let mut left = self.parse_not()?;
        while self.eat(&Token::And) {
            let right = self.parse_not()?;
            left = Expr::Binary(BinOp::And, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_not(&mut self) -> Result<Expr, ExprError> {
        if self.eat(&Token::Not) {
            let inner = self.parse_not()?;
            return Ok(Expr::Not(Box::new(inner)));
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Expr, ExprError> {
        let left = self.parse_additive()?;
        let op = match self.peek() {
            Some(Token::Eq) => BinOp::Eq,
            Some(Token::Ne) => BinOp::Ne,
            Some(Token::Lt) => BinOp::Lt,
            Some(Token::Le) => BinOp::Le,
            Some(Token::Gt) => BinOp::Gt,
            Some(Token::Ge) => BinOp::Ge,
            Some(Token::In) => BinOp::In,
            _ => return Ok(left),
        };
        self.cursor += 1;
        let right = self.parse_additive()?;
        Ok(Expr::Binary(op, Box::new(left), Box::new(right)))
    }

    fn parse_additive(&mut self) -> Result<Expr, ExprError> {
        let mut left = self.parse_term()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinOp::Add,
                Some(Token::Minus) => BinOp::Sub,
                _ => break,
            };
            self.cursor += 1;
            let right = self.parse_term()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_term(&mut self) -> Result<Expr, ExprError> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinOp::Mul,
                Some(Token::Slash) => BinOp::Div,
                Some(Token::Percent) => BinOp::Mod,
                _ => break,
            };
            self.cursor += 1;
            let right = self.parse_unary()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, ExprError> {
        if self.eat(&Token::Minus) {
            let inner = self.parse_unary()?;
            return Ok(Expr::Neg(Box::new(inner)));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expr, ExprError> {
        match self.advance() {
            Some(Token::Integer(i)) => Ok(Expr::Literal(CellValue::Integer(i))),
            Some(Token::Number(n)) => Ok(Expr::Literal(CellValue::Number(n))),
            Some(Token::Text(s)) => Ok(Expr::Literal(CellValue::String(s))),
            Some(Token::True) => Ok(Expr::Literal(CellValue::Boolean(true))),
            Some(Token::False) => Ok(Expr::Literal(CellValue::Boolean(false))),
            Some(Token::Null) => Ok(Expr::Literal(CellValue::Null)),
            Some(Token::Ident(name)) => Ok(Expr::Ident(name)),
            Some(Token::LParen) => {
                let inner = self.parse_or()?;
                if !self.eat(&Token::RParen) {
                    return Err(ExprError::Parse("expected \")\"".to_string()));
                }
                Ok(inner)
            }
            Some(Token::LBracket) => {
                let mut items = Vec::new();
                if !self.eat(&Token::RBracket) {
                    loop {
                        items.push(self.parse_or()?);
                        if self.eat(&Token::Comma) {
                            continue;
                        }
                        if self.eat(&Token::RBracket) {
                            break;
                        }
                        return Err(ExprError::Parse("expected \",\" or \"]\"".to_string()));
                    }
                }
                Ok(Expr::List(items))
            }
            other => Err(ExprError::Parse(format!("unexpected token: {:?}", other))),
        }
    }
}

fn truthy(value: &CellValue) -> bool {
    match value {
        CellValue::Null => false,
        CellValue::Boolean(b) => *b,
        CellValue::Integer(i) => *i != 0,
        CellValue::Number(n) => *n != 0.0,
        CellValue::String(s) => !s.is_empty(),
        CellValue::Date(_) | CellValue::Datetime(_) => true,
    }
}

fn loose_eq(left: &CellValue, right: &CellValue) -> bool {
    match (left.as_number(), right.as_number()) {
        (Some(a), Some(b)) => a == b,
        _ => left == right,
    }
}

fn eval(
    expr: &Expr,
    lookup: &dyn Fn(&str) -> Option<CellValue>,
) -> Result<CellValue, ExprError> {
    match expr {
        Expr::Literal(value) => Ok(value.clone()),
        Expr::Ident(name) => {
            lookup(name).ok_or_else(|| ExprError::Eval(format!("unknown name \"{}\"", name)))
        }
        Expr::List(_) => Err(ExprError::Eval(
            "a list is only usable on the right side of \"in\"".to_string(),
        )),
        Expr::Neg(inner) => match eval(inner, lookup)? {
            CellValue::Integer(i) => Ok(CellValue::Integer(-i)),
            CellValue::Number(n) => Ok(CellValue::Number(-n)),
            other => Err(ExprError::Eval(format!(
                "cannot negate a {}",
                other.type_name()
            ))),
        },
        Expr::Not(inner) => Ok(CellValue::Boolean(!truthy(&eval(inner, lookup)?))),
        Expr::Binary(BinOp::And, left, right) => {
            if !truthy(&eval(left, lookup)?) {
                return Ok(CellValue::Boolean(false));
            }
            Ok(CellValue::Boolean(truthy(&eval(right, lookup)?)))
        }
        Expr::Binary(BinOp::Or, left, right) => {
            if truthy(&eval(left, lookup)?) {
                return Ok(CellValue::Boolean(true));
            }
            Ok(CellValue::Boolean(truthy(&eval(right, lookup)?)))
        }
        Expr::Binary(BinOp::In, left, right) => {
            let needle = eval(left, lookup)?;
            let Expr::List(items) = right.as_ref() else {
                return Err(ExprError::Eval(
                    "the right side of \"in\" must be a list".to_string(),
                ));
            };
            for item in items {
                if loose_eq(&needle, &eval(item, lookup)?) {
                    return Ok(CellValue::Boolean(true));
                }
            }
            Ok(CellValue::Boolean(false))
        }
        Expr::Binary(op, left, right) => {
            let left = eval(left, lookup)?;
            let right = eval(right, lookup)?;
            apply_binary(*op, &left, &right)
        }
    }
}

fn apply_binary(op: BinOp, left: &CellValue, right: &CellValue) -> Result<CellValue, ExprError> {
    match op {
        BinOp::Eq => Ok(CellValue::Boolean(loose_eq(left, right))),
        BinOp::Ne => Ok(CellValue::Boolean(!loose_eq(left, right))),
        BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => {
            let ordering = compare(left, right)?;
            let result = match op {
                BinOp::Lt => ordering.is_lt(),
                BinOp::Le => ordering.is_le(),
                BinOp::Gt => ordering.is_gt(),
                _ => ordering.is_ge(),
            };
            Ok(CellValue::Boolean(result))
        }
        BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Mod => arithmetic(op, left, right),
        BinOp::Div => {
            let (a, b) = numeric_pair(left, right)?;
            if b == 0.0 {
                return Err(ExprError::Eval("division by zero".to_string()));
            }
            Ok(CellValue::Number(a / b))
        }
        BinOp::And | BinOp::Or | BinOp::In => unreachable!("handled by eval"),
    }
}

fn arithmetic(op: BinOp, left: &CellValue, right: &CellValue) -> Result<CellValue, ExprError> {
    if let (CellValue::Integer(a), CellValue::Integer(b)) = (left, right) {
        let result = match op {
            BinOp::Add => a.checked_add(*b),
            BinOp::Sub => a.checked_sub(*b),
            BinOp::Mul => a.checked_mul(*b),
            BinOp::Mod => {
                if *b == 0 {
                    return Err(ExprError::Eval("modulo by zero".to_string()));
                }
                a.checked_rem(*b)
            }
            _ => unreachable!(),
        };
        return result
            .map(CellValue::Integer)
            .ok_or_else(|| ExprError::Eval("integer overflow".to_string()));
    }
    let (a, b) = numeric_pair(left, right)?;
    let result = match op {
        BinOp::Add => a + b,
        BinOp::Sub => a - b,
        BinOp::Mul => a * b,
        BinOp::Mod => {
            if b == 0.0 {
                return Err(ExprError::Eval("modulo by zero".to_string()));
            }
            a % b
        }
        _ => unreachable!(),
    };
    Ok(CellValue::Number(result))
}

fn numeric_pair(left: &CellValue, right: &CellValue) -> Result<(f64, f64), ExprError> {
    match (left.as_number(), right.as_number()) {
        (Some(a), Some(b)) => Ok((a, b)),
        _ => Err(ExprError::Eval(format!(
            "cannot use {} and {} as numbers",
            left.type_name(),
            right.type_name()
        ))),
    }
}

fn compare(left: &CellValue, right: &CellValue) -> Result<std::cmp::Ordering, ExprError> {
    if let (Some(a), Some(b)) = (left.as_number(), right.as_number()) {
        return a
            .partial_cmp(&b)
            .ok_or_else(|| ExprError::Eval("numbers are not comparable".to_string()));
    }
    if let (CellValue::String(a), CellValue::String(b)) = (left, right) {
        return Ok(a.cmp(b));
    }
    Err(ExprError::Eval(format!(
        "cannot compare {} and {}",
        left.type_name(),
        right.type_name()
    )))
}
