//! Declarative predicates for filtering sequence sources in spec files.
//!
//! ```text
//! @.active == true && length(@.tags) > 0
//! lower(@.role) != 'guest' || !@.banned
//! ```

use std::cmp::Ordering;

use serde_json::Value;

use crate::comparison::compare;
use crate::parser::{ParseError, Parser};
use crate::path::{self, Segment};

#[derive(Debug, Clone, PartialEq)]
pub enum FilterExpr {
    Compare(Operand, CmpOp, Operand),
    And(Box<FilterExpr>, Box<FilterExpr>),
    Or(Box<FilterExpr>, Box<FilterExpr>),
    Not(Box<FilterExpr>),
    Truthy(Operand),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Current(Vec<Segment>), // @, @.a['b'][0]
    Literal(Value),        // "abc", 123, true/false/null
    Lower(Box<Operand>),
    Upper(Box<Operand>),
    Length(Box<Operand>),
}

/// Parse a complete filter expression; trailing input is an error.
pub fn parse_filter(input: &str) -> Result<FilterExpr, ParseError> {
    let mut parser = Parser::new(input);
    let expr = parse_or(&mut parser)?;
    parser.skip_ws();
    if !parser.eof() {
        return Err(ParseError::InvalidSyntax("trailing input".into()));
    }
    Ok(expr)
}

fn parse_or(parser: &mut Parser) -> Result<FilterExpr, ParseError> {
    let mut left = parse_and(parser)?;
    loop {
        parser.skip_ws();
        if parser.consume_str("||") {
            let right = parse_and(parser)?;
            left = FilterExpr::Or(Box::new(left), Box::new(right));
        } else {
            break;
        }
    }
    Ok(left)
}

fn parse_and(parser: &mut Parser) -> Result<FilterExpr, ParseError> {
    let mut left = parse_not(parser)?;
    loop {
        parser.skip_ws();
        if parser.consume_str("&&") {
            let right = parse_not(parser)?;
            left = FilterExpr::And(Box::new(left), Box::new(right));
        } else {
            break;
        }
    }
    Ok(left)
}

fn parse_not(parser: &mut Parser) -> Result<FilterExpr, ParseError> {
    parser.skip_ws();
    if !parser.peek_str("!=") && parser.consume_char('!') {
        let inner = parse_not(parser)?;
        Ok(FilterExpr::Not(Box::new(inner)))
    } else {
        parse_compare(parser)
    }
}

fn parse_compare(parser: &mut Parser) -> Result<FilterExpr, ParseError> {
    parser.skip_ws();
    if parser.consume_char('(') {
        let inner = parse_or(parser)?;
        parser.skip_ws();
        parser.expect(')')?;
        return Ok(inner);
    }
    let left = parse_operand(parser)?;
    parser.skip_ws();
    // two-character operators first so `<=` is not read as `<`
    let op = [
        ("==", CmpOp::Eq),
        ("!=", CmpOp::Ne),
        ("<=", CmpOp::Lte),
        (">=", CmpOp::Gte),
        ("<", CmpOp::Lt),
        (">", CmpOp::Gt),
    ]
    .into_iter()
    .find_map(|(lit, op)| parser.consume_str(lit).then_some(op));

    match op {
        Some(op) => {
            let right = parse_operand(parser)?;
            Ok(FilterExpr::Compare(left, op, right))
        }
        None => Ok(FilterExpr::Truthy(left)),
    }
}

fn parse_operand(parser: &mut Parser) -> Result<Operand, ParseError> {
    parser.skip_ws();
    if parser.peek_char() == Some('"') || parser.peek_char() == Some('\'') {
        return Ok(Operand::Literal(Value::String(parser.parse_quoted_string()?)));
    }
    for (lit, value) in [("true", Value::Bool(true)), ("false", Value::Bool(false)), ("null", Value::Null)] {
        if parser.consume_str(lit) {
            return Ok(Operand::Literal(value));
        }
    }
    let calls: [(&str, fn(Box<Operand>) -> Operand); 3] = [
        ("lower(", Operand::Lower),
        ("upper(", Operand::Upper),
        ("length(", Operand::Length),
    ];
    for (name, wrap) in calls {
        if parser.consume_str(name) {
            let inner = parse_operand(parser)?;
            parser.skip_ws();
            parser.expect(')')?;
            return Ok(wrap(Box::new(inner)));
        }
    }
    if parser.consume_char('@') {
        return Ok(Operand::Current(parse_current_path(parser)?));
    }
    if parser
        .peek_char()
        .map(|c| c == '-' || c.is_ascii_digit())
        .unwrap_or(false)
    {
        return Ok(Operand::Literal(parser.parse_number_literal()?));
    }
    Err(ParseError::InvalidSyntax("invalid operand".into()))
}

fn parse_current_path(parser: &mut Parser) -> Result<Vec<Segment>, ParseError> {
    let mut segments = Vec::new();
    loop {
        if parser.consume_char('.') {
            let key = parser.parse_identifier()?;
            segments.extend(path::parse_path(&key)?);
        } else if parser.consume_char('[') {
            parser.skip_ws();
            if parser.peek_char() == Some('"') || parser.peek_char() == Some('\'') {
                segments.push(Segment::Key(parser.parse_quoted_string()?));
                parser.skip_ws();
            } else {
                let inner = parser.capture_until(']')?;
                segments.extend(path::parse_path(inner.trim())?);
            }
            parser.expect(']')?;
        } else {
            break;
        }
    }
    Ok(segments)
}

pub fn eval_filter(expr: &FilterExpr, current: &Value) -> bool {
    match expr {
        FilterExpr::Compare(a, op, b) => {
            let ord = compare(&eval_operand(a, current), &eval_operand(b, current));
            match op {
                CmpOp::Eq => ord == Ordering::Equal,
                CmpOp::Ne => ord != Ordering::Equal,
                CmpOp::Lt => ord == Ordering::Less,
                CmpOp::Lte => ord != Ordering::Greater,
                CmpOp::Gt => ord == Ordering::Greater,
                CmpOp::Gte => ord != Ordering::Less,
            }
        }
        FilterExpr::And(l, r) => eval_filter(l, current) && eval_filter(r, current),
        FilterExpr::Or(l, r) => eval_filter(l, current) || eval_filter(r, current),
        FilterExpr::Not(i) => !eval_filter(i, current),
        FilterExpr::Truthy(op) => truthy(&eval_operand(op, current)),
    }
}

pub(crate) fn truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

fn eval_operand(op: &Operand, current: &Value) -> Value {
    match op {
        Operand::Literal(v) => v.clone(),
        Operand::Lower(inner) => match eval_operand(inner, current) {
            Value::String(s) => Value::String(s.to_lowercase()),
            other => other,
        },
        Operand::Upper(inner) => match eval_operand(inner, current) {
            Value::String(s) => Value::String(s.to_uppercase()),
            other => other,
        },
        Operand::Length(inner) => {
            let len = match eval_operand(inner, current) {
                Value::Array(a) => a.len(),
                Value::Object(m) => m.len(),
                Value::String(s) => s.chars().count(),
                _ => 0,
            };
            Value::from(len)
        }
        Operand::Current(segments) => path::get_segments(current, segments)
            .cloned()
            .unwrap_or(Value::Null),
    }
}
