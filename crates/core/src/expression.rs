//! Expression compiler: infix text -> postfix tokens -> chain of binary tasks.
//!
//! Compilation is a pure function. The input is first normalized (whitespace
//! removed) and validated against the accepted character set and the
//! forbidden operator adjacencies, then tokenized, reordered with the
//! shunting-yard algorithm, and finally evaluated on a value stack. Every
//! operator consumed during that evaluation becomes one [`ChainTask`] whose
//! operands are literals or results already computed at compile time.
//!
//! The value produced here only proves that the expression reduces to a
//! single number. The result reported to users is the one the workers
//! produce by recomputing the chain.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::CoreError;
use crate::operator::Operator;

/// Digits, the four operators and parentheses. Nothing else.
static CHARSET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[-+*/()0-9]+$").expect("valid regex"));

/// Adjacent-symbol sequences that can never form a valid expression:
/// two operators in a row, an operator before `)`, an operator other than
/// `-` after `(`, empty parentheses, a trailing operator, and a leading
/// `+`, `*` or `/`.
static FORBIDDEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[-+*/]{2,}|[-+*/]\)|\([+*/]|\(\)|[-+*/]$|^[+*/]").expect("valid regex")
});

/// One lexical element of a normalized expression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Token {
    /// A numeral, with any unary minus already folded in.
    Number(f64),
    Op(Operator),
    LParen,
    RParen,
}

/// One atomic operation of a compiled chain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChainTask {
    /// 1-based position in the chain.
    pub task_id: i64,
    pub operator: Operator,
    pub arg1: f64,
    pub arg2: f64,
}

impl ChainTask {
    pub fn evaluate(&self) -> f64 {
        self.operator.apply(self.arg1, self.arg2)
    }
}

/// Output of [`compile`].
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledChain {
    /// The expression text with whitespace removed, as persisted.
    pub normalized: String,
    /// Tasks in execution order. Never empty.
    pub tasks: Vec<ChainTask>,
    /// Validation-time value of the whole expression.
    pub value: f64,
}

/// Remove all whitespace from submitted text.
pub fn normalize(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Check the character set, parenthesis balance and operator adjacency of a
/// normalized expression.
pub fn validate(expr: &str) -> Result<(), CoreError> {
    if expr.is_empty() {
        return Err(invalid("expression is empty"));
    }
    if !CHARSET_RE.is_match(expr) {
        return Err(invalid("expression contains characters other than digits, operators and parentheses"));
    }

    let mut depth = 0usize;
    for c in expr.chars() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| invalid("unbalanced parentheses"))?;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(invalid("unbalanced parentheses"));
    }

    if let Some(m) = FORBIDDEN_RE.find(expr) {
        return Err(invalid(&format!("invalid symbol sequence {:?}", m.as_str())));
    }

    Ok(())
}

/// Split a normalized expression into tokens.
///
/// A `-` is unary, and becomes part of the following numeral, when it starts
/// the expression, follows `(`, or follows another operator.
pub fn tokenize(expr: &str) -> Result<Vec<Token>, CoreError> {
    let mut tokens = Vec::new();
    let mut numeral = String::new();
    let mut prev: Option<char> = None;

    for c in expr.chars() {
        match c {
            '0'..='9' => numeral.push(c),
            '-' if starts_operand(prev) => numeral.push(c),
            '+' | '-' | '*' | '/' | '(' | ')' => {
                flush_numeral(&mut numeral, &mut tokens)?;
                tokens.push(match c {
                    '(' => Token::LParen,
                    ')' => Token::RParen,
                    _ => Token::Op(Operator::from_char(c).ok_or_else(|| invalid("unknown operator"))?),
                });
            }
            other => return Err(invalid(&format!("invalid symbol {other:?}"))),
        }
        prev = Some(c);
    }
    flush_numeral(&mut numeral, &mut tokens)?;

    Ok(tokens)
}

fn starts_operand(prev: Option<char>) -> bool {
    match prev {
        None | Some('(') => true,
        Some(c) => Operator::from_char(c).is_some(),
    }
}

fn flush_numeral(numeral: &mut String, tokens: &mut Vec<Token>) -> Result<(), CoreError> {
    if numeral.is_empty() {
        return Ok(());
    }
    let value: f64 = numeral
        .parse()
        .map_err(|_| invalid(&format!("malformed number {numeral:?}")))?;
    if !value.is_finite() {
        return Err(invalid("number is out of range"));
    }
    tokens.push(Token::Number(value));
    numeral.clear();
    Ok(())
}

/// Reorder infix tokens into postfix order (shunting-yard).
pub fn to_postfix(tokens: &[Token]) -> Result<Vec<Token>, CoreError> {
    let mut output = Vec::with_capacity(tokens.len());
    let mut stack: Vec<Token> = Vec::new();

    for &token in tokens {
        match token {
            Token::Number(_) => output.push(token),
            Token::Op(op) => {
                while let Some(&Token::Op(top)) = stack.last() {
                    if top.precedence() < op.precedence() {
                        break;
                    }
                    output.push(Token::Op(top));
                    stack.pop();
                }
                stack.push(token);
            }
            Token::LParen => stack.push(token),
            Token::RParen => loop {
                match stack.pop() {
                    Some(Token::LParen) => break,
                    Some(top) => output.push(top),
                    None => return Err(invalid("unbalanced parentheses")),
                }
            },
        }
    }

    while let Some(top) = stack.pop() {
        if matches!(top, Token::LParen | Token::RParen) {
            return Err(invalid("unbalanced parentheses"));
        }
        output.push(top);
    }

    Ok(output)
}

/// Compile submitted text into a chain of tasks.
pub fn compile(text: &str) -> Result<CompiledChain, CoreError> {
    let normalized = normalize(text);
    validate(&normalized)?;
    let postfix = to_postfix(&tokenize(&normalized)?)?;

    let mut stack: Vec<f64> = Vec::new();
    let mut tasks = Vec::new();

    for token in postfix {
        match token {
            Token::Number(n) => stack.push(n),
            Token::Op(operator) => {
                let (arg2, arg1) = match (stack.pop(), stack.pop()) {
                    (Some(arg2), Some(arg1)) => (arg2, arg1),
                    _ => return Err(invalid("operator is missing an operand")),
                };
                if operator == Operator::Divide && arg2 == 0.0 {
                    return Err(invalid("division by zero"));
                }
                let task = ChainTask {
                    task_id: tasks.len() as i64 + 1,
                    operator,
                    arg1,
                    arg2,
                };
                let value = task.evaluate();
                if !value.is_finite() {
                    return Err(invalid("intermediate result is out of range"));
                }
                stack.push(value);
                tasks.push(task);
            }
            Token::LParen | Token::RParen => return Err(invalid("unbalanced parentheses")),
        }
    }

    let value = match stack.as_slice() {
        [value] => *value,
        _ => return Err(invalid("expression does not reduce to a single value")),
    };
    if tasks.is_empty() {
        return Err(invalid("expression contains no operations"));
    }

    Ok(CompiledChain {
        normalized,
        tasks,
        value,
    })
}

/// Recompute a chain task by task, the way the worker pool does, and return
/// the result of the final task.
pub fn replay(tasks: &[ChainTask]) -> Option<f64> {
    tasks.iter().map(ChainTask::evaluate).last()
}

fn invalid(reason: &str) -> CoreError {
    CoreError::InvalidExpression(reason.to_string())
}
