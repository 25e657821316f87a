//! Basic calculator: infix arithmetic with `+ - × ÷ %`.
//!
//! Percentages are context sensitive: `200+10%` is 200 plus ten percent of
//! 200, while `50×10%` multiplies by one tenth.

use super::format::{format_number, round_significant};
use super::history::History;
use super::token::{Expression, Operator, Paren, Token};
use crate::config::{CalculatorConfig, ErrorPolicy};
use crate::error::{CalcError, CalcResult, ERROR_SENTINEL};
use tracing::debug;

/// Significant digits kept in basic calculator results
pub const SIGNIFICANT_DIGITS: usize = 10;

/// Evaluate a typed expression and return the formatted result
pub fn evaluate(expression: &str) -> CalcResult<String> {
    let expression = expression.trim();
    if expression.is_empty() {
        return Err(CalcError::Evaluation("empty expression".to_string()));
    }
    let parsed = Expression::parse(expression)?;
    evaluate_tokens(parsed.tokens())
}

/// Evaluate an already tokenized expression
pub fn evaluate_tokens(tokens: &[Token]) -> CalcResult<String> {
    evaluate_value(tokens).map(format_result)
}

/// Format a result for display
/// Rounds to 10 significant digits and drops trailing zeros (e.g., 0.1+0.2 -> "0.3")
pub fn format_result(value: f64) -> String {
    format_number(round_significant(value, SIGNIFICANT_DIGITS))
}

fn evaluate_value(tokens: &[Token]) -> CalcResult<f64> {
    if tokens.is_empty() {
        return Err(CalcError::Evaluation("empty expression".to_string()));
    }
    if let Some(token) = tokens.iter().find(|t| {
        matches!(
            t,
            Token::Function(_)
                | Token::Constant(_)
                | Token::Square
                | Token::Operator(Operator::Power)
        )
    }) {
        return Err(CalcError::Evaluation(format!(
            "{:?} is not available on the basic calculator",
            token
        )));
    }

    let resolved = Expression::from_tokens(apply_percentages(tokens)?);
    let source = resolved.to_eval_string();

    match meval::eval_str(&source) {
        Ok(result) if result.is_finite() => Ok(result),
        Ok(result) => {
            debug!("Calculator: '{}' produced non-finite {}", source, result);
            Err(CalcError::Evaluation(format!("'{}' is not finite", source)))
        }
        Err(e) => {
            debug!("Calculator error for '{}': {}", source, e);
            Err(CalcError::Evaluation(e.to_string()))
        }
    }
}

/// Replace every `N%` with a plain number.
///
/// After `+` or `-` with a numeric operand `M` before it, `N%` becomes
/// `M*N/100`; everywhere else it becomes `N/100`.
fn apply_percentages(tokens: &[Token]) -> CalcResult<Vec<Token>> {
    let mut out: Vec<Token> = Vec::with_capacity(tokens.len());

    for token in tokens {
        if *token != Token::Percent {
            out.push(token.clone());
            continue;
        }

        let percent = match out.pop() {
            Some(Token::Number(n)) => parse_literal(&n)?,
            _ => {
                return Err(CalcError::Evaluation(
                    "'%' must follow a number".to_string(),
                ))
            }
        };
        let fraction = percent / 100.0;

        let base = match out.as_slice() {
            [.., Token::Number(m), Token::Operator(op)] if op.is_additive() => {
                Some(parse_literal(m)?)
            }
            _ => None,
        };

        let value = match base {
            Some(m) => m * fraction,
            None => fraction,
        };
        out.push(Token::Number(format!("{}", value)));
    }

    Ok(out)
}

fn parse_literal(literal: &str) -> CalcResult<f64> {
    let normalized = literal.strip_suffix('.').unwrap_or(literal);
    normalized
        .parse()
        .map_err(|_| CalcError::Evaluation(format!("'{}' is not a number", literal)))
}

/// Basic calculator state: expression buffer, memory register and history
#[derive(Debug, Clone)]
pub struct Calculator {
    expression: Expression,
    error: bool,
    memory: Option<f64>,
    history: History,
    on_error: ErrorPolicy,
}

impl Default for Calculator {
    fn default() -> Self {
        Self::new(&CalculatorConfig::default())
    }
}

impl Calculator {
    pub fn new(config: &CalculatorConfig) -> Self {
        Self {
            expression: Expression::new(),
            error: false,
            memory: None,
            history: History::with_limit(config.history_limit),
            on_error: config.on_error,
        }
    }

    /// Text to show: the expression, "0" when empty, or the error sentinel
    pub fn display(&self) -> String {
        if self.error {
            ERROR_SENTINEL.to_string()
        } else if self.expression.is_empty() {
            "0".to_string()
        } else {
            self.expression.to_string()
        }
    }

    pub fn expression(&self) -> &Expression {
        &self.expression
    }

    pub fn is_error(&self) -> bool {
        self.error
    }

    pub fn memory(&self) -> Option<f64> {
        self.memory
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Typing a digit after an error starts a fresh expression
    pub fn input_digit(&mut self, digit: char) {
        if !digit.is_ascii_digit() {
            return;
        }
        if self.error {
            self.reset_expression();
        }
        self.expression.push_digit(digit);
    }

    pub fn input_decimal(&mut self) {
        if self.error {
            return;
        }
        self.expression.push_decimal();
    }

    /// Operators are ignored while an error is shown
    pub fn input_operator(&mut self, op: Operator) {
        if self.error || op == Operator::Power {
            return;
        }
        if self.expression.is_empty() {
            if op != Operator::Subtract {
                self.expression.push(Token::Number("0".to_string()));
            }
            self.expression.push(Token::Operator(op));
            return;
        }
        self.expression.push_operator(op);
    }

    pub fn input_percent(&mut self) {
        if self.error {
            return;
        }
        self.expression.push(Token::Percent);
    }

    pub fn open_paren(&mut self) {
        if self.error {
            return;
        }
        self.expression.push(Token::Paren(Paren::Open));
    }

    pub fn close_paren(&mut self) {
        if self.error || self.expression.open_parens() == 0 {
            return;
        }
        self.expression.push(Token::Paren(Paren::Close));
    }

    /// Flip the sign of the operand being typed
    pub fn negate(&mut self) {
        if self.error {
            return;
        }
        self.expression.negate_last();
    }

    /// Backspace on an error clears it
    pub fn backspace(&mut self) {
        if self.error {
            self.reset_expression();
            return;
        }
        self.expression.backspace();
    }

    pub fn clear(&mut self) {
        self.reset_expression();
    }

    /// Evaluate the buffer; on success the result replaces the expression
    /// and is recorded in the history.
    pub fn calculate(&mut self) -> CalcResult<String> {
        if self.error {
            return Err(CalcError::Evaluation("calculator is in error state".into()));
        }
        if self.expression.is_empty() {
            return Err(CalcError::Evaluation("empty expression".into()));
        }

        match evaluate_tokens(self.expression.tokens()) {
            Ok(result) => {
                self.history.record(self.expression.to_string(), result.clone());
                self.expression = Expression::from_number(result.clone());
                Ok(result)
            }
            Err(e) => {
                self.error = true;
                if self.on_error == ErrorPolicy::ClearBuffer {
                    self.expression.clear();
                }
                Err(e)
            }
        }
    }

    /// M+: evaluate the buffer and add it to memory; ignored if it fails
    pub fn memory_add(&mut self) {
        if let Some(value) = self.current_value() {
            self.memory = Some(self.memory.unwrap_or(0.0) + value);
        }
    }

    /// M-: evaluate the buffer and subtract it from memory; ignored if it fails
    pub fn memory_subtract(&mut self) {
        if let Some(value) = self.current_value() {
            self.memory = Some(self.memory.unwrap_or(0.0) - value);
        }
    }

    /// MR: append the memory value, replacing an empty or error display
    pub fn memory_recall(&mut self) {
        let Some(value) = self.memory else {
            return;
        };
        let literal = format_result(value);
        if self.error || self.expression.is_empty() {
            self.reset_expression();
            self.expression = Expression::from_number(literal);
            return;
        }
        match self.expression.last() {
            Some(Token::Number(_)) | Some(Token::Paren(Paren::Close)) | Some(Token::Percent) => {
                self.expression.push(Token::Operator(Operator::Multiply));
            }
            _ => {}
        }
        self.expression.push(Token::Number(literal));
    }

    pub fn memory_clear(&mut self) {
        self.memory = None;
    }

    fn current_value(&self) -> Option<f64> {
        if self.error {
            return None;
        }
        evaluate_value(self.expression.tokens()).ok()
    }

    fn reset_expression(&mut self) {
        self.expression.clear();
        self.error = false;
    }
}
