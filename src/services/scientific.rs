//! Scientific calculator backed by meval.
//!
//! meval works in radians. In degree mode every `sin(`, `cos(`, `tan(`,
//! `sec(`, `cosec(` and `cot(` argument `A` is rewritten to
//! `((A) * pi / 180)` before evaluation, including trig calls nested inside
//! another call's argument.
//!
//! Percentages are plain substitutions here (`50%` -> `(50/100)`), unlike
//! the basic calculator which takes percentages of the preceding operand.

use super::format::{format_number, round_decimals};
use super::token::{Constant, Expression, Function, Operator, Paren, Token};
use crate::config::{ErrorPolicy, ScientificConfig};
use crate::error::{CalcError, CalcResult, ERROR_SENTINEL};
use meval::{Context, ContextProvider, FuncEvalError};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Decimal places kept in scientific results
pub const DECIMAL_PLACES: usize = 12;

/// Results closer than this to an integer are shown as that integer
const INTEGER_SNAP: f64 = 1e-12;

/// Functions whose argument is converted in degree mode
const ANGLE_FUNCTIONS: [&str; 6] = ["sin", "cos", "tan", "sec", "cosec", "cot"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AngleMode {
    #[default]
    Degrees,
    Radians,
}

impl AngleMode {
    pub fn toggled(self) -> Self {
        match self {
            AngleMode::Degrees => AngleMode::Radians,
            AngleMode::Radians => AngleMode::Degrees,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AngleMode::Degrees => "DEG",
            AngleMode::Radians => "RAD",
        }
    }
}

/// Evaluate with a one-off engine
pub fn evaluate(expression: &str, mode: AngleMode) -> CalcResult<String> {
    ScientificEngine::new().evaluate(expression, mode)
}

/// Format a scientific result: near-integers snap to the integer, anything
/// else is rounded to 12 decimals with trailing zeros dropped
pub fn format_result(value: f64) -> String {
    let nearest = value.round();
    if (value - nearest).abs() < INTEGER_SNAP {
        format_number(nearest)
    } else {
        format_number(round_decimals(value, DECIMAL_PLACES))
    }
}

/// meval context extended with `sec`, `cosec`, `cot` and base-10 `log`
pub struct ScientificEngine {
    context: Context<'static>,
}

impl Default for ScientificEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ScientificEngine {
    pub fn new() -> Self {
        let mut engine = Self {
            context: Context::new(),
        };
        engine.register_extensions();
        engine
    }

    fn register_extensions(&mut self) {
        self.register("sec", |x| 1.0 / x.cos());
        self.register("cosec", |x| 1.0 / x.sin());
        self.register("cot", |x| 1.0 / x.tan());
        self.register("log10", f64::log10);
        self.register("log", f64::log10);
    }

    /// Add a one-argument function unless the name is already taken.
    /// Returns whether the function was added.
    pub fn register<F>(&mut self, name: &str, func: F) -> bool
    where
        F: Fn(f64) -> f64 + 'static,
    {
        if self.has_function(name) {
            debug!("Scientific: '{}' already defined, skipping", name);
            return false;
        }
        self.context.func(name, func);
        true
    }

    pub fn has_function(&self, name: &str) -> bool {
        !matches!(
            self.context.eval_func(name, &[]),
            Err(FuncEvalError::UnknownFunction)
        )
    }

    /// Evaluate and format
    pub fn evaluate(&self, expression: &str, mode: AngleMode) -> CalcResult<String> {
        self.evaluate_value(expression, mode).map(format_result)
    }

    pub fn evaluate_value(&self, expression: &str, mode: AngleMode) -> CalcResult<f64> {
        let expression = expression.trim();
        if expression.is_empty() {
            return Err(CalcError::Evaluation("empty expression".to_string()));
        }

        let prepared = prepare(expression, mode);
        match meval::eval_str_with_context(&prepared, &self.context) {
            Ok(result) if result.is_finite() => Ok(result),
            Ok(result) => {
                debug!("Scientific: '{}' produced non-finite {}", prepared, result);
                Err(CalcError::Evaluation(format!("'{}' is not finite", expression)))
            }
            Err(e) => {
                debug!("Scientific error for '{}': {}", prepared, e);
                Err(CalcError::Evaluation(e.to_string()))
            }
        }
    }
}

/// Turn display text into something meval understands
pub fn prepare(expression: &str, mode: AngleMode) -> String {
    let normalized = normalize_symbols(expression);
    let with_percent = substitute_percentages(&normalized);
    match mode {
        AngleMode::Degrees => rewrite_angles(&with_percent),
        AngleMode::Radians => with_percent,
    }
}

fn normalize_symbols(expression: &str) -> String {
    let mut out = String::with_capacity(expression.len());
    for c in expression.chars() {
        match c {
            'π' => out.push_str("pi"),
            '×' => out.push('*'),
            '÷' => out.push('/'),
            '−' => out.push('-'),
            '√' => out.push_str("sqrt"),
            '²' => out.push_str("^2"),
            other => out.push(other),
        }
    }
    out
}

/// `N%` -> `(N/100)` wherever a numeric literal directly precedes `%`, and
/// `(-N)%` -> `(-(N/100))` for a negative literal
fn substitute_percentages(expression: &str) -> String {
    let mut out = String::with_capacity(expression.len());
    for c in expression.chars() {
        if c != '%' {
            out.push(c);
            continue;
        }
        if let Some(start) = trailing_literal_start(&out) {
            let literal = out.split_off(start);
            out.push_str(&format!("({}/100)", literal));
        } else if let Some(start) = negative_literal_start(&out) {
            let literal = out.split_off(start);
            let digits = &literal[2..literal.len() - 1];
            out.push_str(&format!("(-({}/100))", digits));
        } else {
            out.push(c);
        }
    }
    out
}

/// Byte offset of the digit/dot run ending `expression`
fn trailing_literal_start(expression: &str) -> Option<usize> {
    expression
        .char_indices()
        .rev()
        .take_while(|(_, ch)| ch.is_ascii_digit() || *ch == '.')
        .last()
        .map(|(idx, _)| idx)
}

/// Byte offset of a trailing `(-N)`
fn negative_literal_start(expression: &str) -> Option<usize> {
    let inner = expression.strip_suffix(')')?;
    let digits = trailing_literal_start(inner)?;
    inner[..digits].strip_suffix("(-").map(str::len)
}

/// Wrap each angle function's argument in a degree-to-radian conversion
pub fn rewrite_angles(expression: &str) -> String {
    let chars: Vec<char> = expression.chars().collect();
    let mut out = String::with_capacity(expression.len() + 16);
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if !(c.is_ascii_alphabetic() || c == '_') {
            out.push(c);
            i += 1;
            continue;
        }

        let start = i;
        while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
            i += 1;
        }
        let name: String = chars[start..i].iter().collect();
        out.push_str(&name);

        if !ANGLE_FUNCTIONS.contains(&name.as_str()) {
            continue;
        }

        let mut open = i;
        while open < chars.len() && chars[open].is_whitespace() {
            open += 1;
        }
        if chars.get(open) != Some(&'(') {
            continue;
        }
        // Unbalanced calls are left alone; meval reports them
        if let Some(close) = matching_paren(&chars, open) {
            let argument: String = chars[open + 1..close].iter().collect();
            out.push_str(&format!("((({}) * pi / 180))", rewrite_angles(&argument)));
            i = close + 1;
        }
    }

    out
}

fn matching_paren(chars: &[char], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (idx, c) in chars.iter().enumerate().skip(open) {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(idx);
                }
            }
            _ => {}
        }
    }
    None
}

/// Scientific calculator state: expression buffer, angle mode and memory
pub struct ScientificCalculator {
    engine: ScientificEngine,
    expression: Expression,
    angle_mode: AngleMode,
    error: bool,
    memory: Option<f64>,
    on_error: ErrorPolicy,
}

impl Default for ScientificCalculator {
    fn default() -> Self {
        Self::new(&ScientificConfig::default())
    }
}

impl ScientificCalculator {
    pub fn new(config: &ScientificConfig) -> Self {
        Self {
            engine: ScientificEngine::new(),
            expression: Expression::new(),
            angle_mode: config.angle_mode,
            error: false,
            memory: None,
            on_error: config.on_error,
        }
    }

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

    pub fn angle_mode(&self) -> AngleMode {
        self.angle_mode
    }

    /// Only affects later evaluations; the current expression is untouched
    pub fn toggle_angle_mode(&mut self) {
        self.angle_mode = self.angle_mode.toggled();
    }

    pub fn set_angle_mode(&mut self, mode: AngleMode) {
        self.angle_mode = mode;
    }

    pub fn is_error(&self) -> bool {
        self.error
    }

    pub fn memory(&self) -> Option<f64> {
        self.memory
    }

    pub fn input_digit(&mut self, digit: char) {
        if self.error || !digit.is_ascii_digit() {
            return;
        }
        if self.follows_value() && !matches!(self.expression.last(), Some(Token::Number(_))) {
            self.expression.push(Token::Operator(Operator::Multiply));
        }
        self.expression.push_digit(digit);
    }

    pub fn input_decimal(&mut self) {
        if self.error {
            return;
        }
        self.expression.push_decimal();
    }

    /// A trailing operator is replaced, except that `-` may follow another
    /// operator once to start a negative operand.
    pub fn input_operator(&mut self, op: Operator) {
        if self.error {
            return;
        }
        let tokens = self.expression.tokens();
        let trailing = tokens.iter().rev().take_while(|t| t.is_operator()).count();
        let len = tokens.len();

        match trailing {
            0 if self.expression.is_empty() && op != Operator::Subtract => {
                self.expression.push(Token::Number("0".to_string()));
                self.expression.push(Token::Operator(op));
            }
            0 => self.expression.push(Token::Operator(op)),
            1 if op == Operator::Subtract && len > 1 => {
                self.expression.push(Token::Operator(op));
            }
            _ => {
                // Drop a pending unary minus before replacing the binary operator
                for _ in 1..trailing {
                    self.expression.pop();
                }
                self.expression.push_operator(op);
            }
        }
    }

    pub fn input_function(&mut self, function: Function) {
        if self.error {
            return;
        }
        self.multiply_if_adjacent();
        self.expression.push(Token::Function(function));
    }

    /// `√(`; the user closes the parenthesis, it is never auto-closed
    pub fn input_sqrt(&mut self) {
        self.input_function(Function::Sqrt);
    }

    /// Appends `^2` to the preceding value
    pub fn input_square(&mut self) {
        if self.error || !self.follows_value() {
            return;
        }
        self.expression.push(Token::Square);
    }

    pub fn input_constant(&mut self, constant: Constant) {
        if self.error {
            return;
        }
        self.multiply_if_adjacent();
        self.expression.push(Token::Constant(constant));
    }

    pub fn open_paren(&mut self) {
        if self.error {
            return;
        }
        self.multiply_if_adjacent();
        self.expression.push(Token::Paren(Paren::Open));
    }

    pub fn close_paren(&mut self) {
        if self.error || self.expression.open_parens() == 0 {
            return;
        }
        self.expression.push(Token::Paren(Paren::Close));
    }

    pub fn input_percent(&mut self) {
        if self.error {
            return;
        }
        if matches!(self.expression.last(), Some(Token::Number(_))) {
            self.expression.push(Token::Percent);
        }
    }

    pub fn backspace(&mut self) {
        if self.error {
            return;
        }
        self.expression.backspace();
    }

    /// The only key accepted while an error is shown
    pub fn clear(&mut self) {
        self.expression.clear();
        self.error = false;
    }

    pub fn calculate(&mut self) -> CalcResult<String> {
        if self.error {
            return Err(CalcError::Evaluation("calculator is in error state".into()));
        }
        let source = self.expression.to_eval_string();
        match self.engine.evaluate(&source, self.angle_mode) {
            Ok(result) => {
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

    /// M+: add the displayed value when it is a plain number
    pub fn memory_add(&mut self) {
        if self.error {
            return;
        }
        if let Ok(value) = self.display().parse::<f64>() {
            self.memory = Some(self.memory.unwrap_or(0.0) + value);
        }
    }

    pub fn memory_recall(&mut self) {
        if self.error {
            return;
        }
        if let Some(value) = self.memory {
            self.multiply_if_adjacent();
            self.expression.push(Token::Number(format_result(value)));
        }
    }

    pub fn memory_clear(&mut self) {
        self.memory = None;
    }

    fn follows_value(&self) -> bool {
        matches!(
            self.expression.last(),
            Some(Token::Number(_))
                | Some(Token::Constant(_))
                | Some(Token::Paren(Paren::Close))
                | Some(Token::Square)
                | Some(Token::Percent)
        )
    }

    /// `2π` and `3(` mean multiplication
    fn multiply_if_adjacent(&mut self) {
        if self.follows_value() {
            self.expression.push(Token::Operator(Operator::Multiply));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval_deg(expr: &str) -> String {
        evaluate(expr, AngleMode::Degrees).unwrap()
    }

    #[test]
    fn test_degree_trig() {
        assert_eq!(eval_deg("sin(30)"), "0.5");
        assert_eq!(eval_deg("cos(60)"), "0.5");
        assert_eq!(eval_deg("tan(45)"), "1");
        let value = ScientificEngine::new()
            .evaluate_value("sin(30)", AngleMode::Degrees)
            .unwrap();
        assert!((value - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_reciprocal_trig() {
        assert_eq!(eval_deg("sec(60)"), "2");
        assert_eq!(eval_deg("cosec(30)"), "2");
        assert_eq!(eval_deg("cot(45)"), "1");
    }

    #[test]
    fn test_radian_mode_passes_through() {
        assert_eq!(evaluate("sin(pi/2)", AngleMode::Radians).unwrap(), "1");
        assert_eq!(prepare("sin(30)", AngleMode::Radians), "sin(30)");
    }

    #[test]
    fn test_mode_changes_result_of_same_expression() {
        let degrees = evaluate("sin(30)", AngleMode::Degrees).unwrap();
        let radians = evaluate("sin(30)", AngleMode::Radians).unwrap();
        assert_ne!(degrees, radians);
        assert_eq!(radians, "-0.988031624093");
    }

    #[test]
    fn test_rewrite_handles_nesting() {
        assert_eq!(rewrite_angles("sin(30)"), "sin(((30) * pi / 180))");
        assert_eq!(
            rewrite_angles("sin((10+20))"),
            "sin((((10+20)) * pi / 180))"
        );
        assert_eq!(eval_deg("sin(90-cos(60)*120)"), "0.5");
    }

    #[test]
    fn test_rewrite_skips_other_functions() {
        assert_eq!(rewrite_angles("asin(1)"), "asin(1)");
        assert_eq!(rewrite_angles("sinh(1)+sqrt(4)"), "sinh(1)+sqrt(4)");
        assert_eq!(rewrite_angles("sin(30"), "sin(30");
    }

    #[test]
    fn test_logarithms_are_distinct() {
        assert_eq!(eval_deg("log(100)"), "2");
        assert_eq!(eval_deg("log10(1000)"), "3");
        assert_eq!(eval_deg("ln(e)"), "1");
        assert_ne!(eval_deg("ln(100)"), eval_deg("log(100)"));
    }

    #[test]
    fn test_display_symbols_and_powers() {
        assert_eq!(eval_deg("2^10"), "1024");
        assert_eq!(eval_deg("√(16)"), "4");
        assert_eq!(eval_deg("3²"), "9");
        assert_eq!(eval_deg("2×π÷π"), "2");
    }

    #[test]
    fn test_percent_is_plain_fraction() {
        assert_eq!(eval_deg("50%"), "0.5");
        assert_eq!(eval_deg("200+10%"), "200.1");
        assert_eq!(substitute_percentages("12.5%*8"), "(12.5/100)*8");
    }

    #[test]
    fn test_percent_of_negative_literal() {
        assert_eq!(substitute_percentages("(-12)%"), "(-(12/100))");
        assert_eq!(substitute_percentages("3*(-50)%+1"), "3*(-(50/100))+1");
        assert_eq!(substitute_percentages("(2+3)%"), "(2+3)%");
        assert_eq!(eval_deg("(-12)%"), "-0.12");
    }

    #[test]
    fn test_result_precision() {
        assert_eq!(eval_deg("1/3"), "0.333333333333");
        assert_eq!(format_result(2.00000000001), "2.00000000001");
        assert_eq!(format_result(2.0000000000001), "2");
        assert_eq!(format_result(-0.0000000000001), "0");
    }

    #[test]
    fn test_errors() {
        assert!(evaluate("", AngleMode::Degrees).is_err());
        assert!(evaluate("(2+3", AngleMode::Degrees).is_err());
        assert!(evaluate("log(-1)", AngleMode::Degrees).is_err());
        assert!(evaluate("foo(1)", AngleMode::Degrees).is_err());
        assert!(evaluate("1/0", AngleMode::Degrees).is_err());
    }

    #[test]
    fn test_registration_is_idempotent() {
        let mut engine = ScientificEngine::new();
        assert!(engine.has_function("sec"));
        assert!(engine.has_function("sin"));
        assert!(!engine.has_function("versin"));
        assert!(!engine.register("sec", |x| x));
        assert!(!engine.register("sin", |x| x));
        assert!(engine.register("versin", |x| 1.0 - x.cos()));
        assert_eq!(engine.evaluate("sec(60)", AngleMode::Degrees).unwrap(), "2");
        assert_eq!(engine.evaluate("versin(0)", AngleMode::Radians).unwrap(), "0");
    }

    #[test]
    fn test_calculator_keys() {
        let mut calc = ScientificCalculator::default();
        calc.input_function(Function::Sin);
        calc.input_digit('3');
        calc.input_digit('0');
        calc.close_paren();
        assert_eq!(calc.display(), "sin(30)");
        assert_eq!(calc.calculate().unwrap(), "0.5");
        assert_eq!(calc.display(), "0.5");
    }

    #[test]
    fn test_toggle_only_affects_future_evaluations() {
        let mut calc = ScientificCalculator::default();
        calc.input_function(Function::Sin);
        calc.input_digit('3');
        calc.input_digit('0');
        calc.close_paren();
        calc.toggle_angle_mode();
        assert_eq!(calc.angle_mode(), AngleMode::Radians);
        assert_eq!(calc.display(), "sin(30)");
        assert_eq!(calc.calculate().unwrap(), "-0.988031624093");
    }

    #[test]
    fn test_error_clears_buffer_and_blocks_input() {
        let mut calc = ScientificCalculator::default();
        calc.input_sqrt();
        calc.input_digit('9');
        assert_eq!(calc.display(), "√(9");
        assert!(calc.calculate().is_err());
        assert_eq!(calc.display(), "Error");
        assert!(calc.expression().is_empty());

        calc.input_digit('1');
        assert_eq!(calc.display(), "Error");
        calc.clear();
        calc.input_digit('1');
        assert_eq!(calc.display(), "1");
    }

    #[test]
    fn test_operator_entry_allows_unary_minus() {
        let mut calc = ScientificCalculator::default();
        calc.input_digit('6');
        calc.input_operator(Operator::Multiply);
        calc.input_operator(Operator::Subtract);
        calc.input_digit('2');
        assert_eq!(calc.display(), "6×-2");
        assert_eq!(calc.calculate().unwrap(), "-12");

        calc.clear();
        calc.input_digit('6');
        calc.input_operator(Operator::Multiply);
        calc.input_operator(Operator::Subtract);
        calc.input_operator(Operator::Add);
        assert_eq!(calc.display(), "6+");
    }

    #[test]
    fn test_percent_key_on_negative_result() {
        let mut calc = ScientificCalculator::default();
        calc.input_digit('6');
        calc.input_operator(Operator::Multiply);
        calc.input_operator(Operator::Subtract);
        calc.input_digit('2');
        assert_eq!(calc.calculate().unwrap(), "-12");

        calc.input_percent();
        assert_eq!(calc.display(), "-12%");
        assert_eq!(calc.calculate().unwrap(), "-0.12");
        assert!(!calc.is_error());
    }

    #[test]
    fn test_square_constant_and_implicit_multiply() {
        let mut calc = ScientificCalculator::default();
        calc.input_digit('2');
        calc.input_constant(Constant::Pi);
        assert_eq!(calc.display(), "2×π");
        calc.clear();

        calc.input_digit('4');
        calc.input_square();
        assert_eq!(calc.display(), "4²");
        assert_eq!(calc.calculate().unwrap(), "16");
    }

    #[test]
    fn test_memory() {
        let mut calc = ScientificCalculator::default();
        calc.input_digit('4');
        calc.memory_add();
        calc.memory_add();
        assert_eq!(calc.memory(), Some(8.0));
        calc.clear();
        calc.memory_recall();
        assert_eq!(calc.display(), "8");
        calc.memory_clear();
        assert_eq!(calc.memory(), None);
    }
}
