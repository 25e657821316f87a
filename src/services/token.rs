//! Expression tokens.
//!
//! Calculators build expressions as a sequence of tagged tokens rather than
//! by string concatenation. A token sequence renders two ways: the display
//! form the user sees (`×`, `÷`, `π`, `√(`) and the evaluator form handed to
//! the math engine (`*`, `/`, `pi`, `sqrt(`).

use crate::error::{CalcError, CalcResult};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Power,
}

impl Operator {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '+' => Some(Operator::Add),
            '-' | '−' => Some(Operator::Subtract),
            '*' | '×' => Some(Operator::Multiply),
            '/' | '÷' => Some(Operator::Divide),
            '^' => Some(Operator::Power),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Operator::Add => "+",
            Operator::Subtract => "-",
            Operator::Multiply => "×",
            Operator::Divide => "÷",
            Operator::Power => "^",
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Add => "+",
            Operator::Subtract => "-",
            Operator::Multiply => "*",
            Operator::Divide => "/",
            Operator::Power => "^",
        }
    }

    /// Additive operators take percentages of the preceding operand.
    pub fn is_additive(self) -> bool {
        matches!(self, Operator::Add | Operator::Subtract)
    }
}

/// Functions available on the scientific keypad. Each one opens a parenthesis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    Sin,
    Cos,
    Tan,
    Sec,
    Cosec,
    Cot,
    Asin,
    Acos,
    Atan,
    Sinh,
    Cosh,
    Tanh,
    Sqrt,
    /// Natural logarithm
    Ln,
    /// Base-10 logarithm
    Log,
    Exp,
    Abs,
}

impl Function {
    pub fn from_name(name: &str) -> Option<Self> {
        let function = match name {
            "sin" => Function::Sin,
            "cos" => Function::Cos,
            "tan" => Function::Tan,
            "sec" => Function::Sec,
            "cosec" | "csc" => Function::Cosec,
            "cot" => Function::Cot,
            "asin" => Function::Asin,
            "acos" => Function::Acos,
            "atan" => Function::Atan,
            "sinh" => Function::Sinh,
            "cosh" => Function::Cosh,
            "tanh" => Function::Tanh,
            "sqrt" | "√" => Function::Sqrt,
            "ln" => Function::Ln,
            "log" | "log10" => Function::Log,
            "exp" => Function::Exp,
            "abs" => Function::Abs,
            _ => return None,
        };
        Some(function)
    }

    /// Name used by the evaluator
    pub fn name(self) -> &'static str {
        match self {
            Function::Sin => "sin",
            Function::Cos => "cos",
            Function::Tan => "tan",
            Function::Sec => "sec",
            Function::Cosec => "cosec",
            Function::Cot => "cot",
            Function::Asin => "asin",
            Function::Acos => "acos",
            Function::Atan => "atan",
            Function::Sinh => "sinh",
            Function::Cosh => "cosh",
            Function::Tanh => "tanh",
            Function::Sqrt => "sqrt",
            Function::Ln => "ln",
            Function::Log => "log10",
            Function::Exp => "exp",
            Function::Abs => "abs",
        }
    }

    /// Name shown on the display
    pub fn label(self) -> &'static str {
        match self {
            Function::Sqrt => "√",
            Function::Log => "log",
            other => other.name(),
        }
    }

    /// Trigonometric functions whose argument is an angle
    pub fn takes_angle(self) -> bool {
        matches!(
            self,
            Function::Sin
                | Function::Cos
                | Function::Tan
                | Function::Sec
                | Function::Cosec
                | Function::Cot
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constant {
    Pi,
    E,
}

impl Constant {
    pub fn label(self) -> &'static str {
        match self {
            Constant::Pi => "π",
            Constant::E => "e",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Constant::Pi => "pi",
            Constant::E => "e",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Paren {
    Open,
    Close,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Literal operand as typed, e.g. "12.5" or "-3"
    Number(String),
    Operator(Operator),
    Percent,
    /// Function name plus its opening parenthesis
    Function(Function),
    Paren(Paren),
    Constant(Constant),
    /// Postfix square, rendered `²` and evaluated as `^2`
    Square,
}

impl Token {
    fn write_display(&self, out: &mut String) {
        match self {
            Token::Number(n) => out.push_str(n),
            Token::Operator(op) => out.push_str(op.label()),
            Token::Percent => out.push('%'),
            Token::Function(f) => {
                out.push_str(f.label());
                out.push('(');
            }
            Token::Paren(Paren::Open) => out.push('('),
            Token::Paren(Paren::Close) => out.push(')'),
            Token::Constant(c) => out.push_str(c.label()),
            Token::Square => out.push('²'),
        }
    }

    fn write_eval(&self, out: &mut String) {
        match self {
            Token::Number(n) => out.push_str(&eval_number(n)),
            Token::Operator(op) => out.push_str(op.symbol()),
            Token::Percent => out.push('%'),
            Token::Function(f) => {
                out.push_str(f.name());
                out.push('(');
            }
            Token::Paren(Paren::Open) => out.push('('),
            Token::Paren(Paren::Close) => out.push(')'),
            Token::Constant(c) => out.push_str(c.name()),
            Token::Square => out.push_str("^2"),
        }
    }

    pub fn is_operator(&self) -> bool {
        matches!(self, Token::Operator(_))
    }
}

/// Normalise a typed literal for the evaluator: "3." -> "3", ".5" -> "0.5",
/// negative literals are parenthesised so they survive after an operator.
fn eval_number(literal: &str) -> String {
    let (negative, digits) = match literal.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, literal),
    };
    let digits = digits.strip_suffix('.').unwrap_or(digits);
    let digits = if digits.starts_with('.') {
        format!("0{}", digits)
    } else if digits.is_empty() {
        "0".to_string()
    } else {
        digits.to_string()
    };
    if negative {
        format!("(-{})", digits)
    } else {
        digits
    }
}

/// An expression under construction
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Expression {
    tokens: Vec<Token>,
}

impl Expression {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_tokens(tokens: Vec<Token>) -> Self {
        Self { tokens }
    }

    /// Start a fresh expression holding a single literal, e.g. a previous result
    pub fn from_number(literal: impl Into<String>) -> Self {
        Self {
            tokens: vec![Token::Number(literal.into())],
        }
    }

    /// Tokenize typed input such as `"2+3×4"` or `"sin(30)+√(16)"`
    pub fn parse(input: &str) -> CalcResult<Self> {
        let chars: Vec<char> = input.chars().collect();
        let mut tokens = Vec::new();
        let mut i = 0;

        while i < chars.len() {
            let c = chars[i];
            if c.is_whitespace() {
                i += 1;
            } else if c.is_ascii_digit() || c == '.' {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let literal: String = chars[start..i].iter().collect();
                if literal.matches('.').count() > 1 {
                    return Err(CalcError::Evaluation(format!(
                        "operand '{}' has more than one decimal point",
                        literal
                    )));
                }
                tokens.push(Token::Number(literal));
            } else if let Some(op) = Operator::from_char(c) {
                tokens.push(Token::Operator(op));
                i += 1;
            } else if c == '%' {
                tokens.push(Token::Percent);
                i += 1;
            } else if c == '(' {
                tokens.push(Token::Paren(Paren::Open));
                i += 1;
            } else if c == ')' {
                tokens.push(Token::Paren(Paren::Close));
                i += 1;
            } else if c == '²' {
                tokens.push(Token::Square);
                i += 1;
            } else if c == 'π' {
                tokens.push(Token::Constant(Constant::Pi));
                i += 1;
            } else if c == '√' {
                i += 1;
                if chars.get(i) == Some(&'(') {
                    i += 1;
                }
                tokens.push(Token::Function(Function::Sqrt));
            } else if c.is_ascii_alphabetic() {
                let start = i;
                while i < chars.len() && chars[i].is_ascii_alphanumeric() {
                    i += 1;
                }
                let name: String = chars[start..i].iter().collect();
                match (name.as_str(), chars.get(i)) {
                    ("pi", _) => tokens.push(Token::Constant(Constant::Pi)),
                    ("e", _) => tokens.push(Token::Constant(Constant::E)),
                    (name, Some('(')) => {
                        let function = Function::from_name(name).ok_or_else(|| {
                            CalcError::Evaluation(format!("unknown function '{}'", name))
                        })?;
                        tokens.push(Token::Function(function));
                        i += 1;
                    }
                    (name, _) => {
                        return Err(CalcError::Evaluation(format!(
                            "unknown identifier '{}'",
                            name
                        )))
                    }
                }
            } else {
                return Err(CalcError::Evaluation(format!(
                    "unexpected character '{}'",
                    c
                )));
            }
        }

        Ok(Self { tokens })
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn last(&self) -> Option<&Token> {
        self.tokens.last()
    }

    pub fn push(&mut self, token: Token) {
        self.tokens.push(token);
    }

    pub fn pop(&mut self) -> Option<Token> {
        self.tokens.pop()
    }

    pub fn clear(&mut self) {
        self.tokens.clear();
    }

    /// Append a digit to the current operand, or start a new one
    pub fn push_digit(&mut self, digit: char) {
        match self.tokens.last_mut() {
            Some(Token::Number(n)) => {
                if n == "0" {
                    n.clear();
                } else if n == "-0" {
                    n.truncate(1);
                }
                n.push(digit);
            }
            _ => self.tokens.push(Token::Number(digit.to_string())),
        }
    }

    /// Append a decimal point unless the current operand already has one
    pub fn push_decimal(&mut self) -> bool {
        match self.tokens.last_mut() {
            Some(Token::Number(n)) if n.contains('.') => false,
            Some(Token::Number(n)) => {
                n.push('.');
                true
            }
            _ => {
                self.tokens.push(Token::Number("0.".to_string()));
                true
            }
        }
    }

    /// Append an operator; a trailing operator is replaced instead
    pub fn push_operator(&mut self, op: Operator) {
        if let Some(Token::Operator(last)) = self.tokens.last_mut() {
            *last = op;
        } else {
            self.tokens.push(Token::Operator(op));
        }
    }

    /// Flip the sign of the current operand
    pub fn negate_last(&mut self) -> bool {
        match self.tokens.last_mut() {
            Some(Token::Number(n)) => {
                if let Some(rest) = n.strip_prefix('-') {
                    *n = rest.to_string();
                } else {
                    n.insert(0, '-');
                }
                true
            }
            _ => false,
        }
    }

    /// Remove the last typed character
    pub fn backspace(&mut self) {
        if let Some(Token::Number(n)) = self.tokens.last_mut() {
            n.pop();
            if !n.is_empty() && n != "-" {
                return;
            }
        }
        self.tokens.pop();
    }

    /// Parentheses opened (including by functions) and not yet closed
    pub fn open_parens(&self) -> usize {
        let mut depth: usize = 0;
        for token in &self.tokens {
            match token {
                Token::Function(_) | Token::Paren(Paren::Open) => depth += 1,
                Token::Paren(Paren::Close) => depth = depth.saturating_sub(1),
                _ => {}
            }
        }
        depth
    }

    /// Evaluator form, e.g. `2*sqrt(16)^2`
    pub fn to_eval_string(&self) -> String {
        let mut out = String::new();
        for token in &self.tokens {
            token.write_eval(&mut out);
        }
        out
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        for token in &self.tokens {
            token.write_display(&mut out);
        }
        f.write_str(&out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic_expression() {
        let expr = Expression::parse("2+3×4").unwrap();
        assert_eq!(
            expr.tokens(),
            &[
                Token::Number("2".into()),
                Token::Operator(Operator::Add),
                Token::Number("3".into()),
                Token::Operator(Operator::Multiply),
                Token::Number("4".into()),
            ]
        );
        assert_eq!(expr.to_eval_string(), "2+3*4");
        assert_eq!(expr.to_string(), "2+3×4");
    }

    #[test]
    fn test_parse_functions_and_constants() {
        let expr = Expression::parse("√(16)+log(100)+ln(e)+π").unwrap();
        assert_eq!(expr.to_eval_string(), "sqrt(16)+log10(100)+ln(e)+pi");
        assert_eq!(expr.to_string(), "√(16)+log(100)+ln(e)+π");
    }

    #[test]
    fn test_parse_rejects_double_decimal_and_unknown_names() {
        assert!(Expression::parse("1.2.3").is_err());
        assert!(Expression::parse("foo(2)").is_err());
        assert!(Expression::parse("2$3").is_err());
    }

    #[test]
    fn test_push_operator_replaces_trailing_operator() {
        let mut expr = Expression::new();
        expr.push_digit('5');
        expr.push_operator(Operator::Add);
        expr.push_operator(Operator::Multiply);
        assert_eq!(expr.to_string(), "5×");
    }

    #[test]
    fn test_push_decimal_once_per_operand() {
        let mut expr = Expression::new();
        expr.push_digit('1');
        assert!(expr.push_decimal());
        expr.push_digit('5');
        assert!(!expr.push_decimal());
        expr.push_operator(Operator::Add);
        assert!(expr.push_decimal());
        assert_eq!(expr.to_string(), "1.5+0.");
        assert_eq!(expr.to_eval_string(), "1.5+0");
    }

    #[test]
    fn test_negate_and_backspace() {
        let mut expr = Expression::new();
        expr.push_digit('2');
        expr.push_operator(Operator::Multiply);
        expr.push_digit('5');
        assert!(expr.negate_last());
        assert_eq!(expr.to_string(), "2×-5");
        assert_eq!(expr.to_eval_string(), "2*(-5)");
        expr.backspace();
        assert_eq!(expr.to_string(), "2×");
        expr.backspace();
        assert_eq!(expr.to_string(), "2");
    }

    #[test]
    fn test_open_parens_counts_functions() {
        let expr = Expression::parse("sin(cos(0)").unwrap();
        assert_eq!(expr.open_parens(), 1);
    }

    #[test]
    fn test_square_token() {
        let mut expr = Expression::from_number("3");
        expr.push(Token::Square);
        assert_eq!(expr.to_string(), "3²");
        assert_eq!(expr.to_eval_string(), "3^2");
    }
}
