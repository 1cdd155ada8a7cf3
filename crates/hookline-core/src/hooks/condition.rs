//! Condition evaluation for hooks
//!
//! A condition is a small boolean expression evaluated against the merged
//! bindings of one matrix cell:
//!
//! - String literals: `'true'`, `"linux"`
//! - Booleans: `true`, `false`
//! - References: `RELEASE`, `env.RELEASE`, `matrix.os`, `project.version`
//! - Comparison: `==`, `!=`, `=~` (regex search)
//! - Logic: `!`, `&&`, `||` and parentheses
//!
//! Evaluation is a pure function of the expression and the bindings. Every
//! reference must resolve before anything is evaluated, so `a && missing`
//! fails even when `a` is false; `&&` and `||` then short-circuit on values.
//! Parentheses and `!` may nest at most [`MAX_NESTING`] levels deep.
//!
//! # Examples
//!
//! ```
//! use hookline_core::hooks::condition::evaluate;
//! use hookline_core::hooks::Bindings;
//!
//! let mut bindings = Bindings::new();
//! bindings.insert("RELEASE".to_string(), "false".to_string());
//!
//! assert!(evaluate("", &bindings).unwrap());
//! assert!(!evaluate("env.RELEASE == 'true'", &bindings).unwrap());
//! assert!(evaluate("!RELEASE", &bindings).unwrap());
//! ```

use regex::Regex;
use thiserror::Error;

use super::types::Bindings;

/// Condition or template evaluation failure
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EvaluationError {
    /// The expression could not be parsed
    #[error("syntax error at position {position}: {message}")]
    Syntax { position: usize, message: String },

    /// A referenced binding does not exist
    #[error("unresolved reference '{0}'")]
    UnresolvedReference(String),

    /// A value used as a boolean is neither `true` nor `false`
    #[error("'{subject}' is not a boolean (value: '{value}')")]
    TypeMismatch { subject: String, value: String },

    /// The right-hand side of `=~` is not a valid regex
    #[error("invalid pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },
}

impl EvaluationError {
    fn syntax(position: usize, message: impl Into<String>) -> Self {
        Self::Syntax {
            position,
            message: message.into(),
        }
    }
}

/// Deepest allowed nesting of parentheses and `!`
pub const MAX_NESTING: usize = 64;

/// Namespaces that fall back to the bare binding name
const NAMESPACES: [&str; 2] = ["env.", "matrix."];

/// Look up a reference in the bindings.
///
/// The full dotted name wins; `env.X` and `matrix.X` fall back to `X`.
pub fn lookup<'a>(bindings: &'a Bindings, name: &str) -> Option<&'a str> {
    if let Some(value) = bindings.get(name) {
        return Some(value.as_str());
    }
    NAMESPACES
        .iter()
        .find_map(|ns| name.strip_prefix(ns))
        .and_then(|bare| bindings.get(bare))
        .map(String::as_str)
}

/// Evaluate a condition expression against the given bindings.
///
/// An empty or blank expression is always true.
pub fn evaluate(expression: &str, bindings: &Bindings) -> Result<bool, EvaluationError> {
    Condition::parse(expression)?.evaluate(bindings)
}

/// A parsed condition, reusable across matrix cells
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    source: String,
    expr: Option<Expr>,
}

impl Condition {
    /// Parse a condition expression
    pub fn parse(source: &str) -> Result<Self, EvaluationError> {
        let expr = if source.trim().is_empty() {
            None
        } else {
            let tokens = tokenize(source)?;
            let mut parser = Parser {
                tokens,
                pos: 0,
                end: source.len(),
                depth: 0,
            };
            let expr = parser.parse_or()?;
            if let Some((position, token)) = parser.tokens.get(parser.pos) {
                return Err(EvaluationError::syntax(
                    *position,
                    format!("unexpected {}", token.describe()),
                ));
            }
            Some(expr)
        };

        Ok(Self {
            source: source.to_string(),
            expr,
        })
    }

    /// Get the source text of the condition
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Check if this condition always holds
    pub fn is_unconditional(&self) -> bool {
        self.expr.is_none()
    }

    /// Evaluate the condition against bindings
    pub fn evaluate(&self, bindings: &Bindings) -> Result<bool, EvaluationError> {
        match &self.expr {
            None => Ok(true),
            Some(expr) => {
                expr.check_references(bindings)?;
                expr.truth(bindings)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Str(String),
    Ident(String),
    True,
    False,
    Eq,
    Ne,
    Match,
    Not,
    And,
    Or,
    LParen,
    RParen,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Str(s) => format!("string '{}'", s),
            Token::Ident(name) => format!("reference '{}'", name),
            Token::True => "'true'".to_string(),
            Token::False => "'false'".to_string(),
            Token::Eq => "'=='".to_string(),
            Token::Ne => "'!='".to_string(),
            Token::Match => "'=~'".to_string(),
            Token::Not => "'!'".to_string(),
            Token::And => "'&&'".to_string(),
            Token::Or => "'||'".to_string(),
            Token::LParen => "'('".to_string(),
            Token::RParen => "')'".to_string(),
        }
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | '.')
}

fn tokenize(input: &str) -> Result<Vec<(usize, Token)>, EvaluationError> {
    let chars: Vec<(usize, char)> = input.char_indices().collect();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < chars.len() {
        let (offset, c) = chars[pos];
        let next = chars.get(pos + 1).map(|(_, c)| *c);

        match c {
            c if c.is_whitespace() => pos += 1,
            '(' => {
                tokens.push((offset, Token::LParen));
                pos += 1;
            }
            ')' => {
                tokens.push((offset, Token::RParen));
                pos += 1;
            }
            '=' if next == Some('=') => {
                tokens.push((offset, Token::Eq));
                pos += 2;
            }
            '=' if next == Some('~') => {
                tokens.push((offset, Token::Match));
                pos += 2;
            }
            '!' if next == Some('=') => {
                tokens.push((offset, Token::Ne));
                pos += 2;
            }
            '!' => {
                tokens.push((offset, Token::Not));
                pos += 1;
            }
            '&' if next == Some('&') => {
                tokens.push((offset, Token::And));
                pos += 2;
            }
            '|' if next == Some('|') => {
                tokens.push((offset, Token::Or));
                pos += 2;
            }
            '\'' | '"' => {
                let quote = c;
                let mut value = String::new();
                let mut closed = false;
                pos += 1;
                while pos < chars.len() {
                    let (_, ch) = chars[pos];
                    if ch == '\\' && pos + 1 < chars.len() {
                        value.push(chars[pos + 1].1);
                        pos += 2;
                        continue;
                    }
                    pos += 1;
                    if ch == quote {
                        closed = true;
                        break;
                    }
                    value.push(ch);
                }
                if !closed {
                    return Err(EvaluationError::syntax(offset, "unterminated string"));
                }
                tokens.push((offset, Token::Str(value)));
            }
            c if is_ident_char(c) => {
                let start = pos;
                while pos < chars.len() && is_ident_char(chars[pos].1) {
                    pos += 1;
                }
                let word: String = chars[start..pos].iter().map(|(_, c)| *c).collect();
                let token = match word.as_str() {
                    "true" => Token::True,
                    "false" => Token::False,
                    _ => Token::Ident(word),
                };
                tokens.push((offset, token));
            }
            other => {
                return Err(EvaluationError::syntax(
                    offset,
                    format!("unexpected character '{}'", other),
                ));
            }
        }
    }

    Ok(tokens)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CompareOp {
    Eq,
    Ne,
    Match,
}

#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Str(String),
    Bool(bool),
    Reference(String),
    Not(Box<Expr>),
    All(Vec<Expr>),
    Any(Vec<Expr>),
    Compare(CompareOp, Box<Expr>, Box<Expr>),
}

/// Runtime value of an operand
enum Value {
    Str(String),
    Bool(bool),
}

impl Value {
    fn as_text(&self) -> &str {
        match self {
            Value::Str(s) => s,
            Value::Bool(true) => "true",
            Value::Bool(false) => "false",
        }
    }
}

impl Expr {
    fn check_references(&self, bindings: &Bindings) -> Result<(), EvaluationError> {
        match self {
            Expr::Str(_) | Expr::Bool(_) => Ok(()),
            Expr::Reference(name) => lookup(bindings, name)
                .map(|_| ())
                .ok_or_else(|| EvaluationError::UnresolvedReference(name.clone())),
            Expr::Not(inner) => inner.check_references(bindings),
            Expr::All(terms) | Expr::Any(terms) => terms
                .iter()
                .try_for_each(|term| term.check_references(bindings)),
            Expr::Compare(_, lhs, rhs) => {
                lhs.check_references(bindings)?;
                rhs.check_references(bindings)
            }
        }
    }

    fn value(&self, bindings: &Bindings) -> Result<Value, EvaluationError> {
        match self {
            Expr::Str(s) => Ok(Value::Str(s.clone())),
            Expr::Bool(b) => Ok(Value::Bool(*b)),
            Expr::Reference(name) => lookup(bindings, name)
                .map(|v| Value::Str(v.to_string()))
                .ok_or_else(|| EvaluationError::UnresolvedReference(name.clone())),
            _ => self.truth(bindings).map(Value::Bool),
        }
    }

    fn truth(&self, bindings: &Bindings) -> Result<bool, EvaluationError> {
        match self {
            Expr::Bool(b) => Ok(*b),
            Expr::Str(s) => parse_bool(s).ok_or_else(|| EvaluationError::TypeMismatch {
                subject: format!("'{}'", s),
                value: s.clone(),
            }),
            Expr::Reference(name) => {
                let value = lookup(bindings, name)
                    .ok_or_else(|| EvaluationError::UnresolvedReference(name.clone()))?;
                parse_bool(value).ok_or_else(|| EvaluationError::TypeMismatch {
                    subject: name.clone(),
                    value: value.to_string(),
                })
            }
            Expr::Not(inner) => Ok(!inner.truth(bindings)?),
            Expr::All(terms) => {
                for term in terms {
                    if !term.truth(bindings)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Expr::Any(terms) => {
                for term in terms {
                    if term.truth(bindings)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Expr::Compare(op, lhs, rhs) => {
                let left = lhs.value(bindings)?;
                let right = rhs.value(bindings)?;
                match op {
                    CompareOp::Eq => Ok(values_equal(&left, &right)),
                    CompareOp::Ne => Ok(!values_equal(&left, &right)),
                    CompareOp::Match => {
                        let pattern = right.as_text();
                        let re = Regex::new(pattern).map_err(|e| {
                            EvaluationError::InvalidPattern {
                                pattern: pattern.to_string(),
                                message: e.to_string(),
                            }
                        })?;
                        Ok(re.is_match(left.as_text()))
                    }
                }
            }
        }
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    if s.eq_ignore_ascii_case("true") {
        Some(true)
    } else if s.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// Booleans compare case-insensitively against text, strings compare exactly
fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Str(a), Value::Str(b)) => a == b,
        _ => left.as_text().eq_ignore_ascii_case(right.as_text()),
    }
}

struct Parser {
    tokens: Vec<(usize, Token)>,
    pos: usize,
    end: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(_, t)| t)
    }

    fn position(&self) -> usize {
        self.tokens.get(self.pos).map(|(p, _)| *p).unwrap_or(self.end)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|(_, t)| t.clone());
        self.pos += 1;
        token
    }

    /// Enter one nesting level, failing past [`MAX_NESTING`]
    fn descend(&mut self, position: usize) -> Result<(), EvaluationError> {
        self.depth += 1;
        if self.depth > MAX_NESTING {
            return Err(EvaluationError::syntax(
                position,
                "expression nested too deeply",
            ));
        }
        Ok(())
    }

    fn parse_or(&mut self) -> Result<Expr, EvaluationError> {
        let mut terms = vec![self.parse_and()?];
        while self.peek() == Some(&Token::Or) {
            self.advance();
            terms.push(self.parse_and()?);
        }
        Ok(if terms.len() == 1 {
            terms.remove(0)
        } else {
            Expr::Any(terms)
        })
    }

    fn parse_and(&mut self) -> Result<Expr, EvaluationError> {
        let mut terms = vec![self.parse_unary()?];
        while self.peek() == Some(&Token::And) {
            self.advance();
            terms.push(self.parse_unary()?);
        }
        Ok(if terms.len() == 1 {
            terms.remove(0)
        } else {
            Expr::All(terms)
        })
    }

    fn parse_unary(&mut self) -> Result<Expr, EvaluationError> {
        if self.peek() == Some(&Token::Not) {
            self.descend(self.position())?;
            self.advance();
            let inner = self.parse_unary()?;
            self.depth -= 1;
            return Ok(Expr::Not(Box::new(inner)));
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Expr, EvaluationError> {
        let lhs = self.parse_primary()?;
        let op = match self.peek() {
            Some(Token::Eq) => CompareOp::Eq,
            Some(Token::Ne) => CompareOp::Ne,
            Some(Token::Match) => CompareOp::Match,
            _ => return Ok(lhs),
        };
        self.advance();
        let rhs = self.parse_primary()?;
        Ok(Expr::Compare(op, Box::new(lhs), Box::new(rhs)))
    }

    fn parse_primary(&mut self) -> Result<Expr, EvaluationError> {
        let position = self.position();
        match self.advance() {
            Some(Token::Str(s)) => Ok(Expr::Str(s)),
            Some(Token::True) => Ok(Expr::Bool(true)),
            Some(Token::False) => Ok(Expr::Bool(false)),
            Some(Token::Ident(name)) => Ok(Expr::Reference(name)),
            Some(Token::LParen) => {
                self.descend(position)?;
                let expr = self.parse_or()?;
                let close = self.position();
                match self.advance() {
                    Some(Token::RParen) => {
                        self.depth -= 1;
                        Ok(expr)
                    }
                    _ => Err(EvaluationError::syntax(close, "expected ')'")),
                }
            }
            Some(token) => Err(EvaluationError::syntax(
                position,
                format!("unexpected {}", token.describe()),
            )),
            None => Err(EvaluationError::syntax(position, "unexpected end of expression")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bindings(pairs: &[(&str, &str)]) -> Bindings {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_empty_expression_is_true() {
        let b = Bindings::new();
        assert!(evaluate("", &b).unwrap());
        assert!(evaluate("   ", &b).unwrap());
        assert!(Condition::parse("").unwrap().is_unconditional());
    }

    #[test]
    fn test_string_equality() {
        let b = bindings(&[("RELEASE", "false"), ("os", "linux")]);
        assert!(!evaluate("env.RELEASE == 'true'", &b).unwrap());
        assert!(evaluate("env.RELEASE != 'true'", &b).unwrap());
        assert!(evaluate("os == \"linux\"", &b).unwrap());
        assert!(evaluate("matrix.os == 'linux'", &b).unwrap());
    }

    #[test]
    fn test_bool_comparison_is_case_insensitive() {
        let b = bindings(&[("CI", "TRUE")]);
        assert!(evaluate("CI == true", &b).unwrap());
        assert!(!evaluate("CI == false", &b).unwrap());
        // string literals stay exact
        assert!(!evaluate("CI == 'true'", &b).unwrap());
    }

    #[test]
    fn test_bare_reference_truthiness() {
        let b = bindings(&[("snapshot", "true"), ("name", "demo")]);
        assert!(evaluate("snapshot", &b).unwrap());
        assert!(!evaluate("!snapshot", &b).unwrap());
        assert!(matches!(
            evaluate("name", &b),
            Err(EvaluationError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_logic_and_precedence() {
        let b = bindings(&[("a", "true"), ("b", "false"), ("c", "true")]);
        assert!(evaluate("a || b && c", &b).unwrap());
        assert!(!evaluate("(a || b) && !c", &b).unwrap());
        assert!(evaluate("!(a && b)", &b).unwrap());
    }

    #[test]
    fn test_unresolved_reference_fails_despite_short_circuit() {
        let b = bindings(&[("a", "false"), ("t", "true")]);
        assert!(matches!(
            evaluate("a && missing", &b),
            Err(EvaluationError::UnresolvedReference(name)) if name == "missing"
        ));
        assert!(matches!(
            evaluate("t || matrix.missing == 'x'", &b),
            Err(EvaluationError::UnresolvedReference(name)) if name == "matrix.missing"
        ));
    }

    #[test]
    fn test_short_circuit_skips_type_check() {
        let b = bindings(&[("a", "false"), ("name", "demo")]);
        assert!(!evaluate("a && name", &b).unwrap());
        assert!(matches!(
            evaluate("!a && name", &b),
            Err(EvaluationError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_nesting_limit() {
        let b = bindings(&[("a", "true")]);
        let at_limit = format!("{}a{}", "(".repeat(MAX_NESTING), ")".repeat(MAX_NESTING));
        assert!(evaluate(&at_limit, &b).unwrap());
        let negated = format!("{}a", "!".repeat(MAX_NESTING));
        assert!(evaluate(&negated, &b).unwrap());

        let deep = format!("{}true{}", "(".repeat(5000), ")".repeat(5000));
        assert!(matches!(
            evaluate(&deep, &b),
            Err(EvaluationError::Syntax { position, message })
                if position == MAX_NESTING && message.contains("nested too deeply")
        ));
        assert!(matches!(
            evaluate(&"(".repeat(200_000), &b),
            Err(EvaluationError::Syntax { .. })
        ));
        assert!(matches!(
            evaluate(&"!".repeat(200_000), &b),
            Err(EvaluationError::Syntax { .. })
        ));
    }

    #[test]
    fn test_long_chains_stay_flat() {
        let b = bindings(&[("a", "true"), ("f", "false")]);
        let chain = vec!["a"; 100_000].join(" && ");
        assert!(evaluate(&chain, &b).unwrap());
        let alternatives = format!("{} || a", vec!["f"; 100_000].join(" || "));
        assert!(evaluate(&alternatives, &b).unwrap());
    }

    #[test]
    fn test_unresolved_reference() {
        let b = Bindings::new();
        assert_eq!(
            evaluate("env.RELEASE == 'true'", &b),
            Err(EvaluationError::UnresolvedReference("env.RELEASE".to_string()))
        );
    }

    #[test]
    fn test_dotted_name_wins_over_namespace() {
        let b = bindings(&[("env.MODE", "full"), ("MODE", "bare")]);
        assert!(evaluate("env.MODE == 'full'", &b).unwrap());
    }

    #[test]
    fn test_regex_match() {
        let b = bindings(&[("platform", "osx-aarch_64")]);
        assert!(evaluate("platform =~ '^osx-'", &b).unwrap());
        assert!(!evaluate("platform =~ 'linux'", &b).unwrap());
        assert!(matches!(
            evaluate("platform =~ '[bad'", &b),
            Err(EvaluationError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn test_escaped_quotes() {
        let b = bindings(&[("msg", "it's")]);
        assert!(evaluate(r"msg == 'it\'s'", &b).unwrap());
    }

    #[test]
    fn test_syntax_errors() {
        let b = Bindings::new();
        assert!(matches!(
            evaluate("a ==", &b),
            Err(EvaluationError::Syntax { .. })
        ));
        assert!(matches!(
            evaluate("(a", &b),
            Err(EvaluationError::Syntax { .. })
        ));
        assert!(matches!(
            evaluate("'open", &b),
            Err(EvaluationError::Syntax { position: 0, .. })
        ));
        assert!(matches!(
            evaluate("a b", &b),
            Err(EvaluationError::Syntax { position: 2, .. })
        ));
        assert!(matches!(
            evaluate("a = b", &b),
            Err(EvaluationError::Syntax { .. })
        ));
    }

    #[test]
    fn test_parsed_condition_is_reusable() {
        let condition = Condition::parse("os == 'linux'").unwrap();
        assert_eq!(condition.source(), "os == 'linux'");
        assert!(condition.evaluate(&bindings(&[("os", "linux")])).unwrap());
        assert!(!condition.evaluate(&bindings(&[("os", "osx")])).unwrap());
    }
}
