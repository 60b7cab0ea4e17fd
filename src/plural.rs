//! Plural-form rule compilation and evaluation.
//!
//! MO catalogs carry a C-like selection expression in the `Plural-Forms:`
//! metadata field, e.g. `nplurals=2; plural=n == 1 ? 0 : 1;`. This module
//! compiles that text into a small AST once per catalog and evaluates it per
//! lookup. The expression is never handed to any dynamic evaluation
//! facility; the grammar is fixed to integer literals, the variable `n`,
//! comparisons, `&&`/`||`, arithmetic, unary `!`/`-`, the ternary
//! conditional, and parentheses.
//!
//! Absent or unparseable rules fall back to the two-form default; a rule
//! failure is never an error.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Matches the `Plural-Forms:` field inside a catalog metadata block
    /// (the newline-separated `Key: value` header entry). Case-insensitive,
    /// and the field line must be newline-terminated.
    static ref PLURAL_FORMS_RE: Regex =
        Regex::new(r"(?i)(?:^|\n)plural-forms: ([^\n]*)\n").expect("valid plural-forms regex");
}

/// The fallback rule: two forms, form 0 for exactly one, form 1 otherwise.
pub const DEFAULT_RULE: &str = "nplurals=2; plural=n == 1 ? 0 : 1;";

/// Extracts the `Plural-Forms:` field value from a catalog metadata block,
/// or the default rule when the field is missing.
pub fn extract_plural_forms(metadata: &str) -> &str {
    PLURAL_FORMS_RE
        .captures(metadata)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .unwrap_or(DEFAULT_RULE)
}

/// Strips every character outside the rule allow-set so that unexpected
/// catalog input never reaches the expression compiler.
fn sanitize_expression(expr: &str) -> String {
    expr.chars()
        .filter(|c| c.is_ascii_alphanumeric() || "_:;()?|&=!<>+*/%-".contains(*c))
        .collect()
}

/// Rewrites ternary chains into fully parenthesized nested conditionals:
/// each `?` opens a group, each `:` closes and reopens one, and every `;`
/// closes all groups still pending. A trailing `;` is appended first so the
/// final statement is always closed.
fn parenthesize_ternaries(expr: &str) -> String {
    let mut out = String::with_capacity(expr.len() + 16);
    let mut pending = 0usize;
    for ch in expr.chars().chain(std::iter::once(';')) {
        match ch {
            '?' => {
                out.push_str(" ? (");
                pending += 1;
            }
            ':' => out.push_str(") : ("),
            ';' => {
                for _ in 0..pending {
                    out.push(')');
                }
                out.push(';');
                pending = 0;
            }
            c => out.push(c),
        }
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BinaryOp {
    Or,
    And,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UnaryOp {
    Not,
    Neg,
}

#[derive(Debug, Clone)]
enum Expr {
    Number(i64),
    Var,
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    Ternary(Box<Expr>, Box<Expr>, Box<Expr>),
}

impl Expr {
    /// Evaluates with C semantics: comparisons and boolean operators yield
    /// 0/1, any nonzero value is true. Division and remainder by zero
    /// evaluate to 0 instead of failing.
    fn eval(&self, n: i64) -> i64 {
        match self {
            Expr::Number(value) => *value,
            Expr::Var => n,
            Expr::Unary(op, inner) => {
                let value = inner.eval(n);
                match op {
                    UnaryOp::Not => i64::from(value == 0),
                    UnaryOp::Neg => value.wrapping_neg(),
                }
            }
            Expr::Binary(op, lhs, rhs) => {
                // Short-circuit the boolean operators before touching rhs.
                match op {
                    BinaryOp::Or => {
                        return i64::from(lhs.eval(n) != 0 || rhs.eval(n) != 0);
                    }
                    BinaryOp::And => {
                        return i64::from(lhs.eval(n) != 0 && rhs.eval(n) != 0);
                    }
                    _ => {}
                }
                let a = lhs.eval(n);
                let b = rhs.eval(n);
                match op {
                    BinaryOp::Eq => i64::from(a == b),
                    BinaryOp::Ne => i64::from(a != b),
                    BinaryOp::Lt => i64::from(a < b),
                    BinaryOp::Le => i64::from(a <= b),
                    BinaryOp::Gt => i64::from(a > b),
                    BinaryOp::Ge => i64::from(a >= b),
                    BinaryOp::Add => a.wrapping_add(b),
                    BinaryOp::Sub => a.wrapping_sub(b),
                    BinaryOp::Mul => a.wrapping_mul(b),
                    BinaryOp::Div => a.checked_div(b).unwrap_or(0),
                    BinaryOp::Rem => a.checked_rem(b).unwrap_or(0),
                    BinaryOp::Or | BinaryOp::And => unreachable!("handled above"),
                }
            }
            Expr::Ternary(cond, then, otherwise) => {
                if cond.eval(n) != 0 {
                    then.eval(n)
                } else {
                    otherwise.eval(n)
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    Number(i64),
    Var,
    Or,
    And,
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
    Not,
    Question,
    Colon,
    LParen,
    RParen,
}

fn tokenize(expr: &str) -> Option<Vec<Token>> {
    let bytes = expr.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        match b {
            b' ' | b'\t' => i += 1,
            b'0'..=b'9' => {
                let start = i;
                while i < bytes.len() && bytes[i].is_ascii_digit() {
                    i += 1;
                }
                let literal = &expr[start..i];
                tokens.push(Token::Number(literal.parse().ok()?));
            }
            b'n' => {
                tokens.push(Token::Var);
                i += 1;
            }
            b'|' => {
                if bytes.get(i + 1) != Some(&b'|') {
                    return None;
                }
                tokens.push(Token::Or);
                i += 2;
            }
            b'&' => {
                if bytes.get(i + 1) != Some(&b'&') {
                    return None;
                }
                tokens.push(Token::And);
                i += 2;
            }
            b'=' => {
                if bytes.get(i + 1) != Some(&b'=') {
                    return None;
                }
                tokens.push(Token::Eq);
                i += 2;
            }
            b'!' => {
                if bytes.get(i + 1) == Some(&b'=') {
                    tokens.push(Token::Ne);
                    i += 2;
                } else {
                    tokens.push(Token::Not);
                    i += 1;
                }
            }
            b'<' => {
                if bytes.get(i + 1) == Some(&b'=') {
                    tokens.push(Token::Le);
                    i += 2;
                } else {
                    tokens.push(Token::Lt);
                    i += 1;
                }
            }
            b'>' => {
                if bytes.get(i + 1) == Some(&b'=') {
                    tokens.push(Token::Ge);
                    i += 2;
                } else {
                    tokens.push(Token::Gt);
                    i += 1;
                }
            }
            b'+' => {
                tokens.push(Token::Plus);
                i += 1;
            }
            b'-' => {
                tokens.push(Token::Minus);
                i += 1;
            }
            b'*' => {
                tokens.push(Token::Star);
                i += 1;
            }
            b'/' => {
                tokens.push(Token::Slash);
                i += 1;
            }
            b'%' => {
                tokens.push(Token::Percent);
                i += 1;
            }
            b'?' => {
                tokens.push(Token::Question);
                i += 1;
            }
            b':' => {
                tokens.push(Token::Colon);
                i += 1;
            }
            b'(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            b')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            _ => return None,
        }
    }
    Some(tokens)
}

/// Recursive-descent parser over the fixed rule grammar. Precedence, lowest
/// first: ternary, `||`, `&&`, equality, relational, additive,
/// multiplicative, unary.
struct RuleParser<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> RuleParser<'a> {
    fn parse(tokens: &'a [Token]) -> Option<Expr> {
        let mut parser = RuleParser { tokens, pos: 0 };
        let expr = parser.ternary()?;
        if parser.pos == tokens.len() {
            Some(expr)
        } else {
            None
        }
    }

    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn eat(&mut self, expected: Token) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn ternary(&mut self) -> Option<Expr> {
        let cond = self.or()?;
        if !self.eat(Token::Question) {
            return Some(cond);
        }
        // Right-associative, as in C.
        let then = self.ternary()?;
        if !self.eat(Token::Colon) {
            return None;
        }
        let otherwise = self.ternary()?;
        Some(Expr::Ternary(
            Box::new(cond),
            Box::new(then),
            Box::new(otherwise),
        ))
    }

    fn or(&mut self) -> Option<Expr> {
        let mut lhs = self.and()?;
        while self.eat(Token::Or) {
            let rhs = self.and()?;
            lhs = Expr::Binary(BinaryOp::Or, Box::new(lhs), Box::new(rhs));
        }
        Some(lhs)
    }

    fn and(&mut self) -> Option<Expr> {
        let mut lhs = self.equality()?;
        while self.eat(Token::And) {
            let rhs = self.equality()?;
            lhs = Expr::Binary(BinaryOp::And, Box::new(lhs), Box::new(rhs));
        }
        Some(lhs)
    }

    fn equality(&mut self) -> Option<Expr> {
        let mut lhs = self.relational()?;
        loop {
            let op = match self.peek() {
                Some(Token::Eq) => BinaryOp::Eq,
                Some(Token::Ne) => BinaryOp::Ne,
                _ => return Some(lhs),
            };
            self.pos += 1;
            let rhs = self.relational()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
    }

    fn relational(&mut self) -> Option<Expr> {
        let mut lhs = self.additive()?;
        loop {
            let op = match self.peek() {
                Some(Token::Lt) => BinaryOp::Lt,
                Some(Token::Le) => BinaryOp::Le,
                Some(Token::Gt) => BinaryOp::Gt,
                Some(Token::Ge) => BinaryOp::Ge,
                _ => return Some(lhs),
            };
            self.pos += 1;
            let rhs = self.additive()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
    }

    fn additive(&mut self) -> Option<Expr> {
        let mut lhs = self.multiplicative()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Sub,
                _ => return Some(lhs),
            };
            self.pos += 1;
            let rhs = self.multiplicative()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
    }

    fn multiplicative(&mut self) -> Option<Expr> {
        let mut lhs = self.unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinaryOp::Mul,
                Some(Token::Slash) => BinaryOp::Div,
                Some(Token::Percent) => BinaryOp::Rem,
                _ => return Some(lhs),
            };
            self.pos += 1;
            let rhs = self.unary()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
    }

    fn unary(&mut self) -> Option<Expr> {
        if self.eat(Token::Not) {
            return Some(Expr::Unary(UnaryOp::Not, Box::new(self.unary()?)));
        }
        if self.eat(Token::Minus) {
            return Some(Expr::Unary(UnaryOp::Neg, Box::new(self.unary()?)));
        }
        self.primary()
    }

    fn primary(&mut self) -> Option<Expr> {
        match self.peek()? {
            Token::Number(value) => {
                self.pos += 1;
                Some(Expr::Number(value))
            }
            Token::Var => {
                self.pos += 1;
                Some(Expr::Var)
            }
            Token::LParen => {
                self.pos += 1;
                let inner = self.ternary()?;
                if self.eat(Token::RParen) {
                    Some(inner)
                } else {
                    None
                }
            }
            _ => None,
        }
    }
}

/// A compiled plural-selection rule: the `nplurals` bound plus the
/// expression mapping a cardinal number to a zero-based form index.
#[derive(Debug, Clone)]
pub struct PluralRule {
    nplurals: i64,
    expr: Expr,
}

impl Default for PluralRule {
    /// Two forms, form 0 for `n == 1`, form 1 otherwise.
    fn default() -> Self {
        PluralRule {
            nplurals: 2,
            expr: Expr::Ternary(
                Box::new(Expr::Binary(
                    BinaryOp::Eq,
                    Box::new(Expr::Var),
                    Box::new(Expr::Number(1)),
                )),
                Box::new(Expr::Number(0)),
                Box::new(Expr::Number(1)),
            ),
        }
    }
}

impl PluralRule {
    /// Compiles a raw `Plural-Forms:` value like
    /// `nplurals=3; plural=n%10==1 && n%100!=11 ? 0 : ...;`.
    ///
    /// Returns `None` when the text does not contain both a positive
    /// `nplurals` and a parseable `plural` expression.
    pub fn parse(rule: &str) -> Option<Self> {
        let sanitized = sanitize_expression(rule);
        let rewritten = parenthesize_ternaries(&sanitized);

        let mut nplurals = None;
        let mut expr = None;
        for statement in rewritten.split(';') {
            let statement = statement.trim();
            if let Some(rest) = statement.strip_prefix("nplurals=") {
                let tokens = tokenize(rest)?;
                nplurals = Some(RuleParser::parse(&tokens)?.eval(0));
            } else if let Some(rest) = statement.strip_prefix("plural=") {
                let tokens = tokenize(rest)?;
                expr = Some(RuleParser::parse(&tokens)?);
            }
        }

        let nplurals = nplurals.filter(|&count| count >= 1)?;
        Some(PluralRule {
            nplurals,
            expr: expr?,
        })
    }

    /// Builds a rule from a full catalog metadata block, falling back to the
    /// default rule when the field is absent or unparseable.
    pub fn from_metadata(metadata: &str) -> Self {
        PluralRule::parse(extract_plural_forms(metadata)).unwrap_or_default()
    }

    /// The number of plural forms this rule selects between.
    pub fn nplurals(&self) -> usize {
        self.nplurals as usize
    }

    /// Maps a cardinal number to a form index, always within
    /// `[0, nplurals - 1]`.
    pub fn select(&self, n: u64) -> usize {
        let n = i64::try_from(n).unwrap_or(i64::MAX);
        self.expr.eval(n).clamp(0, self.nplurals - 1) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RUSSIAN: &str = "nplurals=3; plural=n%10==1 && n%100!=11 ? 0 : \
                           n%10>=2 && n%10<=4 && (n%100<10 || n%100>=20) ? 1 : 2;";

    #[test]
    fn test_extract_plural_forms_field() {
        let metadata = "Project-Id-Version: demo\nPlural-Forms: nplurals=1; plural=0;\n\
                        Content-Type: text/plain; charset=UTF-8\n";
        assert_eq!(extract_plural_forms(metadata), "nplurals=1; plural=0;");
    }

    #[test]
    fn test_extract_plural_forms_is_case_insensitive() {
        let metadata = "plural-forms: nplurals=1; plural=0;\n";
        assert_eq!(extract_plural_forms(metadata), "nplurals=1; plural=0;");
    }

    #[test]
    fn test_extract_plural_forms_defaults_when_absent() {
        assert_eq!(
            extract_plural_forms("Content-Type: text/plain\n"),
            DEFAULT_RULE
        );
    }

    #[test]
    fn test_sanitize_strips_disallowed_characters() {
        assert_eq!(
            sanitize_expression("nplurals=2; plural=n == 1 ? 0 : 1; system(\"rm\")"),
            "nplurals=2;plural=n==1?0:1;system(rm)"
        );
    }

    #[test]
    fn test_parenthesize_nested_ternaries() {
        assert_eq!(
            parenthesize_ternaries("n==1?0:n==2?1:2"),
            "n==1 ? (0) : (n==2 ? (1) : (2));"
        );
    }

    #[test]
    fn test_default_rule_selection() {
        let rule = PluralRule::default();
        assert_eq!(rule.nplurals(), 2);
        assert_eq!(rule.select(0), 1);
        assert_eq!(rule.select(1), 0);
        assert_eq!(rule.select(2), 1);
    }

    #[test]
    fn test_parse_english_rule() {
        let rule = PluralRule::parse("nplurals=2; plural=n==1 ? 0 : 1;").unwrap();
        assert_eq!(rule.select(1), 0);
        assert_eq!(rule.select(5), 1);
    }

    #[test]
    fn test_parse_single_form_rule() {
        let rule = PluralRule::parse("nplurals=1; plural=0;").unwrap();
        for n in 0..20 {
            assert_eq!(rule.select(n), 0);
        }
    }

    #[test]
    fn test_russian_rule_boundaries() {
        let rule = PluralRule::parse(RUSSIAN).unwrap();
        assert_eq!(rule.nplurals(), 3);
        assert_eq!(rule.select(1), 0);
        assert_eq!(rule.select(2), 1);
        assert_eq!(rule.select(5), 2);
        assert_eq!(rule.select(11), 2);
        assert_eq!(rule.select(21), 0);
        assert_eq!(rule.select(22), 1);
        assert_eq!(rule.select(25), 2);
        assert_eq!(rule.select(111), 2);
    }

    #[test]
    fn test_select_clamps_to_nplurals() {
        // Rule that dishonestly returns indexes past its own bound.
        let rule = PluralRule::parse("nplurals=2; plural=n;").unwrap();
        assert_eq!(rule.select(0), 0);
        assert_eq!(rule.select(1), 1);
        assert_eq!(rule.select(7), 1);
    }

    #[test]
    fn test_select_clamps_negative_results() {
        let rule = PluralRule::parse("nplurals=2; plural=0-1;").unwrap();
        assert_eq!(rule.select(3), 0);
    }

    #[test]
    fn test_unparseable_rule_falls_back_to_default() {
        assert!(PluralRule::parse("plural=n==1?0:1;").is_none());
        assert!(PluralRule::parse("nplurals=0; plural=0;").is_none());
        assert!(PluralRule::parse("nonsense").is_none());
        let rule = PluralRule::from_metadata("Plural-Forms: nonsense\n");
        assert_eq!(rule.select(1), 0);
        assert_eq!(rule.select(2), 1);
    }

    #[test]
    fn test_division_by_zero_evaluates_to_zero() {
        let rule = PluralRule::parse("nplurals=2; plural=n/0;").unwrap();
        assert_eq!(rule.select(10), 0);
    }

    #[test]
    fn test_from_metadata_with_real_header_block() {
        let metadata = "Project-Id-Version: demo 1.0\n\
                        Content-Type: text/plain; charset=UTF-8\n\
                        Plural-Forms: nplurals=3; plural=n%10==1 && n%100!=11 ? 0 : \
                        n%10>=2 && n%10<=4 && (n%100<10 || n%100>=20) ? 1 : 2;\n";
        let rule = PluralRule::from_metadata(metadata);
        assert_eq!(rule.nplurals(), 3);
        assert_eq!(rule.select(21), 0);
    }
}
