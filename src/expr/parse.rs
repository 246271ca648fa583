use crate::error::{Error, Result};

// ── AST ────────────────────────────────────────────────────────

/// Names an expression may refer to. Resolved while parsing, so evaluation
/// never sees an unknown identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Var {
    /// `t` → `DSEC`
    Time,
    /// `E`, `pH` → `ELE`
    Electrode,
    /// `T` → `TEMP`
    Temperature,
    /// `V` → `VOL`
    Volume,
    /// `C` → `CONC`
    Concentration,
    /// `S`, the selected spectral matrix
    Spectrum,
    /// bare `A`, the full absorbance column
    Absorbance,
}

impl Var {
    fn lookup(name: &str) -> Option<Var> {
        Some(match name {
            "t" => Var::Time,
            "E" | "pH" => Var::Electrode,
            "T" => Var::Temperature,
            "V" => Var::Volume,
            "C" => Var::Concentration,
            "S" => Var::Spectrum,
            "A" => Var::Absorbance,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UnaryOp {
    Neg,
    Plus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

impl BinOp {
    pub(crate) fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Pow => "^",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Func {
    /// `A(lmin, lmax)` or `A()`
    Absorbance,
    Min,
    Max,
    ArgMin,
    ArgMax,
    Mean,
    Sum,
    Len,
    Abs,
    Sqrt,
    Log,
    Log10,
    Exp,
    Pow,
    /// wavelength column of a matrix
    Wl,
    /// absorbance column of a matrix
    Ab,
}

impl Func {
    fn lookup(name: &str) -> Option<Func> {
        Some(match name {
            "A" => Func::Absorbance,
            "min" => Func::Min,
            "max" => Func::Max,
            "argmin" => Func::ArgMin,
            "argmax" => Func::ArgMax,
            "mean" => Func::Mean,
            "sum" => Func::Sum,
            "len" => Func::Len,
            "abs" => Func::Abs,
            "sqrt" => Func::Sqrt,
            "log" => Func::Log,
            "log10" => Func::Log10,
            "exp" => Func::Exp,
            "pow" => Func::Pow,
            "wl" => Func::Wl,
            "ab" => Func::Ab,
            _ => return None,
        })
    }

    pub(crate) fn name(self) -> &'static str {
        match self {
            Func::Absorbance => "A",
            Func::Min => "min",
            Func::Max => "max",
            Func::ArgMin => "argmin",
            Func::ArgMax => "argmax",
            Func::Mean => "mean",
            Func::Sum => "sum",
            Func::Len => "len",
            Func::Abs => "abs",
            Func::Sqrt => "sqrt",
            Func::Log => "log",
            Func::Log10 => "log10",
            Func::Exp => "exp",
            Func::Pow => "pow",
            Func::Wl => "wl",
            Func::Ab => "ab",
        }
    }

    fn accepts(self, n: usize) -> bool {
        match self {
            Func::Absorbance => n == 0 || n == 2,
            Func::Min | Func::Max => n >= 1,
            Func::Pow => n == 2,
            _ => n == 1,
        }
    }

    fn arity(self) -> &'static str {
        match self {
            Func::Absorbance => "0 or 2 arguments",
            Func::Min | Func::Max => "at least 1 argument",
            Func::Pow => "2 arguments",
            _ => "1 argument",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Expr {
    Number(f64),
    Var(Var),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinOp, Box<Expr>, Box<Expr>),
    Call(Func, Vec<Expr>),
    Index(Box<Expr>, Box<Expr>),
}

// ── Tokens ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
enum TokenKind {
    Num(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
}

#[derive(Debug, Clone, PartialEq)]
struct Token {
    kind: TokenKind,
    /// byte offset of the first character
    start: usize,
}

/// Byte offset → 1-based column. Input is ASCII by the time this is called.
fn syntax_err(start: usize, message: impl Into<String>) -> Error {
    Error::Syntax {
        column: start + 1,
        message: message.into(),
    }
}

fn tokenize(input: &str) -> Result<Vec<Token>> {
    if let Some((start, ch)) = input.char_indices().find(|(_, ch)| !ch.is_ascii()) {
        let message = format!("unexpected character '{ch}'");
        return Err(syntax_err(start, message));
    }

    let bytes = input.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        if b.is_ascii_whitespace() {
            i += 1;
            continue;
        }

        let start = i;
        let kind = match b {
            b'+' => TokenKind::Plus,
            b'-' => TokenKind::Minus,
            b'*' if bytes.get(i + 1) == Some(&b'*') => {
                i += 1;
                TokenKind::Caret
            }
            b'*' => TokenKind::Star,
            b'/' => TokenKind::Slash,
            b'^' => TokenKind::Caret,
            b'(' => TokenKind::LParen,
            b')' => TokenKind::RParen,
            b'[' => TokenKind::LBracket,
            b']' => TokenKind::RBracket,
            b',' => TokenKind::Comma,
            b'0'..=b'9' | b'.' => {
                while i + 1 < bytes.len() {
                    let c = bytes[i + 1];
                    let after_exponent = matches!(bytes[i], b'e' | b'E');
                    let exponent_sign = after_exponent && matches!(c, b'+' | b'-');
                    if c.is_ascii_digit() || matches!(c, b'.' | b'e' | b'E') || exponent_sign {
                        i += 1;
                    } else {
                        break;
                    }
                }
                let text = &input[start..=i];
                let n = text
                    .parse::<f64>()
                    .map_err(|_| syntax_err(start, format!("invalid number '{text}'")))?;
                TokenKind::Num(n)
            }
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => {
                while i + 1 < bytes.len()
                    && (bytes[i + 1].is_ascii_alphanumeric() || bytes[i + 1] == b'_')
                {
                    i += 1;
                }
                TokenKind::Ident(input[start..=i].to_string())
            }
            other => {
                return Err(syntax_err(
                    start,
                    format!("unexpected character '{}'", other as char),
                ))
            }
        };
        tokens.push(Token { kind, start });
        i += 1;
    }

    Ok(tokens)
}

// ── Parser (recursive descent) ─────────────────────────────────

/// Deepest nesting of parentheses, calls, subscripts and prefix signs.
const MAX_DEPTH: usize = 64;

/// Most operator, call and subscript nodes in one expression. Bounds the
/// height of the tree, which evaluation and drop walk recursively.
const MAX_NODES: usize = 1024;

/// Parse one expression into its AST.
pub(crate) fn parse(input: &str) -> Result<Expr> {
    let tokens = tokenize(input)?;
    let mut parser = Parser {
        input,
        tokens: &tokens,
        pos: 0,
        depth: 0,
        nodes: 0,
    };
    let expr = parser.parse_expr()?;
    if let Some(t) = parser.peek() {
        let message = format!("unexpected {} after expression", describe(&t.kind));
        return Err(syntax_err(t.start, message));
    }
    Ok(expr)
}

fn describe(kind: &TokenKind) -> String {
    match kind {
        TokenKind::Num(n) => format!("number {n}"),
        TokenKind::Ident(name) => format!("'{name}'"),
        TokenKind::Plus => "'+'".into(),
        TokenKind::Minus => "'-'".into(),
        TokenKind::Star => "'*'".into(),
        TokenKind::Slash => "'/'".into(),
        TokenKind::Caret => "'^'".into(),
        TokenKind::LParen => "'('".into(),
        TokenKind::RParen => "')'".into(),
        TokenKind::LBracket => "'['".into(),
        TokenKind::RBracket => "']'".into(),
        TokenKind::Comma => "','".into(),
    }
}

struct Parser<'a> {
    input: &'a str,
    tokens: &'a [Token],
    pos: usize,
    depth: usize,
    nodes: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn peek_kind(&self) -> Option<&'a TokenKind> {
        self.peek().map(|t| &t.kind)
    }

    fn advance(&mut self) -> Option<&'a Token> {
        let t = self.tokens.get(self.pos);
        if t.is_some() {
            self.pos += 1;
        }
        t
    }

    /// Byte offset of the next token, or of the end of input.
    fn offset(&self) -> usize {
        self.peek().map_or(self.input.len(), |t| t.start)
    }

    fn end_of_input(&self, expected: &str) -> Error {
        syntax_err(
            self.input.len(),
            format!("expected {expected}, got end of input"),
        )
    }

    /// Run `rule` one nesting level deeper.
    fn nested<T>(&mut self, rule: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        if self.depth == MAX_DEPTH {
            let at = self.offset();
            return Err(syntax_err(at, "expression nested too deeply"));
        }
        self.depth += 1;
        let result = rule(self);
        self.depth -= 1;
        result
    }

    /// Count one inner node of the tree; `start` is the token that built it.
    fn grow(&mut self, start: usize) -> Result<()> {
        self.nodes += 1;
        if self.nodes > MAX_NODES {
            return Err(syntax_err(start, "expression too long"));
        }
        Ok(())
    }

    fn expect(&mut self, expected: TokenKind) -> Result<()> {
        match self.advance() {
            Some(t) if t.kind == expected => Ok(()),
            Some(t) => {
                let got = describe(&t.kind);
                let message = format!("expected {}, got {got}", describe(&expected));
                Err(syntax_err(t.start, message))
            }
            None => Err(self.end_of_input(&describe(&expected))),
        }
    }

    // ── Grammar rules ──────────────────────────────────────────

    fn parse_expr(&mut self) -> Result<Expr> {
        let mut lhs = self.parse_term()?;
        loop {
            let op = match self.peek_kind() {
                Some(TokenKind::Plus) => BinOp::Add,
                Some(TokenKind::Minus) => BinOp::Sub,
                _ => break,
            };
            let start = self.offset();
            self.advance();
            self.grow(start)?;
            let rhs = self.parse_term()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_term(&mut self) -> Result<Expr> {
        let mut lhs = self.parse_power()?;
        loop {
            let op = match self.peek_kind() {
                Some(TokenKind::Star) => BinOp::Mul,
                Some(TokenKind::Slash) => BinOp::Div,
                _ => break,
            };
            let start = self.offset();
            self.advance();
            self.grow(start)?;
            let rhs = self.parse_power()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    // `-2^2` is -(2^2) and `2^-1` is allowed, as in most calculators.
    fn parse_power(&mut self) -> Result<Expr> {
        let base = self.parse_unary()?;
        self.parse_exponent(base)
    }

    /// `base ^ rhs` if a caret follows, else `base` unchanged.
    fn parse_exponent(&mut self, base: Expr) -> Result<Expr> {
        if !matches!(self.peek_kind(), Some(TokenKind::Caret)) {
            return Ok(base);
        }
        let start = self.offset();
        self.advance();
        self.grow(start)?;
        let exponent = Box::new(self.nested(Self::parse_power_rhs)?);
        Ok(Expr::Binary(BinOp::Pow, Box::new(base), exponent))
    }

    fn parse_power_rhs(&mut self) -> Result<Expr> {
        match self.peek_kind() {
            Some(TokenKind::Minus) => {
                let start = self.offset();
                self.advance();
                self.grow(start)?;
                let e = self.nested(Self::parse_power_rhs)?;
                Ok(Expr::Unary(UnaryOp::Neg, Box::new(e)))
            }
            Some(TokenKind::Plus) => {
                self.advance();
                self.nested(Self::parse_power_rhs)
            }
            _ => {
                let base = self.parse_postfix()?;
                self.parse_exponent(base)
            }
        }
    }

    fn parse_unary(&mut self) -> Result<Expr> {
        let op = match self.peek_kind() {
            Some(TokenKind::Minus) => UnaryOp::Neg,
            Some(TokenKind::Plus) => UnaryOp::Plus,
            _ => return self.parse_postfix(),
        };
        let start = self.offset();
        self.advance();
        self.grow(start)?;
        let e = self.nested(Self::parse_power)?;
        Ok(Expr::Unary(op, Box::new(e)))
    }

    fn parse_postfix(&mut self) -> Result<Expr> {
        let mut e = self.parse_atom()?;
        while matches!(self.peek_kind(), Some(TokenKind::LBracket)) {
            let start = self.offset();
            self.advance();
            self.grow(start)?;
            let index = self.nested(Self::parse_expr)?;
            self.expect(TokenKind::RBracket)?;
            e = Expr::Index(Box::new(e), Box::new(index));
        }
        Ok(e)
    }

    fn parse_atom(&mut self) -> Result<Expr> {
        let Some(token) = self.advance() else {
            return Err(self.end_of_input("expression"));
        };
        match &token.kind {
            TokenKind::Num(n) => Ok(Expr::Number(*n)),
            TokenKind::LParen => {
                let e = self.nested(Self::parse_expr)?;
                self.expect(TokenKind::RParen)?;
                Ok(e)
            }
            TokenKind::Ident(name) => {
                if matches!(self.peek_kind(), Some(TokenKind::LParen)) {
                    self.advance();
                    self.grow(token.start)?;
                    self.nested(|p| p.parse_call(name, token.start))
                } else {
                    Var::lookup(name)
                        .map(Expr::Var)
                        .ok_or_else(|| Error::UnknownVariable {
                            name: name.clone(),
                            column: token.start + 1,
                        })
                }
            }
            other => Err(syntax_err(
                token.start,
                format!("expected number, name or '(', got {}", describe(other)),
            )),
        }
    }

    fn parse_call(&mut self, name: &str, start: usize) -> Result<Expr> {
        let Some(func) = Func::lookup(name) else {
            let message = if Var::lookup(name).is_some() {
                format!("'{name}' is a variable, not a function")
            } else {
                format!("unknown function '{name}'")
            };
            return Err(syntax_err(start, message));
        };

        let mut args = Vec::new();
        if !matches!(self.peek_kind(), Some(TokenKind::RParen)) {
            args.push(self.parse_expr()?);
            while matches!(self.peek_kind(), Some(TokenKind::Comma)) {
                self.advance();
                args.push(self.parse_expr()?);
            }
        }
        self.expect(TokenKind::RParen)?;

        if !func.accepts(args.len()) {
            let (name, arity) = (func.name(), func.arity());
            let message = format!("{name}() takes {arity}, got {}", args.len());
            return Err(syntax_err(start, message));
        }
        Ok(Expr::Call(func, args))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(n: f64) -> Box<Expr> {
        Box::new(Expr::Number(n))
    }

    #[test]
    fn precedence_and_associativity() {
        let product = Expr::Binary(BinOp::Mul, num(2.0), num(3.0));
        assert_eq!(
            parse("1 + 2 * 3").unwrap(),
            Expr::Binary(BinOp::Add, num(1.0), Box::new(product))
        );

        let difference = Expr::Binary(BinOp::Sub, num(8.0), num(2.0));
        assert_eq!(
            parse("8 - 2 - 1").unwrap(),
            Expr::Binary(BinOp::Sub, Box::new(difference), num(1.0))
        );

        let power = Expr::Binary(BinOp::Pow, num(3.0), num(2.0));
        assert_eq!(
            parse("2 ^ 3 ** 2").unwrap(),
            Expr::Binary(BinOp::Pow, num(2.0), Box::new(power))
        );

        let square = Expr::Binary(BinOp::Pow, num(2.0), num(2.0));
        assert_eq!(
            parse("-2^2").unwrap(),
            Expr::Unary(UnaryOp::Neg, Box::new(square))
        );
    }

    #[test]
    fn variables_and_aliases() {
        assert_eq!(parse("pH").unwrap(), Expr::Var(Var::Electrode));
        assert_eq!(parse("E").unwrap(), Expr::Var(Var::Electrode));
        assert_eq!(parse("A").unwrap(), Expr::Var(Var::Absorbance));
        let bounds = vec![Expr::Number(500.0), Expr::Number(510.0)];
        assert_eq!(
            parse("A(500, 510)").unwrap(),
            Expr::Call(Func::Absorbance, bounds)
        );
    }

    #[test]
    fn numbers_with_exponents() {
        assert_eq!(parse("1.5e-3").unwrap(), Expr::Number(1.5e-3));
        assert_eq!(parse(".5").unwrap(), Expr::Number(0.5));
        assert!(matches!(
            parse("1.2.3"),
            Err(Error::Syntax { column: 1, .. })
        ));
    }

    #[test]
    fn indexing_chains() {
        let inner = Expr::Index(Box::new(Expr::Var(Var::Spectrum)), num(0.0));
        assert_eq!(
            parse("S[0][1]").unwrap(),
            Expr::Index(Box::new(inner), num(1.0))
        );
    }

    #[test]
    fn unknown_identifiers_are_rejected() {
        match parse("t + x") {
            Err(Error::UnknownVariable { name, column }) => {
                assert_eq!(name, "x");
                assert_eq!(column, 5);
            }
            other => panic!("expected UnknownVariable, got {other:?}"),
        }
        assert!(matches!(
            parse("__import__"),
            Err(Error::UnknownVariable { .. })
        ));
    }

    #[test]
    fn constructs_outside_the_grammar_are_rejected() {
        for bad in [
            "1 +",
            "(1",
            "1 2",
            "t = 3",
            "open('x')",
            "A(500)",
            "pow(2)",
            "t(1)",
            "max()",
            "S[0",
            "a.b",
            "1;2",
            "λ",
        ] {
            assert!(
                matches!(
                    parse(bad),
                    Err(Error::Syntax { .. }) | Err(Error::UnknownVariable { .. })
                ),
                "{bad} should not parse"
            );
        }
    }

    #[test]
    fn syntax_errors_point_at_the_column() {
        match parse("t + * 2") {
            Err(Error::Syntax { column, .. }) => assert_eq!(column, 5),
            other => panic!("expected Syntax, got {other:?}"),
        }
        match parse("1 +") {
            Err(Error::Syntax { column, message }) => {
                assert_eq!(column, 4);
                assert!(message.contains("end of input"));
            }
            other => panic!("expected Syntax, got {other:?}"),
        }
    }

    fn nested_parens(levels: usize) -> String {
        format!("{}1{}", "(".repeat(levels), ")".repeat(levels))
    }

    #[test]
    fn nesting_is_bounded() {
        let deepest = parse(&nested_parens(MAX_DEPTH)).unwrap();
        assert_eq!(deepest, Expr::Number(1.0));

        for input in [
            nested_parens(MAX_DEPTH + 1),
            nested_parens(5000),
            format!("{}t", "-".repeat(5000)),
            format!("2{}", "^-2".repeat(5000)),
            format!("{}0{}", "S[".repeat(5000), "]".repeat(5000)),
            format!("{}1{}", "abs(".repeat(5000), ")".repeat(5000)),
        ] {
            match parse(&input) {
                Err(Error::Syntax { message, .. }) => {
                    assert_eq!(message, "expression nested too deeply")
                }
                other => panic!("expected Syntax, got {other:?}"),
            }
        }
    }

    #[test]
    fn long_chains_are_bounded() {
        let ok = vec!["1"; MAX_NODES + 1].join("+");
        assert!(parse(&ok).is_ok());

        for input in [
            vec!["1"; MAX_NODES + 2].join("+"),
            vec!["1"; 200_000].join("+"),
            vec!["t"; 200_000].join(" * "),
        ] {
            match parse(&input) {
                Err(Error::Syntax { message, .. }) => assert_eq!(message, "expression too long"),
                other => panic!("expected Syntax, got {other:?}"),
            }
        }
    }
}
