use crate::errors::ParseError;
use phf::phf_map;

/// Reserved words. Anything in this table can never lex as an identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kw {
    Fn,
    Let,
    Return,
    Int,
    Bool,
    String,
    Float,
    Tuple,
    Array,
    List,
    Read,
    Write,
    If,
    Else,
    Elif,
    Unless,
    Case,
    Of,
    Default,
    While,
    For,
    Do,
    In,
    Head,
    Tail,
    True,
    False,
}

static KEYWORDS: phf::Map<&'static str, Kw> = phf_map! {
    "fn" => Kw::Fn,
    "let" => Kw::Let,
    "return" => Kw::Return,
    "int" => Kw::Int,
    "bool" => Kw::Bool,
    "string" => Kw::String,
    "float" => Kw::Float,
    "tuple" => Kw::Tuple,
    "array" => Kw::Array,
    "list" => Kw::List,
    "read" => Kw::Read,
    "write" => Kw::Write,
    "if" => Kw::If,
    "else" => Kw::Else,
    "elif" => Kw::Elif,
    "unless" => Kw::Unless,
    "case" => Kw::Case,
    "of" => Kw::Of,
    "default" => Kw::Default,
    "while" => Kw::While,
    "for" => Kw::For,
    "do" => Kw::Do,
    "in" => Kw::In,
    "head" => Kw::Head,
    "tail" => Kw::Tail,
    "true" => Kw::True,
    "false" => Kw::False,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Ident,
    IntLit,
    FloatLit,
    StrLit,
    Keyword(Kw),
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Semi,
    Colon,
    Pipe,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Caret,
    Prepend, // ^:
    Append,  // $:
    EqEq,
    NotEq,
    AndAnd,
    OrOr,
    Bang,
    Assign,
    Arrow, // ->
    Lt,
    Gt,
    Eof,
}

/// `text` is the raw lexeme; string literals keep their quotes and escape
/// sequences so the listing can echo the source spelling.
#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub line: usize,
}

struct Lexer<'a> {
    src: &'a [u8],
    pos: usize,
    line: usize,
}

impl<'a> Lexer<'a> {
    fn peek(&self) -> Option<u8> {
        self.src.get(self.pos).copied()
    }

    fn peek_at(&self, off: usize) -> Option<u8> {
        self.src.get(self.pos + off).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.pos += 1;
        if b == b'\n' {
            self.line += 1;
        }
        Some(b)
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError::new(self.line, message)
    }

    fn token(&self, kind: TokenKind, text: &str) -> Token {
        Token {
            kind,
            text: text.to_owned(),
            line: self.line,
        }
    }

    fn lex_string(&mut self) -> Result<Token, ParseError> {
        let start = self.pos;
        let start_line = self.line;
        self.bump(); // opening quote
        loop {
            match self.bump() {
                None => return Err(ParseError::new(start_line, "unterminated string literal")),
                Some(b'\\') => {
                    if self.bump().is_none() {
                        return Err(ParseError::new(start_line, "unterminated string literal"));
                    }
                }
                Some(b'"') => break,
                Some(_) => {}
            }
        }
        let text = std::str::from_utf8(&self.src[start..self.pos])
            .map_err(|_| ParseError::new(start_line, "invalid UTF-8 in string literal"))?;
        Ok(Token {
            kind: TokenKind::StrLit,
            text: text.to_owned(),
            line: start_line,
        })
    }

    fn lex_number(&mut self) -> Token {
        let start = self.pos;
        while self.peek().is_some_and(|b| b.is_ascii_digit()) {
            self.bump();
        }
        let mut kind = TokenKind::IntLit;
        if self.peek() == Some(b'.') && self.peek_at(1).is_some_and(|b| b.is_ascii_digit()) {
            self.bump();
            while self.peek().is_some_and(|b| b.is_ascii_digit()) {
                self.bump();
            }
            kind = TokenKind::FloatLit;
        }
        let text = std::str::from_utf8(&self.src[start..self.pos]).unwrap_or_default();
        self.token(kind, text)
    }

    fn lex_word(&mut self) -> Token {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|b| b == b'_' || b.is_ascii_alphanumeric())
        {
            self.bump();
        }
        let text = std::str::from_utf8(&self.src[start..self.pos]).unwrap_or_default();
        match KEYWORDS.get(text) {
            Some(&kw) => self.token(TokenKind::Keyword(kw), text),
            None => self.token(TokenKind::Ident, text),
        }
    }
}

pub fn tokenize(src: &str) -> Result<Vec<Token>, ParseError> {
    let mut lx = Lexer {
        src: src.as_bytes(),
        pos: 0,
        line: 1,
    };
    let mut out = Vec::new();

    while let Some(b) = lx.peek() {
        match b {
            b' ' | b'\t' | b'\r' | b'\n' => {
                lx.bump();
            }
            b'"' => out.push(lx.lex_string()?),
            b'0'..=b'9' => out.push(lx.lex_number()),
            b'_' | b'a'..=b'z' | b'A'..=b'Z' => out.push(lx.lex_word()),
            _ => {
                let two = (b, lx.peek_at(1));
                let (kind, text): (TokenKind, &str) = match two {
                    (b'^', Some(b':')) => (TokenKind::Prepend, "^:"),
                    (b'$', Some(b':')) => (TokenKind::Append, "$:"),
                    (b'=', Some(b'=')) => (TokenKind::EqEq, "=="),
                    (b'!', Some(b'=')) => (TokenKind::NotEq, "!="),
                    (b'&', Some(b'&')) => (TokenKind::AndAnd, "&&"),
                    (b'|', Some(b'|')) => (TokenKind::OrOr, "||"),
                    (b'-', Some(b'>')) => (TokenKind::Arrow, "->"),
                    (b'(', _) => (TokenKind::LParen, "("),
                    (b')', _) => (TokenKind::RParen, ")"),
                    (b'{', _) => (TokenKind::LBrace, "{"),
                    (b'}', _) => (TokenKind::RBrace, "}"),
                    (b'[', _) => (TokenKind::LBracket, "["),
                    (b']', _) => (TokenKind::RBracket, "]"),
                    (b',', _) => (TokenKind::Comma, ","),
                    (b';', _) => (TokenKind::Semi, ";"),
                    (b':', _) => (TokenKind::Colon, ":"),
                    (b'|', _) => (TokenKind::Pipe, "|"),
                    (b'+', _) => (TokenKind::Plus, "+"),
                    (b'-', _) => (TokenKind::Minus, "-"),
                    (b'*', _) => (TokenKind::Star, "*"),
                    (b'/', _) => (TokenKind::Slash, "/"),
                    (b'%', _) => (TokenKind::Percent, "%"),
                    (b'^', _) => (TokenKind::Caret, "^"),
                    (b'!', _) => (TokenKind::Bang, "!"),
                    (b'=', _) => (TokenKind::Assign, "="),
                    (b'<', _) => (TokenKind::Lt, "<"),
                    (b'>', _) => (TokenKind::Gt, ">"),
                    _ => {
                        return Err(lx.error(format!("unexpected character '{}'", b as char)));
                    }
                };
                out.push(lx.token(kind, text));
                lx.pos += text.len();
            }
        }
    }

    let eof_line = lx.line;
    out.push(Token {
        kind: TokenKind::Eof,
        text: String::new(),
        line: eof_line,
    });
    Ok(out)
}

#[test]
fn keywords_never_lex_as_identifiers() {
    let toks = tokenize("let letter fn fnord").unwrap();
    assert_eq!(toks[0].kind, TokenKind::Keyword(Kw::Let));
    assert_eq!(toks[1].kind, TokenKind::Ident);
    assert_eq!(toks[1].text, "letter");
    assert_eq!(toks[2].kind, TokenKind::Keyword(Kw::Fn));
    assert_eq!(toks[3].kind, TokenKind::Ident);
}

#[test]
fn list_operators_win_over_caret() {
    let toks = tokenize("a ^: l ^ b $: l").unwrap();
    let kinds: Vec<_> = toks.iter().map(|t| t.kind).collect();
    assert_eq!(
        kinds,
        vec![
            TokenKind::Ident,
            TokenKind::Prepend,
            TokenKind::Ident,
            TokenKind::Caret,
            TokenKind::Ident,
            TokenKind::Append,
            TokenKind::Ident,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn string_literals_keep_quotes_and_escapes() {
    let toks = tokenize(r#"let s = "a\"b\n";"#).unwrap();
    let s = toks.iter().find(|t| t.kind == TokenKind::StrLit).unwrap();
    assert_eq!(s.text, r#""a\"b\n""#);
}

#[test]
fn arrow_is_not_minus_gt() {
    let toks = tokenize("-> - >").unwrap();
    assert_eq!(toks[0].kind, TokenKind::Arrow);
    assert_eq!(toks[1].kind, TokenKind::Minus);
    assert_eq!(toks[2].kind, TokenKind::Gt);
}

#[test]
fn float_requires_digits_on_both_sides() {
    let toks = tokenize("3.14 42").unwrap();
    assert_eq!(toks[0].kind, TokenKind::FloatLit);
    assert_eq!(toks[0].text, "3.14");
    assert_eq!(toks[1].kind, TokenKind::IntLit);
}

#[test]
fn stray_ampersand_is_rejected_with_line() {
    let err = tokenize("let x = 1;\na & b").unwrap_err();
    assert_eq!(err.line, 2);
    assert!(err.message.contains('&'));
}
