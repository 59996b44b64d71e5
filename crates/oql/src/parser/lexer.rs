use oql_core::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Keyword {
    And,
    As,
    Asc,
    Between,
    By,
    Desc,
    Distinct,
    Exists,
    False,
    From,
    Group,
    Having,
    In,
    Inner,
    Is,
    Join,
    Left,
    Like,
    Not,
    Null,
    Or,
    Order,
    Outer,
    Select,
    True,
    Where,
    With,
}

impl Keyword {
    fn from_ident(ident: &str) -> Option<Self> {
        Some(match ident.to_ascii_lowercase().as_str() {
            "and" => Self::And,
            "as" => Self::As,
            "asc" => Self::Asc,
            "between" => Self::Between,
            "by" => Self::By,
            "desc" => Self::Desc,
            "distinct" => Self::Distinct,
            "exists" => Self::Exists,
            "false" => Self::False,
            "from" => Self::From,
            "group" => Self::Group,
            "having" => Self::Having,
            "in" => Self::In,
            "inner" => Self::Inner,
            "is" => Self::Is,
            "join" => Self::Join,
            "left" => Self::Left,
            "like" => Self::Like,
            "not" => Self::Not,
            "null" => Self::Null,
            "or" => Self::Or,
            "order" => Self::Order,
            "outer" => Self::Outer,
            "select" => Self::Select,
            "true" => Self::True,
            "where" => Self::Where,
            "with" => Self::With,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TokenKind {
    Eof,
    Keyword(Keyword),
    Identifier(String),
    String(String),
    Integer(i64),
    Decimal(f64),
    Parameter(String),
    Comma,
    Dot,
    LParen,
    RParen,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Token {
    pub(crate) kind: TokenKind,
    pub(crate) start: usize,
}

pub(crate) fn lex(input: &str) -> Result<Vec<Token>> {
    Lexer { input, pos: 0 }.lex_all()
}

struct Lexer<'a> {
    input: &'a str,
    pos: usize,
}

impl Lexer<'_> {
    fn lex_all(mut self) -> Result<Vec<Token>> {
        let mut out = Vec::new();
        loop {
            self.skip_whitespace();
            if self.pos >= self.input.len() {
                out.push(Token {
                    kind: TokenKind::Eof,
                    start: self.pos,
                });
                break;
            }
            out.push(self.next_token()?);
        }
        Ok(out)
    }

    fn next_token(&mut self) -> Result<Token> {
        let start = self.pos;
        let Some(ch) = self.peek_char() else {
            return Ok(Token {
                kind: TokenKind::Eof,
                start,
            });
        };

        for (text, kind) in [
            ("<>", TokenKind::NotEqual),
            ("!=", TokenKind::NotEqual),
            ("<=", TokenKind::LessEqual),
            (">=", TokenKind::GreaterEqual),
        ] {
            if self.input[self.pos..].starts_with(text) {
                self.pos += 2;
                return Ok(Token { kind, start });
            }
        }

        let punct = match ch {
            ',' => Some(TokenKind::Comma),
            '.' => Some(TokenKind::Dot),
            '(' => Some(TokenKind::LParen),
            ')' => Some(TokenKind::RParen),
            '+' => Some(TokenKind::Plus),
            '-' => Some(TokenKind::Minus),
            '*' => Some(TokenKind::Star),
            '/' => Some(TokenKind::Slash),
            '%' => Some(TokenKind::Percent),
            '=' => Some(TokenKind::Equal),
            '<' => Some(TokenKind::Less),
            '>' => Some(TokenKind::Greater),
            _ => None,
        };

        if let Some(kind) = punct {
            self.pos += 1;
            return Ok(Token { kind, start });
        }

        if ch == '\'' {
            return self.lex_string(start);
        }

        if ch == ':' {
            self.pos += 1;
            if !self.peek_char().is_some_and(is_ident_start) {
                return Err(Error::syntax(start, "expected a parameter name after `:`"));
            }
            let name = self.take_while(is_ident_continue);
            return Ok(Token {
                kind: TokenKind::Parameter(name.to_string()),
                start,
            });
        }

        if ch.is_ascii_digit() {
            return self.lex_number(start);
        }

        if is_ident_start(ch) {
            let ident = self.take_while(is_ident_continue);
            let kind = match Keyword::from_ident(ident) {
                Some(keyword) => TokenKind::Keyword(keyword),
                None => TokenKind::Identifier(ident.to_string()),
            };
            return Ok(Token { kind, start });
        }

        Err(Error::syntax(start, format!("unexpected character `{ch}`")))
    }

    fn lex_string(&mut self, start: usize) -> Result<Token> {
        // Skip the opening quote
        self.pos += 1;

        let mut value = String::new();
        loop {
            match self.peek_char() {
                None => return Err(Error::syntax(start, "unterminated string literal")),
                Some('\'') => {
                    self.pos += 1;
                    // `''` is an escaped quote
                    if self.peek_char() == Some('\'') {
                        value.push('\'');
                        self.pos += 1;
                    } else {
                        break;
                    }
                }
                Some(ch) => {
                    value.push(ch);
                    self.pos += ch.len_utf8();
                }
            }
        }

        Ok(Token {
            kind: TokenKind::String(value),
            start,
        })
    }

    fn lex_number(&mut self, start: usize) -> Result<Token> {
        self.take_while(|ch| ch.is_ascii_digit());

        let is_decimal = self.peek_char() == Some('.')
            && self.input[self.pos + 1..]
                .chars()
                .next()
                .is_some_and(|ch| ch.is_ascii_digit());

        if is_decimal {
            self.pos += 1;
            self.take_while(|ch| ch.is_ascii_digit());
        }

        let text = &self.input[start..self.pos];

        if self.peek_char().is_some_and(is_ident_start) {
            return Err(Error::syntax(self.pos, "unexpected character after number"));
        }

        let kind = if is_decimal {
            match text.parse() {
                Ok(value) => TokenKind::Decimal(value),
                Err(_) => return Err(Error::syntax(start, "invalid decimal literal")),
            }
        } else {
            match text.parse() {
                Ok(value) => TokenKind::Integer(value),
                Err(_) => return Err(Error::syntax(start, "integer literal out of range")),
            }
        };

        Ok(Token { kind, start })
    }

    fn skip_whitespace(&mut self) {
        self.take_while(char::is_whitespace);
    }

    fn take_while(&mut self, f: impl Fn(char) -> bool) -> &str {
        let start = self.pos;
        while let Some(ch) = self.peek_char() {
            if !f(ch) {
                break;
            }
            self.pos += ch.len_utf8();
        }
        &self.input[start..self.pos]
    }

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }
}

fn is_ident_start(ch: char) -> bool {
    ch.is_alphabetic() || ch == '_'
}

fn is_ident_continue(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}
