use std::collections::HashMap;
use std::str::Chars;

use once_cell::sync::Lazy;

use super::locations::Location;

#[derive(Clone, Default, Debug)]
pub struct Token {
    pub(crate) typ: TokenType,
    pub(crate) lexeme: String,
    pub(crate) value: Option<Number>,
    pub(crate) loc: Location,
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}('{}')", self.typ, self.lexeme)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TokenType {
    Invalid,
    Eof,
    Newline,
    Plus,
    Minus,
    Times,
    Divide,
    Pow,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Equal,
    Comma,
    Bsep,
    Dot,
    IntLit,
    FloatLit,
    Id,
    Input,
    Integer,
    Real,
    Array,
    Of,
    With,
    Bounds,
    Record,
    End,
    If,
    While,
    Function,
    Ref,
}

impl Default for TokenType {
    fn default() -> Self {
        Self::Invalid
    }
}

/// A literal's numeric payload, carried on the token that spelled it.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Number {
    Int(i64),
    Real(f64),
}

const SIMPLE_TOKENS: [(char, TokenType); 12] = [
    ('\n', TokenType::Newline),
    ('+', TokenType::Plus),
    ('-', TokenType::Minus),
    ('*', TokenType::Times),
    ('/', TokenType::Divide),
    ('^', TokenType::Pow),
    ('(', TokenType::LParen),
    (')', TokenType::RParen),
    ('=', TokenType::Equal),
    (',', TokenType::Comma),
    ('[', TokenType::LBracket),
    (']', TokenType::RBracket),
];

static KEYWORDS: Lazy<HashMap<&'static str, TokenType>> = Lazy::new(|| {
    HashMap::from([
        ("input", TokenType::Input),
        ("integer", TokenType::Integer),
        ("real", TokenType::Real),
        ("array", TokenType::Array),
        ("of", TokenType::Of),
        ("with", TokenType::With),
        ("bounds", TokenType::Bounds),
        ("record", TokenType::Record),
        ("end", TokenType::End),
        ("if", TokenType::If),
        ("while", TokenType::While),
        ("function", TokenType::Function),
        ("ref", TokenType::Ref),
    ])
});

/// Scanner for the calc language. Holds one pending input character and
/// produces one token per call to [`next`](Tokenizer::next); the current
/// token stays available through [`token`](Tokenizer::token) until the
/// next call advances.
pub struct Tokenizer<'a> {
    chars: Chars<'a>,
    cur: Option<char>,
    lexeme: String,
    token: Token,
    line: usize,
    col: usize,
    start: Location,
    in_bsep: bool,
}

impl<'a> Tokenizer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            chars: source.chars(),
            cur: None,
            lexeme: String::new(),
            token: Token::default(),
            line: 1,
            col: 0,
            start: Location::default(),
            in_bsep: false,
        }
    }

    /// Scan for the next token and return it.
    pub fn next(&mut self) -> &Token {
        if self.cur.is_none() {
            self.next_char();
        }
        self.skip_space_and_comments();
        self.lexeme.clear();
        self.start = Location {
            line: self.line,
            column: self.col,
        };

        if self.cur.is_none() {
            self.set_token(TokenType::Eof, None);
        } else if self.lex_single()
            || self.lex_number()
            || self.lex_kw_or_id()
            || self.lex_bsep_or_dot()
        {
        } else {
            self.consume();
            self.set_token(TokenType::Invalid, None);
        }

        &self.token
    }

    /// The current token, unchanged between calls to [`next`](Tokenizer::next).
    pub fn token(&self) -> &Token {
        &self.token
    }

    fn set_token(&mut self, typ: TokenType, value: Option<Number>) {
        self.token = Token {
            typ,
            lexeme: self.lexeme.clone(),
            value,
            loc: self.start,
        };
    }

    fn next_char(&mut self) {
        if self.cur == Some('\n') {
            self.line += 1;
            self.col = 0;
        }
        self.cur = self.chars.next();
        if self.cur.is_some() {
            self.col += 1;
        }
    }

    // Comments run from '#' to the end of the line; the terminating newline
    // is left in the stream so it still closes the statement.
    fn skip_space_and_comments(&mut self) {
        loop {
            match self.cur {
                Some(' ' | '\t') => self.next_char(),
                Some('#') => {
                    while self.cur.is_some() && self.cur != Some('\n') {
                        self.next_char();
                    }
                }
                _ => break,
            }
        }
    }

    /// Add the pending character to the lexeme and advance the stream.
    fn consume(&mut self) {
        if let Some(c) = self.cur {
            self.lexeme.push(c);
        }
        self.next_char();
    }

    fn cur_is(&self, predicate: impl Fn(char) -> bool) -> bool {
        self.cur.is_some_and(predicate)
    }

    /// Attempt to match a single-character token. On success the token is
    /// set and true is returned.
    fn lex_single(&mut self) -> bool {
        let Some(&(_, typ)) = SIMPLE_TOKENS.iter().find(|&&(c, _)| Some(c) == self.cur) else {
            return false;
        };
        self.consume();
        self.set_token(typ, None);
        true
    }

    /// Attempt to lex an integer or float literal. A '.' after the integer
    /// part needs two characters of lookahead: one dot followed by anything
    /// but a dot commits to a decimal point (and requires a fractional
    /// digit), two dots commit to the bounds separator and the integer
    /// lexeme excludes them.
    fn lex_number(&mut self) -> bool {
        if !self.cur_is(|c| c.is_ascii_digit()) {
            return false;
        }
        self.consume();
        while self.cur_is(|c| c.is_ascii_digit()) {
            self.consume();
        }

        if self.cur != Some('.') || self.start_bsep() {
            if self.lexeme.ends_with('.') {
                self.lexeme.pop();
            }
            match self.lexeme.parse::<i64>() {
                Ok(n) => self.set_token(TokenType::IntLit, Some(Number::Int(n))),
                Err(_) => self.set_token(TokenType::Invalid, None),
            }
            return true;
        }

        // one dot without a second: a decimal point needs at least one digit
        if !self.cur_is(|c| c.is_ascii_digit()) {
            self.set_token(TokenType::Invalid, None);
            return true;
        }
        while self.cur_is(|c| c.is_ascii_digit()) {
            self.consume();
        }
        match self.lexeme.parse::<f64>() {
            Ok(x) => self.set_token(TokenType::FloatLit, Some(Number::Real(x))),
            Err(_) => self.set_token(TokenType::Invalid, None),
        }
        true
    }

    /// Attempt to lex a keyword or an identifier.
    fn lex_kw_or_id(&mut self) -> bool {
        if !self.cur_is(|c| c.is_alphabetic() || c == '_') {
            return false;
        }
        self.consume();
        while self.cur_is(|c| c.is_alphanumeric() || c == '_') {
            self.consume();
        }
        match KEYWORDS.get(self.lexeme.as_str()) {
            Some(&typ) => self.set_token(typ, None),
            None => self.set_token(TokenType::Id, None),
        }
        true
    }

    /// Attempt to lex the bounds separator or a lone dot. When a preceding
    /// integer literal already consumed the first dot of '..', only the
    /// second one is left to take.
    fn lex_bsep_or_dot(&mut self) -> bool {
        let needed = if self.in_bsep {
            self.in_bsep = false;
            1
        } else {
            2
        };
        for seen in 0..needed {
            if self.cur != Some('.') {
                if seen == 0 {
                    return false;
                }
                self.set_token(TokenType::Dot, None);
                return true;
            }
            self.consume();
        }
        self.lexeme = "..".to_string();
        self.set_token(TokenType::Bsep, None);
        true
    }

    /// Called with the pending character on the first '.' after an integer
    /// lexeme. Consumes it and reports whether a second dot follows, in
    /// which case the separator state carries over to the next token.
    fn start_bsep(&mut self) -> bool {
        if self.cur != Some('.') {
            return false;
        }
        self.consume();
        self.in_bsep = self.cur == Some('.');
        self.in_bsep
    }
}
