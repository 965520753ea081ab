//! Turns template source into a flat list of tokens.
//!
//! The lexer has two modes: text mode, where everything up to the next `{{` is a single
//! `Text` token, and expression mode, between `{{` and the matching `}}`, where the
//! expression language is tokenized.

use std::fmt;

use serde_json::{Number, Value};

use crate::errors::{Error, Result};

/// All the token kinds the parser can receive
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenKind {
    /// Raw text outside of `{{ }}`
    Text,
    /// `{{`
    ExprStart,
    /// `}}`
    ExprEnd,

    Identifier,
    /// An identifier starting with `html_`, rendered without escaping
    RawHtml,
    Number,
    String,
    True,
    False,
    Null,

    /// `#set`
    Set,
    /// `#if`
    If,
    /// `#elseif`
    ElseIf,
    /// `#else`
    Else,
    /// `#not`
    Not,
    /// `#each`, `#each1`, `#each2`...
    Each,
    /// `#include`
    Include,
    /// `/if`, `/not`, `/eachN`
    Close,
    /// `@index`
    IndexRef,
    /// `@key`
    KeyRef,
    /// `this`
    This,

    Plus,
    Minus,
    Star,
    StarStar,
    Slash,
    Percent,
    Ampersand,
    And,
    Pipe,
    Or,
    Assign,
    Equal,
    StrictEqual,
    Bang,
    NotEqual,
    StrictNotEqual,
    Greater,
    GreaterEqual,
    Less,
    LessEqual,

    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    LeftBrace,
    RightBrace,
    Dot,
    Comma,
    Question,
    Colon,

    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match *self {
            TokenKind::Text => "text",
            TokenKind::ExprStart => "`{{`",
            TokenKind::ExprEnd => "`}}`",
            TokenKind::Identifier => "identifier",
            TokenKind::RawHtml => "raw html identifier",
            TokenKind::Number => "number",
            TokenKind::String => "string",
            TokenKind::True => "`true`",
            TokenKind::False => "`false`",
            TokenKind::Null => "`null`",
            TokenKind::Set => "`#set`",
            TokenKind::If => "`#if`",
            TokenKind::ElseIf => "`#elseif`",
            TokenKind::Else => "`#else`",
            TokenKind::Not => "`#not`",
            TokenKind::Each => "`#each`",
            TokenKind::Include => "`#include`",
            TokenKind::Close => "closing tag",
            TokenKind::IndexRef => "`@index`",
            TokenKind::KeyRef => "`@key`",
            TokenKind::This => "`this`",
            TokenKind::Plus => "`+`",
            TokenKind::Minus => "`-`",
            TokenKind::Star => "`*`",
            TokenKind::StarStar => "`**`",
            TokenKind::Slash => "`/`",
            TokenKind::Percent => "`%`",
            TokenKind::Ampersand => "`&`",
            TokenKind::And => "`&&`",
            TokenKind::Pipe => "`|`",
            TokenKind::Or => "`||`",
            TokenKind::Assign => "`=`",
            TokenKind::Equal => "`==`",
            TokenKind::StrictEqual => "`===`",
            TokenKind::Bang => "`!`",
            TokenKind::NotEqual => "`!=`",
            TokenKind::StrictNotEqual => "`!==`",
            TokenKind::Greater => "`>`",
            TokenKind::GreaterEqual => "`>=`",
            TokenKind::Less => "`<`",
            TokenKind::LessEqual => "`<=`",
            TokenKind::LeftParen => "`(`",
            TokenKind::RightParen => "`)`",
            TokenKind::LeftBracket => "`[`",
            TokenKind::RightBracket => "`]`",
            TokenKind::LeftBrace => "`{`",
            TokenKind::RightBrace => "`}`",
            TokenKind::Dot => "`.`",
            TokenKind::Comma => "`,`",
            TokenKind::Question => "`?`",
            TokenKind::Colon => "`:`",
            TokenKind::Eof => "end of template",
        };
        write!(f, "{}", s)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// The exact source text of the token
    pub lexeme: String,
    /// The value of string and number literals
    pub literal: Option<Value>,
    /// 1-based line the token starts on
    pub line: usize,
    /// Byte position of the token in the input
    pub position: usize,
}

impl Token {
    /// The name of a tag without its `#` or `/` prefix, eg `each2` for `/each2`
    pub fn tag_name(&self) -> &str {
        self.lexeme.trim_start_matches(|c| c == '#' || c == '/')
    }
}

#[derive(Debug)]
pub struct Lexer<'a> {
    input: &'a str,
    chars: Vec<(usize, char)>, // (bytes index, char)
    start: usize,              // index in `chars` where the current token started
    current: usize,            // current index in `chars`
    line: usize,
    start_line: usize,
    brace_depth: usize, // `{` opened inside an expression, for object literals
    tokens: Vec<Token>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Lexer<'a> {
        Lexer {
            input,
            chars: input.char_indices().collect(),
            start: 0,
            current: 0,
            line: 1,
            start_line: 1,
            brace_depth: 0,
            tokens: vec![],
        }
    }

    /// Runs the lexer over the whole input. The last token is always `Eof`.
    pub fn tokenize(mut self) -> Result<Vec<Token>> {
        while !self.is_over() {
            self.lex_text();
            if !self.is_over() {
                self.lex_expression()?;
            }
        }

        self.start = self.current;
        self.start_line = self.line;
        self.add_token(TokenKind::Eof, None);
        Ok(self.tokens)
    }

    fn is_over(&self) -> bool {
        self.current >= self.chars.len()
    }

    fn byte_pos(&self, index: usize) -> usize {
        self.chars.get(index).map(|&(pos, _)| pos).unwrap_or(self.input.len())
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.current).map(|&(_, c)| c)
    }

    fn peek_next(&self) -> Option<char> {
        self.chars.get(self.current + 1).map(|&(_, c)| c)
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.current += 1;
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }

    // Returns whether the next char is the char we expected to see, consuming it if so
    fn accept(&mut self, valid: char) -> bool {
        if self.peek() == Some(valid) {
            self.advance();
            return true;
        }
        false
    }

    fn starts_with(&self, pattern: &str) -> bool {
        self.input[self.byte_pos(self.current)..].starts_with(pattern)
    }

    fn current_lexeme(&self) -> &'a str {
        &self.input[self.byte_pos(self.start)..self.byte_pos(self.current)]
    }

    fn begin_token(&mut self) {
        self.start = self.current;
        self.start_line = self.line;
    }

    fn add_token(&mut self, kind: TokenKind, literal: Option<Value>) {
        let lexeme = self.current_lexeme().to_string();
        self.tokens.push(Token {
            kind,
            lexeme,
            literal,
            line: self.start_line,
            position: self.byte_pos(self.start),
        });
    }

    fn error(&self, message: impl ToString) -> Error {
        Error::syntax(message, self.start_line, self.byte_pos(self.start))
    }

    fn previous_kind(&self) -> Option<TokenKind> {
        self.tokens.last().map(|t| t.kind)
    }

    fn lex_text(&mut self) {
        self.begin_token();
        while !self.is_over() && !self.starts_with("{{") {
            self.advance();
        }
        if self.current > self.start {
            self.add_token(TokenKind::Text, None);
        }
    }

    fn lex_expression(&mut self) -> Result<()> {
        self.begin_token();
        self.current += 2;
        self.add_token(TokenKind::ExprStart, None);
        self.brace_depth = 0;

        loop {
            while self.peek().map_or(false, char::is_whitespace) {
                self.advance();
            }
            self.begin_token();

            if self.is_over() {
                return Err(self.error("Unclosed expression: expected `}}` before the end of the template"));
            }

            if self.brace_depth == 0 && self.starts_with("}}") {
                self.current += 2;
                self.add_token(TokenKind::ExprEnd, None);
                return Ok(());
            }

            self.lex_token()?;
        }
    }

    fn lex_token(&mut self) -> Result<()> {
        let c = match self.advance() {
            Some(c) => c,
            None => return Err(self.error("Unexpected end of template")),
        };

        let kind = match c {
            '(' => TokenKind::LeftParen,
            ')' => TokenKind::RightParen,
            '[' => TokenKind::LeftBracket,
            ']' => TokenKind::RightBracket,
            ',' => TokenKind::Comma,
            '.' => TokenKind::Dot,
            '?' => TokenKind::Question,
            ':' => TokenKind::Colon,
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '%' => TokenKind::Percent,
            '{' => {
                self.brace_depth += 1;
                TokenKind::LeftBrace
            }
            '}' => {
                if self.brace_depth == 0 {
                    return Err(self.error("Unexpected character `}`"));
                }
                self.brace_depth -= 1;
                TokenKind::RightBrace
            }
            '*' => {
                if self.accept('*') {
                    TokenKind::StarStar
                } else {
                    TokenKind::Star
                }
            }
            '/' => {
                // `{{/if}}`: a slash right after `{{` starts a closing tag
                if self.previous_kind() == Some(TokenKind::ExprStart)
                    && self.peek().map_or(false, |c| c.is_alphabetic())
                {
                    self.consume_word();
                    TokenKind::Close
                } else {
                    TokenKind::Slash
                }
            }
            '&' => {
                if self.accept('&') {
                    TokenKind::And
                } else {
                    TokenKind::Ampersand
                }
            }
            '|' => {
                if self.accept('|') {
                    TokenKind::Or
                } else {
                    TokenKind::Pipe
                }
            }
            '=' => {
                if self.accept('=') {
                    if self.accept('=') {
                        TokenKind::StrictEqual
                    } else {
                        TokenKind::Equal
                    }
                } else {
                    TokenKind::Assign
                }
            }
            '!' => {
                if self.accept('=') {
                    if self.accept('=') {
                        TokenKind::StrictNotEqual
                    } else {
                        TokenKind::NotEqual
                    }
                } else {
                    TokenKind::Bang
                }
            }
            '>' => {
                if self.accept('=') {
                    TokenKind::GreaterEqual
                } else {
                    TokenKind::Greater
                }
            }
            '<' => {
                if self.accept('=') {
                    TokenKind::LessEqual
                } else {
                    TokenKind::Less
                }
            }
            '"' | '\'' | '`' => return self.lex_string(c),
            '#' => return self.lex_tag(),
            '@' => return self.lex_at_ref(),
            x if x.is_ascii_digit() => return self.lex_number(),
            x if x.is_alphabetic() || x == '_' || x == '$' => return self.lex_identifier(),
            x => return Err(self.error(format!("Unexpected character `{}`", x))),
        };

        self.add_token(kind, None);
        Ok(())
    }

    fn consume_word(&mut self) {
        while self.peek().map_or(false, |c| c.is_alphanumeric() || c == '_' || c == '$') {
            self.advance();
        }
    }

    // No escape sequences: the string ends at the next matching quote
    fn lex_string(&mut self, quote: char) -> Result<()> {
        loop {
            match self.advance() {
                Some(c) if c == quote => break,
                Some(_) => continue,
                None => return Err(self.error("Unterminated string")),
            }
        }

        let lexeme = self.current_lexeme();
        let content = &lexeme[quote.len_utf8()..lexeme.len() - quote.len_utf8()];
        self.add_token(TokenKind::String, Some(Value::String(content.to_string())));
        Ok(())
    }

    fn lex_number(&mut self) -> Result<()> {
        while self.peek().map_or(false, |c| c.is_ascii_digit()) {
            self.advance();
        }

        let mut is_float = false;
        if self.peek() == Some('.') && self.peek_next().map_or(false, |c| c.is_ascii_digit()) {
            is_float = true;
            self.advance();
            while self.peek().map_or(false, |c| c.is_ascii_digit()) {
                self.advance();
            }
        }

        let lexeme = self.current_lexeme();
        let literal = if is_float {
            let f: f64 = lexeme
                .parse()
                .map_err(|_| self.error(format!("Float out of bounds: `{}`", lexeme)))?;
            match Number::from_f64(f) {
                Some(n) => Value::Number(n),
                None => return Err(self.error(format!("Float out of bounds: `{}`", lexeme))),
            }
        } else {
            let i: i64 = lexeme
                .parse()
                .map_err(|_| self.error(format!("Integer out of bounds: `{}`", lexeme)))?;
            Value::Number(i.into())
        };

        self.add_token(TokenKind::Number, Some(literal));
        Ok(())
    }

    fn lex_identifier(&mut self) -> Result<()> {
        self.consume_word();

        let kind = match self.current_lexeme() {
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            "null" => TokenKind::Null,
            "this" => TokenKind::This,
            ident if ident.starts_with("html_") => TokenKind::RawHtml,
            _ => TokenKind::Identifier,
        };
        self.add_token(kind, None);
        Ok(())
    }

    fn lex_tag(&mut self) -> Result<()> {
        self.consume_word();

        let kind = match &self.current_lexeme()[1..] {
            "set" => TokenKind::Set,
            "if" => TokenKind::If,
            "elseif" => TokenKind::ElseIf,
            "else" => TokenKind::Else,
            "not" => TokenKind::Not,
            "include" => TokenKind::Include,
            name if is_each_tag(name) => TokenKind::Each,
            "" => return Err(self.error("Unexpected character `#`")),
            name => return Err(self.error(format!("Unknown tag `#{}`", name))),
        };
        self.add_token(kind, None);
        Ok(())
    }

    fn lex_at_ref(&mut self) -> Result<()> {
        self.consume_word();

        let kind = match &self.current_lexeme()[1..] {
            "index" => TokenKind::IndexRef,
            "key" => TokenKind::KeyRef,
            "" => return Err(self.error("Unexpected character `@`")),
            name => return Err(self.error(format!("Unknown reference `@{}`", name))),
        };
        self.add_token(kind, None);
        Ok(())
    }
}

/// `each` followed by an optional number
pub fn is_each_tag(name: &str) -> bool {
    name.strip_prefix("each").map_or(false, |suffix| suffix.chars().all(|c| c.is_ascii_digit()))
}

/// Tokenizes a whole template
pub fn tokenize(input: &str) -> Result<Vec<Token>> {
    Lexer::new(input).tokenize()
}
