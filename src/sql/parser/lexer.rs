//! SQL Lexer - Tokenizes SQL input text into a stream of tokens

use std::{fmt::Display, iter::Peekable, str::Chars};

/// Represents a single lexical token in the SQL input
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// SQL reserved keyword
    Keyword(Keyword),
    /// Identifier such as table name or column name
    Ident(String),
    /// String literal
    String(String),
    /// Integer literal
    Number(String),
    /// Punctuation
    OpenParen,
    CloseParen,
    Comma,
    Semicolon,
    Asterisk,
    Period,
    /// Comparison operators
    Equal,
    NotEqual,
    GreaterThan,
    LessThan,
    GreaterThanOrEqual,
    LessThanOrEqual,
    /// End of input sentinel, always the last token
    Eof,
}

impl Token {
    /// Whether the token is one of the six comparison operators
    pub fn is_operator(&self) -> bool {
        matches!(
            self,
            Token::Equal
                | Token::NotEqual
                | Token::GreaterThan
                | Token::LessThan
                | Token::GreaterThanOrEqual
                | Token::LessThanOrEqual
        )
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Keyword(keyword) => f.write_str(keyword.to_str()),
            Token::Ident(ident) => f.write_str(ident),
            Token::String(v) => write!(f, "'{}'", v),
            Token::Number(n) => f.write_str(n),
            Token::OpenParen => f.write_str("("),
            Token::CloseParen => f.write_str(")"),
            Token::Comma => f.write_str(","),
            Token::Semicolon => f.write_str(";"),
            Token::Asterisk => f.write_str("*"),
            Token::Period => f.write_str("."),
            Token::Equal => f.write_str("="),
            Token::NotEqual => f.write_str("!="),
            Token::GreaterThan => f.write_str(">"),
            Token::LessThan => f.write_str("<"),
            Token::GreaterThanOrEqual => f.write_str(">="),
            Token::LessThanOrEqual => f.write_str("<="),
            Token::Eof => f.write_str("end of input"),
        }
    }
}

/// SQL reserved keywords
#[derive(Debug, Clone, PartialEq)]
pub enum Keyword {
    // DDL keywords
    Create,
    Table,
    Primary,
    Key,
    Unique,
    // DML keywords
    Select,
    From,
    Join,
    On,
    Where,
    Insert,
    Into,
    Values,
    Update,
    Set,
    Delete,
    // Literal keywords
    True,
    False,
}

impl Keyword {
    /// Attempts to parse a string as a keyword (case-insensitive)
    pub fn from_str(ident: &str) -> Option<Keyword> {
        Some(match ident.to_uppercase().as_ref() {
            "CREATE" => Keyword::Create,
            "TABLE" => Keyword::Table,
            "PRIMARY" => Keyword::Primary,
            "KEY" => Keyword::Key,
            "UNIQUE" => Keyword::Unique,
            "SELECT" => Keyword::Select,
            "FROM" => Keyword::From,
            "JOIN" => Keyword::Join,
            "ON" => Keyword::On,
            "WHERE" => Keyword::Where,
            "INSERT" => Keyword::Insert,
            "INTO" => Keyword::Into,
            "VALUES" => Keyword::Values,
            "UPDATE" => Keyword::Update,
            "SET" => Keyword::Set,
            "DELETE" => Keyword::Delete,
            "TRUE" => Keyword::True,
            "FALSE" => Keyword::False,
            _ => return None,
        })
    }

    /// Returns the uppercase string representation of the keyword
    pub fn to_str(&self) -> &str {
        match self {
            Keyword::Create => "CREATE",
            Keyword::Table => "TABLE",
            Keyword::Primary => "PRIMARY",
            Keyword::Key => "KEY",
            Keyword::Unique => "UNIQUE",
            Keyword::Select => "SELECT",
            Keyword::From => "FROM",
            Keyword::Join => "JOIN",
            Keyword::On => "ON",
            Keyword::Where => "WHERE",
            Keyword::Insert => "INSERT",
            Keyword::Into => "INTO",
            Keyword::Values => "VALUES",
            Keyword::Update => "UPDATE",
            Keyword::Set => "SET",
            Keyword::Delete => "DELETE",
            Keyword::True => "TRUE",
            Keyword::False => "FALSE",
        }
    }
}

impl Display for Keyword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.to_str())
    }
}

/// SQL lexical analyzer (lexer/tokenizer)
///
/// Never fails: unknown characters come out as one-character identifiers
/// and the stream always ends with a single `Token::Eof`.
pub struct Lexer<'a> {
    iter: Peekable<Chars<'a>>,
    finished: bool,
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let token = self.scan();
        if token == Token::Eof {
            self.finished = true;
        }
        Some(token)
    }
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer for the given SQL text
    pub fn new(sql_text: &'a str) -> Self {
        Self {
            iter: sql_text.chars().peekable(),
            finished: false,
        }
    }

    /// Consumes the next character if it satisfies the predicate
    fn next_if<F: Fn(char) -> bool>(&mut self, predicate: F) -> Option<char> {
        self.iter.peek().filter(|&c| predicate(*c))?;
        self.iter.next()
    }

    /// Consumes consecutive characters while they satisfy the predicate
    fn next_while<F: Fn(char) -> bool>(&mut self, predicate: F) -> Option<String> {
        let mut value = String::new();
        while let Some(c) = self.next_if(&predicate) {
            value.push(c);
        }
        Some(value).filter(|v| !v.is_empty())
    }

    /// Removes whitespace from the input stream
    fn erase_whitespace(&mut self) {
        self.next_while(|c| c.is_whitespace());
    }

    /// Scans and returns the next token
    fn scan(&mut self) -> Token {
        self.erase_whitespace();
        match self.iter.peek() {
            Some('\'') => self.scan_string(),
            Some(c) if c.is_ascii_digit() => self.scan_number(),
            Some(c) if c.is_alphabetic() || *c == '_' => self.scan_ident(),
            Some(_) => self.scan_symbol(),
            None => Token::Eof,
        }
    }

    /// Scans a string literal (enclosed in single quotes)
    ///
    /// There is no escape for an embedded quote. A missing closing quote
    /// takes everything up to the end of input.
    fn scan_string(&mut self) -> Token {
        self.iter.next();
        let mut val = String::new();
        while let Some(c) = self.iter.next() {
            if c == '\'' {
                break;
            }
            val.push(c);
        }
        Token::String(val)
    }

    /// Scans an integer literal
    fn scan_number(&mut self) -> Token {
        Token::Number(self.next_while(|c| c.is_ascii_digit()).unwrap_or_default())
    }

    /// Scans an identifier or keyword
    fn scan_ident(&mut self) -> Token {
        let val = self
            .next_while(|c| c.is_alphanumeric() || c == '_')
            .unwrap_or_default();
        // Returns Keyword if matched, otherwise returns as a regular Ident
        Keyword::from_str(&val).map_or(Token::Ident(val), Token::Keyword)
    }

    /// Scans an operator or punctuation token
    fn scan_symbol(&mut self) -> Token {
        let Some(c) = self.iter.next() else {
            return Token::Eof;
        };
        match c {
            '*' => Token::Asterisk,
            '(' => Token::OpenParen,
            ')' => Token::CloseParen,
            ',' => Token::Comma,
            ';' => Token::Semicolon,
            '.' => Token::Period,
            '=' => Token::Equal,
            '!' if self.next_if(|c| c == '=').is_some() => Token::NotEqual,
            '>' if self.next_if(|c| c == '=').is_some() => Token::GreaterThanOrEqual,
            '>' => Token::GreaterThan,
            '<' if self.next_if(|c| c == '=').is_some() => Token::LessThanOrEqual,
            '<' => Token::LessThan,
            c => Token::Ident(c.to_string()),
        }
    }
}
