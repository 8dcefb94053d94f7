use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::sql::parser::ast::{Column, Consts, Expression, Join, Operation, Operator};
use crate::sql::parser::lexer::{Keyword, Lexer, Token};
use crate::sql::types::DataType;

pub mod ast;
pub mod lexer;

/// SQL Parser - Converts tokens into Abstract Syntax Tree (AST)
///
/// Recursive descent over a two-token window: `current` is the next token
/// to consume and `peek` the one after it.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
    peek: Token,
    errors: Vec<String>,
}

impl<'a> Parser<'a> {
    /// Creates a new parser for the given SQL input
    pub fn new(input: &'a str) -> Self {
        let mut lexer = Lexer::new(input);
        let current = lexer.next().unwrap_or(Token::Eof);
        let peek = lexer.next().unwrap_or(Token::Eof);
        Parser {
            lexer,
            current,
            peek,
            errors: Vec::new(),
        }
    }

    /// Parses the input SQL statement into an AST
    ///
    /// The trailing semicolon is optional. Nothing may follow the statement.
    pub fn parse(&mut self) -> Result<ast::Statement> {
        let stmt = self.parse_statement()?;
        self.next_if_token(Token::Semicolon);
        if self.current != Token::Eof {
            return Err(self.error(format!("[Parser] Unexpected token {}", self.current)));
        }
        Ok(stmt)
    }

    /// Diagnostics recorded while parsing, in the order they occurred
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Parses a statement based on the first token
    fn parse_statement(&mut self) -> Result<ast::Statement> {
        match &self.current {
            Token::Keyword(Keyword::Create) => self.parse_ddl(),
            Token::Keyword(Keyword::Select) => self.parse_select(),
            Token::Keyword(Keyword::Insert) => self.parse_insert(),
            Token::Keyword(Keyword::Update) => self.parse_update(),
            Token::Keyword(Keyword::Delete) => self.parse_delete(),
            Token::Eof => Err(self.error("[Parser] Unexpected end of input".to_string())),
            t => {
                let msg = format!("[Parser] Unexpected token {}", t);
                Err(self.error(msg))
            }
        }
    }

    /// Parses DDL statements (CREATE TABLE)
    fn parse_ddl(&mut self) -> Result<ast::Statement> {
        self.next_expect(Token::Keyword(Keyword::Create))?;
        self.next_expect(Token::Keyword(Keyword::Table))?;
        self.parse_ddl_create_table()
    }

    /// Parses CREATE TABLE statement
    fn parse_ddl_create_table(&mut self) -> Result<ast::Statement> {
        let table_name = self.next_ident()?;
        self.next_expect(Token::OpenParen)?;

        let mut columns = Vec::new();
        loop {
            columns.push(self.parse_ddl_column()?);
            if self.next_if_token(Token::Comma).is_none() {
                break;
            }
        }
        self.next_expect(Token::CloseParen)?;
        Ok(ast::Statement::CreateTable {
            name: table_name,
            columns,
        })
    }

    /// Parses column definition in CREATE TABLE
    fn parse_ddl_column(&mut self) -> Result<ast::Column> {
        let name = self.next_ident()?;
        let datatype = match self.next() {
            Token::Ident(t) => match DataType::from_name(&t) {
                Some(datatype) => datatype,
                None => return Err(self.error(format!("[Parser] Unknown data type {}", t))),
            },
            token => {
                return Err(self.error(format!("[Parser] Expected data type, got {}", token)));
            }
        };
        let mut column = Column {
            name,
            datatype,
            primary_key: false,
            unique: false,
        };

        // Parse column constraints (PRIMARY KEY, UNIQUE)
        loop {
            if self.next_if_token(Token::Keyword(Keyword::Primary)).is_some() {
                self.next_expect(Token::Keyword(Keyword::Key))?;
                column.primary_key = true;
            } else if self.next_if_token(Token::Keyword(Keyword::Unique)).is_some() {
                column.unique = true;
            } else {
                break;
            }
        }

        Ok(column)
    }

    /// Parses SELECT statement
    fn parse_select(&mut self) -> Result<ast::Statement> {
        self.next_expect(Token::Keyword(Keyword::Select))?;

        let select = if self.next_if_token(Token::Asterisk).is_some() {
            vec![Expression::Star]
        } else {
            let mut exprs = Vec::new();
            loop {
                exprs.push(self.parse_expression()?);
                if self.next_if_token(Token::Comma).is_none() {
                    break;
                }
            }
            exprs
        };

        self.next_expect(Token::Keyword(Keyword::From))?;
        let table_name = self.next_ident()?;

        let join = if self.next_if_token(Token::Keyword(Keyword::Join)).is_some() {
            let table_name = self.next_ident()?;
            self.next_expect(Token::Keyword(Keyword::On))?;
            match self.parse_expression()? {
                predicate @ Expression::Operation(_) => Some(Join {
                    table_name,
                    predicate,
                }),
                expr => {
                    return Err(self.error(format!(
                        "[Parser] Expected comparison in ON clause, got {}",
                        expr
                    )));
                }
            }
        } else {
            None
        };

        Ok(ast::Statement::Select {
            select,
            table_name,
            join,
            where_clause: self.parse_where_clause()?,
        })
    }

    /// Parses INSERT statement
    fn parse_insert(&mut self) -> Result<ast::Statement> {
        self.next_expect(Token::Keyword(Keyword::Insert))?;
        self.next_expect(Token::Keyword(Keyword::Into))?;
        let table_name = self.next_ident()?;
        self.next_expect(Token::Keyword(Keyword::Values))?;

        self.next_expect(Token::OpenParen)?;
        let mut values = Vec::new();
        loop {
            values.push(self.parse_expression()?);
            match self.next() {
                Token::CloseParen => break,
                Token::Comma => {}
                token => {
                    return Err(self.error(format!("[Parser] Unexpected token {}", token)));
                }
            }
        }
        Ok(ast::Statement::Insert { table_name, values })
    }

    /// Parses UPDATE statement
    fn parse_update(&mut self) -> Result<ast::Statement> {
        self.next_expect(Token::Keyword(Keyword::Update))?;
        let table_name = self.next_ident()?;
        self.next_expect(Token::Keyword(Keyword::Set))?;

        let mut columns = BTreeMap::new();
        loop {
            let col = self.next_ident()?;
            self.next_expect(Token::Equal)?;
            let value = self.parse_expression()?;
            // The same column may only be assigned once per statement
            if columns.contains_key(&col) {
                return Err(self.error(format!("[Parser] Duplicate column {} for update", col)));
            }
            columns.insert(col, value);
            if self.next_if_token(Token::Comma).is_none() {
                break;
            }
        }
        Ok(ast::Statement::Update {
            table_name,
            columns,
            where_clause: self.parse_where_clause()?,
        })
    }

    /// Parses DELETE statement
    fn parse_delete(&mut self) -> Result<ast::Statement> {
        self.next_expect(Token::Keyword(Keyword::Delete))?;
        self.next_expect(Token::Keyword(Keyword::From))?;
        let table_name = self.next_ident()?;
        Ok(ast::Statement::Delete {
            table_name,
            where_clause: self.parse_where_clause()?,
        })
    }

    /// Parses an optional WHERE clause holding at most one comparison
    fn parse_where_clause(&mut self) -> Result<Option<Expression>> {
        if self.next_if_token(Token::Keyword(Keyword::Where)).is_none() {
            return Ok(None);
        }
        let expr = self.parse_expression()?;
        if let Token::Ident(word) = &self.current {
            if word.eq_ignore_ascii_case("AND") || word.eq_ignore_ascii_case("OR") {
                let msg = format!(
                    "[Parser] Compound predicate {} is not supported",
                    word.to_uppercase()
                );
                self.errors.push(msg.clone());
                return Err(Error::Unsupported(msg));
            }
        }
        Ok(Some(expr))
    }

    /// Parses a primary expression optionally followed by one comparison
    fn parse_expression(&mut self) -> Result<Expression> {
        let left = self.parse_primary_expression()?;
        if !self.current.is_operator() {
            return Ok(left);
        }
        let operator = match self.next() {
            Token::Equal => Operator::Equal,
            Token::NotEqual => Operator::NotEqual,
            Token::GreaterThan => Operator::GreaterThan,
            Token::LessThan => Operator::LessThan,
            Token::GreaterThanOrEqual => Operator::GreaterThanOrEqual,
            Token::LessThanOrEqual => Operator::LessThanOrEqual,
            token => return Err(self.error(format!("[Parser] Unexpected operator {}", token))),
        };
        let right = self.parse_primary_expression()?;
        Ok(Operation::new(left, operator, right).into())
    }

    /// Parses identifiers (plain or `table.column`) and literals
    fn parse_primary_expression(&mut self) -> Result<Expression> {
        // `ident .` starts a qualified column
        if matches!(self.current, Token::Ident(_)) && self.peek == Token::Period {
            let table = self.next_ident()?;
            self.next_expect(Token::Period)?;
            return Ok(Expression::QualifiedField(table, self.next_ident()?));
        }

        Ok(match self.next() {
            Token::Ident(ident) => Expression::Field(ident),
            Token::Number(n) => match n.parse::<i64>() {
                Ok(i) => Consts::Integer(i).into(),
                Err(err) => {
                    return Err(self.error(format!("[Parser] Invalid integer {}: {}", n, err)));
                }
            },
            Token::String(s) => Consts::String(s).into(),
            Token::Keyword(Keyword::True) => Consts::Boolean(true).into(),
            Token::Keyword(Keyword::False) => Consts::Boolean(false).into(),
            t => {
                return Err(self.error(format!("[Parser] Unexpected expression token {}", t)));
            }
        })
    }

    /// Records a diagnostic and returns it as a parse error
    fn error(&mut self, msg: String) -> Error {
        self.errors.push(msg.clone());
        Error::Parse(msg)
    }

    /// Consumes and returns the current token, shifting the window by one
    fn next(&mut self) -> Token {
        let upcoming = self.lexer.next().unwrap_or(Token::Eof);
        let peek = std::mem::replace(&mut self.peek, upcoming);
        std::mem::replace(&mut self.current, peek)
    }

    /// Expects and consumes an identifier
    fn next_ident(&mut self) -> Result<String> {
        match self.next() {
            Token::Ident(ident) => Ok(ident),
            token => Err(self.error(format!("[Parser] Expected ident, got token {}", token))),
        }
    }

    /// Expects a specific token, returns error if different
    fn next_expect(&mut self, expect: Token) -> Result<()> {
        let token = self.next();
        if token != expect {
            return Err(self.error(format!("[Parser] Expected token {}, got {}", expect, token)));
        }
        Ok(())
    }

    /// Consumes the current token if it matches the given token
    fn next_if_token(&mut self, token: Token) -> Option<Token> {
        if self.current != token {
            return None;
        }
        Some(self.next())
    }
}
