//! FlatDB - A minimal relational database implementation in Rust
//!
//! This crate provides:
//! - SQL parsing (lexer, recursive-descent parser, AST)
//! - A table engine with type checking, primary-key index and unique constraints
//! - Query planning and execution (CRUD + single equality JOIN)
//! - Flat-file persistence, one quoted text file per table

pub mod config;
pub mod error;
pub mod sql;
pub mod storage;
