//! C1 — AST & DDL front-ends. One module per input kind; each accepts
//! `(file_path, file_bytes)` and returns a typed parse tree or a structured
//! [`crate::error::ParseError`].

pub mod config_file;
pub mod ddl;
pub mod java;
pub mod mybatis;
