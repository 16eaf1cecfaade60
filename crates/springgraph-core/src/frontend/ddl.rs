//! DDL front-end (C1).
//!
//! Parses `CREATE TABLE`, `ALTER TABLE`, `CREATE INDEX`, and
//! `CREATE SCHEMA`/`CREATE DATABASE` statements with `sqlparser`, using a
//! generic dialect so vendor-specific syntax degrades gracefully rather
//! than failing the whole script.

use std::path::Path;

use sqlparser::ast::{AlterTableOperation, ColumnOption, Statement, TableConstraint};
use sqlparser::dialect::GenericDialect;
use sqlparser::parser::Parser;

use crate::error::ParseError;

#[derive(Debug, Clone)]
pub struct DdlColumn {
    pub name: String,
    pub data_type: String,
    pub nullable: bool,
    pub default_value: Option<String>,
}

#[derive(Debug, Clone)]
pub struct DdlIndex {
    pub name: String,
    pub columns: Vec<String>,
    pub unique: bool,
}

#[derive(Debug, Clone)]
pub struct DdlConstraint {
    pub name: String,
    pub constraint_type: String,
    pub columns: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct DdlTable {
    pub name: String,
    pub columns: Vec<DdlColumn>,
    pub indexes: Vec<DdlIndex>,
    pub constraints: Vec<DdlConstraint>,
}

#[derive(Debug, Clone, Default)]
pub struct DdlScript {
    pub database_names: Vec<String>,
    pub tables: Vec<DdlTable>,
}

pub struct DdlFrontend;

impl DdlFrontend {
    pub fn parse(&self, path: &Path, source: &str) -> Result<DdlScript, ParseError> {
        let dialect = GenericDialect {};
        let statements = Parser::parse_sql(&dialect, source)
            .map_err(|e| ParseError::new(path, format!("ddl parse error: {e}")).with_excerpt(excerpt(source)))?;

        let mut script = DdlScript::default();
        for stmt in statements {
            match stmt {
                Statement::CreateTable { name, columns, constraints, .. } => {
                    let table_name = name.to_string();
                    let ddl_columns = columns
                        .iter()
                        .map(|c| {
                            let nullable = !c.options.iter().any(|o| matches!(o.option, ColumnOption::NotNull));
                            let default_value = c.options.iter().find_map(|o| match &o.option {
                                ColumnOption::Default(expr) => Some(expr.to_string()),
                                _ => None,
                            });
                            DdlColumn {
                                name: c.name.to_string(),
                                data_type: c.data_type.to_string(),
                                nullable,
                                default_value,
                            }
                        })
                        .collect();

                    let mut ddl_constraints = Vec::new();
                    for c in &constraints {
                        if let Some(parsed) = parse_table_constraint(c, &table_name) {
                            ddl_constraints.push(parsed);
                        }
                    }

                    script.tables.push(DdlTable {
                        name: table_name,
                        columns: ddl_columns,
                        indexes: Vec::new(),
                        constraints: ddl_constraints,
                    });
                }
                Statement::CreateIndex(create_index) => {
                    let table_name = create_index.table_name.to_string();
                    let index_name = create_index
                        .name
                        .map(|n| n.to_string())
                        .unwrap_or_else(|| format!("{table_name}_idx"));
                    let columns = create_index.columns.iter().map(|c| c.to_string()).collect();
                    if let Some(table) = script.tables.iter_mut().find(|t| t.name == table_name) {
                        table.indexes.push(DdlIndex {
                            name: index_name,
                            columns,
                            unique: create_index.unique,
                        });
                    }
                }
                Statement::AlterTable { name, operations, .. } => {
                    let table_name = name.to_string();
                    for op in operations {
                        if let AlterTableOperation::AddConstraint(constraint) = op {
                            if let Some(parsed) = parse_table_constraint(&constraint, &table_name) {
                                if let Some(table) = script.tables.iter_mut().find(|t| t.name == table_name) {
                                    table.constraints.push(parsed);
                                }
                            }
                        }
                    }
                }
                Statement::CreateSchema { schema_name, .. } => {
                    script.database_names.push(schema_name.to_string());
                }
                _ => {}
            }
        }

        Ok(script)
    }
}

fn parse_table_constraint(constraint: &TableConstraint, _table_name: &str) -> Option<DdlConstraint> {
    match constraint {
        TableConstraint::Unique { name, columns, is_primary, .. } => Some(DdlConstraint {
            name: name.as_ref().map(|n| n.to_string()).unwrap_or_default(),
            constraint_type: if *is_primary { "PRIMARY KEY".to_string() } else { "UNIQUE".to_string() },
            columns: columns.iter().map(|c| c.to_string()).collect(),
        }),
        TableConstraint::ForeignKey { name, columns, .. } => Some(DdlConstraint {
            name: name.as_ref().map(|n| n.to_string()).unwrap_or_default(),
            constraint_type: "FOREIGN KEY".to_string(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
        }),
        TableConstraint::Check { name, .. } => Some(DdlConstraint {
            name: name.as_ref().map(|n| n.to_string()).unwrap_or_default(),
            constraint_type: "CHECK".to_string(),
            columns: Vec::new(),
        }),
        _ => None,
    }
}

fn excerpt(source: &str) -> String {
    source.chars().take(120).collect()
}

/// Parses a single DML statement (typically a MyBatis `SqlStatement`'s raw
/// text) just far enough to recover the table names it touches. MyBatis
/// `#{...}`/`${...}` placeholders are not valid SQL, so they are normalized
/// to `?` bind parameters before parsing; a statement that still fails to
/// parse yields no tables rather than failing the caller.
pub fn referenced_table_names(sql: &str) -> Vec<String> {
    let normalized = normalize_placeholders(sql);
    let dialect = GenericDialect {};
    let Ok(statements) = Parser::parse_sql(&dialect, &normalized) else {
        return Vec::new();
    };

    let mut tables = Vec::new();
    for stmt in &statements {
        collect_tables(stmt, &mut tables);
    }
    tables.sort();
    tables.dedup();
    tables
}

fn normalize_placeholders(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len());
    let mut chars = sql.chars().peekable();
    while let Some(c) = chars.next() {
        if (c == '#' || c == '$') && chars.peek() == Some(&'{') {
            chars.next();
            let mut depth = 1;
            while depth > 0 {
                match chars.next() {
                    Some('{') => depth += 1,
                    Some('}') => depth -= 1,
                    Some(_) => {}
                    None => break,
                }
            }
            out.push('?');
        } else {
            out.push(c);
        }
    }
    out
}

fn collect_tables(stmt: &Statement, out: &mut Vec<String>) {
    use sqlparser::ast::{SetExpr, TableFactor};

    fn from_table_factor(factor: &TableFactor, out: &mut Vec<String>) {
        match factor {
            TableFactor::Table { name, .. } => out.push(name.to_string()),
            TableFactor::Derived { subquery, .. } => collect_from_query(subquery, out),
            _ => {}
        }
    }

    fn collect_from_query(query: &sqlparser::ast::Query, out: &mut Vec<String>) {
        if let SetExpr::Select(select) = query.body.as_ref() {
            for twj in &select.from {
                from_table_factor(&twj.relation, out);
                for join in &twj.joins {
                    from_table_factor(&join.relation, out);
                }
            }
        }
    }

    match stmt {
        Statement::Query(query) => collect_from_query(query, out),
        Statement::Insert { table_name, .. } => out.push(table_name.to_string()),
        Statement::Update { table, .. } => from_table_factor(&table.relation, out),
        Statement::Delete { from, .. } => {
            for twj in from {
                from_table_factor(&twj.relation, out);
            }
        }
        _ => {}
    }
}
