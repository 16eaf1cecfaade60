//! Post-parse resolver (C6): three independent passes, each expressed as a
//! query against the already-populated graph rather than an in-memory
//! traversal (spec.md §4.6). Bean dependency cycles need no special
//! handling here — edges are created with MERGE-equivalent upserts, not by
//! recursive traversal (spec.md §9).

use std::collections::HashMap;

use tracing::info;

use crate::error::ResolverError;
use crate::model::{Edge, EdgeKind, NodeKind};
use crate::writer::GraphStore;

const INJECTION_MARKERS: &[&str] = &["Autowired", "Inject", "Resource"];

/// Pass 1: field, constructor, and setter bean dependency injection
/// (spec.md §4.6.1). Returns the edges created and any individual
/// `upsert_edge` failures, each wrapped as a `ResolverError` (spec.md §4.6
/// "Failure semantics": one failed edge never aborts the pass).
pub fn resolve_bean_dependencies(store: &mut dyn GraphStore, project_name: &str) -> (usize, Vec<ResolverError>) {
    let beans = store.nodes_of_kind(NodeKind::Bean);
    let bean_by_class: HashMap<String, crate::model::Bean> = beans
        .into_iter()
        .filter_map(|n| match n {
            crate::model::Node::Bean(b) if b.project_name == project_name => Some((b.class_name.clone(), b)),
            _ => None,
        })
        .collect();

    let mut created = 0usize;
    let mut errors = Vec::new();

    for field_node in store.nodes_of_kind(NodeKind::Field) {
        let crate::model::Node::Field(field) = field_node else { continue };
        if field.project_name != project_name {
            continue;
        }
        let Some(source_bean) = bean_by_class.get(&field.class_name) else { continue };
        if !field.annotations.iter().any(|a| INJECTION_MARKERS.contains(&a.name.as_str())) {
            continue;
        }
        let Some(target_bean) = bean_by_class.get(&field.field_type) else { continue };

        let edge = Edge::new(EdgeKind::DependsOn, source_bean.identity(), target_bean.identity())
            .with_attr("injection_type", "field")
            .with_attr("parameter_name", field.name.clone())
            .with_attr("created_by", "resolver");
        match store.upsert_edge(edge) {
            Ok(()) => created += 1,
            Err(e) => errors.push(ResolverError {
                pass: "bean_dependencies",
                message: format!("field injection {}.{}: {e}", field.class_name, field.name),
            }),
        }
    }

    for method_node in store.nodes_of_kind(NodeKind::Method) {
        let crate::model::Node::Method(method) = method_node else { continue };
        if method.project_name != project_name {
            continue;
        }
        let Some(source_bean) = bean_by_class.get(&method.class_name) else { continue };

        if method.is_constructor() {
            for param in &method.parameters {
                let Some(target_bean) = bean_by_class.get(&param.param_type) else { continue };
                let edge = Edge::new(EdgeKind::DependsOn, source_bean.identity(), target_bean.identity())
                    .with_attr("injection_type", "constructor")
                    .with_attr("parameter_name", param.name.clone())
                    .with_attr("parameter_order", param.order as i64)
                    .with_attr("created_by", "resolver");
                match store.upsert_edge(edge) {
                    Ok(()) => created += 1,
                    Err(e) => errors.push(ResolverError {
                        pass: "bean_dependencies",
                        message: format!("constructor injection {}.{}: {e}", method.class_name, param.name),
                    }),
                }
            }
            continue;
        }

        let is_annotated_setter = method.name.starts_with("set")
            && method.annotations.iter().any(|a| INJECTION_MARKERS.contains(&a.name.as_str()));
        if is_annotated_setter {
            if let Some(param) = method.parameters.first() {
                let Some(target_bean) = bean_by_class.get(&param.param_type) else { continue };
                let edge = Edge::new(EdgeKind::DependsOn, source_bean.identity(), target_bean.identity())
                    .with_attr("injection_type", "setter")
                    .with_attr("parameter_name", param.name.clone())
                    .with_attr("created_by", "resolver");
                match store.upsert_edge(edge) {
                    Ok(()) => created += 1,
                    Err(e) => errors.push(ResolverError {
                        pass: "bean_dependencies",
                        message: format!("setter injection {}.{}: {e}", method.class_name, method.name),
                    }),
                }
            }
        }
    }

    info!(project_name, created, errors = errors.len(), "bean dependency resolution pass complete");
    (created, errors)
}

/// Pass 2: the declarative rule in invariant I7 — a `CALLS` edge from a
/// Mapper/Repository method to its same-named `SqlStatement`.
pub fn resolve_method_sql_bindings(store: &mut dyn GraphStore, project_name: &str) -> (usize, Vec<ResolverError>) {
    let statements: HashMap<(String, String), crate::model::SqlStatement> = store
        .nodes_of_kind(NodeKind::SqlStatement)
        .into_iter()
        .filter_map(|n| match n {
            crate::model::Node::SqlStatement(s) if s.project_name == project_name => {
                Some(((s.mapper_name.clone(), s.id.clone()), s))
            }
            _ => None,
        })
        .collect();

    let mut created = 0usize;
    let mut errors = Vec::new();
    for node in store.nodes_of_kind(NodeKind::Method) {
        let crate::model::Node::Method(method) = node else { continue };
        if method.project_name != project_name {
            continue;
        }
        let eligible = method.class_name.ends_with("Mapper") || method.class_name.ends_with("Repository");
        if !eligible {
            continue;
        }
        let Some(statement) = statements.get(&(method.class_name.clone(), method.name.clone())) else { continue };

        let edge = Edge::new(EdgeKind::Calls, method.identity(), statement.identity()).with_attr("created_by", "resolver");
        match store.upsert_edge(edge) {
            Ok(()) => created += 1,
            Err(e) => errors.push(ResolverError {
                pass: "method_sql_bindings",
                message: format!("{}.{}: {e}", method.class_name, method.name),
            }),
        }
    }

    info!(project_name, created, errors = errors.len(), "method-to-sql binding pass complete");
    (created, errors)
}

/// Pass 3: `USES_TABLE` edges from each `SqlStatement`'s previously-parsed
/// table list. Tables referenced in SQL but absent from DDL are *not*
/// created as silent Table nodes — they are returned as diagnostics
/// instead (spec.md §4.6.3).
pub fn resolve_table_usage(store: &mut dyn GraphStore, project_name: &str) -> (usize, Vec<String>, Vec<ResolverError>) {
    let tables: HashMap<String, crate::model::Table> = store
        .nodes_of_kind(NodeKind::Table)
        .into_iter()
        .filter_map(|n| match n {
            crate::model::Node::Table(t) if t.project_name == project_name => Some((t.name.clone(), t)),
            _ => None,
        })
        .collect();

    let mut created = 0usize;
    let mut missing = Vec::new();
    let mut errors = Vec::new();

    for node in store.nodes_of_kind(NodeKind::SqlStatement) {
        let crate::model::Node::SqlStatement(stmt) = node else { continue };
        if stmt.project_name != project_name {
            continue;
        }
        for table_name in &stmt.tables {
            match tables.get(table_name) {
                Some(table) => {
                    let edge = Edge::new(EdgeKind::UsesTable, stmt.identity(), table.identity()).with_attr("created_by", "resolver");
                    match store.upsert_edge(edge) {
                        Ok(()) => created += 1,
                        Err(e) => errors.push(ResolverError {
                            pass: "table_usage",
                            message: format!("{}.{} -> {table_name}: {e}", stmt.mapper_name, stmt.id),
                        }),
                    }
                }
                None => missing.push(format!("{}.{}: missing_table={}", stmt.mapper_name, stmt.id, table_name)),
            }
        }
    }

    info!(project_name, created, missing = missing.len(), errors = errors.len(), "sql-to-table resolution pass complete");
    (created, missing, errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::ArtifactBundle;
    use crate::model::*;
    use crate::writer::InMemoryGraphStore;

    fn bean(class_name: &str, name: &str) -> Bean {
        Bean {
            project_name: "demo".into(),
            name: name.into(),
            kind: BeanKind::Service,
            class_name: class_name.into(),
            scope: "singleton".into(),
        }
    }

    #[test]
    fn constructor_injection_creates_ordered_depends_on_edges() {
        let mut store = InMemoryGraphStore::new();
        store.ensure_project("demo", true).unwrap();

        let controller_bean = bean("UserController", "userController");
        let service_bean = bean("UserService", "userService");

        let controller = Method {
            project_name: "demo".into(),
            class_name: "UserController".into(),
            name: "UserController".into(),
            signature: "(UserService)".into(),
            parameters: vec![MethodParam {
                name: "userService".into(),
                param_type: "UserService".into(),
                order: 0,
            }],
            return_type: "void".into(),
            modifiers: vec![],
            annotations: vec![],
            logical_name: None,
        };

        let mut bundle = ArtifactBundle::new("UserController.java");
        bundle.push_node(Node::Bean(controller_bean));
        bundle.push_node(Node::Bean(service_bean));
        bundle.push_node(Node::Method(controller));
        store.write_bundle(&bundle).unwrap();

        let (created, errors) = resolve_bean_dependencies(&mut store, "demo");
        assert_eq!(created, 1);
        assert!(errors.is_empty());
        let edges = store.edges_of_kind(EdgeKind::DependsOn);
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].attrs.get("parameter_order"), Some(&AttrValue::Int(0)));
    }

    #[test]
    fn method_sql_binding_matches_mapper_and_repository_suffixes() {
        let mut store = InMemoryGraphStore::new();
        store.ensure_project("demo", true).unwrap();

        let method = Method {
            project_name: "demo".into(),
            class_name: "UserRepository".into(),
            name: "findById".into(),
            signature: "(long)".into(),
            parameters: vec![],
            return_type: "User".into(),
            modifiers: vec![],
            annotations: vec![],
            logical_name: None,
        };
        let statement = SqlStatement {
            project_name: "demo".into(),
            mapper_name: "UserRepository".into(),
            id: "findById".into(),
            sql_type: SqlType::Select,
            sql_content: "SELECT * FROM users WHERE id=?".into(),
            tables: vec!["users".into()],
            parameters: vec![],
        };

        let mut bundle = ArtifactBundle::new("UserRepository.java");
        bundle.push_node(Node::Method(method));
        bundle.push_node(Node::SqlStatement(statement));
        store.write_bundle(&bundle).unwrap();

        let (created, errors) = resolve_method_sql_bindings(&mut store, "demo");
        assert_eq!(created, 1);
        assert!(errors.is_empty());
    }

    #[test]
    fn table_usage_reports_missing_tables_as_diagnostics() {
        let mut store = InMemoryGraphStore::new();
        store.ensure_project("demo", true).unwrap();

        let statement = SqlStatement {
            project_name: "demo".into(),
            mapper_name: "OrderRepository".into(),
            id: "findAll".into(),
            sql_type: SqlType::Select,
            sql_content: "SELECT * FROM orders".into(),
            tables: vec!["orders".into()],
            parameters: vec![],
        };
        let mut bundle = ArtifactBundle::new("OrderRepository.xml");
        bundle.push_node(Node::SqlStatement(statement));
        store.write_bundle(&bundle).unwrap();

        let (created, missing, errors) = resolve_table_usage(&mut store, "demo");
        assert_eq!(created, 0);
        assert_eq!(missing.len(), 1);
        assert!(errors.is_empty());
    }
}
