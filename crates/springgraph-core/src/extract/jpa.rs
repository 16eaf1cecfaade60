//! JPA entity and repository extraction (spec.md §3/§4.3).
//!
//! Derived query methods are materialized as [`JpaQuery`] nodes, kept
//! distinct from `SqlStatement` per the open-question resolution recorded
//! in DESIGN.md.

use std::collections::BTreeMap;

use crate::frontend::java::JavaTypeDecl;
use crate::model::{DerivedQueryMethod, JpaEntity, JpaQuery, JpaRelationKind, JpaRelationship, JpaRepository};

const REPOSITORY_BASES: &[&str] = &["CrudRepository", "JpaRepository", "PagingAndSortingRepository", "Repository"];

const RELATION_ANNOTATIONS: &[(&str, JpaRelationKind)] = &[
    ("OneToOne", JpaRelationKind::OneToOne),
    ("OneToMany", JpaRelationKind::OneToMany),
    ("ManyToOne", JpaRelationKind::ManyToOne),
    ("ManyToMany", JpaRelationKind::ManyToMany),
];

pub fn jpa_entity(project_name: &str, class: &JavaTypeDecl) -> Option<JpaEntity> {
    if !class.annotations.iter().any(|a| a.name == "Entity") {
        return None;
    }

    let table_name = class
        .annotations
        .iter()
        .find(|a| a.name == "Table")
        .and_then(|a| a.parameters.get("name").cloned())
        .unwrap_or_else(|| class.name.clone());

    let id_fields = class
        .fields
        .iter()
        .filter(|f| f.annotations.iter().any(|a| a.name == "Id"))
        .map(|f| f.name.clone())
        .collect();

    let relationships = class
        .fields
        .iter()
        .filter_map(|f| {
            f.annotations.iter().find_map(|a| {
                RELATION_ANNOTATIONS.iter().find(|(n, _)| *n == a.name).map(|(_, kind)| JpaRelationship {
                    kind: *kind,
                    target_class: strip_generic(&f.field_type),
                })
            })
        })
        .collect();

    Some(JpaEntity {
        project_name: project_name.to_string(),
        class_name: class.name.clone(),
        table_name,
        id_fields,
        relationships,
    })
}

pub fn jpa_repository(project_name: &str, class: &JavaTypeDecl) -> Option<(JpaRepository, Vec<JpaQuery>)> {
    use crate::model::ClassKind;
    if class.kind != ClassKind::Interface {
        return None;
    }

    let generic_parent = class
        .implements
        .iter()
        .chain(class.extends.iter())
        .find(|t| REPOSITORY_BASES.iter().any(|base| t.starts_with(base)))?;

    let entity_type = generic_args(generic_parent).into_iter().next().unwrap_or_default();

    let mut derived_query_methods = BTreeMap::new();
    let mut explicit_queries = Vec::new();
    let mut jpa_queries = Vec::new();

    for method in &class.methods {
        if let Some(query_annotation) = method.annotations.iter().find(|a| a.name == "Query") {
            if let Some(sql) = query_annotation.parameters.get("value") {
                explicit_queries.push(sql.clone());
            }
            continue;
        }

        if let Some(derived) = parse_derived_query(&method.name) {
            jpa_queries.push(JpaQuery {
                project_name: project_name.to_string(),
                repository_class: class.name.clone(),
                method_name: method.name.clone(),
                operation: derived.operation.clone(),
                selector: derived.selector.clone(),
            });
            derived_query_methods.insert(method.name.clone(), derived);
        }
    }

    Some((
        JpaRepository {
            project_name: project_name.to_string(),
            class_name: class.name.clone(),
            entity_type,
            derived_query_methods,
            explicit_queries,
        },
        jpa_queries,
    ))
}

fn parse_derived_query(method_name: &str) -> Option<DerivedQueryMethod> {
    const PREFIXES: &[&str] = &["findBy", "countBy", "existsBy", "deleteBy", "getBy"];
    let prefix = PREFIXES.iter().find(|p| method_name.starts_with(*p))?;
    let operation = prefix.trim_end_matches("By").to_string();
    let selector = method_name[prefix.len()..].to_string();
    Some(DerivedQueryMethod {
        operation,
        selector,
        projection: None,
    })
}

fn generic_args(type_text: &str) -> Vec<String> {
    let Some(start) = type_text.find('<') else { return Vec::new() };
    let Some(end) = type_text.rfind('>') else { return Vec::new() };
    if end <= start {
        return Vec::new();
    }
    type_text[start + 1..end].split(',').map(|s| s.trim().to_string()).collect()
}

fn strip_generic(type_text: &str) -> String {
    generic_args(type_text).into_iter().next().unwrap_or_else(|| type_text.to_string())
}
