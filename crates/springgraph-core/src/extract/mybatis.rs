//! MyBatis interface-mapper extraction (spec.md §4.3): `@Mapper` interfaces
//! with `@Select`/`@Insert`/`@Update`/`@Delete`-annotated methods emit one
//! mapper plus one `SqlStatement` per annotated method.

use crate::frontend::java::JavaTypeDecl;
use crate::frontend::mybatis::MyBatisXmlMapper;
use crate::model::{ClassKind, MapperSource, MyBatisMapper, SqlStatement, SqlType};

const SQL_ANNOTATIONS: &[(&str, SqlType)] = &[
    ("Select", SqlType::Select),
    ("Insert", SqlType::Insert),
    ("Update", SqlType::Update),
    ("Delete", SqlType::Delete),
];

pub fn interface_mapper(project_name: &str, class: &JavaTypeDecl) -> Option<(MyBatisMapper, Vec<SqlStatement>)> {
    if class.kind != ClassKind::Interface {
        return None;
    }
    if !class.annotations.iter().any(|a| a.name == "Mapper") {
        return None;
    }

    let mut statements = Vec::new();
    for method in &class.methods {
        if let Some((annotation, sql_type)) = method
            .annotations
            .iter()
            .find_map(|a| SQL_ANNOTATIONS.iter().find(|(n, _)| *n == a.name).map(|(_, t)| (a, *t)))
        {
            let sql_content = annotation.parameters.get("value").cloned().unwrap_or_default();
            statements.push(SqlStatement {
                project_name: project_name.to_string(),
                mapper_name: class.name.clone(),
                id: method.name.clone(),
                sql_type,
                sql_content: sql_content.clone(),
                tables: crate::frontend::ddl::referenced_table_names(&sql_content),
                parameters: method.parameters.iter().map(|p| p.name.clone()).collect(),
            });
        }
    }

    Some((
        MyBatisMapper {
            project_name: project_name.to_string(),
            name: class.name.clone(),
            source: MapperSource::Interface,
            xml_path: None,
            namespace: None,
        },
        statements,
    ))
}

/// Converts a parsed XML mapper (spec.md §4.1's MyBatis front-end output)
/// into the same `MyBatisMapper`/`SqlStatement` shape the interface-mapper
/// path produces. `SqlStatement` identity is `(project, mapper_name, id)`
/// regardless of origin, so an interface mapper and its XML counterpart
/// deduplicate onto the same node (spec.md §8 scenario 4).
pub fn xml_mapper(project_name: &str, xml_path: &str, xml: &MyBatisXmlMapper) -> (MyBatisMapper, Vec<SqlStatement>) {
    let namespace = xml.namespace.clone();
    let mapper_name = namespace
        .as_deref()
        .and_then(|ns| ns.rsplit('.').next())
        .unwrap_or("UnknownMapper")
        .to_string();

    let statements = xml
        .statements
        .iter()
        .map(|s| SqlStatement {
            project_name: project_name.to_string(),
            mapper_name: mapper_name.clone(),
            id: s.id.clone(),
            sql_type: s.sql_type,
            sql_content: s.raw_text.clone(),
            tables: crate::frontend::ddl::referenced_table_names(&s.raw_text),
            parameters: Vec::new(),
        })
        .collect();

    (
        MyBatisMapper {
            project_name: project_name.to_string(),
            name: mapper_name,
            source: MapperSource::Xml,
            xml_path: Some(xml_path.to_string()),
            namespace,
        },
        statements,
    )
}
