//! MyBatis XML front-end (C1).
//!
//! Reads `<mapper namespace=...>` and its executable-statement children,
//! inlining `<include>` references to `<sql>` fragments before returning one
//! record per statement.

use std::collections::HashMap;
use std::path::Path;

use roxmltree::Document;

use crate::error::ParseError;
use crate::model::SqlType;

#[derive(Debug, Clone)]
pub struct MyBatisStatement {
    pub id: String,
    pub sql_type: SqlType,
    pub raw_text: String,
}

#[derive(Debug, Clone)]
pub struct MyBatisXmlMapper {
    pub namespace: Option<String>,
    pub statements: Vec<MyBatisStatement>,
}

pub struct MyBatisFrontend;

impl MyBatisFrontend {
    pub fn parse(&self, path: &Path, source: &str) -> Result<MyBatisXmlMapper, ParseError> {
        let doc = Document::parse(source).map_err(|e| ParseError::new(path, format!("xml parse error: {e}")))?;

        let mapper = doc
            .descendants()
            .find(|n| n.has_tag_name("mapper"))
            .ok_or_else(|| ParseError::new(path, "no <mapper> root element"))?;

        let namespace = mapper.attribute("namespace").map(str::to_string);

        let mut sql_fragments: HashMap<String, String> = HashMap::new();
        for node in mapper.children().filter(|n| n.has_tag_name("sql")) {
            if let Some(id) = node.attribute("id") {
                sql_fragments.insert(id.to_string(), inner_text(&node));
            }
        }

        let mut statements = Vec::new();
        for node in mapper.children() {
            let sql_type = match node.tag_name().name() {
                "select" => SqlType::Select,
                "insert" => SqlType::Insert,
                "update" => SqlType::Update,
                "delete" => SqlType::Delete,
                _ => continue,
            };
            let Some(id) = node.attribute("id") else { continue };
            let raw_text = resolve_includes(&node, &sql_fragments);
            statements.push(MyBatisStatement {
                id: id.to_string(),
                sql_type,
                raw_text,
            });
        }

        Ok(MyBatisXmlMapper { namespace, statements })
    }
}

fn inner_text(node: &roxmltree::Node) -> String {
    let mut out = String::new();
    for child in node.children() {
        if child.is_text() {
            out.push_str(child.text().unwrap_or_default());
        } else if child.has_tag_name("include") {
            // fragments are resolved by the caller once all <sql> ids are known
        } else {
            out.push_str(&inner_text(&child));
        }
    }
    out
}

fn resolve_includes(node: &roxmltree::Node, fragments: &HashMap<String, String>) -> String {
    let mut out = String::new();
    for child in node.children() {
        if child.is_text() {
            out.push_str(child.text().unwrap_or_default());
        } else if child.has_tag_name("include") {
            if let Some(refid) = child.attribute("refid") {
                if let Some(fragment) = fragments.get(refid) {
                    out.push_str(fragment);
                }
            }
        } else {
            out.push_str(&resolve_includes(&child, fragments));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn parses_namespace_and_statements() {
        let xml = r#"
        <mapper namespace="com.example.UserRepository">
            <select id="selectUserById" resultType="User">
                SELECT * FROM users WHERE id = #{id}
            </select>
        </mapper>
        "#;
        let mapper = MyBatisFrontend.parse(&PathBuf::from("UserRepository.xml"), xml).unwrap();
        assert_eq!(mapper.namespace.as_deref(), Some("com.example.UserRepository"));
        assert_eq!(mapper.statements.len(), 1);
        assert_eq!(mapper.statements[0].id, "selectUserById");
        assert_eq!(mapper.statements[0].sql_type, SqlType::Select);
    }

    #[test]
    fn inlines_sql_fragment_includes() {
        let xml = r#"
        <mapper namespace="com.example.UserRepository">
            <sql id="userColumns">id, email</sql>
            <select id="findAll">
                SELECT <include refid="userColumns"/> FROM users
            </select>
        </mapper>
        "#;
        let mapper = MyBatisFrontend.parse(&PathBuf::from("UserRepository.xml"), xml).unwrap();
        assert!(mapper.statements[0].raw_text.contains("id, email"));
    }
}
