//! The labelled property graph's node and edge catalogue.
//!
//! The original engine this is modeled on holds these as reflective,
//! dynamically-typed records. Here every node kind is an explicit struct and
//! every edge kind an explicit enum variant; the writer dispatches on kind
//! rather than duck-typing a record's shape.

use std::collections::BTreeMap;
use std::fmt;

/// A scalar edge/annotation-parameter attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Str(String),
    Int(i64),
    Bool(bool),
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::Str(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::Str(value)
    }
}

impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        AttrValue::Int(value)
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        AttrValue::Bool(value)
    }
}

/// An opaque, per-kind composite identity key.
///
/// Two nodes of the same kind with the same `NodeId` are the same node for
/// upsert purposes (invariant I6). The key is built from a node's identity
/// fields joined by a separator byte that cannot appear in any identity
/// field we accept (names, paths, signatures).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(String);

const KEY_SEP: char = '\u{1}';

impl NodeId {
    fn build(kind: NodeKind, parts: &[&str]) -> Self {
        let mut s = String::new();
        s.push_str(kind.as_str());
        for part in parts {
            s.push(KEY_SEP);
            s.push_str(part);
        }
        NodeId(s)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeKind {
    Project,
    Package,
    Class,
    Method,
    Field,
    Annotation,
    Bean,
    Endpoint,
    JpaEntity,
    JpaRepository,
    JpaQuery,
    MyBatisMapper,
    SqlStatement,
    Database,
    Table,
    Column,
    Index,
    Constraint,
    TestClass,
    ConfigFile,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Project => "Project",
            NodeKind::Package => "Package",
            NodeKind::Class => "Class",
            NodeKind::Method => "Method",
            NodeKind::Field => "Field",
            NodeKind::Annotation => "Annotation",
            NodeKind::Bean => "Bean",
            NodeKind::Endpoint => "Endpoint",
            NodeKind::JpaEntity => "JpaEntity",
            NodeKind::JpaRepository => "JpaRepository",
            NodeKind::JpaQuery => "JpaQuery",
            NodeKind::MyBatisMapper => "MyBatisMapper",
            NodeKind::SqlStatement => "SqlStatement",
            NodeKind::Database => "Database",
            NodeKind::Table => "Table",
            NodeKind::Column => "Column",
            NodeKind::Index => "Index",
            NodeKind::Constraint => "Constraint",
            NodeKind::TestClass => "TestClass",
            NodeKind::ConfigFile => "ConfigFile",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EdgeKind {
    HasPackage,
    Contains,
    HasMethod,
    HasField,
    Extends,
    Implements,
    HasAnnotation,
    DeclaresBean,
    HasEndpoint,
    DependsOn,
    HasSqlStatement,
    Calls,
    UsesTable,
    HasColumn,
}

impl EdgeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeKind::HasPackage => "HAS_PACKAGE",
            EdgeKind::Contains => "CONTAINS",
            EdgeKind::HasMethod => "HAS_METHOD",
            EdgeKind::HasField => "HAS_FIELD",
            EdgeKind::Extends => "EXTENDS",
            EdgeKind::Implements => "IMPLEMENTS",
            EdgeKind::HasAnnotation => "HAS_ANNOTATION",
            EdgeKind::DeclaresBean => "DECLARES_BEAN",
            EdgeKind::HasEndpoint => "HAS_ENDPOINT",
            EdgeKind::DependsOn => "DEPENDS_ON",
            EdgeKind::HasSqlStatement => "HAS_SQL_STATEMENT",
            EdgeKind::Calls => "CALLS",
            EdgeKind::UsesTable => "USES_TABLE",
            EdgeKind::HasColumn => "HAS_COLUMN",
        }
    }
}

/// An edge, keyed for upsert by `(kind, from, to)` per spec — duplicate
/// inserts of the same triple are no-ops regardless of attrs.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub kind: EdgeKind,
    pub from: NodeId,
    pub to: NodeId,
    pub attrs: BTreeMap<String, AttrValue>,
}

impl Edge {
    pub fn new(kind: EdgeKind, from: NodeId, to: NodeId) -> Self {
        Edge {
            kind,
            from,
            to,
            attrs: BTreeMap::new(),
        }
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassKind {
    Class,
    Interface,
    Enum,
    Abstract,
    Annotation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotationTarget {
    Class,
    Method,
    Field,
    Parameter,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub name: String,
    pub parameters: BTreeMap<String, String>,
    pub target: AnnotationTarget,
}

/// The graph-node form of an [`Annotation`]: carried as an embedded value on
/// its carrier struct (above) *and* materialized as its own node so
/// `HAS_ANNOTATION` edges (spec.md §3) have something concrete to point at.
/// `ordinal` disambiguates repeated annotations of the same name on one
/// carrier (e.g. two `@Parameter` annotations).
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationNode {
    pub project_name: String,
    pub carrier: NodeId,
    pub ordinal: u32,
    pub name: String,
    pub parameters: BTreeMap<String, String>,
    pub target: AnnotationTarget,
}

impl AnnotationNode {
    pub fn identity(&self) -> NodeId {
        NodeId::build(
            NodeKind::Annotation,
            &[&self.project_name, self.carrier.as_str(), &self.ordinal.to_string(), &self.name],
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeanKind {
    Component,
    Service,
    Repository,
    Controller,
    Configuration,
    FactoryMethod,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JpaRelationKind {
    OneToOne,
    OneToMany,
    ManyToOne,
    ManyToMany,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JpaRelationship {
    pub kind: JpaRelationKind,
    pub target_class: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    Select,
    Insert,
    Update,
    Delete,
    Merge,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapperSource {
    Interface,
    Xml,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodParam {
    pub name: String,
    pub param_type: String,
    pub order: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Project {
    pub name: String,
}

impl Project {
    pub fn identity(&self) -> NodeId {
        NodeId::build(NodeKind::Project, &[&self.name])
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Package {
    pub project_name: String,
    pub name: String,
    pub logical_name: Option<String>,
}

impl Package {
    pub fn identity(&self) -> NodeId {
        NodeId::build(NodeKind::Package, &[&self.project_name, &self.name])
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Class {
    pub project_name: String,
    pub name: String,
    pub kind: ClassKind,
    pub modifiers: Vec<String>,
    pub file_path: String,
    pub source_text: Option<String>,
    pub logical_name: Option<String>,
    pub description: Option<String>,
}

impl Class {
    pub fn identity(&self) -> NodeId {
        NodeId::build(NodeKind::Class, &[&self.project_name, &self.name])
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Method {
    pub project_name: String,
    pub class_name: String,
    pub name: String,
    pub signature: String,
    pub parameters: Vec<MethodParam>,
    pub return_type: String,
    pub modifiers: Vec<String>,
    pub annotations: Vec<Annotation>,
    pub logical_name: Option<String>,
}

impl Method {
    pub fn identity(&self) -> NodeId {
        NodeId::build(
            NodeKind::Method,
            &[&self.project_name, &self.class_name, &self.name, &self.signature],
        )
    }

    /// "an `is_constructor` flag equals (`name == class_name`)" — spec.md §3.
    pub fn is_constructor(&self) -> bool {
        self.name == self.class_name
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub project_name: String,
    pub class_name: String,
    pub name: String,
    pub field_type: String,
    pub modifiers: Vec<String>,
    pub annotations: Vec<Annotation>,
    pub initializer_text: Option<String>,
    pub logical_name: Option<String>,
}

impl Field {
    pub fn identity(&self) -> NodeId {
        NodeId::build(NodeKind::Field, &[&self.project_name, &self.class_name, &self.name])
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bean {
    pub project_name: String,
    pub name: String,
    pub kind: BeanKind,
    pub class_name: String,
    pub scope: String,
}

impl Bean {
    pub fn identity(&self) -> NodeId {
        NodeId::build(NodeKind::Bean, &[&self.project_name, &self.name])
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Endpoint {
    pub project_name: String,
    pub controller_class: String,
    pub handler_method: String,
    pub http_method: String,
    pub path: String,
}

impl Endpoint {
    pub fn identity(&self) -> NodeId {
        NodeId::build(
            NodeKind::Endpoint,
            &[
                &self.project_name,
                &self.controller_class,
                &self.handler_method,
                &self.http_method,
                &self.path,
            ],
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct JpaEntity {
    pub project_name: String,
    pub class_name: String,
    pub table_name: String,
    pub id_fields: Vec<String>,
    pub relationships: Vec<JpaRelationship>,
}

impl JpaEntity {
    pub fn identity(&self) -> NodeId {
        NodeId::build(NodeKind::JpaEntity, &[&self.project_name, &self.class_name])
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DerivedQueryMethod {
    pub operation: String,
    pub selector: String,
    pub projection: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JpaRepository {
    pub project_name: String,
    pub class_name: String,
    pub entity_type: String,
    pub derived_query_methods: BTreeMap<String, DerivedQueryMethod>,
    pub explicit_queries: Vec<String>,
}

impl JpaRepository {
    pub fn identity(&self) -> NodeId {
        NodeId::build(NodeKind::JpaRepository, &[&self.project_name, &self.class_name])
    }
}

/// Kept distinct from `SqlStatement` per the open-question resolution in
/// DESIGN.md: derived JPA query methods are not materialized as SQL.
#[derive(Debug, Clone, PartialEq)]
pub struct JpaQuery {
    pub project_name: String,
    pub repository_class: String,
    pub method_name: String,
    pub operation: String,
    pub selector: String,
}

impl JpaQuery {
    pub fn identity(&self) -> NodeId {
        NodeId::build(
            NodeKind::JpaQuery,
            &[&self.project_name, &self.repository_class, &self.method_name],
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MyBatisMapper {
    pub project_name: String,
    pub name: String,
    pub source: MapperSource,
    pub xml_path: Option<String>,
    pub namespace: Option<String>,
}

impl MyBatisMapper {
    pub fn identity(&self) -> NodeId {
        NodeId::build(NodeKind::MyBatisMapper, &[&self.project_name, &self.name])
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SqlStatement {
    pub project_name: String,
    pub mapper_name: String,
    pub id: String,
    pub sql_type: SqlType,
    pub sql_content: String,
    pub tables: Vec<String>,
    pub parameters: Vec<String>,
}

impl SqlStatement {
    pub fn identity(&self) -> NodeId {
        NodeId::build(NodeKind::SqlStatement, &[&self.project_name, &self.mapper_name, &self.id])
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Database {
    pub project_name: String,
    pub name: String,
}

impl Database {
    pub fn identity(&self) -> NodeId {
        NodeId::build(NodeKind::Database, &[&self.project_name, &self.name])
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub project_name: String,
    pub database_name: String,
    pub name: String,
}

impl Table {
    pub fn identity(&self) -> NodeId {
        NodeId::build(NodeKind::Table, &[&self.project_name, &self.database_name, &self.name])
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub project_name: String,
    pub table_name: String,
    pub name: String,
    pub data_type: String,
    pub nullable: bool,
    pub default_value: Option<String>,
}

impl Column {
    pub fn identity(&self) -> NodeId {
        NodeId::build(NodeKind::Column, &[&self.project_name, &self.table_name, &self.name])
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Index {
    pub project_name: String,
    pub table_name: String,
    pub name: String,
    pub columns: Vec<String>,
    pub unique: bool,
}

impl Index {
    pub fn identity(&self) -> NodeId {
        NodeId::build(NodeKind::Index, &[&self.project_name, &self.table_name, &self.name])
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    pub project_name: String,
    pub table_name: String,
    pub name: String,
    pub constraint_type: String,
    pub columns: Vec<String>,
}

impl Constraint {
    pub fn identity(&self) -> NodeId {
        NodeId::build(NodeKind::Constraint, &[&self.project_name, &self.table_name, &self.name])
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TestClass {
    pub project_name: String,
    pub class_name: String,
    pub subject_under_test: Option<String>,
    pub framework_markers: Vec<String>,
}

impl TestClass {
    pub fn identity(&self) -> NodeId {
        NodeId::build(NodeKind::TestClass, &[&self.project_name, &self.class_name])
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    pub project_name: String,
    pub path: String,
    pub entries: BTreeMap<String, String>,
}

impl ConfigFile {
    pub fn identity(&self) -> NodeId {
        NodeId::build(NodeKind::ConfigFile, &[&self.project_name, &self.path])
    }
}

/// A sealed set of node labels (spec.md §9: "re-implement as explicit tagged
/// variants ... and a sealed set of node labels").
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Project(Project),
    Package(Package),
    Class(Class),
    Method(Method),
    Field(Field),
    AnnotationNode(AnnotationNode),
    Bean(Bean),
    Endpoint(Endpoint),
    JpaEntity(JpaEntity),
    JpaRepository(JpaRepository),
    JpaQuery(JpaQuery),
    MyBatisMapper(MyBatisMapper),
    SqlStatement(SqlStatement),
    Database(Database),
    Table(Table),
    Column(Column),
    Index(Index),
    Constraint(Constraint),
    TestClass(TestClass),
    ConfigFile(ConfigFile),
}

impl Node {
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Project(_) => NodeKind::Project,
            Node::Package(_) => NodeKind::Package,
            Node::Class(_) => NodeKind::Class,
            Node::Method(_) => NodeKind::Method,
            Node::Field(_) => NodeKind::Field,
            Node::AnnotationNode(_) => NodeKind::Annotation,
            Node::Bean(_) => NodeKind::Bean,
            Node::Endpoint(_) => NodeKind::Endpoint,
            Node::JpaEntity(_) => NodeKind::JpaEntity,
            Node::JpaRepository(_) => NodeKind::JpaRepository,
            Node::JpaQuery(_) => NodeKind::JpaQuery,
            Node::MyBatisMapper(_) => NodeKind::MyBatisMapper,
            Node::SqlStatement(_) => NodeKind::SqlStatement,
            Node::Database(_) => NodeKind::Database,
            Node::Table(_) => NodeKind::Table,
            Node::Column(_) => NodeKind::Column,
            Node::Index(_) => NodeKind::Index,
            Node::Constraint(_) => NodeKind::Constraint,
            Node::TestClass(_) => NodeKind::TestClass,
            Node::ConfigFile(_) => NodeKind::ConfigFile,
        }
    }

    pub fn identity(&self) -> NodeId {
        match self {
            Node::Project(n) => n.identity(),
            Node::Package(n) => n.identity(),
            Node::Class(n) => n.identity(),
            Node::Method(n) => n.identity(),
            Node::Field(n) => n.identity(),
            Node::AnnotationNode(n) => n.identity(),
            Node::Bean(n) => n.identity(),
            Node::Endpoint(n) => n.identity(),
            Node::JpaEntity(n) => n.identity(),
            Node::JpaRepository(n) => n.identity(),
            Node::JpaQuery(n) => n.identity(),
            Node::MyBatisMapper(n) => n.identity(),
            Node::SqlStatement(n) => n.identity(),
            Node::Database(n) => n.identity(),
            Node::Table(n) => n.identity(),
            Node::Column(n) => n.identity(),
            Node::Index(n) => n.identity(),
            Node::Constraint(n) => n.identity(),
            Node::TestClass(n) => n.identity(),
            Node::ConfigFile(n) => n.identity(),
        }
    }

    /// `HAS_ANNOTATION` targets are embedded on the carrier rather than
    /// being separate nodes in the bundle; this returns the carrier's own
    /// annotation list where one exists.
    pub fn annotations(&self) -> &[Annotation] {
        match self {
            Node::Class(_) => &[],
            Node::Method(m) => &m.annotations,
            Node::Field(f) => &f.annotations,
            _ => &[],
        }
    }

    pub fn project_name(&self) -> &str {
        match self {
            Node::Project(n) => &n.name,
            Node::Package(n) => &n.project_name,
            Node::Class(n) => &n.project_name,
            Node::Method(n) => &n.project_name,
            Node::Field(n) => &n.project_name,
            Node::AnnotationNode(n) => &n.project_name,
            Node::Bean(n) => &n.project_name,
            Node::Endpoint(n) => &n.project_name,
            Node::JpaEntity(n) => &n.project_name,
            Node::JpaRepository(n) => &n.project_name,
            Node::JpaQuery(n) => &n.project_name,
            Node::MyBatisMapper(n) => &n.project_name,
            Node::SqlStatement(n) => &n.project_name,
            Node::Database(n) => &n.project_name,
            Node::Table(n) => &n.project_name,
            Node::Column(n) => &n.project_name,
            Node::Index(n) => &n.project_name,
            Node::Constraint(n) => &n.project_name,
            Node::TestClass(n) => &n.project_name,
            Node::ConfigFile(n) => &n.project_name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_is_stable_across_equal_inputs() {
        let a = Class {
            project_name: "demo".into(),
            name: "UserService".into(),
            kind: ClassKind::Class,
            modifiers: vec!["public".into()],
            file_path: "UserService.java".into(),
            source_text: None,
            logical_name: None,
            description: None,
        };
        let b = a.clone();
        assert_eq!(a.identity(), b.identity());
    }

    #[test]
    fn identity_differs_across_kinds_with_same_names() {
        let project_name = "demo".to_string();
        let class = Class {
            project_name: project_name.clone(),
            name: "Foo".into(),
            kind: ClassKind::Class,
            modifiers: vec![],
            file_path: "Foo.java".into(),
            source_text: None,
            logical_name: None,
            description: None,
        };
        let bean = Bean {
            project_name,
            name: "Foo".into(),
            kind: BeanKind::Component,
            class_name: "Foo".into(),
            scope: "singleton".into(),
        };
        assert_ne!(class.identity(), bean.identity());
    }

    #[test]
    fn method_is_constructor_matches_class_name() {
        let m = Method {
            project_name: "demo".into(),
            class_name: "UserService".into(),
            name: "UserService".into(),
            signature: "()".into(),
            parameters: vec![],
            return_type: "void".into(),
            modifiers: vec![],
            annotations: vec![],
            logical_name: None,
        };
        assert!(m.is_constructor());
    }
}
