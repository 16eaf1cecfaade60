//! Orchestrates C3 for one parsed Java compilation unit: emits Package,
//! then each Class (including nested members) in the fixed order spec.md
//! §4.3/§5 describes, followed by the Bean/Endpoint/JPA/MyBatis/Test
//! artifacts derivable from that class.

use std::path::Path;

use crate::bundle::ArtifactBundle;
use crate::extract::{bean, endpoint, jpa, mybatis, test_class};
use crate::frontend::java::{JavaAnnotation, JavaCompilationUnit, JavaFieldDecl, JavaMethodDecl, JavaTypeDecl};
use crate::model::{
    AnnotationNode, AnnotationTarget, Class, Edge, EdgeKind, Field, Method, MethodParam, Node, NodeId, Package,
    Project,
};
use crate::rules::{ConstructKind, LogicalNameRuleSet};

pub fn extract_compilation_unit(
    project_name: &str,
    path: &Path,
    source_text: &str,
    cu: &JavaCompilationUnit,
    rules: &LogicalNameRuleSet,
) -> ArtifactBundle {
    let mut bundle = ArtifactBundle::new(path);

    let package_id = cu.package_name.as_ref().map(|name| {
        let package = Package {
            project_name: project_name.to_string(),
            name: name.clone(),
            logical_name: None,
        };
        let id = package.identity();
        bundle.push_node(Node::Package(package));
        let project_id = Project { name: project_name.to_string() }.identity();
        bundle.push_edge(Edge::new(EdgeKind::HasPackage, project_id, id.clone()));
        id
    });

    for type_decl in &cu.types {
        extract_class(project_name, path, source_text, package_id.as_ref(), type_decl, rules, &mut bundle);
    }

    bundle
}

fn extract_class(
    project_name: &str,
    path: &Path,
    source_text: &str,
    package_id: Option<&NodeId>,
    type_decl: &JavaTypeDecl,
    rules: &LogicalNameRuleSet,
    bundle: &mut ArtifactBundle,
) {
    let extracted_name = rules.extract(source_text, ConstructKind::Class, type_decl.offset, &type_decl.name);

    let class = Class {
        project_name: project_name.to_string(),
        name: type_decl.name.clone(),
        kind: type_decl.kind,
        modifiers: type_decl.modifiers.clone(),
        file_path: path.display().to_string(),
        source_text: Some(source_text.to_string()),
        logical_name: non_empty(extracted_name.logical_name),
        description: non_empty(extracted_name.description),
    };
    let class_id = class.identity();
    bundle.push_node(Node::Class(class));

    if let Some(package_id) = package_id {
        bundle.push_edge(Edge::new(EdgeKind::Contains, package_id.clone(), class_id.clone()));
    }

    if let Some(superclass) = &type_decl.extends {
        let target = Class {
            project_name: project_name.to_string(),
            name: simple_name(superclass),
            kind: crate::model::ClassKind::Class,
            modifiers: Vec::new(),
            file_path: String::new(),
            source_text: None,
            logical_name: None,
            description: None,
        }
        .identity();
        bundle.push_edge(Edge::new(EdgeKind::Extends, class_id.clone(), target));
    }
    for iface in &type_decl.implements {
        let target = Class {
            project_name: project_name.to_string(),
            name: simple_name(iface),
            kind: crate::model::ClassKind::Interface,
            modifiers: Vec::new(),
            file_path: String::new(),
            source_text: None,
            logical_name: None,
            description: None,
        }
        .identity();
        bundle.push_edge(Edge::new(EdgeKind::Implements, class_id.clone(), target));
    }

    push_annotations(project_name, &class_id, AnnotationTarget::Class, &type_decl.annotations, bundle);

    for field in &type_decl.fields {
        extract_field(project_name, &class_id, source_text, field, rules, bundle);
    }

    let mut method_ids_by_name: std::collections::HashMap<&str, NodeId> = std::collections::HashMap::new();
    for method in &type_decl.methods {
        let method_id = extract_method(project_name, &class_id, &type_decl.name, source_text, method, rules, bundle);
        method_ids_by_name.entry(method.name.as_str()).or_insert(method_id);
    }
    // Same-class method calls are the only invocations resolvable without
    // semantic type resolution (out of scope per spec); a call whose name
    // matches a sibling method becomes a CALLS edge here rather than in the
    // resolver, since both ends already exist in this one bundle.
    for method in &type_decl.methods {
        let Some(caller_id) = method_ids_by_name.get(method.name.as_str()) else { continue };
        for invoked in &method.invoked_method_names {
            if invoked == &method.name {
                continue;
            }
            if let Some(callee_id) = method_ids_by_name.get(invoked.as_str()) {
                bundle.push_edge(Edge::new(EdgeKind::Calls, caller_id.clone(), callee_id.clone()));
            }
        }
    }

    if let Some(b) = bean::class_stereotype_bean(project_name, type_decl) {
        let bean_id = b.identity();
        bundle.push_node(Node::Bean(b));
        bundle.push_edge(Edge::new(EdgeKind::DeclaresBean, class_id.clone(), bean_id));
    }
    for b in bean::factory_method_beans(project_name, type_decl) {
        let bean_id = b.identity();
        bundle.push_node(Node::Bean(b));
        bundle.push_edge(Edge::new(EdgeKind::DeclaresBean, class_id.clone(), bean_id));
    }

    let (endpoints, endpoint_anomalies) = endpoint::class_endpoints(project_name, type_decl);
    for ep in endpoints {
        let ep_id = ep.identity();
        bundle.push_node(Node::Endpoint(ep));
        bundle.push_edge(Edge::new(EdgeKind::HasEndpoint, class_id.clone(), ep_id));
    }
    for anomaly in endpoint_anomalies {
        bundle.push_extraction_error(anomaly);
    }

    if let Some(entity) = jpa::jpa_entity(project_name, type_decl) {
        bundle.push_node(Node::JpaEntity(entity));
    }
    if let Some((repo, queries)) = jpa::jpa_repository(project_name, type_decl) {
        bundle.push_node(Node::JpaRepository(repo));
        for q in queries {
            bundle.push_node(Node::JpaQuery(q));
        }
    }

    if let Some((mapper, statements)) = mybatis::interface_mapper(project_name, type_decl) {
        let mapper_id = mapper.identity();
        bundle.push_node(Node::MyBatisMapper(mapper));
        for stmt in statements {
            let stmt_id = stmt.identity();
            bundle.push_node(Node::SqlStatement(stmt));
            bundle.push_edge(Edge::new(EdgeKind::HasSqlStatement, mapper_id.clone(), stmt_id));
        }
    }

    if let Some(tc) = test_class::test_class(project_name, type_decl) {
        bundle.push_node(Node::TestClass(tc));
    }

    for nested in &type_decl.nested {
        // Inner class identity uses the simple class name only (DESIGN.md
        // open-question resolution); no CONTAINS edge from the outer class
        // is modeled since spec.md §3 only defines package-to-class
        // containment.
        extract_class(project_name, path, source_text, package_id, nested, rules, bundle);
    }
}

fn extract_field(
    project_name: &str,
    class_id: &NodeId,
    source_text: &str,
    field: &JavaFieldDecl,
    rules: &LogicalNameRuleSet,
    bundle: &mut ArtifactBundle,
) {
    let extracted = rules.extract(source_text, ConstructKind::Field, field.offset, &field.name);
    let class_name = class_name_from_id(class_id);

    let model_field = Field {
        project_name: project_name.to_string(),
        class_name: class_name.clone(),
        name: field.name.clone(),
        field_type: field.field_type.clone(),
        modifiers: field.modifiers.clone(),
        annotations: field.annotations.iter().map(|a| to_model_annotation(a, AnnotationTarget::Field)).collect(),
        initializer_text: field.initializer_text.clone(),
        logical_name: non_empty(extracted.logical_name),
    };
    let field_id = model_field.identity();
    bundle.push_node(Node::Field(model_field));
    bundle.push_edge(Edge::new(EdgeKind::HasField, class_id.clone(), field_id.clone()));
    push_annotations(project_name, &field_id, AnnotationTarget::Field, &field.annotations, bundle);
}

fn extract_method(
    project_name: &str,
    class_id: &NodeId,
    class_name: &str,
    source_text: &str,
    method: &JavaMethodDecl,
    rules: &LogicalNameRuleSet,
    bundle: &mut ArtifactBundle,
) -> NodeId {
    let extracted = rules.extract(source_text, ConstructKind::Method, method.offset, &method.name);

    let parameters: Vec<MethodParam> = method
        .parameters
        .iter()
        .enumerate()
        .map(|(i, p)| MethodParam {
            name: p.name.clone(),
            param_type: p.param_type.clone(),
            order: i as u32,
        })
        .collect();

    let signature = format!("({})", parameters.iter().map(|p| p.param_type.clone()).collect::<Vec<_>>().join(","));

    let model_method = Method {
        project_name: project_name.to_string(),
        class_name: class_name.to_string(),
        name: method.name.clone(),
        signature,
        parameters,
        return_type: method.return_type.clone(),
        modifiers: method.modifiers.clone(),
        annotations: method.annotations.iter().map(|a| to_model_annotation(a, AnnotationTarget::Method)).collect(),
        logical_name: non_empty(extracted.logical_name),
    };
    let method_id = model_method.identity();
    bundle.push_node(Node::Method(model_method));
    bundle.push_edge(Edge::new(EdgeKind::HasMethod, class_id.clone(), method_id.clone()));
    push_annotations(project_name, &method_id, AnnotationTarget::Method, &method.annotations, bundle);
    method_id
}

fn push_annotations(
    project_name: &str,
    carrier: &NodeId,
    target: AnnotationTarget,
    annotations: &[JavaAnnotation],
    bundle: &mut ArtifactBundle,
) {
    for (i, a) in annotations.iter().enumerate() {
        let node = AnnotationNode {
            project_name: project_name.to_string(),
            carrier: carrier.clone(),
            ordinal: i as u32,
            name: a.name.clone(),
            parameters: a.parameters.clone(),
            target,
        };
        let node_id = node.identity();
        bundle.push_node(Node::AnnotationNode(node));
        bundle.push_edge(Edge::new(EdgeKind::HasAnnotation, carrier.clone(), node_id));
    }
}

fn to_model_annotation(a: &JavaAnnotation, target: AnnotationTarget) -> crate::model::Annotation {
    crate::model::Annotation {
        name: a.name.clone(),
        parameters: a.parameters.clone(),
        target,
    }
}

fn simple_name(type_text: &str) -> String {
    type_text.split('<').next().unwrap_or(type_text).trim().to_string()
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

/// `NodeId`s are opaque but built by joining identity fields; a `Class`
/// identity's last field is always the class name, which every extractor in
/// this module needs to label child nodes without re-threading the original
/// `JavaTypeDecl` reference everywhere.
fn class_name_from_id(class_id: &NodeId) -> String {
    class_id.as_str().rsplit('\u{1}').next().unwrap_or_default().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::java::JavaFrontend;
    use std::path::PathBuf;

    #[test]
    fn emits_package_class_method_field_chain() {
        let source = r#"
        package com.example;

        @Service
        class UserService {
            @Autowired
            private UserRepository userRepository;

            public User find(long id) {
                return userRepository.findById(id);
            }
        }
        "#;
        let cu = JavaFrontend::default().parse(&PathBuf::from("UserService.java"), source).unwrap();
        let bundle = extract_compilation_unit("demo", &PathBuf::from("UserService.java"), source, &cu, &LogicalNameRuleSet::default());

        assert!(bundle.nodes.iter().any(|n| matches!(n, Node::Package(p) if p.name == "com.example")));
        assert!(bundle.nodes.iter().any(|n| matches!(n, Node::Class(c) if c.name == "UserService")));
        assert!(bundle.nodes.iter().any(|n| matches!(n, Node::Field(f) if f.name == "userRepository")));
        assert!(bundle.nodes.iter().any(|n| matches!(n, Node::Method(m) if m.name == "find")));
        assert!(bundle.nodes.iter().any(|n| matches!(n, Node::Bean(b) if b.name == "userService")));

        let package_id = Package {
            project_name: "demo".into(),
            name: "com.example".into(),
            logical_name: None,
        }
        .identity();
        let project_id = Project { name: "demo".into() }.identity();
        assert!(bundle
            .edges
            .iter()
            .any(|e| e.kind == EdgeKind::HasPackage && e.from == project_id && e.to == package_id));
    }

    #[test]
    fn same_class_method_calls_produce_calls_edges() {
        let source = r#"
        class OrderService {
            public Order place(long id) {
                validate(id);
                return load(id);
            }

            private void validate(long id) {}

            private Order load(long id) { return null; }
        }
        "#;
        let cu = JavaFrontend::default().parse(&PathBuf::from("OrderService.java"), source).unwrap();
        let bundle = extract_compilation_unit("demo", &PathBuf::from("OrderService.java"), source, &cu, &LogicalNameRuleSet::default());

        let methods: Vec<&Method> = bundle
            .nodes
            .iter()
            .filter_map(|n| match n {
                Node::Method(m) => Some(m),
                _ => None,
            })
            .collect();
        let place = methods.iter().find(|m| m.name == "place").unwrap();
        let validate = methods.iter().find(|m| m.name == "validate").unwrap();
        let load = methods.iter().find(|m| m.name == "load").unwrap();

        let calls: Vec<&Edge> = bundle.edges.iter().filter(|e| e.kind == EdgeKind::Calls).collect();
        assert!(calls.iter().any(|e| e.from == place.identity() && e.to == validate.identity()));
        assert!(calls.iter().any(|e| e.from == place.identity() && e.to == load.identity()));
    }

    #[test]
    fn constructor_injection_bean_scenario() {
        let controller_src = r#"
        @RestController
        class UserController {
            UserController(UserService userService) {}
        }
        "#;
        let cu = JavaFrontend::default().parse(&PathBuf::from("UserController.java"), controller_src).unwrap();
        let bundle = extract_compilation_unit(
            "demo",
            &PathBuf::from("UserController.java"),
            controller_src,
            &cu,
            &LogicalNameRuleSet::default(),
        );
        assert!(bundle.nodes.iter().any(|n| matches!(n, Node::Bean(b) if b.name == "userController")));
        assert!(bundle.nodes.iter().any(|n| matches!(n, Node::Method(m) if m.is_constructor())));
    }
}
