//! HTTP endpoint extraction: union of class- and method-level request
//! mapping annotations, expanded across HTTP verbs (spec.md §4.3).

use crate::frontend::java::{JavaAnnotation, JavaTypeDecl};
use crate::model::Endpoint;

const ALL_VERBS: &[&str] = &["GET", "POST", "PUT", "DELETE", "PATCH"];

/// Returns the HTTP verbs the annotation expands to, plus an anomaly
/// message when a `@RequestMapping(method = ...)` filter matched none of
/// the known verbs (a typo'd or unrecognized `RequestMethod` value) —
/// spec.md §7's `ExtractionError`: "annotation with unexpected shape".
fn verbs_for(annotation: &JavaAnnotation) -> (Vec<&'static str>, Option<String>) {
    match annotation.name.as_str() {
        "GetMapping" => (vec!["GET"], None),
        "PostMapping" => (vec!["POST"], None),
        "PutMapping" => (vec!["PUT"], None),
        "DeleteMapping" => (vec!["DELETE"], None),
        "PatchMapping" => (vec!["PATCH"], None),
        "RequestMapping" => {
            if let Some(method) = annotation.parameters.get("method") {
                let verbs: Vec<&'static str> = ALL_VERBS.iter().copied().filter(|v| method.contains(v)).collect();
                if verbs.is_empty() {
                    (Vec::new(), Some(format!("@RequestMapping(method = {method}) did not match any known HTTP verb")))
                } else {
                    (verbs, None)
                }
            } else {
                (ALL_VERBS.to_vec(), None)
            }
        }
        _ => (Vec::new(), None),
    }
}

fn path_of(annotation: &JavaAnnotation) -> String {
    annotation
        .parameters
        .get("value")
        .or_else(|| annotation.parameters.get("path"))
        .cloned()
        .unwrap_or_default()
}

fn join_path(base: &str, method_path: &str) -> String {
    let base = base.trim_end_matches('/');
    let method_path = method_path.trim_start_matches('/');
    match (base.is_empty(), method_path.is_empty()) {
        (true, true) => "/".to_string(),
        (true, false) => format!("/{method_path}"),
        (false, true) => base.to_string(),
        (false, false) => format!("{base}/{method_path}"),
    }
}

pub fn class_endpoints(project_name: &str, class: &JavaTypeDecl) -> (Vec<Endpoint>, Vec<String>) {
    let is_controller = class.annotations.iter().any(|a| a.name == "RestController" || a.name == "Controller");
    if !is_controller {
        return (Vec::new(), Vec::new());
    }

    let base_path = class
        .annotations
        .iter()
        .find(|a| a.name == "RequestMapping")
        .map(path_of)
        .unwrap_or_default();

    let mut endpoints = Vec::new();
    let mut anomalies = Vec::new();
    for method in &class.methods {
        for annotation in &method.annotations {
            let (verbs, anomaly) = verbs_for(annotation);
            if let Some(message) = anomaly {
                anomalies.push(format!("{}.{}: {message}", class.name, method.name));
            }
            if verbs.is_empty() {
                continue;
            }
            let full_path = join_path(&base_path, &path_of(annotation));
            for verb in verbs {
                endpoints.push(Endpoint {
                    project_name: project_name.to_string(),
                    controller_class: class.name.clone(),
                    handler_method: method.name.clone(),
                    http_method: verb.to_string(),
                    path: full_path.clone(),
                });
            }
        }
    }
    (endpoints, anomalies)
}
