//! Spring bean extraction: stereotype classes and `@Bean`-annotated factory
//! methods on `@Configuration` classes.

use crate::frontend::java::{JavaAnnotation, JavaMethodDecl, JavaTypeDecl};
use crate::model::{Bean, BeanKind};

const STEREOTYPES: &[(&str, BeanKind)] = &[
    ("Component", BeanKind::Component),
    ("Service", BeanKind::Service),
    ("Repository", BeanKind::Repository),
    ("Controller", BeanKind::Controller),
    ("RestController", BeanKind::Controller),
    ("Configuration", BeanKind::Configuration),
];

/// Bean naming: explicit annotation value wins; else decapitalized simple
/// class name for stereotype beans; else the factory method name
/// (spec.md §4.3).
pub fn class_stereotype_bean(project_name: &str, class: &JavaTypeDecl) -> Option<Bean> {
    let (annotation, kind) = class
        .annotations
        .iter()
        .find_map(|a| STEREOTYPES.iter().find(|(n, _)| *n == a.name).map(|(_, k)| (a, *k)))?;

    let name = annotation
        .parameters
        .get("value")
        .filter(|v| !v.is_empty())
        .cloned()
        .unwrap_or_else(|| decapitalize(&class.name));

    Some(Bean {
        project_name: project_name.to_string(),
        name,
        kind,
        class_name: class.name.clone(),
        scope: "singleton".to_string(),
    })
}

/// `@Configuration` factory methods: one Bean per `@Bean`-annotated method.
pub fn factory_method_beans(project_name: &str, class: &JavaTypeDecl) -> Vec<Bean> {
    let is_configuration = class.annotations.iter().any(|a| a.name == "Configuration");
    if !is_configuration {
        return Vec::new();
    }

    class
        .methods
        .iter()
        .filter_map(|m| factory_method_bean(project_name, class, m))
        .collect()
}

fn factory_method_bean(project_name: &str, class: &JavaTypeDecl, method: &JavaMethodDecl) -> Option<Bean> {
    let bean_annotation: &JavaAnnotation = method.annotations.iter().find(|a| a.name == "Bean")?;
    let name = bean_annotation
        .parameters
        .get("value")
        .filter(|v| !v.is_empty())
        .cloned()
        .unwrap_or_else(|| method.name.clone());

    Some(Bean {
        project_name: project_name.to_string(),
        name,
        kind: BeanKind::FactoryMethod,
        class_name: class.name.clone(),
        scope: "singleton".to_string(),
    })
}

fn decapitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::java::JavaFrontend;
    use std::path::PathBuf;

    fn parse(src: &str) -> JavaTypeDecl {
        JavaFrontend::default()
            .parse(&PathBuf::from("T.java"), src)
            .unwrap()
            .types
            .remove(0)
    }

    #[test]
    fn stereotype_bean_uses_decapitalized_class_name_by_default() {
        let class = parse("@Service class UserService {}");
        let bean = class_stereotype_bean("demo", &class).unwrap();
        assert_eq!(bean.name, "userService");
        assert_eq!(bean.kind, BeanKind::Service);
    }

    #[test]
    fn stereotype_bean_prefers_explicit_annotation_value() {
        let class = parse(r#"@Service("customName") class UserService {}"#);
        let bean = class_stereotype_bean("demo", &class).unwrap();
        assert_eq!(bean.name, "customName");
    }

    #[test]
    fn configuration_factory_method_produces_one_bean_per_bean_method() {
        let class = parse(
            r#"
            @Configuration
            class AppConfig {
                @Bean
                ObjectMapper objectMapper() {}
            }
            "#,
        );
        let beans = factory_method_beans("demo", &class);
        assert_eq!(beans.len(), 1);
        assert_eq!(beans[0].name, "objectMapper");
        assert_eq!(beans[0].kind, BeanKind::FactoryMethod);
    }
}
