//! Test-class detection: class-level test-framework annotations produce a
//! `TestClass` node with a best-effort subject-under-test guess.

use crate::frontend::java::JavaTypeDecl;
use crate::model::TestClass;

const FRAMEWORK_MARKERS: &[&str] = &["SpringBootTest", "ExtendWith", "RunWith", "Test"];

pub fn test_class(project_name: &str, class: &JavaTypeDecl) -> Option<TestClass> {
    let framework_markers: Vec<String> = class
        .annotations
        .iter()
        .map(|a| a.name.clone())
        .filter(|n| FRAMEWORK_MARKERS.contains(&n.as_str()))
        .collect();

    let has_method_level_test = class.methods.iter().any(|m| m.annotations.iter().any(|a| a.name == "Test"));

    if framework_markers.is_empty() && !has_method_level_test && !class.name.ends_with("Test") && !class.name.ends_with("Tests") {
        return None;
    }

    let subject_under_test = class
        .name
        .strip_suffix("Test")
        .or_else(|| class.name.strip_suffix("Tests"))
        .map(str::to_string);

    Some(TestClass {
        project_name: project_name.to_string(),
        class_name: class.name.clone(),
        subject_under_test,
        framework_markers,
    })
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
    fn guesses_subject_under_test_from_class_name_suffix() {
        let class = parse(
            r#"
            @SpringBootTest
            class UserServiceTest {
                @Test
                void doesSomething() {}
            }
            "#,
        );
        let test_class = test_class("demo", &class).unwrap();
        assert_eq!(test_class.subject_under_test.as_deref(), Some("UserService"));
        assert!(test_class.framework_markers.contains(&"SpringBootTest".to_string()));
    }

    #[test]
    fn non_test_class_is_not_detected() {
        let class = parse("class UserService {}");
        assert!(test_class("demo", &class).is_none());
    }
}
