//! Component test exercising the full pipeline (C1-C7) against a small
//! on-disk project: a controller/service bean pair, a `@Mapper` interface
//! bound to a same-named table, and a DDL script — the shape spec.md §8's
//! end-to-end scenarios describe, driven through `analyze` rather than
//! hand-built nodes (in the style of `nova-framework-jpa/tests/jpa.rs`).

use springgraph_core::{analyze, GraphStore, IngestConfig, InMemoryGraphStore, LogicalNameRuleSet};

fn write(dir: &std::path::Path, name: &str, contents: &str) {
    std::fs::write(dir.join(name), contents).unwrap();
}

#[test]
fn controller_service_mapper_and_ddl_resolve_end_to_end() {
    let dir = tempfile::tempdir().unwrap();

    write(
        dir.path(),
        "OrderController.java",
        r#"
        @RestController
        class OrderController {
            OrderController(OrderService orderService) {}
        }
        "#,
    );
    write(
        dir.path(),
        "OrderService.java",
        r#"
        @Service
        class OrderService {
            @Autowired
            private OrderRepository orderRepository;
        }
        "#,
    );
    write(
        dir.path(),
        "OrderRepository.java",
        r#"
        @Mapper
        interface OrderRepository {
            @Select("SELECT * FROM orders WHERE id=#{id}")
            Order findById(long id);
        }
        "#,
    );
    write(
        dir.path(),
        "schema.sql",
        "CREATE TABLE orders (id BIGINT NOT NULL, total DECIMAL(10,2));",
    );

    let mut config = IngestConfig::new("orders-demo", dir.path());
    config.clean = true;
    let store: Box<dyn GraphStore> = Box::new(InMemoryGraphStore::new());

    let summary = analyze(&config, &LogicalNameRuleSet::default(), store).unwrap();

    assert_eq!(summary.exit_code(), 0);
    assert_eq!(summary.files_ok, 4);

    assert_eq!(summary.nodes_by_kind.get("Bean").copied(), Some(2));
    assert_eq!(summary.nodes_by_kind.get("Table").copied(), Some(1));
    assert_eq!(summary.nodes_by_kind.get("SqlStatement").copied(), Some(1));

    // constructor DI from controller to service (bean dependency pass).
    assert_eq!(summary.edges_by_kind.get("DEPENDS_ON").copied(), Some(1));
    // I7: findById on OrderRepository (Mapper suffix) binds to its SqlStatement.
    assert_eq!(summary.edges_by_kind.get("CALLS").copied(), Some(1));
    // the SELECT's FROM clause resolves against the DDL-declared table.
    assert_eq!(summary.edges_by_kind.get("USES_TABLE").copied(), Some(1));

    assert!(summary.diagnostics.is_empty(), "unexpected diagnostics: {:?}", summary.diagnostics);
}

#[test]
fn sql_referencing_an_undeclared_table_is_reported_not_silently_dropped() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "InvoiceRepository.java",
        r#"
        @Mapper
        interface InvoiceRepository {
            @Select("SELECT * FROM invoices")
            Invoice findAll();
        }
        "#,
    );

    let mut config = IngestConfig::new("invoices-demo", dir.path());
    config.clean = true;
    let store: Box<dyn GraphStore> = Box::new(InMemoryGraphStore::new());

    let summary = analyze(&config, &LogicalNameRuleSet::default(), store).unwrap();

    assert_eq!(summary.exit_code(), 0);
    assert!(summary.nodes_by_kind.get("Table").is_none());
    assert!(summary.edges_by_kind.get("USES_TABLE").is_none());
    assert!(summary.diagnostics.iter().any(|d| d.message.contains("invoices")));
}
