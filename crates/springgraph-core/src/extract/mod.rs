//! C3 — artifact extractors. `class` drives the fixed emission order from
//! spec.md §4.3/§5; the other modules each own one derived-artifact family.

pub mod bean;
pub mod class;
pub mod endpoint;
pub mod jpa;
pub mod mybatis;
pub mod test_class;

pub use class::extract_compilation_unit;
