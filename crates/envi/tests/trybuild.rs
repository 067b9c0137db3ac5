//! Compile-time tests for the `Config` derive macro.
//!
//! These tests verify that valid derive usage compiles successfully.
//!
//! Run with: cargo nextest run --package envi trybuild

#[test]
fn compile_pass() {
    let t = trybuild::TestCases::new();
    t.pass("tests/compile_pass/basic.rs");
    t.pass("tests/compile_pass/field_kinds.rs");
    t.pass("tests/compile_pass/serde_fields.rs");
    t.pass("tests/compile_pass/watched_record.rs");
}
