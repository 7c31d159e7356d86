//! Three entries: a clean pass, a query with no assertions, and an entry
//! without a query.

/// Multi-entry document.
pub const BATCH: &str = r#"
- QUERY: |
    getCallsTo('memcpy')
  POSITIVE_TESTS:
    - "void g(){ memcpy(d,s,n); }"
    - "void h(){ memcpy(d,s,4); }"
  NEGATIVE_TESTS:
    - "void g(){ memmove(d,s,n); }"
- QUERY: getCallsTo('free')
- POSITIVE_TESTS:
    - "void k(){ free(p); free(p); }"
"#;
