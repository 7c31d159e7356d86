//! Single entry with one positive and one negative snippet.

/// Snippet the strcpy query must match.
pub const STRCPY_POSITIVE: &str = "void f(){ strcpy(a,b); }";

/// Snippet the strcpy query must not match.
pub const STRCPY_NEGATIVE: &str = "void f(){ strncpy(a,b,1); }";

/// Document holding the strcpy entry.
pub const STRCPY: &str = r#"
- DESCRIPTION: calls to strcpy are flagged
  QUERY: |
    // every call site of strcpy
      getCallsTo('strcpy')
  POSITIVE_TESTS:
    - "void f(){ strcpy(a,b); }"
  NEGATIVE_TESTS:
    - "void f(){ strncpy(a,b,1); }"
"#;
