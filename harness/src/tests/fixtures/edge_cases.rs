//! Documents exercising optional fields and malformed input.

/// Entries with null, missing and empty snippet lists.
pub const SPARSE: &str = r#"
- QUERY: getCallsTo('gets')
  POSITIVE_TESTS:
    - "int main(){ gets(buf); }"
  NEGATIVE_TESTS: ~
- QUERY: getCallsTo('gets')
  NEGATIVE_TESTS:
    - "int main(){ fgets(buf, 10, stdin); }"
- QUERY: getCallsTo('gets')
  POSITIVE_TESTS: []
"#;

/// Query written as a list of fragments.
pub const FRAGMENTED_QUERY: &str = r#"
- QUERY:
    - "// sinks reached by argv"
    - "getCallsTo('system')"
    - "  .filter { it.code != '' }"
  POSITIVE_TESTS:
    - "int main(int c, char **v){ system(v[1]); }"
"#;

/// Not a valid specification document.
pub const MALFORMED: &str = "- QUERY: [unterminated\n  POSITIVE_TESTS: {\n";

/// A well-formed entry, one whose positive snippet is a mapping, and another
/// well-formed entry.
pub const MIXED: &str = r#"
- QUERY: getCallsTo('memcpy')
  POSITIVE_TESTS:
    - "void a(){ memcpy(d, s, n); }"
- QUERY: getCallsTo('memmove')
  POSITIVE_TESTS:
    - nested: map
- QUERY: getCallsTo('memset')
  POSITIVE_TESTS:
    - "void c(){ memset(p, 0, n); }"
"#;

/// Snippets of the well-formed [`MIXED`] entries, in order.
pub const MIXED_POSITIVES: [&str; 2] = [
    "void a(){ memcpy(d, s, n); }",
    "void c(){ memset(p, 0, n); }",
];
