//! Query text normalization and result projection.

/// Prefix marking a comment line in a query.
pub const COMMENT_PREFIX: &str = "//";

/// Lists the file path of every file node the engine has ingested.
pub const ALL_FILES_QUERY: &str = "getNodesWithType('File').filepath";

/// Maps each matched node to the path of the file it came from.
pub const PATH_PROJECTION: &str =
    ".transform { g.v(it.functionId).functionToFile().filepath }.scatter()";

/// Rebuilds a single executable expression from commented, indented text.
///
/// Each line is trimmed, lines starting with `//` are dropped, and the rest
/// are concatenated with no separator.
pub fn normalize(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.starts_with(COMMENT_PREFIX))
        .collect()
}

/// Appends the path projection to a normalized query.
pub fn compose(normalized: &str) -> String {
    format!("{normalized}\n{PATH_PROJECTION}")
}
