use std::path::Path;

/// Last dot-separated component of a fully-qualified name.
///
/// `telemetry.v1.Heartbeat` → `Heartbeat`; a bare name is returned as-is.
pub fn local_name(full_name: &str) -> &str {
    full_name.rsplit('.').next().unwrap_or(full_name)
}

/// File name component of a path, falling back to the input.
pub fn base_name(path: &str) -> &str {
    Path::new(path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(path)
}

/// Split `Field=pattern` on the first `=`.
pub fn split_match_expression(expr: &str) -> Option<(&str, &str)> {
    expr.split_once('=')
}
