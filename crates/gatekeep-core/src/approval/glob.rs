//! Path glob matching for reviewer allow/deny rules.
//!
//! Deliberately small. Supported pattern shapes, checked in this order:
//!
//! | Pattern        | Matches |
//! |----------------|---------|
//! | `**` or `*`    | every path |
//! | `dir/**`       | `dir` itself and anything nested under it |
//! | `dir/*`        | exactly one segment directly under `dir` |
//! | `prefix*`      | any path starting with `prefix` |
//! | anything else  | that exact path |
//!
//! Both sides are normalized first: backslashes become `/`, and leading `./`
//! and `/` are stripped.

/// Normalize a path or pattern for matching.
pub fn normalize_path(value: &str) -> String {
    let unified = value.replace('\\', "/");
    let mut rest = unified.as_str();
    loop {
        if let Some(stripped) = rest.strip_prefix("./") {
            rest = stripped;
        } else if let Some(stripped) = rest.strip_prefix('/') {
            rest = stripped;
        } else {
            break;
        }
    }
    rest.to_string()
}

/// Whether `path` matches a single `pattern`.
pub fn matches_pattern(path: &str, pattern: &str) -> bool {
    let path = normalize_path(path);
    let pattern = normalize_path(pattern);

    if pattern == "**" || pattern == "*" {
        return true;
    }

    if let Some(prefix) = pattern.strip_suffix("/**") {
        return path == prefix || path.starts_with(&format!("{prefix}/"));
    }

    if let Some(prefix) = pattern.strip_suffix("/*") {
        return match path.strip_prefix(&format!("{prefix}/")) {
            Some(remainder) => !remainder.is_empty() && !remainder.contains('/'),
            None => false,
        };
    }

    if let Some(prefix) = pattern.strip_suffix('*') {
        return path.starts_with(prefix);
    }

    path == pattern
}

/// Whether `path` matches any of `patterns`. An empty list matches nothing.
pub fn matches_any<S: AsRef<str>>(path: &str, patterns: &[S]) -> bool {
    patterns.iter().any(|p| matches_pattern(path, p.as_ref()))
}
