/// Normalize a source path into the key used to recognize the same file
/// across runs.
///
/// Purely lexical: the filesystem is never consulted, so the result does not
/// depend on where the tool runs. Backslashes become `/`, empty and `.`
/// segments vanish, and `..` removes the segment before it. A `..` that has
/// nothing to remove is kept on a relative path and dropped at an absolute
/// root.
#[must_use]
pub fn canonical_path(raw: &str) -> String {
    let unified = raw.replace('\\', "/");
    let absolute = unified.starts_with('/');

    let mut parts: Vec<&str> = Vec::new();
    for segment in unified.split('/') {
        match segment {
            "" | "." => {}
            ".." => match parts.last() {
                Some(&last) if last != ".." => {
                    parts.pop();
                }
                _ if absolute => {}
                _ => parts.push(".."),
            },
            s => parts.push(s),
        }
    }

    let joined = parts.join("/");
    if absolute {
        format!("/{joined}")
    } else if joined.is_empty() {
        ".".to_string()
    } else {
        joined
    }
}
