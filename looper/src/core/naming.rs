//! Pure helpers for mapping registry keys to canonical paths.
//!
//! Registry keys always use `/` as separator. Host separators are accepted on
//! input and folded away by [`normalize`].

/// File name appended to extension-less keys.
pub const INDEX_FILE: &str = "index.html";

fn is_separator(c: char) -> bool {
    c == '/' || c == std::path::MAIN_SEPARATOR
}

fn last_segment(name: &str) -> &str {
    name.rsplit(is_separator).next().unwrap_or(name)
}

/// Map a logical key to a file path.
///
/// Keys whose last segment has no extension become directory index documents:
/// `blog/post` and `blog/post/` both map to `blog/post/index.html`.
pub fn to_path(name: &str) -> String {
    if last_segment(name).contains('.') {
        return name.to_string();
    }
    let mut path = name.to_string();
    if !path.is_empty() && !path.ends_with(is_separator) {
        path.push('/');
    }
    path.push_str(INDEX_FILE);
    path
}

/// The key without its final extension; the prefix under which a content
/// record owns its assets.
pub fn identity(name: &str) -> String {
    let mut path = to_path(name);
    if let Some(dot) = path.rfind('.') {
        path.truncate(dot);
    }
    path
}

/// Parent portion of a key, empty for top-level keys.
pub fn dirname(key: &str) -> &str {
    match key.rfind(is_separator) {
        Some(pos) => &key[..pos],
        None => "",
    }
}

/// True when `key` names a directory index document.
pub fn is_index_document(key: &str) -> bool {
    last_segment(key) == INDEX_FILE
}

/// Join segments `[start, end)` of a `/`-separated key.
pub fn slice_path(name: &str, start: usize, end: usize) -> String {
    let segments: Vec<&str> = name.split(is_separator).collect();
    let end = end.min(segments.len());
    let start = start.min(end);
    segments[start..end].join("/")
}

/// Canonical cross-platform form of a key: forward slashes only, no empty or
/// `.` segments, `..` folded into its parent.
pub fn normalize(key: &str) -> String {
    let absolute = key.starts_with(is_separator);
    let mut out: Vec<&str> = Vec::new();
    for segment in key.split(is_separator) {
        match segment {
            "" | "." => {}
            ".." => {
                if matches!(out.last(), Some(last) if *last != "..") {
                    out.pop();
                } else if !absolute {
                    out.push("..");
                }
            }
            other => out.push(other),
        }
    }
    let joined = out.join("/");
    if absolute {
        format!("/{joined}")
    } else {
        joined
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn to_path_appends_index_for_extensionless_keys() {
        assert_eq!(to_path("blog/post"), "blog/post/index.html");
        assert_eq!(to_path("blog/post/"), "blog/post/index.html");
        assert_eq!(to_path(""), "index.html");
    }

    #[test]
    fn to_path_keeps_keys_with_extension() {
        assert_eq!(to_path("blog/post.html"), "blog/post.html");
        assert_eq!(to_path("img/logo.png"), "img/logo.png");
    }

    #[test]
    fn to_path_only_looks_at_last_segment() {
        assert_eq!(to_path("docs/v1.2/intro"), "docs/v1.2/intro/index.html");
    }

    #[test]
    fn identity_strips_final_extension() {
        assert_eq!(identity("blog/post.html"), "blog/post");
        assert_eq!(identity("blog/post"), "blog/post/index");
        assert_eq!(identity("a/archive.tar.gz"), "a/archive.tar");
    }

    #[test]
    fn dirname_of_top_level_key_is_empty() {
        assert_eq!(dirname("index.html"), "");
        assert_eq!(dirname("a/b/c.html"), "a/b");
    }

    #[test]
    fn slice_path_clamps_out_of_range() {
        assert_eq!(slice_path("blog/2020/post.html", 0, 1), "blog");
        assert_eq!(slice_path("blog/2020/post.html", 1, 10), "2020/post.html");
        assert_eq!(slice_path("blog", 3, 5), "");
    }

    #[test]
    fn normalize_folds_dots_and_duplicate_separators() {
        assert_eq!(normalize("blog//./post/../other.html"), "blog/other.html");
        assert_eq!(normalize("../up.html"), "../up.html");
        assert_eq!(normalize("/abs/./x.html"), "/abs/x.html");
    }

    #[test]
    fn index_document_detection() {
        assert!(is_index_document("blog/post/index.html"));
        assert!(!is_index_document("blog/post.html"));
    }
}
