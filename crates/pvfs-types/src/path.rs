//! Separator algebra for virtual and backend paths.
//!
//! Plain string functions with no state. Paths use `/` regardless of host
//! platform; callers that build backend URIs rely on these never producing a
//! doubled separator at a join point.

/// The only separator pvfs knows about.
pub const SEPARATOR: char = '/';

/// The separator as a string slice.
pub const SEPARATOR_STR: &str = "/";

/// Append `suffix` to `base` with exactly one separator at the join.
///
/// An empty or `"/"` suffix leaves `base` untouched. One leading separator on
/// `suffix` is dropped. An empty `base` gets no separator prepended, so
/// `append_path("", "a")` yields `"a"`.
pub fn append_path(base: &mut String, suffix: &str) {
    if suffix.is_empty() || suffix == SEPARATOR_STR {
        return;
    }

    ensure_trailing_separator_in_place(base);
    base.push_str(trim_leading_separator(suffix));
}

/// Remove exactly one leading separator, if present.
pub fn trim_leading_separator(s: &str) -> &str {
    s.strip_prefix(SEPARATOR).unwrap_or(s)
}

/// Prefix one separator unless already present. `""` becomes `"/"`.
pub fn ensure_leading_separator(s: &str) -> String {
    if s.starts_with(SEPARATOR) {
        s.to_string()
    } else {
        format!("{SEPARATOR}{s}")
    }
}

/// Append one separator unless already present. `""` becomes `"/"`.
pub fn ensure_trailing_separator(s: &str) -> String {
    if s.ends_with(SEPARATOR) {
        s.to_string()
    } else {
        format!("{s}{SEPARATOR}")
    }
}

/// Append one separator to a buffer unless already present.
///
/// Unlike [`ensure_trailing_separator`], an empty buffer is left empty.
pub fn ensure_trailing_separator_in_place(buf: &mut String) {
    if !buf.is_empty() && !buf.ends_with(SEPARATOR) {
        buf.push(SEPARATOR);
    }
}

/// First path component, without separators.
///
/// `""` for an empty path or `"/"`.
pub fn first_segment(path: &str) -> &str {
    let rest = trim_leading_separator(path);
    match rest.find(SEPARATOR) {
        Some(pos) => &rest[..pos],
        None => rest,
    }
}

/// Everything after the first component, starting at its separator.
///
/// `""` when there is no further component.
pub fn path_after_first_segment(path: &str) -> &str {
    let rest = trim_leading_separator(path);
    match rest.find(SEPARATOR) {
        Some(pos) => &rest[pos..],
        None => "",
    }
}

/// Check whether `path` is `base` or lies underneath it.
///
/// Matching is on whole components: `/base-other` is not under `/base`.
/// An empty `base` matches every path. Case-sensitive.
pub fn is_descendant_or_self(path: &str, base: &str) -> bool {
    if base.is_empty() || path == base {
        return true;
    }

    match path.strip_prefix(base) {
        Some(rest) => base.ends_with(SEPARATOR) || rest.starts_with(SEPARATOR),
        None => false,
    }
}

/// Last component of a path. `""` for `"/"`.
pub fn base_name(path: &str) -> &str {
    let trimmed = path.trim_end_matches(SEPARATOR);
    match trimmed.rfind(SEPARATOR) {
        Some(pos) => &trimmed[pos + 1..],
        None => trimmed,
    }
}

/// Path without its last component. Top-level paths and `"/"` yield `"/"`.
pub fn parent_path(path: &str) -> &str {
    let trimmed = path.trim_end_matches(SEPARATOR);
    match trimmed.rfind(SEPARATOR) {
        Some(0) | None => SEPARATOR_STR,
        Some(pos) => &trimmed[..pos],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn appended(base: &str, suffix: &str) -> String {
        let mut buf = base.to_string();
        append_path(&mut buf, suffix);
        buf
    }

    #[test]
    fn test_append_path() {
        assert_eq!(appended("s3://bucket", "dir/file"), "s3://bucket/dir/file");
        assert_eq!(appended("s3://bucket/", "/dir/file"), "s3://bucket/dir/file");
        assert_eq!(appended("s3://bucket", "/dir"), "s3://bucket/dir");
        assert_eq!(appended("/root/", "dir"), "/root/dir");
        assert_eq!(appended("", "dir"), "dir");
    }

    #[test]
    fn test_append_path_noop_suffix() {
        assert_eq!(appended("s3://bucket", ""), "s3://bucket");
        assert_eq!(appended("s3://bucket", "/"), "s3://bucket");
    }

    #[test]
    fn test_trim_leading_separator() {
        assert_eq!(trim_leading_separator("/a/b"), "a/b");
        assert_eq!(trim_leading_separator("a/b"), "a/b");
        assert_eq!(trim_leading_separator("/"), "");
        assert_eq!(trim_leading_separator("//a"), "/a");
        assert_eq!(trim_leading_separator(""), "");
    }

    #[test]
    fn test_ensure_leading_separator() {
        assert_eq!(ensure_leading_separator("a"), "/a");
        assert_eq!(ensure_leading_separator("/a"), "/a");
        assert_eq!(ensure_leading_separator(""), "/");
    }

    #[test]
    fn test_leading_separator_inverse() {
        for p in ["", "a", "a/b", "a/b/", "file name.txt"] {
            assert_eq!(trim_leading_separator(&ensure_leading_separator(p)), p, "for {p:?}");
        }
    }

    #[test]
    fn test_trailing_separator_asymmetry() {
        assert_eq!(ensure_trailing_separator(""), "/");
        assert_eq!(ensure_trailing_separator("a"), "a/");
        assert_eq!(ensure_trailing_separator("a/"), "a/");

        let mut empty = String::new();
        ensure_trailing_separator_in_place(&mut empty);
        assert_eq!(empty, "");

        let mut buf = String::from("a");
        ensure_trailing_separator_in_place(&mut buf);
        assert_eq!(buf, "a/");
        ensure_trailing_separator_in_place(&mut buf);
        assert_eq!(buf, "a/");
    }

    #[test]
    fn test_first_segment() {
        assert_eq!(first_segment("/a/b/c"), "a");
        assert_eq!(first_segment("a/b"), "a");
        assert_eq!(first_segment("/a"), "a");
        assert_eq!(first_segment("/"), "");
        assert_eq!(first_segment(""), "");
    }

    #[test]
    fn test_path_after_first_segment() {
        assert_eq!(path_after_first_segment("/a/b/c"), "/b/c");
        assert_eq!(path_after_first_segment("a/b"), "/b");
        assert_eq!(path_after_first_segment("/a"), "");
        assert_eq!(path_after_first_segment("/"), "");
        assert_eq!(path_after_first_segment(""), "");
    }

    #[test]
    fn test_is_descendant_or_self() {
        assert!(is_descendant_or_self("/base/folder/x", "/base/folder"));
        assert!(is_descendant_or_self("/base/folder", "/base/folder"));
        assert!(is_descendant_or_self("/anything", "/"));
        assert!(!is_descendant_or_self("/base-other/x", "/base"));
        assert!(!is_descendant_or_self("/base", "/base/folder"));
        assert!(!is_descendant_or_self("/Base/x", "/base"));
    }

    #[test]
    fn test_is_descendant_of_empty_base() {
        for p in ["", "/", "/a", "relative/b", "s3://bucket"] {
            assert!(is_descendant_or_self(p, ""));
        }
    }

    #[test]
    fn test_base_name() {
        assert_eq!(base_name("/"), "");
        assert_eq!(base_name("/a"), "a");
        assert_eq!(base_name("/a/b.txt"), "b.txt");
        assert_eq!(base_name("s3://bucket/key/"), "key");
    }

    #[test]
    fn test_parent_path() {
        assert_eq!(parent_path("/"), "/");
        assert_eq!(parent_path("/a"), "/");
        assert_eq!(parent_path("/a/b"), "/a");
        assert_eq!(parent_path("/a/b/c"), "/a/b");
    }
}
