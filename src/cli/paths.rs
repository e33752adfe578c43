//! Normalize path do user nhập thành absolute path.

/// Chuyển path bất kỳ thành dạng `/a/b/c`: bỏ segment rỗng và `.`,
/// mỗi `..` xoá luôn segment ngay trước nó.
///
/// `..` ở đầu path không có gì để xoá nên bị bỏ qua (không vượt qua root).
pub fn resolve(path: &str) -> String {
    let mut segments: Vec<&str> = path
        .split('/')
        .filter(|s| !s.is_empty() && *s != ".")
        .collect();

    while let Some(index) = segments.iter().position(|s| *s == "..") {
        segments.remove(index);
        if index > 0 {
            segments.remove(index - 1);
        }
    }

    format!("/{}", segments.join("/"))
}

/// Directory chứa một resolved path (parent của `/` là `/`)
pub fn parent(path: &str) -> String {
    match path.trim_end_matches('/').rfind('/') {
        Some(0) | None => "/".to_string(),
        Some(index) => path[..index].to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_examples() {
        assert_eq!(resolve("a/./b/../c"), "/a/c");
        assert_eq!(resolve("/x/y/"), "/x/y");
        assert_eq!(resolve(""), "/");
        assert_eq!(resolve("//a///b"), "/a/b");
        assert_eq!(resolve("/a/b/../../.."), "/");
    }

    #[test]
    fn test_leading_parent_is_clamped_to_root() {
        assert_eq!(resolve(".."), "/");
        assert_eq!(resolve("../a"), "/a");
        assert_eq!(resolve("/../../a/b"), "/a/b");
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let inputs = [
            "",
            "/",
            ".",
            "..",
            "a/b/c",
            "./a/../b/./c/..",
            "../../x/y/../z",
            "/music//2024/./mix.mp3",
            "a/..b/c",
        ];

        for input in inputs {
            let once = resolve(input);
            assert_eq!(resolve(&once), once, "input: {:?}", input);
            assert!(once.starts_with('/'));
            assert!(!once.split('/').skip(1).any(|s| s == "." || s == ".."));
        }
    }

    #[test]
    fn test_parent() {
        assert_eq!(parent("/a/b"), "/a");
        assert_eq!(parent("/a"), "/");
        assert_eq!(parent("/"), "/");
    }
}
