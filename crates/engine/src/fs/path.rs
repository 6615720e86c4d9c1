/// Split a `/`-delimited path into segments.
///
/// Leading/trailing slashes and whitespace are ignored, and a leading
/// `root` segment denotes the root directory itself, so `"root/a.txt"`,
/// `"/a.txt"` and `"a.txt"` all address the same entry. This is the
/// "implicit root": it is always present and never needs a mkdir.
pub fn parse_path(path: &str) -> Vec<String> {
    let mut segments: Vec<String> = path
        .trim()
        .trim_matches('/')
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(String::from)
        .collect();
    if segments.first().map(String::as_str) == Some("root") {
        segments.remove(0);
    }
    segments
}

/// Render segments back as a display path.
pub(crate) fn display_path(segments: &[String]) -> String {
    format!("/{}", segments.join("/"))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_path() {
        let out = parse_path("root/test.txt");
        assert_eq!(out, vec!["test.txt".to_string()]);
    }

    #[test]
    fn test_equivalent_spellings() {
        assert_eq!(parse_path("/a/b.txt"), parse_path("root/a/b.txt"));
        assert_eq!(parse_path("a/b.txt"), parse_path(" /a/b.txt/ "));
    }

    #[test]
    fn test_root_spellings_are_empty() {
        assert!(parse_path("/").is_empty());
        assert!(parse_path("root").is_empty());
        assert!(parse_path("").is_empty());
    }

    #[test]
    fn test_double_slashes_collapse() {
        assert_eq!(parse_path("a//b"), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_display_path() {
        assert_eq!(
            display_path(&["a".to_string(), "b".to_string()]),
            "/a/b".to_string()
        );
    }
}
