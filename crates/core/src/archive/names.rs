//! Display-name handling for archive members.

use std::collections::HashSet;
use std::path::Path;

/// Makes every name a safe, unique archive member name.
///
/// Directory components are stripped. Repeats get ` (1)`, ` (2)`, ...
/// inserted before the extension, in input order.
pub fn unique_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut used = HashSet::new();
    let mut out = Vec::new();

    for name in names {
        let base = member_name(name);
        let mut candidate = base.clone();
        let mut n = 1;
        while used.contains(&candidate) {
            candidate = with_suffix(&base, n);
            n += 1;
        }
        used.insert(candidate.clone());
        out.push(candidate);
    }
    out
}

fn member_name(name: &str) -> String {
    let last = name.rsplit(['/', '\\']).next().unwrap_or("");
    match last {
        "" | "." | ".." => "file".to_string(),
        other => other.to_string(),
    }
}

fn with_suffix(name: &str, n: usize) -> String {
    let path = Path::new(name);
    let stem = path.file_stem().and_then(|s| s.to_str());
    let ext = path.extension().and_then(|e| e.to_str());
    match (stem, ext) {
        (Some(stem), Some(ext)) => format!("{} ({}).{}", stem, n, ext),
        _ => format!("{} ({})", name, n),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_names_untouched() {
        assert_eq!(unique_names(["a.webp", "b.webp"]), vec!["a.webp", "b.webp"]);
    }

    #[test]
    fn test_duplicates_get_suffixes() {
        assert_eq!(
            unique_names(["photo.webp", "photo.webp", "photo.webp"]),
            vec!["photo.webp", "photo (1).webp", "photo (2).webp"]
        );
    }

    #[test]
    fn test_suffix_skips_taken_names() {
        assert_eq!(
            unique_names(["a (1).jpg", "a.jpg", "a.jpg"]),
            vec!["a (1).jpg", "a.jpg", "a (2).jpg"]
        );
    }

    #[test]
    fn test_directory_components_stripped() {
        assert_eq!(
            unique_names(["../../etc/passwd", "dir\\x.png", ".."]),
            vec!["passwd", "x.png", "file"]
        );
    }

    #[test]
    fn test_no_extension() {
        assert_eq!(unique_names(["README", "README"]), vec!["README", "README (1)"]);
    }
}
