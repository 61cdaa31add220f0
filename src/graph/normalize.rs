//! Concept name normalization and similarity scoring

use std::collections::HashSet;

/// Punctuation removed before names are compared
const STRIPPED_CHARS: &[char] = &[
    '-', '_', '.', '，', '。', '、', '：', '；', '！', '？', '（', '）', '《', '》', '“', '”', '‘',
    '’', '·', '【', '】', '「', '」', '—',
];

/// Single-character names that carry no meaning on their own
const STOPWORDS: &[&str] = &["的", "了", "和", "与", "是", "在", "之"];

/// Normalize a concept name into its dedup key.
///
/// Returns an empty string for names that should never match anything.
pub fn normalize_name(name: &str) -> String {
    let normalized: String = name
        .chars()
        .filter(|c| !c.is_whitespace() && !STRIPPED_CHARS.contains(c))
        .flat_map(char::to_lowercase)
        .collect();

    if STOPWORDS.contains(&normalized.as_str()) {
        String::new()
    } else {
        normalized
    }
}

/// Similarity in [0, 1] between two normalized names.
///
/// Substring containment scores `shorter / longer` (in characters);
/// otherwise the Jaccard index of the two character sets.
pub fn name_similarity(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    if a == b {
        return 1.0;
    }

    let a_len = a.chars().count();
    let b_len = b.chars().count();
    if a.contains(b) || b.contains(a) {
        return a_len.min(b_len) as f64 / a_len.max(b_len) as f64;
    }

    let a_chars: HashSet<char> = a.chars().collect();
    let b_chars: HashSet<char> = b.chars().collect();
    let intersection = a_chars.intersection(&b_chars).count() as f64;
    let union = a_chars.union(&b_chars).count() as f64;

    if union == 0.0 {
        0.0
    } else {
        intersection / union
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_case_and_punctuation() {
        assert_eq!(normalize_name("Java-Script"), "javascript");
        assert_eq!(normalize_name("  node_js. "), "nodejs");
        assert_eq!(normalize_name("机器 学习。"), "机器学习");
        assert_eq!(normalize_name("《数据结构》"), "数据结构");
    }

    #[test]
    fn test_normalize_drops_stopword_names() {
        assert_eq!(normalize_name("的"), "");
        assert_eq!(normalize_name(" 的 "), "");
        assert_eq!(normalize_name("目的"), "目的");
    }

    #[test]
    fn test_similarity_identical_and_empty() {
        assert_eq!(name_similarity("rust", "rust"), 1.0);
        assert_eq!(name_similarity("", "rust"), 0.0);
    }

    #[test]
    fn test_similarity_substring_uses_length_ratio() {
        let score = name_similarity("closure", "closures");
        assert!((score - 7.0 / 8.0).abs() < 1e-9);

        let score = name_similarity("rust", "rustownership");
        assert!(score < 0.8);
    }

    #[test]
    fn test_similarity_character_jaccard() {
        // {l,i,s,t,e,n} vs {s,i,l,e,n,t} share every character
        assert_eq!(name_similarity("listen", "silent"), 1.0);
        // {a,b} vs {c,d} share nothing
        assert_eq!(name_similarity("ab", "cd"), 0.0);
    }
}
