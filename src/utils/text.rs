use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

static SCRIPT_STYLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<(script|style|noscript)[^>]*>.*?</(script|style|noscript)>")
        .expect("script/style pattern is valid")
});
static TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<[^>]+>").expect("tag pattern is valid"));
static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

/// 常见英文停用词，不参与相似度计算
const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "for", "from", "how", "in", "is", "it",
    "of", "on", "or", "the", "to", "what", "why", "with", "your", "you", "vs",
];

/// 把HTML粗略转换为纯文本
pub fn strip_html(markup: &str) -> String {
    let without_blocks = SCRIPT_STYLE.replace_all(markup, " ");
    let without_tags = TAG.replace_all(&without_blocks, " ");
    let decoded = without_tags
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">");
    WHITESPACE.replace_all(&decoded, " ").trim().to_string()
}

/// 按字节上限截断，保证落在字符边界
pub fn truncate_at_char_boundary(text: &str, max_bytes: usize) -> &str {
    if text.len() <= max_bytes {
        return text;
    }
    let mut end = max_bytes;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

/// 统计单词数（以空白分隔）
pub fn word_count(text: &str) -> usize {
    text.split_whitespace()
        .filter(|w| w.chars().any(|c| c.is_alphanumeric()))
        .count()
}

/// 把文本切分为去掉停用词的小写词集合
pub fn token_set(text: &str) -> BTreeSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .filter(|t| !STOP_WORDS.contains(&t.as_str()))
        .collect()
}

/// 两段文本词集合的Jaccard相似度
pub fn jaccard_similarity(a: &str, b: &str) -> f64 {
    let left = token_set(a);
    let right = token_set(b);
    if left.is_empty() || right.is_empty() {
        return 0.0;
    }
    let intersection = left.intersection(&right).count() as f64;
    let union = left.union(&right).count() as f64;
    intersection / union
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_html_removes_scripts_and_tags() {
        let html = r#"<html><head><style>.x{color:red}</style><script>alert(1)</script></head>
<body><h1>Remote   work</h1><p>Tips &amp; tricks</p></body></html>"#;
        assert_eq!(strip_html(html), "Remote work Tips & tricks");
    }

    #[test]
    fn test_truncate_respects_char_boundary() {
        let text = "héllo";
        assert_eq!(truncate_at_char_boundary(text, 2), "h");
        assert_eq!(truncate_at_char_boundary(text, 3), "hé");
        assert_eq!(truncate_at_char_boundary(text, 100), "héllo");
    }

    #[test]
    fn test_word_count_ignores_markdown_symbols() {
        assert_eq!(word_count("## Remote work\n\n- one - two"), 4);
        assert_eq!(word_count(""), 0);
    }

    #[test]
    fn test_jaccard_similarity() {
        assert_eq!(
            jaccard_similarity("Remote Work Productivity", "remote work productivity"),
            1.0
        );
        assert_eq!(jaccard_similarity("the and of", "remote"), 0.0);
        let partial = jaccard_similarity("remote work productivity", "remote work burnout");
        assert!(partial > 0.4 && partial < 0.6);
    }
}
