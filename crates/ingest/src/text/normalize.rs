use std::collections::HashSet;
use std::sync::OnceLock;

/// Tokens this short (in characters) or shorter are dropped.
const MIN_TOKEN_CHARS: usize = 3;

/// English stopwords plus URL boilerplate.
const STOPWORDS: &[&str] = &[
    // English function words.
    "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "you're", "you've",
    "you'll", "you'd", "your", "yours", "yourself", "yourselves", "he", "him", "his", "himself",
    "she", "she's", "her", "hers", "herself", "it", "it's", "its", "itself", "they", "them",
    "their", "theirs", "themselves", "what", "which", "who", "whom", "this", "that", "that'll",
    "these", "those", "am", "is", "are", "was", "were", "be", "been", "being", "have", "has",
    "had", "having", "do", "does", "did", "doing", "a", "an", "the", "and", "but", "if", "or",
    "because", "as", "until", "while", "of", "at", "by", "for", "with", "about", "against",
    "between", "into", "through", "during", "before", "after", "above", "below", "to", "from",
    "up", "down", "in", "out", "on", "off", "over", "under", "again", "further", "then", "once",
    "here", "there", "when", "where", "why", "how", "all", "any", "both", "each", "few", "more",
    "most", "other", "some", "such", "no", "nor", "not", "only", "own", "same", "so", "than",
    "too", "very", "s", "t", "can", "will", "just", "don", "don't", "should", "should've", "now",
    "d", "ll", "m", "o", "re", "ve", "y", "ain", "aren", "aren't", "couldn", "couldn't", "didn",
    "didn't", "doesn", "doesn't", "hadn", "hadn't", "hasn", "hasn't", "haven", "haven't", "isn",
    "isn't", "ma", "mightn", "mightn't", "mustn", "mustn't", "needn", "needn't", "shan",
    "shan't", "shouldn", "shouldn't", "wasn", "wasn't", "weren", "weren't", "won", "won't",
    "wouldn", "wouldn't",
    // Web boilerplate.
    "www", "http", "https", "com", "org", "net", "en", "unit", "page", "index",
];

fn stopword_set() -> &'static HashSet<&'static str> {
    static SET: OnceLock<HashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| STOPWORDS.iter().copied().collect())
}

/// Whether `token` (already lowercase) is a stopword.
pub fn is_stopword(token: &str) -> bool {
    stopword_set().contains(token)
}

/// Lowercase, keep ASCII letters and whitespace only.
fn strip_to_letters(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_ascii_alphabetic() || c.is_whitespace())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Normalize a URL component or title into space-joined content tokens.
///
/// Digits and punctuation are deleted (not replaced by spaces), so
/// `"news-today"` becomes the single token `"newstoday"`. Stopwords and
/// tokens of three characters or fewer are dropped.
pub fn clean_text(text: &str) -> String {
    if text.trim().is_empty() {
        return String::new();
    }

    strip_to_letters(text)
        .split_whitespace()
        .filter(|token| token.len() > MIN_TOKEN_CHARS && !is_stopword(token))
        .collect::<Vec<_>>()
        .join(" ")
}
