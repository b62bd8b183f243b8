//! Keyword phrase ranking over short, already-normalized text segments.
//!
//! Candidate phrases are runs of content words delimited by stopwords,
//! non-letter characters and segment boundaries. Each word is scored by
//! its co-occurrence degree divided by its frequency; a phrase scores the
//! sum of its words.

use std::collections::{HashMap, HashSet};

use super::normalize::is_stopword;

/// Longer runs are cut into consecutive phrases of at most this many words.
pub const MAX_PHRASE_WORDS: usize = 3;

/// A candidate phrase with its score.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedPhrase {
    pub phrase: String,
    pub score: f64,
}

fn candidate_phrases<'a, I>(segments: I) -> Vec<Vec<String>>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut phrases = Vec::new();

    for segment in segments {
        let mut run: Vec<String> = Vec::new();
        let lowered = segment.to_lowercase();

        for token in lowered.split(|c: char| !c.is_alphabetic()) {
            if token.is_empty() {
                // Punctuation (including runs of it) breaks the phrase.
                flush_run(&mut run, &mut phrases);
                continue;
            }
            if is_stopword(token) {
                flush_run(&mut run, &mut phrases);
                continue;
            }
            run.push(token.to_string());
        }
        flush_run(&mut run, &mut phrases);
    }

    phrases
}

fn flush_run(run: &mut Vec<String>, phrases: &mut Vec<Vec<String>>) {
    if run.is_empty() {
        return;
    }
    for chunk in run.chunks(MAX_PHRASE_WORDS) {
        phrases.push(chunk.to_vec());
    }
    run.clear();
}

/// Rank every distinct candidate phrase in `segments`, best first.
///
/// Ties keep the order in which phrases first appear.
pub fn rank_phrases<'a, I>(segments: I) -> Vec<RankedPhrase>
where
    I: IntoIterator<Item = &'a str>,
{
    let phrases = candidate_phrases(segments);

    let mut frequency: HashMap<&str, f64> = HashMap::new();
    let mut degree: HashMap<&str, f64> = HashMap::new();
    for phrase in &phrases {
        let len = phrase.len() as f64;
        for word in phrase {
            *frequency.entry(word.as_str()).or_default() += 1.0;
            *degree.entry(word.as_str()).or_default() += len;
        }
    }

    let word_score = |word: &str| -> f64 {
        let freq = frequency.get(word).copied().unwrap_or(0.0);
        if freq == 0.0 {
            0.0
        } else {
            degree.get(word).copied().unwrap_or(0.0) / freq
        }
    };

    let mut ranked: Vec<RankedPhrase> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    for phrase in &phrases {
        let text = phrase.join(" ");
        if !seen.insert(text.clone()) {
            continue;
        }
        let score = phrase.iter().map(|w| word_score(w)).sum();
        ranked.push(RankedPhrase {
            phrase: text,
            score,
        });
    }

    // Stable sort keeps first-appearance order among equal scores.
    ranked.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    ranked
}

/// The `n` best phrases as plain strings.
pub fn top_phrases<'a, I>(segments: I, n: usize) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    rank_phrases(segments)
        .into_iter()
        .take(n)
        .map(|r| r.phrase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_has_no_phrases() {
        assert!(rank_phrases(Vec::<&str>::new()).is_empty());
        assert!(rank_phrases(["", "   "]).is_empty());
    }

    #[test]
    fn stopwords_and_punctuation_split_phrases() {
        let ranked = rank_phrases(["rust programming and systems design, memory safety"]);
        let phrases: Vec<&str> = ranked.iter().map(|r| r.phrase.as_str()).collect();
        assert!(phrases.contains(&"rust programming"));
        assert!(phrases.contains(&"systems design"));
        assert!(phrases.contains(&"memory safety"));
        assert_eq!(phrases.len(), 3);
    }

    #[test]
    fn segments_never_join_into_one_phrase() {
        let ranked = rank_phrases(["github", "rust analyzer"]);
        let phrases: Vec<&str> = ranked.iter().map(|r| r.phrase.as_str()).collect();
        assert_eq!(phrases, vec!["rust analyzer", "github"]);
    }

    #[test]
    fn long_runs_are_chunked() {
        let ranked = rank_phrases(["alpha beta gamma delta epsilon"]);
        let phrases: Vec<&str> = ranked.iter().map(|r| r.phrase.as_str()).collect();
        assert_eq!(phrases, vec!["alpha beta gamma", "delta epsilon"]);
    }

    #[test]
    fn longer_phrases_outrank_single_words() {
        let ranked = rank_phrases(["python", "python tutorial basics"]);
        assert_eq!(ranked[0].phrase, "python tutorial basics");
        // python: degree 1 + 3 = 4, frequency 2 -> 2.0; tutorial/basics: 3.0 each.
        assert!((ranked[0].score - 8.0).abs() < 1e-12);
        assert_eq!(ranked[1].phrase, "python");
        assert!((ranked[1].score - 2.0).abs() < 1e-12);
    }

    #[test]
    fn repeated_phrases_are_listed_once() {
        let top = top_phrases(["weather forecast", "weather forecast", "radar"], 3);
        assert_eq!(top, vec!["weather forecast", "radar"]);
    }
}
