use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tabgroup_core::{NamingStrategy, Tab};
use tabgroup_ingest::{bare_domain, text::top_phrases, Document};

/// Name used when a strategy has nothing to go on.
pub const FALLBACK_NAME: &str = "Workspace";
/// Key phrases joined into a keyword name.
pub const KEYWORD_COUNT: usize = 3;
/// Seed of the auto-numbering sequence; reset for every request.
pub const NUMBERING_SEED: u64 = 42;
/// Auto-numbered group numbers; the upper bound is exclusive.
pub const GROUP_NUMBER_RANGE: std::ops::Range<u32> = 1000..9999;

/// Names the groups of one request.
///
/// Auto-numbered names draw from a seeded sequence, so the same request
/// always yields the same numbers.
pub struct GroupNamer {
    strategy: NamingStrategy,
    rng: StdRng,
}

impl GroupNamer {
    pub fn new(strategy: NamingStrategy) -> Self {
        Self {
            strategy,
            rng: StdRng::seed_from_u64(NUMBERING_SEED),
        }
    }

    /// Name a group from its tabs and their documents (same order).
    pub fn name(&mut self, tabs: &[&Tab], docs: &[&Document]) -> String {
        match &self.strategy {
            NamingStrategy::Keyword => keyword_name(docs),
            NamingStrategy::Domain | NamingStrategy::DomainWord => domain_name(tabs),
            NamingStrategy::AutoNumbered => {
                let number: u32 = self.rng.gen_range(GROUP_NUMBER_RANGE);
                match top_phrases(segments(docs), 1).into_iter().next() {
                    Some(phrase) => format!("Group {number} - {phrase}"),
                    None => format!("Group {number}"),
                }
            }
            NamingStrategy::Other(_) => FALLBACK_NAME.to_string(),
        }
    }
}

/// Top key phrases across the group's documents, comma-joined.
pub fn keyword_name(docs: &[&Document]) -> String {
    let phrases = top_phrases(segments(docs), KEYWORD_COUNT);
    if phrases.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        phrases.join(", ")
    }
}

fn segments<'a>(docs: &'a [&'a Document]) -> impl Iterator<Item = &'a str> + 'a {
    docs.iter().flat_map(|d| d.segments.iter().map(String::as_str))
}

/// Most common bare domain; ties go to the domain seen first.
pub fn domain_name(tabs: &[&Tab]) -> String {
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut order: Vec<String> = Vec::new();
    for tab in tabs {
        let domain = bare_domain(&tab.url);
        if domain.is_empty() {
            continue;
        }
        let count = counts.entry(domain.clone()).or_insert(0);
        if *count == 0 {
            order.push(domain);
        }
        *count += 1;
    }

    let mut best: Option<(&String, usize)> = None;
    for domain in &order {
        let count = counts[domain];
        if best.map_or(true, |(_, c)| count > c) {
            best = Some((domain, count));
        }
    }
    best.map(|(d, _)| d.clone())
        .unwrap_or_else(|| FALLBACK_NAME.to_string())
}
