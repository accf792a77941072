//! Document search over the company FAQ corpus
//!
//! Wraps a single static text file as a passage-level lexical index. Queries
//! are plain strings by contract; scores are idf-weighted token overlap
//! normalized into [0, 1]. The index is read-only after construction.

use std::collections::HashMap;
use std::collections::HashSet;
use std::path::Path;

use tracing::debug;
use tracing::info;

use crate::errors::Result;
use crate::errors::StyleRagError;

/// One passage of the FAQ corpus
#[derive(Debug, Clone)]
pub struct FaqPassage {
    pub section: String,
    pub text: String,
    tokens: HashSet<String>,
}

/// One search hit with its relevance score in [0, 1]
#[derive(Debug, Clone)]
pub struct FaqHit {
    pub section: String,
    pub text: String,
    pub score: f32,
}

/// Lexical index over one FAQ document
#[derive(Debug)]
pub struct FaqIndex {
    passages: Vec<FaqPassage>,
    document_frequency: HashMap<String, usize>,
}

impl FaqIndex {
    /// Build the index from the corpus file
    ///
    /// A missing or empty corpus is a collaborator-initialization failure:
    /// the caller surfaces it as a system-error message for that request.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            StyleRagError::ConfigError(format!(
                "Cannot read FAQ corpus at {}: {e}",
                path.display()
            ))
        })?;

        let index = Self::from_corpus(&content);
        if index.is_empty() {
            return Err(StyleRagError::ConfigError(format!(
                "FAQ corpus at {} contains no passages",
                path.display()
            )));
        }

        info!(
            "Loaded FAQ corpus: {} passages from {}",
            index.len(),
            path.display()
        );
        Ok(index)
    }

    /// Build the index from corpus text
    ///
    /// Passages are blank-line separated blocks; a block whose first line
    /// ends with ':' or starts with '#' opens a new section.
    pub fn from_corpus(content: &str) -> Self {
        let mut passages = Vec::new();
        let mut current_section = String::from("General");

        for block in content.split("\n\n") {
            let block = block.trim();
            if block.is_empty() {
                continue;
            }

            let first_line = block.lines().next().unwrap_or_default().trim();
            let is_header = first_line.starts_with('#')
                || (first_line.ends_with(':') && first_line.len() < 80);

            let text = if is_header {
                current_section = first_line
                    .trim_start_matches('#')
                    .trim_end_matches(':')
                    .trim()
                    .to_string();
                block
                    .lines()
                    .skip(1)
                    .collect::<Vec<_>>()
                    .join("\n")
                    .trim()
                    .to_string()
            } else {
                block.to_string()
            };

            if text.is_empty() {
                continue;
            }

            let tokens: HashSet<String> = tokenize(&text).into_iter().collect();
            passages.push(FaqPassage {
                section: current_section.clone(),
                text,
                tokens,
            });
        }

        let mut document_frequency: HashMap<String, usize> = HashMap::new();
        for passage in &passages {
            for token in &passage.tokens {
                *document_frequency.entry(token.clone()).or_insert(0) += 1;
            }
        }

        Self {
            passages,
            document_frequency,
        }
    }

    pub fn len(&self) -> usize {
        self.passages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passages.is_empty()
    }

    /// Sections present in the corpus, in document order, deduplicated
    pub fn sections(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.passages
            .iter()
            .filter(|p| seen.insert(p.section.as_str()))
            .map(|p| p.section.as_str())
            .collect()
    }

    /// Search the corpus; results sorted by descending score, length ≤ top_k
    pub fn search(&self, query: &str, top_k: usize) -> Vec<FaqHit> {
        let query_tokens = tokenize(query);
        if query_tokens.is_empty() || self.passages.is_empty() {
            return Vec::new();
        }

        let n = self.passages.len() as f32;
        let idf = |token: &str| -> f32 {
            let df = self.document_frequency.get(token).copied().unwrap_or(0) as f32;
            if df == 0.0 {
                // Unseen terms still count toward the denominator at max weight
                (n + 1.0).ln() + 1.0
            } else {
                (n / df).ln() + 1.0
            }
        };

        let total_weight: f32 = query_tokens.iter().map(|t| idf(t)).sum();
        if total_weight == 0.0 {
            return Vec::new();
        }

        let mut hits: Vec<FaqHit> = self
            .passages
            .iter()
            .filter_map(|passage| {
                let matched: f32 = query_tokens
                    .iter()
                    .filter(|t| passage_matches(passage, t))
                    .map(|t| idf(t))
                    .sum();
                if matched == 0.0 {
                    return None;
                }
                Some(FaqHit {
                    section: passage.section.clone(),
                    text: passage.text.clone(),
                    score: matched / total_weight,
                })
            })
            .collect();

        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(top_k);

        debug!(
            "FAQ search for {:?}: {} hits, best score {:.2}",
            query,
            hits.len(),
            hits.first().map_or(0.0, |h| h.score)
        );

        hits
    }
}

/// True when a passage contains the query token, exactly or by stem prefix
/// ("return" also hits "returned" and "returns")
fn passage_matches(passage: &FaqPassage, token: &str) -> bool {
    if passage.tokens.contains(token) {
        return true;
    }
    let stem = stem(token);
    passage.tokens.iter().any(|pt| pt.starts_with(stem))
}

/// Crude inflection stripper for prefix matching
fn stem(token: &str) -> &str {
    for suffix in ["ing", "ed", "es", "s"] {
        if let Some(stripped) = token.strip_suffix(suffix) {
            if stripped.len() >= 3 {
                return stripped;
            }
        }
    }
    token
}

/// Lowercased alphanumeric tokens with stopwords removed
fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .map(str::to_lowercase)
        .filter(|t| t.len() > 1 && !is_stopword(t))
        .collect()
}

fn is_stopword(token: &str) -> bool {
    matches!(
        token,
        "the" | "a" | "an" | "is" | "are" | "was" | "were" | "be" | "been"
            | "do" | "does" | "did" | "can" | "could" | "will" | "would"
            | "i" | "you" | "your" | "yours" | "we" | "our" | "my" | "me"
            | "it" | "its" | "this" | "that" | "these" | "those"
            | "what" | "which" | "how" | "when" | "where" | "who"
            | "and" | "or" | "but" | "if" | "of" | "to" | "in" | "on"
            | "for" | "with" | "at" | "by" | "from" | "as" | "about"
            | "please" | "tell" | "want" | "know"
    )
}
