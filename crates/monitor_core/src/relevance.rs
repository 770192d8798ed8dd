//! Heuristic trading-relevance scoring for decoded text payloads.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::lexicon::{KEYWORDS, NUMBER_PATTERN, RANGE_PATTERN, STRUCTURE_PATTERNS, SYMBOL_GLYPHS};

/// Minimum score for a payload to count as trading chatter.
pub const TRADING_THRESHOLD: u32 = 5;

pub const REASON_NO_TEXT: &str = "no-text";
pub const REASON_EMPTY_TEXT: &str = "empty-text";

const KEYWORD_CAP: u32 = 4;
const STRUCTURE_CAP: u32 = 4;
const SYMBOL_CAP: u32 = 2;

#[derive(Debug, thiserror::Error)]
pub enum ScorerError {
    #[error("failed to compile pattern '{label}': {source}")]
    Pattern {
        label: String,
        #[source]
        source: regex::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordHit {
    pub keyword: String,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructureHit {
    pub label: String,
    pub count: u32,
}

/// Score and evidence for one payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelevanceAssessment {
    pub score: u32,
    pub numbers_count: u32,
    /// Lexicon order; only keywords that occurred.
    pub keyword_hits: Vec<KeywordHit>,
    /// Catalogue order; only patterns that matched.
    pub structure_hits: Vec<StructureHit>,
    pub symbol_count: u32,
    pub is_trading: bool,
    pub reasons: Vec<String>,
}

impl RelevanceAssessment {
    fn rejected(reason: &str) -> Self {
        Self {
            score: 0,
            numbers_count: 0,
            keyword_hits: Vec::new(),
            structure_hits: Vec::new(),
            symbol_count: 0,
            is_trading: false,
            reasons: vec![reason.to_string()],
        }
    }
}

/// Compiled lexicon. Build once and share; [`RelevanceScorer::assess`] holds no state.
pub struct RelevanceScorer {
    keywords: Vec<(&'static str, Regex)>,
    structures: Vec<(&'static str, Regex)>,
    numbers: Regex,
    range: Regex,
}

impl RelevanceScorer {
    pub fn new() -> Result<Self, ScorerError> {
        let keywords = KEYWORDS
            .iter()
            .map(|keyword| Ok((*keyword, compile(keyword, &keyword_pattern(keyword))?)))
            .collect::<Result<Vec<_>, ScorerError>>()?;
        let structures = STRUCTURE_PATTERNS
            .iter()
            .map(|pat| Ok((pat.label, compile(pat.label, pat.pattern)?)))
            .collect::<Result<Vec<_>, ScorerError>>()?;

        Ok(Self {
            keywords,
            structures,
            numbers: compile("numbers", NUMBER_PATTERN)?,
            range: compile("range", RANGE_PATTERN)?,
        })
    }

    /// Score `text`; `None` means the message carried no text at all.
    /// JSON envelopes are scored on their string fields only, so ids and
    /// numeric timestamps do not count as prices.
    pub fn assess(&self, text: Option<&str>) -> RelevanceAssessment {
        let Some(text) = text else {
            return RelevanceAssessment::rejected(REASON_NO_TEXT);
        };
        let normalized = match json_content(text) {
            Some(content) => normalize_text(&content),
            None => normalize_text(text),
        };
        if normalized.is_empty() {
            return RelevanceAssessment::rejected(REASON_EMPTY_TEXT);
        }

        let mut score = 0;
        let mut reasons = Vec::new();

        let numbers_count = count(self.numbers.find_iter(&normalized).count());
        let number_points = match numbers_count {
            n if n >= 5 => 3,
            n if n >= 3 => 2,
            n if n >= 2 => 1,
            _ => 0,
        };
        if number_points > 0 {
            score += number_points;
            reasons.push(format!("numbers:{numbers_count}(+{number_points})"));
        }

        let keyword_hits: Vec<KeywordHit> = self
            .keywords
            .iter()
            .filter_map(|(keyword, re)| {
                let hits = count(re.find_iter(&normalized).count());
                (hits > 0).then(|| KeywordHit {
                    keyword: keyword.to_string(),
                    count: hits,
                })
            })
            .collect();
        let keyword_total: u32 = keyword_hits.iter().map(|hit| hit.count).sum();
        if keyword_total > 0 {
            let points = keyword_total.min(KEYWORD_CAP);
            score += points;
            reasons.push(format!("keywords:{keyword_total}(+{points})"));
        }

        let structure_hits: Vec<StructureHit> = self
            .structures
            .iter()
            .filter_map(|(label, re)| {
                let hits = count(re.find_iter(&normalized).count());
                (hits > 0).then(|| StructureHit {
                    label: label.to_string(),
                    count: hits,
                })
            })
            .collect();
        let structure_total: u32 = structure_hits.iter().map(|hit| hit.count).sum();
        if structure_total > 0 {
            let points = structure_total.saturating_mul(2).min(STRUCTURE_CAP);
            score += points;
            reasons.push(format!("structures:{structure_total}(+{points})"));
        }

        let symbol_count = count(
            normalized
                .chars()
                .filter(|ch| SYMBOL_GLYPHS.contains(ch))
                .count(),
        );
        if symbol_count > 0 {
            let points = symbol_count.min(SYMBOL_CAP);
            score += points;
            reasons.push(format!("symbols:{symbol_count}(+{points})"));
        }

        if self.range.is_match(&normalized) {
            score += 1;
            reasons.push("range(+1)".to_string());
        }

        RelevanceAssessment {
            score,
            numbers_count,
            keyword_hits,
            structure_hits,
            symbol_count,
            is_trading: score >= TRADING_THRESHOLD,
            reasons,
        }
    }
}

/// Collapse whitespace runs to single spaces and trim.
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// String leaves of a JSON object or array, one per line. `None` when
/// `text` is not such a document or carries no strings.
fn json_content(text: &str) -> Option<String> {
    fn collect<'a>(value: &'a serde_json::Value, out: &mut Vec<&'a str>) {
        match value {
            serde_json::Value::String(s) if !is_timestamp(s) => out.push(s),
            serde_json::Value::Array(items) => items.iter().for_each(|item| collect(item, out)),
            serde_json::Value::Object(map) => map.values().for_each(|item| collect(item, out)),
            _ => {}
        }
    }

    let trimmed = text.trim_start();
    if !trimmed.starts_with('{') && !trimmed.starts_with('[') {
        return None;
    }
    let value: serde_json::Value = serde_json::from_str(text).ok()?;
    let mut leaves = Vec::new();
    collect(&value, &mut leaves);
    (!leaves.is_empty()).then(|| leaves.join("\n"))
}

/// `2026-01-02`, `2026-01-02T03:04:05.000Z` and the like.
fn is_timestamp(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() >= 10
        && bytes[..10].iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        })
        && s[10..].chars().all(|ch| ch.is_ascii_digit() || ":.TZ+- ".contains(ch))
}

fn keyword_pattern(keyword: &str) -> String {
    if keyword.is_ascii() {
        let words: Vec<String> = keyword.split(' ').map(regex::escape).collect();
        // ASCII boundaries: CJK text is not a word character here.
        format!(r"(?i)(?-u:\b){}(?-u:\b)", words.join(r"\s+"))
    } else {
        regex::escape(keyword)
    }
}

fn compile(label: &str, pattern: &str) -> Result<Regex, ScorerError> {
    Regex::new(pattern).map_err(|source| ScorerError::Pattern {
        label: label.to_string(),
        source,
    })
}

fn count(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_collapses_whitespace() {
        assert_eq!(normalize_text("  a \n\t b  "), "a b");
        assert_eq!(normalize_text(" \n "), "");
    }

    #[test]
    fn ascii_keywords_respect_word_boundaries() {
        let scorer = RelevanceScorer::new().expect("scorer");
        let assessment = scorer.assess(Some("belong to the shortlist"));
        assert!(assessment.keyword_hits.is_empty());
        let assessment = scorer.assess(Some("Going LONG, stop   loss tight"));
        let keywords: Vec<&str> = assessment
            .keyword_hits
            .iter()
            .map(|hit| hit.keyword.as_str())
            .collect();
        assert_eq!(keywords, vec!["long", "stop loss"]);
    }

    #[test]
    fn ascii_keywords_match_next_to_cjk_text() {
        let scorer = RelevanceScorer::new().expect("scorer");
        let assessment = scorer.assess(Some("BTC突破，long仓"));
        let keywords: Vec<&str> = assessment
            .keyword_hits
            .iter()
            .map(|hit| hit.keyword.as_str())
            .collect();
        assert!(keywords.contains(&"btc"), "{keywords:?}");
        assert!(keywords.contains(&"long"), "{keywords:?}");
    }

    #[test]
    fn timestamps_are_recognized() {
        assert!(is_timestamp("2026-01-02"));
        assert!(is_timestamp("2026-01-02T03:04:05.000Z"));
        assert!(is_timestamp("2026-01-02 03:04:05+08:00"));
        assert!(!is_timestamp("2026-01-02 破位"));
        assert!(!is_timestamp("104000-106000"));
        assert!(!is_timestamp("短"));
    }

    #[test]
    fn number_bands_do_not_stack() {
        let scorer = RelevanceScorer::new().expect("scorer");
        assert_eq!(scorer.assess(Some("1 2")).score, 1);
        assert_eq!(scorer.assess(Some("1 2 3")).score, 2);
        assert_eq!(scorer.assess(Some("1 2 3 4 5 6 7")).score, 3);
        assert_eq!(scorer.assess(Some("1,250.5 and 7")).numbers_count, 2);
    }
}
