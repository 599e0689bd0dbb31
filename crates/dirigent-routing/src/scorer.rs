//! Weighted keyword confidence scoring.
//!
//! Pure and deterministic: safe to call concurrently from many routing
//! requests over a shared profile snapshot.

use crate::profile::AgentProfile;

/// One keyword that matched the task description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordMatch {
    pub term: String,
    pub weight: u32,
}

/// Result of scoring one task description against one profile.
#[derive(Debug, Clone, PartialEq)]
pub struct KeywordScore {
    /// Normalized confidence, 0-100
    pub score: f64,
    /// Keywords that contributed, longest first
    pub matched: Vec<KeywordMatch>,
}

/// Score `description` against `profile`.
///
/// `score = 100 × (Σ weight of matched keywords) / (Σ weight of all keywords)`.
///
/// A keyword matches when it appears case-insensitively in the description.
/// Matching is longest-keyword-first over a claimed-span mask, so "root
/// cause" consumes its characters before "root" or "cause" can match the
/// same span — overlapping terms are never double counted.
///
/// A profile with no keywords scores 0 (defined, not an error).
pub fn keyword_score(description: &str, profile: &AgentProfile) -> KeywordScore {
    let total = profile.total_weight();
    if total == 0 || description.trim().is_empty() {
        return KeywordScore {
            score: 0.0,
            matched: Vec::new(),
        };
    }

    let haystack = description.to_lowercase();

    // Longest first; equal lengths ordered by term for determinism.
    let mut keywords: Vec<_> = profile
        .keywords
        .iter()
        .filter(|k| !k.term.trim().is_empty())
        .collect();
    keywords.sort_by(|a, b| b.term.len().cmp(&a.term.len()).then(a.term.cmp(&b.term)));

    let mut claimed: Vec<(usize, usize)> = Vec::new();
    let mut matched_weight: u64 = 0;
    let mut matched = Vec::new();

    for keyword in keywords {
        let needle = keyword.term.to_lowercase();
        let span = haystack.match_indices(&needle).map(|(start, m)| (start, start + m.len())).find(
            |&(start, end)| {
                !claimed
                    .iter()
                    .any(|&(c_start, c_end)| start < c_end && c_start < end)
            },
        );
        if let Some(span) = span {
            claimed.push(span);
            matched_weight += keyword.weight as u64;
            matched.push(KeywordMatch {
                term: keyword.term.clone(),
                weight: keyword.weight,
            });
        }
    }

    KeywordScore {
        score: 100.0 * matched_weight as f64 / total as f64,
        matched,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::WeightedKeyword;

    fn profile(keywords: &[(&str, u32)]) -> AgentProfile {
        AgentProfile {
            agent_id: "rca".to_string(),
            keywords: keywords
                .iter()
                .map(|(term, weight)| WeightedKeyword {
                    term: term.to_string(),
                    weight: *weight,
                })
                .collect(),
            semantic_ref: None,
        }
    }

    #[test]
    fn test_documented_root_cause_example_scores_80() {
        // "root cause" + "bug" + "identify" match out of total weight 100
        let p = profile(&[
            ("root cause", 40),
            ("bug", 30),
            ("identify", 10),
            ("migration", 20),
        ]);
        let result = keyword_score("identify the root cause of this bug", &p);
        assert!((result.score - 80.0).abs() < f64::EPSILON);
        assert_eq!(result.matched.len(), 3);
    }

    #[test]
    fn test_empty_profile_scores_zero() {
        let p = profile(&[]);
        let result = keyword_score("anything at all", &p);
        assert_eq!(result.score, 0.0);
    }

    #[test]
    fn test_matching_is_case_insensitive() {
        let p = profile(&[("Root Cause", 50), ("BUG", 50)]);
        let result = keyword_score("ROOT CAUSE of a bug", &p);
        assert_eq!(result.score, 100.0);
    }

    #[test]
    fn test_overlapping_keywords_counted_once() {
        // "root" would overlap the span claimed by "root cause"
        let p = profile(&[("root cause", 60), ("root", 40)]);
        let result = keyword_score("find the root cause", &p);
        assert_eq!(result.score, 60.0);
        assert_eq!(result.matched.len(), 1);
        assert_eq!(result.matched[0].term, "root cause");
    }

    #[test]
    fn test_shorter_keyword_still_matches_elsewhere() {
        // Second occurrence of "root" is outside the claimed span
        let p = profile(&[("root cause", 60), ("root", 40)]);
        let result = keyword_score("root cause analysis of the root partition", &p);
        assert_eq!(result.score, 100.0);
    }

    #[test]
    fn test_score_is_monotone_in_matching_keywords() {
        let p = profile(&[("alpha", 20), ("beta", 30), ("gamma", 50)]);
        let s1 = keyword_score("alpha", &p).score;
        let s2 = keyword_score("alpha beta", &p).score;
        let s3 = keyword_score("alpha beta gamma", &p).score;
        assert!(s1 <= s2 && s2 <= s3);
        assert_eq!(s3, 100.0);
    }

    #[test]
    fn test_repeated_keyword_counted_once() {
        let p = profile(&[("bug", 50), ("fix", 50)]);
        let result = keyword_score("bug bug bug", &p);
        assert_eq!(result.score, 50.0);
    }

    #[test]
    fn test_empty_description_scores_zero() {
        let p = profile(&[("bug", 100)]);
        assert_eq!(keyword_score("", &p).score, 0.0);
        assert_eq!(keyword_score("   ", &p).score, 0.0);
    }
}
