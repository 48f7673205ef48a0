// SPDX-FileCopyrightText: 2026 Engram Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pattern-based importance classifier for conversation turns.
//!
//! A pure function of the utterances and thresholds: the same inputs always
//! produce the same verdict. Rules are evaluated in a fixed order; each match
//! can raise the importance floor, append a tag, and set the reason if no
//! earlier rule already did.

use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};

use crate::types::Verdict;
use crate::vector::cosine_similarity;

/// Whole-line acknowledgments and filler words that carry no content.
static ACKNOWLEDGMENT: LazyLock<Regex> = LazyLock::new(|| {
    line_pattern(
        r"(ok(ay)?|kk?|yes|yep|yeah|yup|no|nope|nah|sure|thanks|thank you|thx|ty|got it|cool|nice|great|perfect|sounds good|will do|done|alright|right|indeed|agreed)",
    )
});

/// Whole-line greetings.
static GREETING: LazyLock<Regex> = LazyLock::new(|| {
    line_pattern(
        r"(hi|hiya|hey|hello|yo|howdy|greetings|good (morning|afternoon|evening|night)|morning|evening|what'?s up|sup)( there| everyone| all)?",
    )
});

/// Whole-line stalling phrases from either side of the conversation.
static FILLER: LazyLock<Regex> = LazyLock::new(|| {
    line_pattern(
        r"(let me (check|see|look)|one (sec|second|moment)|just a (sec|second|minute|moment)|hold on|hang on|working on it|checking|looking into it|on it|brb|give me a (sec|second|minute|moment))",
    )
});

/// Fenced code block with at least 20 characters of payload.
static CODE_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```.{20,}?```").expect("code fence pattern compiles"));

/// Bare code keywords. Deliberately case-sensitive: prose capitalizes, code doesn't.
static CODE_KEYWORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(function|const|let|var|import|export|class|def|async)\b")
        .expect("code keyword pattern compiles")
});

/// One content-signal rule: pattern, importance floor, tag, optional reason.
struct SignalRule {
    pattern: Regex,
    floor: f64,
    tag: &'static str,
    reason: &'static str,
}

/// Content-signal rules in evaluation order. Importance is max-wins across
/// all matches; the reason comes from the first match only.
static SIGNAL_RULES: LazyLock<Vec<SignalRule>> = LazyLock::new(|| {
    vec![
        SignalRule {
            pattern: search_pattern(
                r"\b(remember|note|save|store|don'?t forget|keep in mind|write (this |that |it )?down)\b",
            ),
            floor: 0.95,
            tag: "explicit",
            reason: "explicit remember command",
        },
        SignalRule {
            pattern: search_pattern(
                r"\b(we (have )?decided|we'?ve decided|decided to|let'?s go with|the plan is|going with|chose|settled on|final answer|final decision)\b",
            ),
            floor: 0.85,
            tag: "decision",
            reason: "contains decision",
        },
        SignalRule {
            pattern: search_pattern(
                r"\b(i learned|lesson learned|the problem was|never again|turns out|root cause|key insight|the fix was)\b",
            ),
            floor: 0.85,
            tag: "lesson",
            reason: "contains lesson/insight",
        },
        SignalRule {
            pattern: search_pattern(
                r"\b(i prefer|i'?d prefer|i like|i love|i hate|always use|never use|my preference|my favou?rite)\b",
            ),
            floor: 0.80,
            tag: "preference",
            reason: "contains preference",
        },
        SignalRule {
            pattern: search_pattern(
                r"\b(my name is|i am|i'?m|i work (at|for)|my role|my job is|i live in|based in)\b",
            ),
            floor: 0.80,
            tag: "identity",
            reason: "contains identity information",
        },
        SignalRule {
            pattern: search_pattern(
                r"\b(password|api[ _-]?key|token|secret|credential|url|endpoint|port|hostname|username|version|license|deadline)\b|\bv\d+\.\d+|\b\d{4}-\d{2}-\d{2}\b|https?://",
            ),
            floor: 0.60,
            tag: "factual",
            reason: "contains factual/config data",
        },
        SignalRule {
            pattern: search_pattern(
                r"\b(architecture|schema|database|server|deploy(ment|ed|ing)?|migration|algorithm|protocol|framework|library|compiler|container|kubernetes|docker|pipeline|cache|index|refactor(ing)?|regression|benchmark)\b",
            ),
            floor: 0.50,
            tag: "technical",
            reason: "contains technical discussion",
        },
    ]
});

/// Case-insensitive whole-line matcher with optional trailing punctuation.
fn line_pattern(alternatives: &str) -> Regex {
    RegexBuilder::new(&format!(r"^{alternatives}[\s.!?,…]*$"))
        .case_insensitive(true)
        .build()
        .expect("line pattern compiles")
}

/// Case-insensitive substring matcher.
fn search_pattern(pattern: &str) -> Regex {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .expect("search pattern compiles")
}

/// Deterministic importance classifier.
///
/// Stateless apart from the configured thresholds; safe to share.
#[derive(Debug, Clone)]
pub struct Classifier {
    min_importance: f64,
    dedup_threshold: f64,
    heuristic: bool,
}

impl Classifier {
    pub fn new(min_importance: f64, dedup_threshold: f64, heuristic: bool) -> Self {
        Self {
            min_importance,
            dedup_threshold,
            heuristic,
        }
    }

    /// Classify one conversation turn.
    ///
    /// `embedding` and `existing` feed the duplicate guard: when both are
    /// supplied and the closest existing memory exceeds the dedup threshold,
    /// the turn is rejected regardless of its importance.
    pub fn classify(
        &self,
        user: &str,
        assistant: &str,
        embedding: Option<&[f32]>,
        existing: &[&[f32]],
    ) -> Verdict {
        let mut importance = 0.0f64;
        let mut reason: Option<String> = None;
        let mut tags: Vec<String> = Vec::new();
        let haystack = format!("{user}\n{assistant}");
        let word_count = haystack.split_whitespace().count();

        if self.heuristic {
            // Pattern rejections run before the length check so that a bare
            // "ok" reads as an acknowledgment rather than as merely short.
            let user_trimmed = user.trim();
            if ACKNOWLEDGMENT.is_match(user_trimmed) {
                return Verdict::reject("acknowledgment/filler");
            }
            if GREETING.is_match(user_trimmed) {
                return Verdict::reject("greeting");
            }
            if FILLER.is_match(user_trimmed) || FILLER.is_match(assistant.trim()) {
                return Verdict::reject("filler");
            }
            if user_trimmed.chars().count() < 10 {
                return Verdict::reject("too short");
            }

            for rule in SIGNAL_RULES.iter() {
                if rule.pattern.is_match(&haystack) {
                    importance = importance.max(rule.floor);
                    push_tag(&mut tags, rule.tag);
                    if reason.is_none() {
                        reason = Some(rule.reason.to_string());
                    }
                }
            }

            if CODE_FENCE.is_match(&haystack) || CODE_KEYWORD.is_match(&haystack) {
                importance = importance.max(0.45);
                push_tag(&mut tags, "code");
                push_tag(&mut tags, "technical");
            }

            if word_count > 200 && importance < 0.4 {
                importance = 0.4;
                if reason.is_none() {
                    reason = Some("substantive exchange (length)".to_string());
                }
            }
        } else {
            // Heuristic scoring disabled: accept at default importance and
            // let the duplicate guard and threshold do the filtering.
            importance = 0.5;
            reason = Some("heuristic disabled".to_string());
        }

        if let Some(new_embedding) = embedding {
            if !existing.is_empty() {
                let max_similarity = existing
                    .iter()
                    .map(|known| cosine_similarity(new_embedding, known))
                    .fold(f32::NEG_INFINITY, f32::max);
                if f64::from(max_similarity) > self.dedup_threshold {
                    return Verdict {
                        should_remember: false,
                        importance,
                        reason: format!(
                            "duplicate (similarity: {:.0}%)",
                            max_similarity * 100.0
                        ),
                        tags,
                    };
                }
            }
        }

        if importance == 0.0 {
            if word_count > 30 {
                importance = 0.2;
                reason = Some("general conversation".to_string());
            } else {
                return Verdict::reject("no importance signals");
            }
        }

        Verdict {
            should_remember: importance >= self.min_importance,
            importance,
            reason: reason.unwrap_or_default(),
            tags,
        }
    }
}

fn push_tag(tags: &mut Vec<String>, tag: &str) {
    if !tags.iter().any(|t| t == tag) {
        tags.push(tag.to_string());
    }
}
