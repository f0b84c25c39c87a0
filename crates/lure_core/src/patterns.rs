//! Pattern library: stateless matchers for every artifact class.
//!
//! Matchers tolerate separators (spaces, dashes, dots) between digit groups of
//! otherwise-valid tokens. They never fail; no match is an empty `Vec`.

use regex::Regex;
use serde::Deserialize;
use std::sync::LazyLock;

// ============================================================================
// Pre-compiled regexes
// ============================================================================

static RE_DIGIT_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:\+|\b)\d+(?:[ .\-]\d+)*\b").unwrap());
static RE_DIGITS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").unwrap());
static RE_PAYMENT_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[A-Za-z0-9][A-Za-z0-9._\-]{1,}@[A-Za-z]{2,}\b").unwrap());
static RE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)(?:https?://|\bwww\.|\b(?:bit\.ly|tinyurl\.com|t\.co|goo\.gl|is\.gd|cutt\.ly|rb\.gy)/)[^\s<>"'()]+"#,
    )
    .unwrap()
});

/// Digit count range of a bank account number.
const BANK_ACCOUNT_DIGITS: (usize, usize) = (9, 18);

// ============================================================================
// Lexicon
// ============================================================================

pub const URGENCY_TERMS: &[&str] = &[
    "urgent", "urgently", "immediately", "asap", "hurry", "quickly", "right now",
];

pub const THREAT_TERMS: &[&str] = &[
    "blocked", "suspended", "frozen", "locked", "closed", "terminated", "deactivated",
    "legal action", "arrest",
];

pub const SENSITIVE_TERMS: &[&str] = &[
    "otp", "pin", "password", "cvv", "account number", "upi id", "upi pin", "kyc",
];

pub const ACTION_TERMS: &[&str] = &[
    "verify", "share", "send", "provide", "click", "call", "update", "confirm",
];

pub const TIME_PRESSURE_TERMS: &[&str] = &[
    "minutes", "hours", "today", "deadline", "final notice", "last chance", "expire", "expires",
];

pub const REWARD_TERMS: &[&str] = &[
    "lottery", "prize", "winner", "cashback", "refund", "reward", "congratulations",
];

// ============================================================================
// Phone policy
// ============================================================================

/// Canonicalization rules for phone numbers of the local country.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PhonePolicy {
    /// Dialing code without `+`, e.g. "91".
    pub country_code: String,
    /// Digit count of a national number without trunk prefix.
    pub national_digits: usize,
    /// Leading digits that a bare national mobile number may start with.
    pub mobile_leading: String,
}

impl Default for PhonePolicy {
    fn default() -> Self {
        Self {
            country_code: "91".to_string(),
            national_digits: 10,
            mobile_leading: "6789".to_string(),
        }
    }
}

impl PhonePolicy {
    /// Normalize a raw phone candidate to `+<cc><national>`.
    ///
    /// Returns `None` for shapes that are not recognisably local numbers.
    pub fn normalize(&self, raw: &str) -> Option<String> {
        let cleaned = strip_separators(raw);
        let cc = self.country_code.as_str();
        let national = self.national_digits;

        if !cleaned.trim_start_matches('+').chars().all(|c| c.is_ascii_digit()) {
            return None;
        }

        let international = format!("+{}", cc);
        if cleaned.starts_with(&international) && cleaned.len() == international.len() + national {
            return Some(cleaned);
        }
        if cleaned.starts_with(cc) && cleaned.len() == cc.len() + national {
            return Some(format!("+{}", cleaned));
        }
        if cleaned.starts_with('0') && cleaned.len() == national + 1 {
            return Some(format!("{}{}", international, &cleaned[1..]));
        }
        if !cleaned.starts_with('+') && cleaned.len() == national {
            let first = cleaned.chars().next()?;
            if self.mobile_leading.contains(first) {
                return Some(format!("{}{}", international, cleaned));
            }
        }
        None
    }

    /// Every local phone number in `text`, normalized.
    ///
    /// Within a run of separated digit groups the shortest leading span that
    /// normalizes wins, so "9876543210 24" yields the phone and drops the "24".
    pub fn find_all(&self, text: &str) -> Vec<String> {
        let mut found = Vec::new();
        for run in RE_DIGIT_RUN.find_iter(text) {
            let run = run.as_str();
            let spans = group_spans(run);
            let mut i = 0;
            while i < spans.len() {
                let hit = (i..spans.len()).find_map(|j| {
                    self.normalize(&run[spans[i].0..spans[j].1]).map(|phone| (j, phone))
                });
                match hit {
                    Some((j, phone)) => {
                        found.push(phone);
                        i = j + 1;
                    }
                    None => i += 1,
                }
            }
        }
        found
    }
}

// ============================================================================
// Matchers
// ============================================================================

/// Remove spaces, dashes and dots.
pub fn strip_separators(raw: &str) -> String {
    raw.chars()
        .filter(|c| !(c.is_whitespace() || *c == '-' || *c == '.'))
        .collect()
}

/// Digit groups of a run as byte ranges. A leading `+` belongs to the first group.
fn group_spans(run: &str) -> Vec<(usize, usize)> {
    RE_DIGITS
        .find_iter(run)
        .enumerate()
        .map(|(i, m)| if i == 0 { (0, m.end()) } else { (m.start(), m.end()) })
        .collect()
}

/// Bank-account-like digit groups (9-18 digits once separators are removed).
///
/// A group that is already account-length stands alone and never absorbs its
/// neighbours. Shorter groups join into one account while the separator
/// between them stays the same.
pub fn bank_account_candidates(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    for run in RE_DIGIT_RUN.find_iter(text) {
        let run = run.as_str().trim_start_matches('+');
        // (start, end, separator used inside the chunk)
        let mut chunk: Option<(usize, usize, Option<&str>)> = None;
        let mut prev_end = 0;
        for (start, end) in group_spans(run) {
            let sep = &run[prev_end..start];
            prev_end = end;
            if end - start >= BANK_ACCOUNT_DIGITS.0 {
                tokens.extend(chunk.take().map(|(a, b, _)| &run[a..b]));
                tokens.push(&run[start..end]);
                continue;
            }
            chunk = match chunk {
                Some((a, _, inner)) if inner.map_or(true, |s| s == sep) => {
                    Some((a, end, Some(sep)))
                }
                other => {
                    tokens.extend(other.map(|(a, b, _)| &run[a..b]));
                    Some((start, end, None))
                }
            };
        }
        tokens.extend(chunk.map(|(a, b, _)| &run[a..b]));
    }
    tokens
        .into_iter()
        .filter(|t| {
            let digits = t.chars().filter(char::is_ascii_digit).count();
            (BANK_ACCOUNT_DIGITS.0..=BANK_ACCOUNT_DIGITS.1).contains(&digits)
        })
        .map(str::to_string)
        .collect()
}

/// Payment IDs of the `name@handle` form. E-mail addresses are excluded.
pub fn payment_id_candidates(text: &str) -> Vec<String> {
    RE_PAYMENT_ID
        .find_iter(text)
        .filter(|m| {
            // "x@gmail.com": the handle continues with a domain suffix
            let rest = &text[m.end()..];
            let mut chars = rest.chars();
            !(chars.next() == Some('.') && chars.next().is_some_and(|c| c.is_ascii_alphanumeric()))
        })
        .map(|m| m.as_str().to_lowercase())
        .collect()
}

/// Links: scheme URLs, `www.` hosts and bare shortener links.
pub fn url_candidates(text: &str) -> Vec<String> {
    RE_URL
        .find_iter(text)
        .map(|m| {
            m.as_str()
                .trim_end_matches(['.', ',', ';', ':', '!', '?', ']', '}'])
                .to_string()
        })
        .filter(|u| !u.is_empty())
        .collect()
}

/// Suspicious lexicon terms present in the text, lowercased.
pub fn suspicious_terms(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    [
        URGENCY_TERMS,
        THREAT_TERMS,
        SENSITIVE_TERMS,
        ACTION_TERMS,
        TIME_PRESSURE_TERMS,
        REWARD_TERMS,
    ]
    .iter()
    .flat_map(|group| group.iter())
    .filter(|term| contains_term(&lower, term))
    .map(|term| term.to_string())
    .collect()
}

/// True if `term` occurs in the lowercased haystack on word boundaries.
pub fn contains_term(haystack_lower: &str, term: &str) -> bool {
    let is_word = |c: char| c.is_alphanumeric() || c == '_';
    haystack_lower.match_indices(term).any(|(start, _)| {
        let before_ok = haystack_lower[..start].chars().next_back().map_or(true, |c| !is_word(c));
        let after_ok = haystack_lower[start + term.len()..]
            .chars()
            .next()
            .map_or(true, |c| !is_word(c));
        before_ok && after_ok
    })
}

/// True if any of `terms` occurs in `text` (case-insensitive, word bounded).
pub fn contains_any(text: &str, terms: &[&str]) -> bool {
    let lower = text.to_lowercase();
    terms.iter().any(|t| contains_term(&lower, t))
}

// ============================================================================
// Tests
// ============================================================================
