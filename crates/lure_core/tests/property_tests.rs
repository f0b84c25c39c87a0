//! Property-based tests for lure_core.
//!
//! Uses proptest to check the normalization and accumulation invariants for
//! arbitrary inputs, not just hand-picked examples.

use lure_core::patterns::{self, strip_separators, PhonePolicy};
use lure_core::ArtifactSet;
use proptest::prelude::*;

// ============================================================================
// Strategies
// ============================================================================

/// A valid Indian mobile number with random separators inserted.
fn arb_separated_mobile() -> impl Strategy<Value = (String, String)> {
    (
        prop::sample::select(vec!['6', '7', '8', '9']),
        prop::collection::vec(0u8..10, 9),
        prop::collection::vec(prop::sample::select(vec!["", " ", "-", "."]), 10),
        prop::sample::select(vec!["", "0", "91", "+91"]),
    )
        .prop_map(|(first, rest, seps, prefix)| {
            let digits: String = std::iter::once(first)
                .chain(rest.iter().map(|d| char::from(b'0' + d)))
                .collect();
            let mut raw = prefix.to_string();
            for (c, sep) in digits.chars().zip(seps.iter()) {
                raw.push(c);
                raw.push_str(sep);
            }
            (raw.trim_end_matches(['-', '.', ' ']).to_string(), format!("+91{}", digits))
        })
}

fn arb_artifact_set() -> impl Strategy<Value = ArtifactSet> {
    (
        prop::collection::vec("[0-9]{9,18}", 0..4),
        prop::collection::vec("[a-z]{3,8}@[a-z]{3,6}", 0..4),
        prop::collection::vec("https://[a-z]{3,10}\\.example/[a-z]{0,6}", 0..4),
    )
        .prop_map(|(accounts, ids, links)| {
            let mut set = ArtifactSet::new();
            for a in &accounts {
                set.add_bank_account(a);
            }
            for i in &ids {
                set.add_payment_id(i);
            }
            for l in &links {
                set.add_link(l);
            }
            set
        })
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    /// Any separator layout of a valid mobile number normalizes to one canonical value.
    #[test]
    fn phone_normalization_is_separator_insensitive((raw, expected) in arb_separated_mobile()) {
        let policy = PhonePolicy::default();
        prop_assert_eq!(policy.normalize(&raw), Some(expected));
    }

    /// Normalization never panics and only ever yields canonical `+91` + 10 digits.
    #[test]
    fn phone_normalization_output_is_canonical(raw in "\\PC{0,40}") {
        let policy = PhonePolicy::default();
        if let Some(phone) = policy.normalize(&raw) {
            prop_assert!(phone.starts_with("+91"));
            prop_assert_eq!(phone.len(), 13);
            prop_assert!(phone[1..].chars().all(|c| c.is_ascii_digit()));
        }
    }

    /// Normalizing an already-canonical value is a fixed point.
    #[test]
    fn phone_normalization_idempotent((raw, _) in arb_separated_mobile()) {
        let policy = PhonePolicy::default();
        let once = policy.normalize(&raw).unwrap();
        prop_assert_eq!(policy.normalize(&once), Some(once.clone()));
    }

    #[test]
    fn strip_separators_idempotent(s in "\\PC{0,200}") {
        let once = strip_separators(&s);
        prop_assert_eq!(strip_separators(&once), once);
    }

    /// A number written after a phone never merges into it.
    #[test]
    fn phone_survives_trailing_count((raw, expected) in arb_separated_mobile(), n in 0u32..1000) {
        // "91" followed by a mobile digit reads as a bare mobile on its own
        prop_assume!(!raw.starts_with("91"));
        let text = format!("Call {} {} hours a day", raw, n);
        prop_assert_eq!(PhonePolicy::default().find_all(&text), vec![expected]);
    }

    /// Matchers never panic on arbitrary input.
    #[test]
    fn matchers_never_panic(s in "\\PC{0,500}") {
        let _ = patterns::bank_account_candidates(&s);
        let _ = PhonePolicy::default().find_all(&s);
        let _ = patterns::payment_id_candidates(&s);
        let _ = patterns::url_candidates(&s);
        let _ = patterns::suspicious_terms(&s);
    }

    /// Merging never shrinks any class, and merging twice adds nothing.
    #[test]
    fn merge_monotonic_and_idempotent(a in arb_artifact_set(), b in arb_artifact_set()) {
        let mut acc = a.clone();
        let before = acc.counts();
        acc.merge(&b);
        prop_assert!(acc.counts().dominates(&before));
        prop_assert!(acc.counts().dominates(&b.counts()));
        let snapshot = acc.clone();
        prop_assert_eq!(acc.merge(&b), 0);
        prop_assert_eq!(acc, snapshot);
    }
}
