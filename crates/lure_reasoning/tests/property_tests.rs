//! Property-based tests for extraction and reply cleanup.
//!
//! Extraction runs against a failing client so every case exercises the
//! pattern fallback through the public `extract` entry point.

use lure_core::{ArtifactSet, Message, PhonePolicy};
use lure_reasoning::persona::clean_reply;
use lure_reasoning::providers::mock::MockProvider;
use lure_reasoning::ExtractionEngine;
use proptest::prelude::*;
use std::sync::Arc;

fn engine() -> ExtractionEngine {
    ExtractionEngine::new(Some(Arc::new(MockProvider::failing())), PhonePolicy::default())
}

fn extract(engine: &ExtractionEngine, message: &Message, history: &[Message]) -> ArtifactSet {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap()
        .block_on(engine.extract(message, history))
}

/// Messages that mix artifacts with filler text.
fn arb_message_text() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop_oneof![
            "[a-z]{1,8}",
            "[6-9][0-9]{4}[ -]?[0-9]{5}",
            "[0-9]{4}-[0-9]{4}-[0-9]{4}",
            "[a-z]{3,6}@(ybl|paytm|okicici)",
            "https://[a-z]{3,8}\\.example/[a-z]{0,5}",
            prop::sample::select(vec!["urgent", "otp", "blocked", "verify", "today"])
                .prop_map(str::to_string),
        ],
        0..12,
    )
    .prop_map(|words| words.join(" "))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// **Idempotency**: re-extracting over an unchanged history gives the same set.
    #[test]
    fn extraction_idempotent(
        history in prop::collection::vec(arb_message_text(), 0..6),
        current in arb_message_text(),
    ) {
        let e = engine();
        let history: Vec<Message> = history.into_iter().map(Message::counterparty).collect();
        let message = Message::counterparty(current);
        let first = extract(&e, &message, &history);
        let second = extract(&e, &message, &history);
        prop_assert_eq!(first, second);
    }

    /// **Monotonicity**: each rescan over a longer history keeps everything the
    /// previous scan found.
    #[test]
    fn extraction_monotonic(texts in prop::collection::vec(arb_message_text(), 1..8)) {
        let e = engine();
        let mut history: Vec<Message> = Vec::new();
        let mut previous = ArtifactSet::new();
        for text in texts {
            let message = Message::counterparty(text);
            let found = extract(&e, &message, &history);
            prop_assert!(found.counts().dominates(&previous.counts()));
            prop_assert!(previous.phone_numbers.is_subset(&found.phone_numbers));
            prop_assert!(previous.bank_accounts.is_subset(&found.bank_accounts));
            prop_assert!(previous.payment_ids.is_subset(&found.payment_ids));
            prop_assert!(previous.links.is_subset(&found.links));
            prop_assert!(previous.suspicious_terms.is_subset(&found.suspicious_terms));
            history.push(message);
            previous = found;
        }
    }

    /// Extracted phones are always canonical.
    #[test]
    fn extracted_phones_canonical(text in arb_message_text()) {
        let set = extract(&engine(), &Message::counterparty(text), &[]);
        for phone in &set.phone_numbers {
            prop_assert!(phone.starts_with("+91"));
            prop_assert_eq!(phone.len(), 13);
        }
    }

    /// Reply cleanup never panics and never grows its input.
    #[test]
    fn clean_reply_never_grows(s in "\\PC{0,200}") {
        let once = clean_reply(&s);
        prop_assert!(once.len() <= s.len());
        prop_assert!(clean_reply(&once).len() <= once.len());
    }
}
