//! Extracted artifact set: five deduplicated collections of normalized intelligence.

use crate::patterns::{strip_separators, PhonePolicy};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactSet {
    #[serde(rename = "bankAccounts", default)]
    pub bank_accounts: BTreeSet<String>,
    /// Canonical `+<cc><national>` form.
    #[serde(rename = "phoneNumbers", default)]
    pub phone_numbers: BTreeSet<String>,
    #[serde(rename = "upiIds", default)]
    pub payment_ids: BTreeSet<String>,
    #[serde(rename = "phishingLinks", default)]
    pub links: BTreeSet<String>,
    #[serde(rename = "suspiciousKeywords", default)]
    pub suspicious_terms: BTreeSet<String>,
}

/// Per-class sizes of an [`ArtifactSet`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ArtifactCounts {
    pub bank_accounts: usize,
    pub phone_numbers: usize,
    pub payment_ids: usize,
    pub links: usize,
    pub suspicious_terms: usize,
}

impl ArtifactCounts {
    /// True if no class is smaller than in `earlier`.
    pub fn dominates(&self, earlier: &ArtifactCounts) -> bool {
        self.bank_accounts >= earlier.bank_accounts
            && self.phone_numbers >= earlier.phone_numbers
            && self.payment_ids >= earlier.payment_ids
            && self.links >= earlier.links
            && self.suspicious_terms >= earlier.suspicious_terms
    }
}

impl ArtifactSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total number of artifacts across all classes.
    pub fn len(&self) -> usize {
        self.bank_accounts.len()
            + self.phone_numbers.len()
            + self.payment_ids.len()
            + self.links.len()
            + self.suspicious_terms.len()
    }

    pub fn counts(&self) -> ArtifactCounts {
        ArtifactCounts {
            bank_accounts: self.bank_accounts.len(),
            phone_numbers: self.phone_numbers.len(),
            payment_ids: self.payment_ids.len(),
            links: self.links.len(),
            suspicious_terms: self.suspicious_terms.len(),
        }
    }

    /// Set union with `other`. Returns how many new artifacts were added.
    ///
    /// Artifacts are never removed: once observed, intelligence stays valid.
    pub fn merge(&mut self, other: &ArtifactSet) -> usize {
        let before = self.len();
        self.bank_accounts.extend(other.bank_accounts.iter().cloned());
        self.phone_numbers.extend(other.phone_numbers.iter().cloned());
        self.payment_ids.extend(other.payment_ids.iter().cloned());
        self.links.extend(other.links.iter().cloned());
        self.suspicious_terms.extend(other.suspicious_terms.iter().cloned());
        self.len() - before
    }

    /// Insert a bank account; separators are stripped, nothing else is validated.
    pub fn add_bank_account(&mut self, raw: &str) -> bool {
        let cleaned = strip_separators(raw);
        !cleaned.is_empty() && self.bank_accounts.insert(cleaned)
    }

    /// Insert a phone number if `policy` recognises its shape.
    pub fn add_phone(&mut self, raw: &str, policy: &PhonePolicy) -> bool {
        match policy.normalize(raw) {
            Some(phone) => self.phone_numbers.insert(phone),
            None => false,
        }
    }

    pub fn add_payment_id(&mut self, raw: &str) -> bool {
        let id = raw.trim().to_lowercase();
        !id.is_empty() && self.payment_ids.insert(id)
    }

    pub fn add_link(&mut self, raw: &str) -> bool {
        let link = raw.trim();
        !link.is_empty() && self.links.insert(link.to_string())
    }

    pub fn add_term(&mut self, raw: &str) -> bool {
        let term = raw.trim().to_lowercase();
        !term.is_empty() && self.suspicious_terms.insert(term)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bank_account_dedup_across_separators() {
        let mut set = ArtifactSet::new();
        assert!(set.add_bank_account("1234-5678-9012"));
        assert!(!set.add_bank_account("123456789012"));
        assert_eq!(set.bank_accounts.len(), 1);
        assert!(set.bank_accounts.contains("123456789012"));
    }

    #[test]
    fn test_add_phone_drops_unknown_shapes() {
        let policy = PhonePolicy::default();
        let mut set = ArtifactSet::new();
        assert!(set.add_phone("98765 43210", &policy));
        assert!(!set.add_phone("+91-98765-43210", &policy)); // same number
        assert!(!set.add_phone("98765", &policy));
        assert_eq!(set.phone_numbers.len(), 1);
    }

    #[test]
    fn test_merge_is_monotonic() {
        let mut a = ArtifactSet::new();
        a.add_link("http://a.example");
        a.add_term("urgent");
        let before = a.counts();

        let mut b = ArtifactSet::new();
        b.add_link("http://a.example");
        b.add_payment_id("x@ybl");

        assert_eq!(a.merge(&b), 1);
        assert!(a.counts().dominates(&before));
        assert_eq!(a.len(), 3);
    }

    #[test]
    fn test_serde_field_names() {
        let mut set = ArtifactSet::new();
        set.add_payment_id("Scammer@Paytm");
        let json = serde_json::to_value(&set).unwrap();
        assert_eq!(json["upiIds"][0], "scammer@paytm");
        assert!(json["bankAccounts"].as_array().unwrap().is_empty());

        let back: ArtifactSet = serde_json::from_value(json).unwrap();
        assert_eq!(back, set);
    }
}
