//! Query classification
//!
//! Pure keyword rules that derive session metadata from the raw user
//! query, plus the routing predicates for the conditional pipeline
//! steps. Classification happens once at session creation and is never
//! recomputed.

use crate::types::messages::ActionDecision;
use crate::types::session::{Priority, SessionMetadata, SessionType};

/// Risk score above which the fraud-screening step always runs
pub const RISK_THRESHOLD: f64 = 0.7;

const PAYMENT_KEYWORDS: &[&str] = &["payment", "transfer", "send"];
const FRAUD_KEYWORDS: &[&str] = &["fraud", "scam", "suspicious"];
const HIGH_PRIORITY_KEYWORDS: &[&str] = &["urgent", "emergency", "fraud"];
const MEDIUM_PRIORITY_KEYWORDS: &[&str] = &["payment", "transaction", "send"];

fn contains_any(query: &str, keywords: &[&str]) -> bool {
    let lowered = query.to_lowercase();
    keywords.iter().any(|k| lowered.contains(k))
}

/// Classify the interaction category. Payment keywords win over fraud
/// keywords; rules are checked in that order.
pub fn session_type(query: &str) -> SessionType {
    if contains_any(query, PAYMENT_KEYWORDS) {
        SessionType::PaymentProcessing
    } else if contains_any(query, FRAUD_KEYWORDS) {
        SessionType::FraudDetection
    } else {
        SessionType::VoiceSupport
    }
}

/// Classify the handling priority. High-priority keywords are checked
/// before the payment/transaction rule.
pub fn priority(query: &str) -> Priority {
    if contains_any(query, HIGH_PRIORITY_KEYWORDS) {
        Priority::High
    } else if contains_any(query, MEDIUM_PRIORITY_KEYWORDS) {
        Priority::Medium
    } else {
        Priority::Low
    }
}

/// Derive the full session metadata for a query
pub fn classify(query: &str) -> SessionMetadata {
    SessionMetadata {
        user_query: query.to_string(),
        session_type: session_type(query),
        priority: priority(query),
    }
}

/// Whether the fraud-screening step runs: triggered by fraud keywords in
/// the query, or by a brain risk score above [`RISK_THRESHOLD`].
pub fn requires_fraud_detection(query: &str, risk_score: f64) -> bool {
    contains_any(query, FRAUD_KEYWORDS) || risk_score > RISK_THRESHOLD
}

/// Whether the executor step runs: the brain declared a blockchain
/// action is needed and did not explicitly reject it.
pub fn requires_blockchain_action(decision: Option<ActionDecision>) -> bool {
    match decision {
        Some(action) => action.required && action.approved != Some(false),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck_macros::quickcheck;

    #[test]
    fn test_nft_support_query() {
        // Scenario: plain support query with no trigger keywords
        let query = "My NFT mint transaction failed";
        assert_eq!(session_type(query), SessionType::VoiceSupport);
        assert_eq!(priority(query), Priority::Medium); // "transaction"
        assert!(!requires_fraud_detection(query, 0.2));
    }

    #[test]
    fn test_urgent_scam_query() {
        let query = "urgent: I think this is a scam";
        assert_eq!(session_type(query), SessionType::FraudDetection);
        assert_eq!(priority(query), Priority::High);
        assert!(requires_fraud_detection(query, 0.0));
    }

    #[test]
    fn test_remittance_query() {
        let query = "Send $1000 to Philippines";
        assert_eq!(session_type(query), SessionType::PaymentProcessing);
        assert_eq!(priority(query), Priority::Medium);
    }

    #[test]
    fn test_payment_rule_wins_over_fraud_rule() {
        let query = "suspicious payment on my account";
        assert_eq!(session_type(query), SessionType::PaymentProcessing);
        assert_eq!(priority(query), Priority::Medium);
    }

    #[test]
    fn test_priority_tiers() {
        assert_eq!(priority("emergency help needed"), Priority::High);
        assert_eq!(priority("payment is stuck"), Priority::Medium);
        assert_eq!(priority("how do wallets work"), Priority::Low);
    }

    #[test]
    fn test_classification_is_case_insensitive() {
        assert_eq!(session_type("REPORT FRAUD NOW"), SessionType::FraudDetection);
        assert_eq!(priority("URGENT"), Priority::High);
    }

    #[test]
    fn test_risk_threshold_is_exclusive() {
        assert!(!requires_fraud_detection("hello", 0.7));
        assert!(requires_fraud_detection("hello", 0.71));
    }

    #[test]
    fn test_blockchain_action_routing() {
        assert!(!requires_blockchain_action(None));
        assert!(requires_blockchain_action(Some(ActionDecision {
            required: true,
            approved: None,
        })));
        assert!(requires_blockchain_action(Some(ActionDecision {
            required: true,
            approved: Some(true),
        })));
        // Explicit rejection vetoes execution
        assert!(!requires_blockchain_action(Some(ActionDecision {
            required: true,
            approved: Some(false),
        })));
        assert!(!requires_blockchain_action(Some(ActionDecision {
            required: false,
            approved: Some(true),
        })));
    }

    #[quickcheck]
    fn prop_classification_is_deterministic(query: String) -> bool {
        classify(&query) == classify(&query)
    }

    #[quickcheck]
    fn prop_payment_keyword_always_classifies_payment(prefix: String, suffix: String) -> bool {
        let query = format!("{} payment {}", prefix, suffix);
        session_type(&query) == SessionType::PaymentProcessing
    }

    #[quickcheck]
    fn prop_urgent_keyword_always_high_priority(prefix: String, suffix: String) -> bool {
        let query = format!("{} urgent {}", prefix, suffix);
        priority(&query) == Priority::High
    }

    #[quickcheck]
    fn prop_high_risk_always_screens(query: String) -> bool {
        requires_fraud_detection(&query, 0.9)
    }
}
