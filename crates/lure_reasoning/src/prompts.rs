//! Request text for every external-service call.

use lure_core::{ArtifactCounts, ConversationGoal, Message, Sender};
use std::fmt::Write;

fn speaker(sender: Sender) -> &'static str {
    match sender {
        Sender::Counterparty => "Scammer",
        Sender::Subject => "You",
    }
}

// ============================================================================
// Extraction
// ============================================================================

pub const EXTRACTION_SYSTEM_PROMPT: &str = "You extract intelligence from scam conversations. \
Reply with a single JSON object and nothing else.";

pub fn extraction_prompt(history: &[Message], current: &Message) -> String {
    let mut conversation = String::new();
    for (i, msg) in history.iter().enumerate() {
        let _ = writeln!(conversation, "Message {} ({}): {}", i + 1, msg.sender.as_str(), msg.text);
    }
    let _ = writeln!(conversation, "Current message ({}): {}", current.sender.as_str(), current.text);

    format!(
        r#"Extract every piece of intelligence from the WHOLE conversation below, not only the latest message.

Look for:
1. Bank account numbers in any grouping (1234-5678-9012-3456, 1234 5678 9012 3456, 1234567890123456).
2. Phone numbers in any format. Normalize Indian numbers to +91XXXXXXXXXX and keep the country code on foreign ones.
3. UPI / payment IDs such as name@paytm, name@ybl, name@okicici.
4. Links: http(s) URLs, www. hosts, shortened links (bit.ly, tinyurl, ...).
5. Suspicious keywords: urgency (urgent, immediately), threats (blocked, suspended), sensitive data (OTP, PIN, CVV), actions (verify, click, share), time pressure (minutes, today, deadline).

Remove duplicates. Use empty arrays when nothing is found.

Conversation:
{conversation}
Return ONLY JSON of this exact shape:
{{
  "bankAccounts": [],
  "phoneNumbers": [],
  "upiIds": [],
  "phishingLinks": [],
  "suspiciousKeywords": []
}}"#
    )
}

// ============================================================================
// Strategy (end detection)
// ============================================================================

pub const STRATEGY_SYSTEM_PROMPT: &str =
    "You classify whether a scammer is ending a conversation. Answer with YES or NO only.";

pub fn end_detection_prompt(
    message_text: &str,
    message_count: usize,
    payment_id_count: usize,
    link_count: usize,
) -> String {
    format!(
        r#"Decide whether the scammer is clearly trying to END the conversation.

Rules:
- Answer NO if they ask for anything (verification, UPI, links, actions).
- Answer NO if they threaten or demand.
- Answer YES only if they say goodbye, thank you, or that the matter is finished.

Examples:
- "Thanks, goodbye" -> YES
- "Okay, that's all" -> YES
- "Send your UPI now" -> NO
- "Click this link to verify" -> NO

Current message:
"{message_text}"

Conversation length: {message_count}
Payment IDs seen: {payment_id_count}
Links seen: {link_count}

Answer ONLY with "YES" or "NO"."#
    )
}

// ============================================================================
// Persona
// ============================================================================

pub const PERSONA_SYSTEM_PROMPT: &str = r#"You are an ordinary person who just got a message about a problem with a bank account.

Persona:
- Polite, a little worried, cooperative.
- Not technical. Simple everyday English.
- Short replies, usually one or two sentences.

Never:
- say or hint that you are an AI, a bot or any kind of system;
- talk about analysis, rules or confidence;
- share or confirm OTPs, PINs, UPI IDs or account numbers;
- tell anyone to pay or transfer money.

Sound unsure rather than aggressive, prefer questions, and vary your sentences.
Return ONLY the reply text."#;

pub fn goal_instruction(goal: ConversationGoal) -> &'static str {
    match goal {
        ConversationGoal::Clarify => {
            "Current goal: ask for clarification. Ask one simple question, show mild confusion, agree to nothing."
        }
        ConversationGoal::Delay => {
            "Current goal: delay politely. Say you need time or need to check something. Stay calm."
        }
        ConversationGoal::Escalate => {
            "Current goal: show more concern. Sound worried and ask what has to be done, without committing."
        }
        ConversationGoal::Continue => {
            "Current goal: keep the conversation going. Reply briefly and ask a relevant follow-up."
        }
        ConversationGoal::WrapUp => {
            "Current goal: end the conversation politely but firmly, e.g. \"I'll check with my bank directly. Thank you.\""
        }
    }
}

pub fn persona_system_prompt(goal: ConversationGoal) -> String {
    format!("{}\n\n{}", PERSONA_SYSTEM_PROMPT, goal_instruction(goal))
}

pub fn persona_prompt(history: &[Message], current_text: &str) -> String {
    let mut context = String::from(
        "Example replies (tone and length):\n\
         - \"I'm not sure why this is happening. Can you explain?\"\n\
         - \"This sounds worrying. What exactly do I need to do?\"\n\
         - \"I need some time to check this. Please wait.\"\n\n",
    );
    if !history.is_empty() {
        context.push_str("Previous conversation:\n");
        for msg in history {
            let _ = writeln!(context, "{}: {}", speaker(msg.sender), msg.text);
        }
        context.push('\n');
    }
    let _ = write!(
        context,
        "Current message from scammer: {}\n\nYour reply (natural, varied, never repeating an earlier reply):",
        current_text
    );
    context
}

// ============================================================================
// Agent notes
// ============================================================================

pub const NOTES_SYSTEM_PROMPT: &str =
    "You write short analyst notes about scam conversations. Explain tactics, not inventories.";

pub fn notes_prompt(
    recent: &[Message],
    counts: &ArtifactCounts,
    detection_reason: &str,
    confidence: f32,
) -> String {
    let mut summary = String::new();
    for (i, msg) in recent.iter().enumerate() {
        let _ = writeln!(summary, "{}. {}: {}", i + 1, msg.sender.as_str(), msg.text);
    }

    format!(
        r#"Write a SHORT summary (2-3 sentences) of why this conversation is a scam.

Cover the tactics used (urgency, threats, time pressure), what the scammer tried to obtain (OTP, PIN, account numbers, ...), and the key intelligence gathered. Do not just list artifacts.

Conversation:
{summary}
Detection:
- Reason: {detection_reason}
- Confidence: {confidence:.2}

Gathered so far:
- Bank accounts: {}
- Phone numbers: {}
- Payment IDs: {}
- Links: {}
- Suspicious keywords: {}

Summary:"#,
        counts.bank_accounts,
        counts.phone_numbers,
        counts.payment_ids,
        counts.links,
        counts.suspicious_terms,
    )
}

// ============================================================================
// Detection adjudication
// ============================================================================

pub const DETECTION_SYSTEM_PROMPT: &str =
    "You are a security analyst. Reply with a single JSON object and nothing else.";

pub fn adjudication_prompt(
    message_text: &str,
    recent: &[Message],
    rule_score: f32,
    evidence: &[String],
) -> String {
    let mut history = String::new();
    if !recent.is_empty() {
        history.push_str("\nRecent conversation:\n");
        for msg in recent {
            let _ = writeln!(history, "- {}: {}", msg.sender.as_str(), msg.text);
        }
    }
    let indicators = if evidence.is_empty() {
        "- none".to_string()
    } else {
        evidence.iter().map(|e| format!("- {}", e)).collect::<Vec<_>>().join("\n")
    };

    format!(
        r#"Rule-based screening gave this message an AMBIGUOUS score of {rule_score:.2}.

Indicators found:
{indicators}

Message:
"{message_text}"
{history}
Decide whether it is a SCAM. Urgency, threats, requests for sensitive data, payment requests and phishing links point to a scam; informational or unclear messages do not. Only use confidence >= 0.7 when clearly sure.

Return ONLY JSON:
{{"is_scam": true, "confidence": 0.0, "reason": "short explanation"}}"#
    )
}
