//! Best-effort case-detail extraction over the user's turns.
//!
//! Pattern matching only; nothing is validated. For each field the last
//! match found in the history wins. Name capture is case-insensitive but
//! preserves the original casing of the captured word.

use intake_types::{CaseDetails, Role, Turn};
use once_cell::sync::Lazy;
use regex::Regex;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").expect("email regex")
});

// 8+ consecutive digits (Singapore-style mobile numbers).
static PHONE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\d{8,}\b").expect("phone regex"));

static NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bmy name is (\w+)").expect("name regex"));

// Phrases that mark a turn as an appointment/call-back request.
static APPOINTMENT_TRIGGER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:appointment|schedule|call(?:\s+me)?\s+back)\b")
        .expect("appointment trigger regex")
});

// "<day><ordinal?> <month-name> <year> <time>", e.g. "5 Jan 2025 3pm" or
// "21st March 2025 10:30 am".
static DATE_TIME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b\d{1,2}(?:st|nd|rd|th)?\s+(?:jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\s+\d{4}\s+(?:\d{1,2}:\d{2}(?:\s*[ap]m)?|\d{1,2}\s*[ap]m)",
    )
    .expect("date/time regex")
});

fn mentions_inquiry(content: &str) -> bool {
    let lower = content.to_lowercase();
    lower.contains("inquiry") || lower.contains("question") || lower.contains("help")
}

/// Extracts case details from the user turns of `history`.
pub fn extract_case_details(history: &[Turn]) -> CaseDetails {
    let mut details = CaseDetails::default();

    for turn in history.iter().filter(|t| t.role == Role::User) {
        let content = turn.content.as_str();

        if mentions_inquiry(content) {
            details.inquiry = Some(content.to_string());
        }

        if let Some(captures) = NAME_RE.captures(content) {
            details.name = Some(captures[1].to_string());
        }

        if let Some(m) = EMAIL_RE.find(content) {
            details.email_address = Some(m.as_str().to_string());
        }

        if let Some(m) = PHONE_RE.find(content) {
            details.mobile_number = Some(m.as_str().to_string());
        }

        if APPOINTMENT_TRIGGER_RE.is_match(content) {
            if let Some(m) = DATE_TIME_RE.find(content) {
                details.appointment_date_time = Some(m.as_str().to_string());
            }
        }
    }

    details
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(content: &str) -> Turn {
        Turn::user(content)
    }

    #[test]
    fn extracts_name_email_and_appointment() {
        let history = vec![user(
            "My name is Alex, email alex@example.com, call me back 5 Jan 2025 3pm",
        )];
        let details = extract_case_details(&history);

        assert_eq!(details.name.as_deref(), Some("Alex"));
        assert_eq!(details.email_address.as_deref(), Some("alex@example.com"));
        assert_eq!(details.appointment_date_time.as_deref(), Some("5 Jan 2025 3pm"));
    }

    #[test]
    fn name_keeps_original_casing() {
        let history = vec![user("MY NAME IS Priya and I have a question")];
        let details = extract_case_details(&history);
        assert_eq!(details.name.as_deref(), Some("Priya"));
    }

    #[test]
    fn last_match_wins() {
        let history = vec![
            user("my name is Alex"),
            user("sorry, my name is Alexandra"),
        ];
        let details = extract_case_details(&history);
        assert_eq!(details.name.as_deref(), Some("Alexandra"));
    }

    #[test]
    fn assistant_turns_are_ignored() {
        let history = vec![Turn::assistant("my name is HAL, email hal@example.com")];
        let details = extract_case_details(&history);
        assert!(details.is_empty());
    }

    #[test]
    fn inquiry_captures_full_turn() {
        let history = vec![user("I have a question about my tenancy agreement")];
        let details = extract_case_details(&history);
        assert_eq!(
            details.inquiry.as_deref(),
            Some("I have a question about my tenancy agreement")
        );
    }

    #[test]
    fn phone_requires_eight_digits() {
        let details = extract_case_details(&[user("call 91234567 not 1234567")]);
        assert_eq!(details.mobile_number.as_deref(), Some("91234567"));
    }

    #[test]
    fn date_time_needs_an_appointment_trigger() {
        // A bare date with no appointment/schedule/call-back phrasing.
        let details = extract_case_details(&[user("I was born 5 Jan 1990 3pm")]);
        assert!(details.appointment_date_time.is_none());

        let details = extract_case_details(&[user("schedule me for 21st March 2025 10:30 am")]);
        assert_eq!(
            details.appointment_date_time.as_deref(),
            Some("21st March 2025 10:30 am")
        );
    }

    #[test]
    fn no_matches_yields_empty_details() {
        let details = extract_case_details(&[user("hello there")]);
        assert!(details.is_empty());
    }
}
