//! Notification fanout for mentor-swap events.
//!
//! Transports (email send, chat-platform send) are external collaborators;
//! this module owns the contracts, the templated content, phone-number
//! normalization, and the per-recipient/per-channel failure isolation.

pub mod client;

pub use client::{ChatClient, EmailClient};

use crate::db::Mentor;
use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;
use std::time::Duration;
use tracing::{info, warn};

/// Country prefix applied to bare 10-digit numbers.
const HOME_COUNTRY_PREFIX: &str = "91";

/// Pause between super-mentor recipients, respecting provider rate limits.
/// Fanout wall-clock time is linear in the number of super-mentors.
pub const FANOUT_PACING: Duration = Duration::from_millis(500);

/// Email transport contract: one external call, boolean success.
#[allow(async_fn_in_trait)]
pub trait EmailSender {
    async fn send_email(&self, to: &str, subject: &str, html_body: &str) -> bool;
}

/// Chat transport contract: templated message, boolean success.
#[allow(async_fn_in_trait)]
pub trait ChatSender {
    async fn send_template(&self, phone: &str, template_id: &str, params: &[String]) -> bool;
}

/// Everything the swap notifications need to render.
#[derive(Debug, Clone)]
pub struct SwapContext {
    pub cohort_label: String,
    pub subject_name: String,
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub join_link: Option<String>,
    pub original_mentor: Mentor,
    pub new_mentor: Mentor,
    /// Human name of whoever performed the swap
    pub actor: String,
}

/// Per-channel outcome counters for one fanout. Operational only; never
/// surfaced to the end user beyond an aggregate log line.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FanoutStats {
    pub emails_sent: u32,
    pub emails_failed: u32,
    pub chats_sent: u32,
    pub chats_failed: u32,
    pub phones_skipped: u32,
}

/// Template ids for the two notification purposes.
#[derive(Debug, Clone)]
pub struct FanoutTemplates {
    pub alert_template: String,
    pub assign_template: String,
}

/// Normalizes a phone number to the chat provider's international format.
///
/// Ten bare digits get the home-country prefix; 11-13 digits are assumed
/// to already carry a prefix and are kept; anything else is unsendable.
pub fn normalize_phone(raw: &str) -> Option<String> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    match digits.len() {
        10 => Some(format!("{HOME_COUNTRY_PREFIX}{digits}")),
        11..=13 => Some(digits),
        _ => None,
    }
}

/// Sends the swap alert to every super-mentor, then the assignment notice
/// to the newly assigned mentor. Every send is independently caught; the
/// stats are the only record of failures.
pub async fn notify_mentor_swap<E: EmailSender, C: ChatSender>(
    email: &E,
    chat: &C,
    super_mentors: &[Mentor],
    ctx: &SwapContext,
    templates: &FanoutTemplates,
    pacing: Duration,
) -> FanoutStats {
    let mut stats = FanoutStats::default();

    let alert_subject = format!("Mentor swap: {} - {}", ctx.cohort_label, ctx.subject_name);
    let alert_body = swap_alert_email_body(ctx);
    let alert_params = chat_params(ctx);

    for (i, mentor) in super_mentors.iter().enumerate() {
        if i > 0 {
            tokio::time::sleep(pacing).await;
        }
        send_both(
            email,
            chat,
            mentor,
            &alert_subject,
            &alert_body,
            &templates.alert_template,
            &alert_params,
            &mut stats,
        )
        .await;
    }

    // Exactly one recipient on the assignment side; no pacing needed.
    let assign_subject = format!(
        "You have been assigned: {} - {}",
        ctx.cohort_label, ctx.subject_name
    );
    let assign_body = swap_assignment_email_body(ctx);
    send_both(
        email,
        chat,
        &ctx.new_mentor,
        &assign_subject,
        &assign_body,
        &templates.assign_template,
        &alert_params,
        &mut stats,
    )
    .await;

    info!(
        cohort = %ctx.cohort_label,
        emails_sent = stats.emails_sent,
        emails_failed = stats.emails_failed,
        chats_sent = stats.chats_sent,
        chats_failed = stats.chats_failed,
        phones_skipped = stats.phones_skipped,
        "Mentor-swap notification fanout finished"
    );
    stats
}

#[allow(clippy::too_many_arguments)]
async fn send_both<E: EmailSender, C: ChatSender>(
    email: &E,
    chat: &C,
    recipient: &Mentor,
    subject: &str,
    body: &str,
    template_id: &str,
    params: &[String],
    stats: &mut FanoutStats,
) {
    if email.send_email(&recipient.email, subject, body).await {
        stats.emails_sent += 1;
    } else {
        stats.emails_failed += 1;
        warn!(recipient = %recipient.email, "Swap email failed");
    }

    match recipient.phone.as_deref().and_then(normalize_phone) {
        Some(phone) => {
            if chat.send_template(&phone, template_id, params).await {
                stats.chats_sent += 1;
            } else {
                stats.chats_failed += 1;
                warn!(recipient = %recipient.name, "Swap chat message failed");
            }
        }
        None => {
            stats.phones_skipped += 1;
        }
    }
}

fn chat_params(ctx: &SwapContext) -> Vec<String> {
    vec![
        ctx.cohort_label.clone(),
        ctx.subject_name.clone(),
        format_date(ctx.date),
        ctx.original_mentor.name.clone(),
        ctx.new_mentor.name.clone(),
    ]
}

fn swap_alert_email_body(ctx: &SwapContext) -> String {
    format!(
        "<html><body>\
         <h3>Mentor swap for {cohort}</h3>\
         <p><b>Session:</b> {subject}</p>\
         <p><b>Date:</b> {date} at {time}</p>\
         <p><b>Original mentor:</b> {original}</p>\
         <p><b>New mentor:</b> {new}</p>\
         <p>Swapped by {actor}.</p>\
         </body></html>",
        cohort = ctx.cohort_label,
        subject = ctx.subject_name,
        date = format_date(ctx.date),
        time = format_time(ctx.time),
        original = ctx.original_mentor.name,
        new = ctx.new_mentor.name,
        actor = ctx.actor,
    )
}

fn swap_assignment_email_body(ctx: &SwapContext) -> String {
    let join = ctx
        .join_link
        .as_deref()
        .filter(|l| !l.trim().is_empty())
        .map(|l| format!("<p><a href=\"{l}\">Join the session</a></p>"))
        .unwrap_or_default();
    format!(
        "<html><body>\
         <h3>You are taking over a session for {cohort}</h3>\
         <p><b>Session:</b> {subject}</p>\
         <p><b>Date:</b> {date} at {time}</p>\
         <p>You are replacing {original}.</p>\
         {join}\
         </body></html>",
        cohort = ctx.cohort_label,
        subject = ctx.subject_name,
        date = format_date(ctx.date),
        time = format_time(ctx.time),
        original = ctx.original_mentor.name,
    )
}

fn format_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "TBD".to_string())
}

fn format_time(time: Option<NaiveTime>) -> String {
    time.map(|t| t.format("%H:%M").to_string())
        .unwrap_or_else(|| "TBD".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_normalize_phone_bare_ten_digits() {
        assert_eq!(
            normalize_phone("9876543210"),
            Some("919876543210".to_string())
        );
        assert_eq!(
            normalize_phone("98765-43210"),
            Some("919876543210".to_string())
        );
    }

    #[test]
    fn test_normalize_phone_preserves_existing_prefix() {
        assert_eq!(
            normalize_phone("+91 98765 43210"),
            Some("919876543210".to_string())
        );
        assert_eq!(
            normalize_phone("4479460123456"),
            Some("4479460123456".to_string())
        );
    }

    #[test]
    fn test_normalize_phone_rejects_out_of_range() {
        assert_eq!(normalize_phone("12345"), None);
        assert_eq!(normalize_phone("98765432109876"), None);
        assert_eq!(normalize_phone(""), None);
    }

    struct FlakyEmail;
    struct FlakyChat {
        sent: AtomicU32,
    }

    impl EmailSender for FlakyEmail {
        async fn send_email(&self, to: &str, _subject: &str, _body: &str) -> bool {
            // One recipient's email bounces; must not affect the others
            to != "bounce@example.com"
        }
    }

    impl ChatSender for FlakyChat {
        async fn send_template(&self, _phone: &str, _template: &str, _params: &[String]) -> bool {
            self.sent.fetch_add(1, Ordering::Relaxed);
            true
        }
    }

    fn mentor(id: i64, email: &str, phone: Option<&str>) -> Mentor {
        Mentor {
            id,
            name: format!("Mentor {id}"),
            email: email.to_string(),
            phone: phone.map(str::to_string),
            is_super: true,
        }
    }

    fn context() -> SwapContext {
        SwapContext {
            cohort_label: "Cohort Basic 1.1".to_string(),
            subject_name: "Web Development".to_string(),
            date: NaiveDate::from_ymd_opt(2026, 1, 5),
            time: NaiveTime::from_hms_opt(19, 0, 0),
            join_link: Some("https://teams.example/j/1".to_string()),
            original_mentor: mentor(5, "saswata@example.com", Some("9876543210")),
            new_mentor: mentor(6, "new@example.com", Some("9123456780")),
            actor: "Admin".to_string(),
        }
    }

    #[tokio::test]
    async fn test_fanout_isolates_channel_failures() {
        let supers = vec![
            mentor(1, "bounce@example.com", Some("9876543210")),
            mentor(2, "ok@example.com", None),
        ];
        let chat = FlakyChat {
            sent: AtomicU32::new(0),
        };
        let templates = FanoutTemplates {
            alert_template: "alert".to_string(),
            assign_template: "assign".to_string(),
        };

        let stats = notify_mentor_swap(
            &FlakyEmail,
            &chat,
            &supers,
            &context(),
            &templates,
            Duration::ZERO,
        )
        .await;

        // 3 recipients total (2 supers + new mentor); one email bounced,
        // one phone was missing.
        assert_eq!(stats.emails_sent, 2);
        assert_eq!(stats.emails_failed, 1);
        assert_eq!(stats.chats_sent, 2);
        assert_eq!(stats.phones_skipped, 1);
    }
}
