//! User notifications and confirmation prompts
//!
//! The tracker core never prints or prompts directly. It raises [`Notice`]s and
//! asks for confirmation through a [`NotificationChannel`], which front ends
//! implement however they present things.

use chrono::{DateTime, Utc};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::io::IsTerminal;
use std::time::Duration;
use tracing::{debug, warn};

/// How long a notice stays visible before it is dismissed
pub const NOTICE_TTL: Duration = Duration::from_millis(3000);

/// Notice severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    Success,
    Error,
}

/// A transient, auto-dismissed message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notice {
    pub message: String,
    pub kind: NoticeKind,
    pub raised_at: DateTime<Utc>,
    #[serde(with = "ttl_millis")]
    pub ttl: Duration,
}

impl Notice {
    pub fn new(message: impl Into<String>, kind: NoticeKind) -> Self {
        Self {
            message: message.into(),
            kind,
            raised_at: Utc::now(),
            ttl: NOTICE_TTL,
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(message, NoticeKind::Success)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(message, NoticeKind::Error)
    }

    /// Whether the notice should have been dismissed by `now`
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        let ttl = chrono::Duration::milliseconds(self.ttl.as_millis() as i64);
        now.signed_duration_since(self.raised_at) >= ttl
    }

    pub fn is_error(&self) -> bool {
        self.kind == NoticeKind::Error
    }
}

mod ttl_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(ttl: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(ttl.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}

/// Outbound notices plus a blocking yes/no prompt
///
/// `confirm` resolves before the caller mutates anything; a `false` answer
/// means the caller leaves its state untouched.
pub trait NotificationChannel {
    /// Raise a fire-and-forget notice
    fn notify(&mut self, notice: Notice);

    /// Ask the user to confirm a destructive action
    fn confirm(&mut self, prompt: &str) -> bool;

    fn success(&mut self, message: String) {
        self.notify(Notice::success(message));
    }

    fn error(&mut self, message: String) {
        self.notify(Notice::error(message));
    }
}

/// Terminal front end: colored one-line notices and `inquire` prompts
///
/// Success notices go to stdout, error notices to stderr.
#[derive(Debug, Default)]
pub struct ConsoleNotifier {
    assume_yes: bool,
}

impl ConsoleNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every prompt with yes (for `--yes` and scripted shells)
    pub fn assume_yes(mut self, yes: bool) -> Self {
        self.assume_yes = yes;
        self
    }
}

impl NotificationChannel for ConsoleNotifier {
    fn notify(&mut self, notice: Notice) {
        match notice.kind {
            NoticeKind::Success => println!("{} {}", "✓".green(), notice.message),
            NoticeKind::Error => eprintln!("{} {}", "✗".red(), notice.message),
        }
    }

    fn confirm(&mut self, prompt: &str) -> bool {
        if self.assume_yes {
            debug!(prompt, "Prompt auto-confirmed");
            return true;
        }

        if !std::io::stdin().is_terminal() {
            warn!(prompt, "No terminal to confirm on, treating as cancel");
            return false;
        }

        match inquire::Confirm::new(prompt).with_default(false).prompt() {
            Ok(answer) => answer,
            Err(e) => {
                warn!(error = %e, "Confirmation prompt unavailable, treating as cancel");
                false
            },
        }
    }
}

/// Collects notices in memory and answers prompts with a fixed reply
///
/// Useful for tests and for embedding the tracker behind another UI that
/// drains notices on its own schedule.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    notices: Vec<Notice>,
    prompts: Vec<String>,
    answer: bool,
}

impl RecordingNotifier {
    /// Notifier that confirms every prompt
    pub fn approving() -> Self {
        Self {
            answer: true,
            ..Self::default()
        }
    }

    /// Notifier that cancels every prompt
    pub fn declining() -> Self {
        Self::default()
    }

    pub fn set_answer(&mut self, answer: bool) {
        self.answer = answer;
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn errors(&self) -> impl Iterator<Item = &Notice> {
        self.notices.iter().filter(|n| n.is_error())
    }

    pub fn prompts(&self) -> &[String] {
        &self.prompts
    }

    /// Notices still on screen at `now`
    pub fn active(&self, now: DateTime<Utc>) -> Vec<&Notice> {
        self.notices.iter().filter(|n| !n.is_expired(now)).collect()
    }

    pub fn clear(&mut self) {
        self.notices.clear();
        self.prompts.clear();
    }
}

impl NotificationChannel for RecordingNotifier {
    fn notify(&mut self, notice: Notice) {
        self.notices.push(notice);
    }

    fn confirm(&mut self, prompt: &str) -> bool {
        self.prompts.push(prompt.to_string());
        self.answer
    }
}
