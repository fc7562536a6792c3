use std::fmt;
use serde::{Deserialize, Serialize};

/// Header data a backend returns for one unread message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MailHeader {
    pub id: String,
    pub subject: String,
    pub sender: String,
}

/// One entry of the most recent unread listing, numbered for voice reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailSummary {
    pub id: String,
    pub subject: String,
    pub from: String,
    pub ordinal: usize,
}

/// Full content of the email most recently read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailDetail {
    pub id: String,
    pub subject: String,
    pub sender: String,
    pub body: String,
}

impl EmailSummary {
    /// Case-insensitive substring match against subject or sender.
    pub fn matches(&self, needle_lower: &str) -> bool {
        self.subject.to_lowercase().contains(needle_lower)
            || self.from.to_lowercase().contains(needle_lower)
    }
}

impl fmt::Display for EmailSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}. Subject: {}, From: {}", self.ordinal, self.subject, self.from)
    }
}

impl fmt::Display for EmailDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let body = self.body.trim_end();
        write!(f, "Reading email from {}. Subject: {}. Body: {}", self.sender, self.subject, body)?;
        // A body that already ends a sentence keeps its own punctuation.
        if !body.ends_with(['.', '!', '?']) {
            f.write_str(".")?;
        }
        Ok(())
    }
}

/// Numbers headers 1..=n in listing order.
pub fn number_headers(headers: Vec<MailHeader>) -> Vec<EmailSummary> {
    headers
        .into_iter()
        .enumerate()
        .map(|(i, h)| EmailSummary {
            id: h.id,
            subject: h.subject,
            from: h.sender,
            ordinal: i + 1,
        })
        .collect()
}

pub fn format_listing(emails: &[EmailSummary]) -> String {
    emails.iter()
        .map(|email| email.to_string())
        .collect::<Vec<_>>()
        .join(". ")
}
