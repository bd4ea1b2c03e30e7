//! Weekly narrative report entities
//!
//! Covers the report record itself, its index entry, the optional per-branch
//! narrative arc, and the two text formats a report goes through: the raw reply
//! of the text generator and the on-disk report file.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::core::calendar::format_date;

/// Weekly report as produced by the generator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyReport {
    pub id: String,
    pub branch_id: String,
    pub branch_name: String,
    pub sender_email: String,
    pub subject: String,
    pub text: String,
    pub date: NaiveDate,
    pub timestamp: DateTime<Utc>,
}

/// One line of the report index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportIndexEntry {
    pub id: String,
    pub branch_id: String,
    pub date: NaiveDate,
    pub file_path: String,
}

/// Target length of a generated report body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LengthBucket {
    Short,
    #[default]
    Medium,
    Long,
}

impl LengthBucket {
    pub fn word_range(&self) -> &'static str {
        match self {
            LengthBucket::Short => "60-80 words",
            LengthBucket::Medium => "80-160 words",
            LengthBucket::Long => "160-200 words",
        }
    }
}

/// Thematic hint for a branch, occasionally woven into its reports
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarrativeArc {
    #[serde(rename = "narrative_tone", default = "default_tone")]
    pub tone: String,
    #[serde(rename = "narrative_description", default)]
    pub description: String,
    #[serde(rename = "narrative_themes", default)]
    pub themes: Vec<String>,
    #[serde(default)]
    pub message_length: LengthBucket,
}

fn default_tone() -> String {
    "neutral".to_string()
}

/// Subject and body extracted from a text-generator reply
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedText {
    pub subject: String,
    pub body: String,
}

impl GeneratedText {
    /// Parse an email-style reply.
    ///
    /// Header lines run until the first blank line. `Subject:` is captured,
    /// `From:` is skipped, and any other line ends the header and becomes the
    /// first body line. A missing subject is replaced by `fallback_subject`.
    pub fn parse(raw: &str, fallback_subject: &str) -> Self {
        let mut subject = String::new();
        let mut body_lines: Vec<&str> = vec![];
        let mut in_header = true;

        for line in raw.trim().lines() {
            if !in_header {
                body_lines.push(line);
                continue;
            }
            let lower = line.to_lowercase();
            if lower.starts_with("subject:") {
                subject = line
                    .split_once(':')
                    .map(|(_, rest)| rest.trim().to_string())
                    .unwrap_or_default();
            } else if lower.starts_with("from:") {
                continue;
            } else if line.trim().is_empty() {
                in_header = false;
            } else {
                in_header = false;
                body_lines.push(line);
            }
        }

        if subject.is_empty() {
            subject = fallback_subject.to_string();
        }

        Self {
            subject,
            body: body_lines.join("\n").trim().to_string(),
        }
    }
}

/// Report file with its `Subject/From/Date/Branch` header
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReportFile {
    pub subject: String,
    pub sender_email: String,
    pub date: String,
    pub branch_name: String,
    pub text: String,
}

impl ReportFile {
    pub fn from_report(report: &WeeklyReport) -> Self {
        Self {
            subject: report.subject.clone(),
            sender_email: report.sender_email.clone(),
            date: format_date(report.date),
            branch_name: report.branch_name.clone(),
            text: report.text.clone(),
        }
    }

    /// File contents
    pub fn render(&self) -> String {
        format!(
            "Subject: {}\nFrom: {}\nDate: {}\nBranch: {}\n\n{}\n",
            self.subject, self.sender_email, self.date, self.branch_name, self.text
        )
    }

    /// Parse file contents back into fields. Unknown header lines are ignored;
    /// a stray `From:` line at the top of the body is dropped. Without a blank
    /// separator line the whole content is the body.
    pub fn parse(content: &str) -> Self {
        let lines: Vec<&str> = content.split('\n').collect();
        let mut parsed = ReportFile::default();
        let mut body_start = 0;

        for (i, line) in lines.iter().enumerate() {
            if line.trim().is_empty() {
                body_start = i + 1;
                break;
            }
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let value = value.trim().to_string();
            match key {
                "Subject" => parsed.subject = value,
                "From" => parsed.sender_email = value,
                "Date" => parsed.date = value,
                "Branch" => parsed.branch_name = value,
                _ => {}
            }
        }

        let mut body = &lines[body_start.min(lines.len())..];
        if body.first().is_some_and(|l| l.starts_with("From:")) {
            body = &body[1..];
        }
        parsed.text = body.join("\n").trim().to_string();
        parsed
    }
}
