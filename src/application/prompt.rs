//! Prompt construction for weekly reports

use chrono::NaiveDate;
use sha2::{Digest, Sha256};

use crate::core::calendar::{long_date, season_context};
use crate::domain::{Branch, LengthBucket, NarrativeArc, Role, StaffMember, StaffStatus};

/// Writing personalities a manager can have
pub const PERSONALITIES: [&str; 7] = [
    "casual",
    "terse",
    "formal",
    "verbose",
    "upbeat",
    "dry_humor",
    "anxious",
];

/// Stable personality for a manager: SHA-256 of the name, read as a big-endian
/// integer, modulo the number of personalities
pub fn personality(manager_name: &str) -> &'static str {
    let digest = Sha256::digest(manager_name.as_bytes());
    let n = PERSONALITIES.len() as u32;
    let index = digest
        .iter()
        .fold(0u32, |acc, byte| (acc * 256 + *byte as u32) % n);
    PERSONALITIES[index as usize]
}

/// Everything the text generator is told about one report
#[derive(Debug, Clone)]
pub struct ReportContext<'a> {
    pub branch: &'a Branch,
    pub manager: &'a StaffMember,
    pub roster: &'a [StaffMember],
    pub date: NaiveDate,
    pub previous_reports: &'a [String],
    pub narrative: Option<&'a NarrativeArc>,
    pub include_narrative: bool,
}

impl<'a> ReportContext<'a> {
    /// First names of active staff other than the manager
    pub fn active_first_names(&self) -> Vec<&'a str> {
        self.roster
            .iter()
            .filter(|m| m.role != Role::Manager && m.status == StaffStatus::Active)
            .map(|m| m.first_name())
            .collect()
    }

    /// First names of former staff
    pub fn former_first_names(&self) -> Vec<&'a str> {
        self.roster
            .iter()
            .filter(|m| m.status == StaffStatus::Inactive)
            .map(|m| m.first_name())
            .collect()
    }

    pub fn tone(&self) -> &str {
        self.narrative.map(|n| n.tone.as_str()).unwrap_or("neutral")
    }

    pub fn length(&self) -> LengthBucket {
        self.narrative.map(|n| n.message_length).unwrap_or_default()
    }

    /// Narrative arc to weave in, if this report carries one
    pub fn injected_narrative(&self) -> Option<&'a NarrativeArc> {
        self.narrative.filter(|_| self.include_narrative)
    }
}

fn join_or(names: &[&str], empty: &str) -> String {
    if names.is_empty() {
        empty.to_string()
    } else {
        names.join(", ")
    }
}

/// Render the prompt
pub fn build_prompt(ctx: &ReportContext<'_>) -> String {
    let branch = ctx.branch;
    let manager = ctx.manager;
    let personality = personality(&manager.name);
    let words = ctx.length().word_range();

    let previous = if ctx.previous_reports.is_empty() {
        "This is the first report from this branch.".to_string()
    } else {
        ctx.previous_reports
            .iter()
            .enumerate()
            .map(|(i, r)| format!("<report index=\"{}\">{}</report>", i + 1, r))
            .collect::<Vec<_>>()
            .join("\n")
    };

    let narrative = match ctx.injected_narrative() {
        Some(arc) => format!(
            "<narrative>\n<description>{}</description>\n<themes>{}</themes>\n</narrative>",
            arc.description,
            arc.themes.join(", ")
        ),
        None => "<narrative></narrative>".to_string(),
    };

    format!(
        r#"Write a weekly report email from a coffee shop branch manager.

<context>
<branch>
<name>{name}</name>
<location>{city}, {state} ({region} region)</location>
<size>{size}</size>
</branch>

<manager>
<name>{manager_name}</name>
<personality>{personality}</personality>
</manager>

<staff>
<active>{active}</active>
<former>{former}</former>
</staff>

<date>
<report_date>{report_date}</report_date>
<season>{season}</season>
</date>

<previous_reports>
{previous}
</previous_reports>
{narrative}

<style>
<tone>{tone}</tone>
<message_length>{words}</message_length>
</style>
</context>

<topics>
Pick 1-2 normal coffee shop topics (NOT more):
- Sales performance
- Equipment issues
- Staffing
- Inventory/supplies
- Customer incidents
- Weather impact
- Seasonal menu items
</topics>

<personality_guide>
- casual: relaxed, contractions, friendly
- terse: very brief, bullet-points, minimal
- formal: professional, structured
- verbose: detailed, explains everything
- upbeat: positive, enthusiastic
- dry_humor: deadpan, subtle sarcasm
- anxious: worries, asks for confirmation
</personality_guide>

<instructions>
- Informal email-style report, NOT a formal document
- Everyday American English, written quickly at the end of a busy day
- Few metaphors; keep vocabulary simple and natural
- Narrative should evolve realistically
- Personality: {personality}
- HARD WORD LIMIT: the email body MUST be {words}
- Cover only 1-2 topics
- Mention a staff name only if relevant
- Typos and imperfect grammar are fine
- Do NOT reference week numbers
- End with just the manager's first name
- If a narrative is provided, weave it in briefly
</instructions>

<output>
Return the email in this exact format:
Subject: [short subject line]
From: {email}

[email body text]
</output>"#,
        name = branch.name,
        city = branch.address.city,
        state = branch.address.state,
        region = branch.region,
        size = branch.size,
        manager_name = manager.name,
        personality = personality,
        active = join_or(&ctx.active_first_names(), "just the manager"),
        former = join_or(&ctx.former_first_names(), "none"),
        report_date = long_date(ctx.date),
        season = season_context(ctx.date),
        previous = previous,
        narrative = narrative,
        tone = ctx.tone(),
        words = words,
        email = manager.email,
    )
}
