mod narrative;
mod sanitize;

pub use narrative::{fallback_narrative, is_fallback_narrative, narrative_prompt, split_narrative};
pub use sanitize::{is_renderable, sanitize_for_rendering, PLACEHOLDER};

use serde::Serialize;

use super::scoring::ScoreResult;
use super::submission::UserMeta;

pub const REPORT_TITLE: &str = "TAICC AI Readiness Assessment Report";
pub const REPORT_FOOTER: &str = "Report generated by TAICC AI Readiness Assessment";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TitleBlock {
    pub name: String,
    pub company: String,
    pub email: String,
    pub phone: String,
    pub domain: String,
    pub tier: String,
}

impl TitleBlock {
    /// Labelled lines in the order they are printed.
    pub fn lines(&self) -> [(&'static str, &str); 6] {
        [
            ("Name", self.name.as_str()),
            ("Company", self.company.as_str()),
            ("Email", self.email.as_str()),
            ("Phone", self.phone.as_str()),
            ("Domain", self.domain.as_str()),
            ("Tier", self.tier.as_str()),
        ]
    }
}

/// Render-ready report. Every text field is already restricted to the renderer's encoding.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub title: &'static str,
    pub title_block: TitleBlock,
    pub score: ScoreResult,
    pub maturity_headline: String,
    pub headline: String,
    pub body: String,
    pub footer: &'static str,
}

impl Report {
    /// Headline and body joined back into the narrative as stored in the submission record.
    pub fn narrative(&self) -> String {
        if self.body.is_empty() {
            self.headline.clone()
        } else {
            format!("{}\n{}", self.headline, self.body)
        }
    }
}

/// Combine user metadata, the score and generated prose into a [`Report`].
pub fn assemble(user: &UserMeta, score: &ScoreResult, narrative_text: &str) -> Report {
    let (headline, body) = split_narrative(narrative_text);

    Report {
        title: REPORT_TITLE,
        title_block: TitleBlock {
            name: sanitize_for_rendering(&user.name),
            company: sanitize_for_rendering(&user.company),
            email: sanitize_for_rendering(&user.email),
            phone: sanitize_for_rendering(&user.phone),
            domain: sanitize_for_rendering(&user.domain),
            tier: sanitize_for_rendering(&user.tier),
        },
        score: *score,
        maturity_headline: format!("AI Maturity Level: {}", score.maturity.label()),
        headline: sanitize_for_rendering(&headline),
        body: sanitize_for_rendering(&body),
        footer: REPORT_FOOTER,
    }
}
