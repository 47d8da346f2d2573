use crate::assessment::scoring::ScoreResult;

const FALLBACK_PREFIX: &str = "report generation failed";

/// Prompt handed to the text generator for a scored submission.
pub fn narrative_prompt(score: &ScoreResult) -> String {
    format!(
        "You are an expert AI consultant preparing a professional AI readiness assessment report for a business.\n\
Overall numeric score: {average:.2}\n\
Maturity level: {maturity}\n\
\n\
Provide:\n\
1) A short executive summary (2-4 sentences).\n\
2) Key weaknesses or challenges typically faced at this maturity level (bullet list).\n\
3) Practical, prioritized recommendations (3-6 items) with short justifications.\n\
4) A concluding call-to-action encouraging partnership with TAICC, including next steps (contact).\n\
Write in professional, business-friendly tone suitable for C-suite readers.\n",
        average = score.average,
        maturity = score.maturity.label(),
    )
}

/// Narrative substituted when the text generator fails.
pub fn fallback_narrative(cause: &str) -> String {
    format!("{FALLBACK_PREFIX}: {cause}")
}

pub fn is_fallback_narrative(text: &str) -> bool {
    text.starts_with(FALLBACK_PREFIX)
}

/// Split generated prose into a headline (first non-blank line) and the remaining body.
///
/// Text without a line break is all headline and has an empty body.
pub fn split_narrative(text: &str) -> (String, String) {
    let trimmed = text.trim();
    match trimmed.split_once('\n') {
        Some((first, rest)) => (first.trim().to_string(), rest.trim().to_string()),
        None => (trimmed.to_string(), String::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assessment::maturity::MaturityLabel;

    #[test]
    fn prompt_carries_score_and_maturity() {
        let prompt = narrative_prompt(&ScoreResult {
            average: 3.4,
            maturity: MaturityLabel::Established,
        });
        assert!(prompt.contains("Overall numeric score: 3.40"));
        assert!(prompt.contains("Maturity level: Established"));
    }

    #[test]
    fn fallback_is_recognised() {
        let text = fallback_narrative("quota exceeded");
        assert_eq!(text, "report generation failed: quota exceeded");
        assert!(is_fallback_narrative(&text));
        assert!(!is_fallback_narrative("Executive summary"));
    }

    #[test]
    fn split_tolerates_any_number_of_line_breaks() {
        assert_eq!(
            split_narrative("Single sentence summary."),
            ("Single sentence summary.".to_string(), String::new())
        );
        assert_eq!(
            split_narrative("\n\nHeadline\nFirst paragraph\n\nSecond paragraph\n"),
            (
                "Headline".to_string(),
                "First paragraph\n\nSecond paragraph".to_string()
            )
        );
        assert_eq!(split_narrative(""), (String::new(), String::new()));
    }
}
