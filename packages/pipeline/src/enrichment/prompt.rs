use crate::models::RawMention;

const SYSTEM_CLASSIFICATION: &str = include_str!("../../prompts/system_classification.txt");
const SYSTEM_RISK_ASSESSMENT: &str = include_str!("../../prompts/system_risk_assessment.txt");

/// Build the system prompt for classification.
pub fn build_classification_system_prompt() -> &'static str {
    SYSTEM_CLASSIFICATION
}

/// Build the system prompt for risk assessment.
pub fn build_risk_system_prompt() -> &'static str {
    SYSTEM_RISK_ASSESSMENT
}

/// Build the user prompt shared by both classification and risk assessment.
pub fn build_mention_prompt(mention: &RawMention) -> String {
    let mut prompt = String::new();

    prompt.push_str(&format!("# Post on {}\n", mention.source));
    if let Some(ref author) = mention.author {
        prompt.push_str(&format!("- Author: {author}\n"));
    }
    if let Some(ref url) = mention.url {
        prompt.push_str(&format!("- URL: {url}\n"));
    }
    prompt.push_str(&format!(
        "- Posted at: {}\n\n",
        mention.created_at.to_rfc3339()
    ));

    prompt.push_str(">>>\n");
    prompt.push_str(mention.text.trim());
    prompt.push_str("\n>>>\n");

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_system_prompts_not_empty() {
        assert!(build_classification_system_prompt().contains("keyPhrases"));
        assert!(build_risk_system_prompt().contains("riskScore"));
    }

    #[test]
    fn test_mention_prompt_includes_text_and_metadata() {
        let mention = RawMention::new(
            "reddit_1",
            "  The lid cracked on day two  ",
            "reddit",
            Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap(),
        )
        .with_author("jdoe");

        let prompt = build_mention_prompt(&mention);
        assert!(prompt.contains("# Post on reddit"));
        assert!(prompt.contains("- Author: jdoe"));
        assert!(prompt.contains("\nThe lid cracked on day two\n"));
        assert!(!prompt.contains("URL"));
    }
}
