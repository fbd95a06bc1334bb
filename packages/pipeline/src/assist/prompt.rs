use crate::models::MentionContext;

const SYSTEM_ASSIST: &str = include_str!("../../prompts/system_assist.txt");

const NOT_AVAILABLE: &str = "N/A";

/// Build the system prompt for reply suggestions.
pub fn build_system_prompt() -> &'static str {
    SYSTEM_ASSIST
}

/// Build the user prompt for one mention. `text` is the validated mention text.
pub fn build_assist_prompt(text: &str, context: &MentionContext) -> String {
    let platform = context.source.as_deref().filter(|s| !s.trim().is_empty());
    let key_phrases = context
        .key_phrases
        .as_ref()
        .filter(|phrases| !phrases.is_empty())
        .map(|phrases| phrases.join(", "));
    let risk_score = context.risk_score.map(|score| score.value().to_string());

    let mut prompt = String::new();

    prompt.push_str(&format!(
        "A user has posted the following online on {}:\n",
        platform.unwrap_or("an unspecified platform")
    ));
    prompt.push_str(">>>\n");
    prompt.push_str(&format!("\"{text}\"\n"));
    prompt.push_str(">>>\n\n");

    prompt.push_str("Our analysis of this post provides the following context:\n");
    prompt.push_str(&format!("- Sentiment: {}\n", or_na(context.sentiment.as_deref())));
    prompt.push_str(&format!("- Tone: {}\n", or_na(context.tone.as_deref())));
    prompt.push_str(&format!(
        "- Detected intent: {}\n",
        or_na(context.intent.as_deref())
    ));
    prompt.push_str(&format!("- Key phrases: {}\n", or_na(key_phrases.as_deref())));
    prompt.push_str(&format!(
        "- Assessed risk level: {} (overall risk score: {})\n",
        or_na(context.gemini_risk_level.as_deref()),
        or_na(risk_score.as_deref())
    ));
    prompt.push_str(&format!("- Source URL: {}\n", or_na(context.url.as_deref())));
    prompt.push_str(&format!("- Author: {}\n\n", or_na(context.author.as_deref())));

    prompt.push_str(&format!(
        "Based on ALL the information above, draft a concise, empathetic and actionable \
         response suitable for {}, and outline the engagement strategy for this specific mention.",
        platform.unwrap_or("the platform")
    ));

    prompt
}

fn or_na(value: Option<&str>) -> &str {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(NOT_AVAILABLE)
}
