/// Characters of page text sent per request.
pub const MAX_PROMPT_CHARS: usize = 3000;

const CODES_PLACEHOLDER: &str = "{codes}";

/// System and user messages for one classification call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

/// Fill the template with the taxonomy and wrap the (truncated) page text.
pub fn build(taxonomy: &[String], template: &str, text: &str) -> Prompt {
    Prompt {
        system: render_system(taxonomy, template),
        user: render_user(text),
    }
}

/// Template with every `{codes}` replaced by one code per line, in order.
pub fn render_system(taxonomy: &[String], template: &str) -> String {
    template.replace(CODES_PLACEHOLDER, &taxonomy.join("\n"))
}

pub fn render_user(text: &str) -> String {
    format!(
        "Text:\n{}\n\nTop 3 classifications:",
        truncate_chars(text, MAX_PROMPT_CHARS)
    )
}

/// Longest prefix of `s` holding at most `max` characters.
fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
