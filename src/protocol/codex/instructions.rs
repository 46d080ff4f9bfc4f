const BASE_INSTRUCTIONS: &str = include_str!("instructions/prompt.md");
const CODEX_INSTRUCTIONS: &str = include_str!("instructions/gpt_5_codex_prompt.md");

const TEMPLATES: [&str; 2] = [BASE_INSTRUCTIONS, CODEX_INSTRUCTIONS];

/// Instruction template the Codex upstream expects for `model`.
#[must_use]
pub fn instructions_for_model(model: &str) -> &'static str {
    if model.contains("codex") {
        CODEX_INSTRUCTIONS
    } else {
        BASE_INSTRUCTIONS
    }
}

/// Whether client-supplied system text already starts with one of the
/// official templates, in which case it can be forwarded as `instructions`
/// verbatim.
#[must_use]
pub fn is_official_instructions(system: &str) -> bool {
    !system.is_empty()
        && TEMPLATES
            .iter()
            .any(|template| system.starts_with(template.trim_end()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_selection() {
        assert_eq!(instructions_for_model("gpt-5-codex"), CODEX_INSTRUCTIONS);
        assert_eq!(instructions_for_model("gpt-5"), BASE_INSTRUCTIONS);
        assert!(CODEX_INSTRUCTIONS.starts_with("You are Codex"));
    }

    #[test]
    fn test_official_instructions_detection() {
        let forwarded = format!("{BASE_INSTRUCTIONS}\nextra project notes");
        assert!(is_official_instructions(&forwarded));
        assert!(!is_official_instructions("You are a pirate."));
        assert!(!is_official_instructions(""));
    }
}
