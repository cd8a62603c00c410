//! Evaluation prompt construction.

use mitra_core::EvaluationConfig;

/// Rubric template shipped with the crate.
pub const DEFAULT_TEMPLATE: &str = include_str!("../templates/evaluation_prompt.md");

/// Placeholder-substitution template for the evaluation prompt.
///
/// Placeholders are replaced in a fixed order. Every `{marks}` is replaced;
/// each other placeholder only at its first occurrence.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    text: String,
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::new(DEFAULT_TEMPLATE)
    }
}

impl PromptTemplate {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn build(&self, config: &EvaluationConfig, answer: &str) -> String {
        let section = match config.section.trim() {
            "" => "N/A",
            _ => config.section.as_str(),
        };

        self.text
            .replacen("{exam}", &config.exam, 1)
            .replacen("{phase}", &config.phase, 1)
            .replacen("{paper}", &config.paper, 1)
            .replacen("{section}", section, 1)
            .replacen("{question}", &config.question, 1)
            .replace("{marks}", &config.marks.to_string())
            .replacen("{wordLimit}", &config.word_limit.to_string(), 1)
            .replacen("{answer}", answer, 1)
    }
}

/// Builds the prompt from the default template.
pub fn build_prompt(config: &EvaluationConfig, answer: &str) -> String {
    PromptTemplate::default().build(config, answer)
}
