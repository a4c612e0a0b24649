//! System prompt template with persona and context placeholders.
//!
//! The template is plain text. `BOT_USER_NAME` and `BOT_ESCAPE_WORD` are
//! replaced once, when the template is built; `BOT_CONTEXT` is replaced with
//! the retrieved context on every turn.

use std::path::Path;

use docbot_config::BotConfig;
use docbot_core::error::PromptError;

pub const NAME_PLACEHOLDER: &str = "BOT_USER_NAME";
pub const ESCAPE_WORD_PLACEHOLDER: &str = "BOT_ESCAPE_WORD";
pub const CONTEXT_PLACEHOLDER: &str = "BOT_CONTEXT";

/// Who the bot claims to be.
#[derive(Debug, Clone)]
pub struct Persona {
    pub name: String,
    /// Phrase the bot uses when the context does not answer the question.
    pub escape_word: String,
    /// Greeting posted when a thread starts.
    pub first_message: String,
}

impl From<&BotConfig> for Persona {
    fn from(config: &BotConfig) -> Self {
        Self {
            name: config.name.clone(),
            escape_word: config.escape_word.clone(),
            first_message: config.first_message.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PromptTemplate {
    template: String,
}

impl PromptTemplate {
    pub fn new(raw: &str, persona: &Persona) -> Result<Self, PromptError> {
        let template = raw
            .replace(NAME_PLACEHOLDER, &persona.name)
            .replace(ESCAPE_WORD_PLACEHOLDER, &persona.escape_word);

        let found = template.matches(CONTEXT_PLACEHOLDER).count();
        if found != 1 {
            return Err(PromptError::Placeholder {
                placeholder: CONTEXT_PLACEHOLDER,
                found,
            });
        }

        Ok(Self { template })
    }

    pub fn load(path: &Path, persona: &Persona) -> Result<Self, PromptError> {
        let raw = std::fs::read_to_string(path).map_err(|e| PromptError::Read {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::new(&raw, persona)
    }

    /// Inline `prompt_override` wins over the file at `prompt_path`.
    pub fn from_config(config: &BotConfig) -> Result<Self, PromptError> {
        let persona = Persona::from(config);
        match &config.prompt_override {
            Some(raw) => Self::new(raw, &persona),
            None => Self::load(&config.prompt_path, &persona),
        }
    }

    /// The system prompt for one turn.
    pub fn render(&self, context: &str) -> String {
        self.template.replacen(CONTEXT_PLACEHOLDER, context, 1)
    }

    pub fn as_str(&self) -> &str {
        &self.template
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn persona() -> Persona {
        Persona {
            name: "Docbot".into(),
            escape_word: "Stumped!".into(),
            first_message: "Hi!".into(),
        }
    }

    #[test]
    fn substitutes_persona_everywhere() {
        let t = PromptTemplate::new(
            "You are BOT_USER_NAME. BOT_USER_NAME says BOT_ESCAPE_WORD.\nBOT_CONTEXT",
            &persona(),
        )
        .unwrap();
        assert_eq!(t.as_str(), "You are Docbot. Docbot says Stumped!.\nBOT_CONTEXT");
    }

    #[test]
    fn renders_context() {
        let t = PromptTemplate::new("Docs:\nBOT_CONTEXT\nEnd", &persona()).unwrap();
        assert_eq!(t.render("passage one"), "Docs:\npassage one\nEnd");
        assert_eq!(t.render(""), "Docs:\n\nEnd");
    }

    #[test]
    fn render_does_not_rescan_context() {
        let t = PromptTemplate::new("[BOT_CONTEXT]", &persona()).unwrap();
        assert_eq!(t.render("BOT_USER_NAME"), "[BOT_USER_NAME]");
    }

    #[test]
    fn missing_context_placeholder_is_rejected() {
        let err = PromptTemplate::new("No slot here", &persona()).unwrap_err();
        assert!(matches!(err, PromptError::Placeholder { found: 0, .. }));
    }

    #[test]
    fn duplicate_context_placeholder_is_rejected() {
        let err = PromptTemplate::new("BOT_CONTEXT and BOT_CONTEXT", &persona()).unwrap_err();
        assert!(matches!(err, PromptError::Placeholder { found: 2, .. }));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "I am BOT_USER_NAME.\n\nBOT_CONTEXT").unwrap();
        let t = PromptTemplate::load(file.path(), &persona()).unwrap();
        assert!(t.as_str().starts_with("I am Docbot."));
    }

    #[test]
    fn missing_file_is_read_error() {
        let err = PromptTemplate::load(Path::new("/nonexistent/prompt.txt"), &persona())
            .unwrap_err();
        assert!(matches!(err, PromptError::Read { .. }));
    }

    #[test]
    fn override_beats_path() {
        let config = BotConfig {
            prompt_path: "/nonexistent/prompt.txt".into(),
            prompt_override: Some("Hello BOT_USER_NAME: BOT_CONTEXT".into()),
            ..BotConfig::default()
        };
        let t = PromptTemplate::from_config(&config).unwrap();
        assert_eq!(t.render("ctx"), format!("Hello {}: ctx", config.name));
    }
}
