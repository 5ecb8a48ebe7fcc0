//! Email transform kinds and prompt construction.

/// The rewrite the user asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformKind {
    Revise,
    Formal,
    Casual,
    Shorten,
    Expand,
}

impl TransformKind {
    /// Parse a kind name. `None` for anything unrecognized; such
    /// input is sent to the model untouched.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "revise" => Some(TransformKind::Revise),
            "formal" => Some(TransformKind::Formal),
            "casual" => Some(TransformKind::Casual),
            "shorten" => Some(TransformKind::Shorten),
            "expand" => Some(TransformKind::Expand),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransformKind::Revise => "revise",
            TransformKind::Formal => "formal",
            TransformKind::Casual => "casual",
            TransformKind::Shorten => "shorten",
            TransformKind::Expand => "expand",
        }
    }

    /// The fixed instruction prefixed to the email text.
    fn instruction(&self) -> &'static str {
        match self {
            TransformKind::Revise => {
                "Revise the following email for clarity, grammar, and tone. \
                 Reply with only the revised email text, no commentary.\n\n"
            }
            TransformKind::Formal => {
                "Rewrite the following email in a formal, professional tone. \
                 Reply with only the rewritten email text, no commentary.\n\n"
            }
            TransformKind::Casual => {
                "Rewrite the following email in a relaxed, friendly tone. \
                 Reply with only the rewritten email text, no commentary.\n\n"
            }
            TransformKind::Shorten => {
                "Shorten the following email while keeping every essential point. \
                 Reply with only the shortened email text, no commentary.\n\n"
            }
            TransformKind::Expand => {
                "Expand the following email with more detail and a fuller structure. \
                 Reply with only the expanded email text, no commentary.\n\n"
            }
        }
    }
}

/// Build the prompt for one request: an optional email-context prefix,
/// the kind's instruction, then the email text. An unrecognized kind
/// (`None`) passes the raw text through unmodified.
pub fn build_prompt(kind: Option<TransformKind>, context: &str, text: &str) -> String {
    let Some(kind) = kind else {
        return text.to_string();
    };
    let mut prompt = String::new();
    let context = context.trim();
    if !context.is_empty() {
        prompt.push_str(context);
        prompt.push_str("\n\n");
    }
    prompt.push_str(kind.instruction());
    prompt.push_str(text);
    prompt
}
