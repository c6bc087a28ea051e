use serde::{Deserialize, Serialize};

/// Declared format of an uploaded document, derived from its file extension.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DocumentFormat {
    Pdf,
    Txt,
    Doc,
    Docx,
}

impl DocumentFormat {
    pub const SUPPORTED: [DocumentFormat; 4] = [Self::Pdf, Self::Txt, Self::Doc, Self::Docx];

    /// Resolve a format from a file name, using its last extension.
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        let (_, ext) = file_name.rsplit_once('.')?;
        ext.parse().ok()
    }

    pub fn supported_list() -> String {
        Self::SUPPORTED
            .iter()
            .map(|f| f.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl std::fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pdf => write!(f, "pdf"),
            Self::Txt => write!(f, "txt"),
            Self::Doc => write!(f, "doc"),
            Self::Docx => write!(f, "docx"),
        }
    }
}

impl std::str::FromStr for DocumentFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pdf" => Ok(Self::Pdf),
            "txt" => Ok(Self::Txt),
            "doc" => Ok(Self::Doc),
            "docx" => Ok(Self::Docx),
            _ => Err(format!("Unknown document format: {s}")),
        }
    }
}

/// Retrieval mode of a conversation, fixed at creation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ConversationType {
    /// Model knowledge only, no retrieval.
    #[default]
    General,
    /// Retrieved context is primary, general knowledge may fill gaps.
    Rag,
    /// Retrieved context is the only permitted source.
    StrictRag,
}

impl ConversationType {
    pub fn uses_retrieval(&self) -> bool {
        !matches!(self, Self::General)
    }
}

impl std::fmt::Display for ConversationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::General => write!(f, "general"),
            Self::Rag => write!(f, "rag"),
            Self::StrictRag => write!(f, "strict_rag"),
        }
    }
}

impl std::str::FromStr for ConversationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "general" => Ok(Self::General),
            "rag" => Ok(Self::Rag),
            "strict_rag" => Ok(Self::StrictRag),
            _ => Err(format!("Unknown conversation type: {s}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MessageSender {
    User,
    Assistant,
}

impl MessageSender {
    /// Role name understood by the chat model.
    pub fn as_role(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for MessageSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_role())
    }
}

impl std::str::FromStr for MessageSender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(Self::User),
            "assistant" => Ok(Self::Assistant),
            _ => Err(format!("Unknown message sender: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_file_name_uses_last_extension() {
        assert_eq!(
            DocumentFormat::from_file_name("report.final.PDF"),
            Some(DocumentFormat::Pdf)
        );
        assert_eq!(
            DocumentFormat::from_file_name("notes.txt"),
            Some(DocumentFormat::Txt)
        );
        assert_eq!(DocumentFormat::from_file_name("data.csv"), None);
        assert_eq!(DocumentFormat::from_file_name("README"), None);
    }

    #[test]
    fn test_conversation_type_roundtrip_strings() {
        for (raw, expected) in [
            ("general", ConversationType::General),
            ("rag", ConversationType::Rag),
            ("strict_rag", ConversationType::StrictRag),
        ] {
            let parsed: ConversationType = raw.parse().unwrap();
            assert_eq!(parsed, expected);
            assert_eq!(parsed.to_string(), raw);
        }
        assert!("strict".parse::<ConversationType>().is_err());
    }

    #[test]
    fn test_only_general_skips_retrieval() {
        assert!(!ConversationType::General.uses_retrieval());
        assert!(ConversationType::Rag.uses_retrieval());
        assert!(ConversationType::StrictRag.uses_retrieval());
    }

    #[test]
    fn test_supported_list() {
        assert_eq!(DocumentFormat::supported_list(), "pdf, txt, doc, docx");
    }
}
