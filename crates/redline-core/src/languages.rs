use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Languages the review prompt knows how to name.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    Javascript,
    Java,
    #[serde(rename = "c++")]
    Cpp,
    #[serde(rename = "c#")]
    Csharp,
    Html,
    Go,
}

impl Language {
    pub const ALL: [Language; 7] = [
        Language::Python,
        Language::Javascript,
        Language::Java,
        Language::Cpp,
        Language::Csharp,
        Language::Html,
        Language::Go,
    ];

    /// Name as it appears in the prompt.
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::Javascript => "javascript",
            Language::Java => "java",
            Language::Cpp => "c++",
            Language::Csharp => "c#",
            Language::Html => "html",
            Language::Go => "go",
        }
    }

    /// Guess the language from a file extension ("py", "cpp", ...).
    pub fn from_extension(ext: &str) -> Option<Language> {
        match ext.to_ascii_lowercase().as_str() {
            "py" => Some(Language::Python),
            "js" => Some(Language::Javascript),
            "java" => Some(Language::Java),
            "cpp" => Some(Language::Cpp),
            "cs" => Some(Language::Csharp),
            "html" => Some(Language::Html),
            "go" => Some(Language::Go),
            _ => None,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unsupported language: {0} (expected one of python, javascript, java, c++, c#, html, go)")]
pub struct UnknownLanguage(pub String);

impl FromStr for Language {
    type Err = UnknownLanguage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "python" | "py" => Ok(Language::Python),
            "javascript" | "js" => Ok(Language::Javascript),
            "java" => Ok(Language::Java),
            "c++" | "cpp" => Ok(Language::Cpp),
            "c#" | "csharp" | "cs" => Ok(Language::Csharp),
            "html" => Ok(Language::Html),
            "go" => Ok(Language::Go),
            other => Err(UnknownLanguage(other.to_string())),
        }
    }
}
