use serde::{Deserialize, Serialize};

/// Response style selected by the user for a completion request.
///
/// Each mode maps to a generation profile (system prompt, temperature,
/// output length) in [`ModesConfig`](crate::config::ModesConfig).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseMode {
    /// Concise, direct answers.
    Fast,
    #[default]
    Default,
    /// Long-form answers with examples and context.
    Full,
    /// Casual, conversational tone.
    Friend,
}

impl ResponseMode {
    pub const ALL: [ResponseMode; 4] = [
        ResponseMode::Fast,
        ResponseMode::Default,
        ResponseMode::Full,
        ResponseMode::Friend,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fast => "fast",
            Self::Default => "default",
            Self::Full => "full",
            Self::Friend => "friend",
        }
    }
}

impl std::fmt::Display for ResponseMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ResponseMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fast" => Ok(Self::Fast),
            "default" => Ok(Self::Default),
            "full" => Ok(Self::Full),
            "friend" => Ok(Self::Friend),
            other => Err(format!(
                "unknown mode '{other}' (expected fast, default, full or friend)"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("FULL".parse::<ResponseMode>().unwrap(), ResponseMode::Full);
        assert_eq!(" friend ".parse::<ResponseMode>().unwrap(), ResponseMode::Friend);
        assert!("verbose".parse::<ResponseMode>().is_err());
    }

    #[test]
    fn wire_names_match_display() {
        for mode in ResponseMode::ALL {
            let json = serde_json::to_string(&mode).unwrap();
            assert_eq!(json, format!("\"{mode}\""));
        }
    }
}
