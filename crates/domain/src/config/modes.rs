use serde::{Deserialize, Serialize};

use crate::mode::ResponseMode;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Response mode table
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Generation parameters for one [`ResponseMode`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModeProfile {
    /// Prepended as a `system` turn to every request in this mode.
    pub system_prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// One profile per mode.  Every field can be overridden from TOML, e.g.
///
/// ```toml
/// [modes.fast]
/// system_prompt = "Answer in one sentence."
/// temperature = 0.2
/// max_tokens = 128
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModesConfig {
    #[serde(default = "d_fast")]
    pub fast: ModeProfile,
    #[serde(default = "d_default")]
    pub default: ModeProfile,
    #[serde(default = "d_full")]
    pub full: ModeProfile,
    #[serde(default = "d_friend")]
    pub friend: ModeProfile,
}

impl Default for ModesConfig {
    fn default() -> Self {
        Self {
            fast: d_fast(),
            default: d_default(),
            full: d_full(),
            friend: d_friend(),
        }
    }
}

impl ModesConfig {
    pub fn profile(&self, mode: ResponseMode) -> &ModeProfile {
        match mode {
            ResponseMode::Fast => &self.fast,
            ResponseMode::Default => &self.default,
            ResponseMode::Full => &self.full,
            ResponseMode::Friend => &self.friend,
        }
    }
}

fn d_fast() -> ModeProfile {
    ModeProfile {
        system_prompt: "You are Parley in fast mode. Provide concise, direct answers \
            without elaboration. Focus on key points only. Be brief but accurate."
            .into(),
        temperature: 0.3,
        max_tokens: 256,
    }
}

fn d_default() -> ModeProfile {
    ModeProfile {
        system_prompt: "You are Parley, a helpful AI assistant focused on research and \
            innovation. You provide clear, accurate, and well-structured responses while \
            maintaining a professional and friendly tone."
            .into(),
        temperature: 0.7,
        max_tokens: 1024,
    }
}

fn d_full() -> ModeProfile {
    ModeProfile {
        system_prompt: "You are Parley in full mode. Provide comprehensive, detailed \
            responses with thorough explanations and examples. Explore multiple \
            perspectives, include relevant context, and connect ideas across domains \
            when relevant."
            .into(),
        temperature: 0.9,
        max_tokens: 2048,
    }
}

fn d_friend() -> ModeProfile {
    ModeProfile {
        system_prompt: "You are Parley in friend mode. Talk like a warm, curious friend: \
            casual, encouraging, and honest. Keep answers conversational and ask a \
            follow-up question when it helps."
            .into(),
        temperature: 0.8,
        max_tokens: 1024,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_matches_mode_ordering() {
        let modes = ModesConfig::default();
        let fast = modes.profile(ResponseMode::Fast);
        let full = modes.profile(ResponseMode::Full);
        assert!(fast.temperature < full.temperature);
        assert!(fast.max_tokens < full.max_tokens);
        assert_eq!(modes.profile(ResponseMode::Default).max_tokens, 1024);
    }

    #[test]
    fn partial_override_keeps_other_modes() {
        let toml_str = r#"
            [fast]
            system_prompt = "One sentence."
            temperature = 0.1
            max_tokens = 64
        "#;
        let modes: ModesConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(modes.fast.max_tokens, 64);
        assert_eq!(modes.full, ModesConfig::default().full);
    }
}
