//! Character card definitions.

use serde::{Deserialize, Serialize};

use crate::entries::CardId;

/// The persona the conversation is played against.
///
/// Consumed only by prompt assembly; absent fields are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CharacterCard {
    pub id: CardId,
    pub name: String,
    pub description: String,
    pub personality: String,
    pub scenario: String,
    pub system_prompt: String,
}

impl CharacterCard {
    /// Create a new card with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_personality(mut self, personality: impl Into<String>) -> Self {
        self.personality = personality.into();
        self
    }

    pub fn with_scenario(mut self, scenario: impl Into<String>) -> Self {
        self.scenario = scenario.into();
        self
    }

    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = system_prompt.into();
        self
    }

    /// Check if every renderable field is blank.
    pub fn is_blank(&self) -> bool {
        [
            &self.system_prompt,
            &self.name,
            &self.description,
            &self.personality,
            &self.scenario,
        ]
        .iter()
        .all(|field| field.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_card() {
        assert!(CharacterCard::default().is_blank());
        assert!(!CharacterCard::new("Aria").is_blank());
        assert!(!CharacterCard::default().with_scenario("A tavern").is_blank());
    }
}
