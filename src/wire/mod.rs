use serde::{Deserialize, Serialize};

/// ========================================
/// Chat-completion request shared by all providers
/// ========================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

/// A system + user instruction pair as built by the prompt module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instruction {
    pub system: String,
    pub user: String,
}

impl Instruction {
    pub fn to_messages(&self) -> Vec<ChatMessage> {
        vec![
            ChatMessage { role: Role::System, content: self.system.clone() },
            ChatMessage { role: Role::User, content: self.user.clone() },
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl ChatRequest {
    pub fn new(model: &str, instruction: &Instruction, temperature: f32, max_tokens: u32) -> Self {
        Self {
            model: model.to_string(),
            messages: instruction.to_messages(),
            temperature,
            max_tokens,
        }
    }

    /// Concatenated system messages, for providers that take the system prompt separately.
    pub fn system_text(&self) -> Option<String> {
        let parts: Vec<&str> = self
            .messages
            .iter()
            .filter(|m| m.role == Role::System)
            .map(|m| m.content.as_str())
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join("\n\n"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_in_chat_completion_shape() {
        let ins = Instruction { system: "sys".into(), user: "usr".into() };
        let req = ChatRequest::new("llama-3.3-70b-versatile", &ins, 0.7, 1500);
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(v["model"], "llama-3.3-70b-versatile");
        assert_eq!(v["messages"][0]["role"], "system");
        assert_eq!(v["messages"][1]["role"], "user");
        assert_eq!(v["messages"][1]["content"], "usr");
        assert_eq!(v["max_tokens"], 1500);
    }

    #[test]
    fn system_text_joins_system_messages_only() {
        let ins = Instruction { system: "a".into(), user: "b".into() };
        let req = ChatRequest::new("m", &ins, 0.0, 1);
        assert_eq!(req.system_text().as_deref(), Some("a"));
    }
}
