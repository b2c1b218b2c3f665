use crate::lang::Language;
use crate::wire::Instruction;

pub const EXPLANATION_MARKER: &str = "**Explanation**:";
pub const FIX_MARKER: &str = "**Suggested Fix**:";
pub const UPDATED_CODE_MARKER: &str = "**Updated Code**:";

/// Canned edit prompts offered to the user, parameterised by language.
pub const TEMPLATES: &[(&str, &str)] = &[
    (
        "Add jump mechanic",
        "Modify this {lang} code to add a jump mechanic with height 2 units, triggered by the spacebar (or equivalent input for the chosen language).",
    ),
    (
        "Add health system",
        "Modify this {lang} code to add a health system with max health 100 and a damage function.",
    ),
    (
        "Optimize performance",
        "Modify this {lang} code to improve frame rate, focusing on efficient movement or rendering.",
    ),
];

/// 1-based template lookup, rendered for `lang`.
pub fn template(n: usize, lang: Language) -> Option<String> {
    n.checked_sub(1)
        .and_then(|i| TEMPLATES.get(i))
        .map(|(_, body)| body.replace("{lang}", lang.display_name()))
}

pub fn system_prompt_generate(lang: Language) -> String {
    let name = lang.display_name();
    let tag = lang.fence_tag();
    format!(
r#"You are an expert game developer proficient in {name}. Modify the provided code based on the sequence of user prompts, ensuring best practices for {name} in game development (e.g., memory management for C++, dynamic typing for Python, Rigidbody for C#). Apply each prompt in order, building on the previous modifications. Return the response in markdown format:
```{tag}
[modified code]
```
{marker} Provide a highly detailed, elaborative, and beginner-friendly explanation of the modified code. Ensure the explanation is easy to understand for someone new to {name} and game development. Avoid generic responses and focus on specifics of the code. Include the following sections:
- **Summary of Changes**: Summarize all changes made to the original code across all prompts in a clear list, explaining what was added or modified.
- **How the New Features Work**: Explain each new or modified feature in detail, specific to {name} and its game development context (e.g., how a jump mechanic works with physics or input handling in {name}).
- **Step-by-Step Code Breakdown**: Break down the entire modified code line by line, explaining the purpose of each variable, function, and language-specific feature. Include reasoning for why each line is necessary for the game.
- **Game Logic Explained**: Describe how the changes fit into the broader game logic, such as how the feature affects gameplay (e.g., how a health system impacts player survival).
If a prompt is a duplicate of an earlier step, note that no additional changes were made for that step."#,
        marker = EXPLANATION_MARKER,
    )
}

/// Always embeds the untouched original and the whole history; the model replays every step.
pub fn user_prompt_generate(
    lang: Language,
    original_code: &str,
    history: &[String],
    context: &str,
) -> String {
    let context = if context.trim().is_empty() {
        format!("No additional context provided for {}.", lang.display_name())
    } else {
        context.trim().to_string()
    };

    let mut s = format!(
        "Context: {context}\nOriginal code:\n```{tag}\n{original_code}\n```\nApply the following changes in sequence:\n",
        tag = lang.fence_tag(),
    );
    for (i, p) in history.iter().enumerate() {
        s.push_str(&format!("\nStep {}: {}", i + 1, p));
    }
    s
}

pub fn generate_instruction(
    lang: Language,
    original_code: &str,
    history: &[String],
    context: &str,
) -> Instruction {
    Instruction {
        system: system_prompt_generate(lang),
        user: user_prompt_generate(lang, original_code, history, context),
    }
}

pub fn system_prompt_fix(lang: Language) -> String {
    let name = lang.display_name();
    format!(
r#"You are an expert game developer proficient in {name}. The user has encountered an error while testing their {name} game code. Analyze the error message and the code, then provide:
1. A clear, beginner-friendly suggestion to fix the error, specific to {name} game development.
2. The fully updated code with the fix applied.
Return the response in markdown format:
{fix} [Detailed explanation of the fix, including why the error occurred, how the fix resolves it, and any code changes made.]
{updated}
```{tag}
[fully updated code with the fix applied]
```"#,
        fix = FIX_MARKER,
        updated = UPDATED_CODE_MARKER,
        tag = lang.fence_tag(),
    )
}

pub fn user_prompt_fix(lang: Language, error_message: &str, code: &str) -> String {
    format!(
        "Error message from the game environment:\n{error_message}\n\nCode being tested:\n```{tag}\n{code}\n```\nSuggest a fix for this error and provide the fully updated code.",
        tag = lang.fence_tag(),
    )
}

pub fn fix_instruction(lang: Language, error_message: &str, code: &str) -> Instruction {
    Instruction {
        system: system_prompt_fix(lang),
        user: user_prompt_fix(lang, error_message, code),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn steps_are_numbered_in_order_against_original() {
        let history = vec!["Add jump".to_string(), "Add health".to_string()];
        let u = user_prompt_generate(Language::Python, "def main(): pass", &history, "");
        let s1 = u.find("Step 1: Add jump").unwrap();
        let s2 = u.find("Step 2: Add health").unwrap();
        assert!(s1 < s2);
        assert!(u.contains("```python\ndef main(): pass\n```"));
        assert!(u.starts_with("Context: No additional context provided for Python."));
    }

    #[test]
    fn user_prompt_layout() {
        let u = user_prompt_generate(Language::Lua, "local x = 1", &["Go".to_string()], "LÖVE 11");
        assert_eq!(
            u,
            "Context: LÖVE 11\nOriginal code:\n```lua\nlocal x = 1\n```\nApply the following changes in sequence:\n\nStep 1: Go"
        );
    }

    #[test]
    fn system_prompt_names_fence_and_marker() {
        let s = system_prompt_generate(Language::Cpp);
        assert!(s.contains("proficient in C++"));
        assert!(s.contains("```c++\n[modified code]\n```"));
        assert!(s.contains("**Explanation**:"));
        for section in ["Summary of Changes", "How the New Features Work", "Step-by-Step Code Breakdown", "Game Logic Explained"] {
            assert!(s.contains(section), "missing {section}");
        }
    }

    #[test]
    fn fix_prompts_embed_error_and_code() {
        let ins = fix_instruction(Language::Rust, "E0382: use of moved value", "fn main() {}");
        assert!(ins.system.contains("**Suggested Fix**:"));
        assert!(ins.system.contains("**Updated Code**:\n```rust"));
        assert!(ins.user.contains("E0382: use of moved value"));
        assert!(ins.user.contains("```rust\nfn main() {}\n```"));
    }

    #[test]
    fn templates_render_language() {
        let t = template(2, Language::GdScript).unwrap();
        assert!(t.starts_with("Modify this GDScript code to add a health system"));
        assert!(template(0, Language::Lua).is_none());
        assert!(template(4, Language::Lua).is_none());
    }
}
