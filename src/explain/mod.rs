//! Rule-based substitute for a missing or thin model explanation.
//!
//! Purely lexical: the most recent prompt and the modified code are sniffed
//! for a few gameplay keywords, and each non-blank line gets one templated
//! sentence based on shallow textual cues.

use std::fmt::Write;

use crate::lang::Language;

const NO_EXPLANATION: &str = "No explanation provided.";
const MIN_LINES: usize = 5;

const DEFINING_KEYWORDS: &[&str] = &["def ", "function ", "void ", "fn ", "class ", "struct "];

/// Whether a parsed explanation should be replaced by [`fallback_explanation`].
pub fn needs_fallback(explanation: &str) -> bool {
    explanation.is_empty()
        || explanation == NO_EXPLANATION
        || explanation.split('\n').count() < MIN_LINES
}

struct Topics {
    jump: bool,
    health: bool,
    optimize: bool,
}

/// The original code is accepted for parity with the generation call; only the
/// latest prompt and the modified code shape the text.
pub fn fallback_explanation(
    _original_code: &str,
    modified_code: &str,
    history: &[String],
    lang: Language,
) -> String {
    let latest = history.last().map(|p| p.to_lowercase()).unwrap_or_default();
    let code_lower = modified_code.to_lowercase();
    let asked = Topics {
        jump: latest.contains("jump"),
        health: latest.contains("health"),
        optimize: latest.contains("optimize"),
    };

    // fmt::Write into a String cannot fail.
    let mut out = String::from("### Key Changes Made:\n");
    if asked.jump || code_lower.contains("jumpforce") {
        let _ = writeln!(out, "- Added a jump mechanic to the {lang} code. This allows the player to jump when a specific key (like the spacebar) is pressed. The mechanic uses variables to track the player's vertical position, applies an initial upward velocity, and simulates gravity to bring the player back down.");
    }
    if asked.health || code_lower.contains("maxhealth") {
        let _ = writeln!(out, "- Added a health system to the {lang} code. This tracks the player's health, starting at a maximum value (e.g., 100), and includes a function to reduce health when the player takes damage.");
    }
    if asked.optimize || code_lower.contains("performance") {
        let _ = writeln!(out, "- Optimized performance in the {lang} code. This might involve reducing unnecessary calculations, improving loop efficiency, or using better data structures to make the game run smoother.");
    }

    let _ = writeln!(out, "\n### Detailed Step-by-Step Breakdown of the {lang} Code:");
    for (idx, raw) in modified_code.split('\n').enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(sentence) = describe_line(line, &asked, lang) {
            let _ = writeln!(out, "- **Line {}: `{}`** - {}", idx + 1, line, sentence);
        }
    }

    let _ = writeln!(out, "\n### Reasoning Behind the Changes:");
    if asked.jump {
        let _ = writeln!(out, "- **Jump Mechanic**: The jump mechanic was added to enhance gameplay by allowing vertical movement. In {lang}, this typically involves checking for a key press (e.g., spacebar) to start the jump, applying an upward velocity to the player's position, and using gravity to bring the player back down. This creates a smooth jumping effect, making the game more interactive and fun. The variables like `jump_velocity` and `gravity` are carefully chosen to balance the jump height and fall speed, ensuring the player can jump over obstacles without the jump feeling too floaty or too abrupt.");
    } else if asked.health {
        let _ = writeln!(out, "- **Health System**: The health system was added to introduce a survival element to the game. By tracking the player's health, the game can simulate damage from enemies or obstacles, making the player more cautious. The `max_health` variable sets the starting health, and a damage function allows the health to decrease, adding challenge and stakes to the gameplay.");
    } else if asked.optimize {
        let _ = writeln!(out, "- **Performance Optimization**: The optimization changes were made to improve the game's frame rate, ensuring it runs smoothly even on lower-end devices. In {lang}, this might involve reducing the number of calculations in the game loop or using more efficient data structures, which helps maintain a consistent gaming experience.");
    }

    let _ = writeln!(out, "\n### How the {lang} Code Fits into Game Development:");
    let _ = writeln!(out, "- The modified code follows {lang} best practices, making it suitable for game development in its respective environment (e.g., using Pygame for Python). The changes enhance the player's experience by adding interactive features like jumping, while maintaining the core game loop that updates the game state each frame.");
    out
}

fn describe_line(line: &str, asked: &Topics, lang: Language) -> Option<String> {
    let lower = line.to_lowercase();
    let sentence = if asked.jump && lower.contains("jump") {
        "This line is part of the jump mechanic. It likely checks for a key press (e.g., spacebar) to start the jump or updates the player's vertical position. The reasoning behind this is to allow the player to interact with the game world by jumping over obstacles or reaching higher platforms, which is a core feature in many 2D games.".to_string()
    } else if asked.health && lower.contains("health") {
        "This line relates to the health system. It might define the player's health or reduce it when damage is taken. The purpose is to track the player's survival status, adding challenge and strategy to the game by requiring the player to avoid damage.".to_string()
    } else if DEFINING_KEYWORDS.iter().any(|k| line.starts_with(k)) {
        format!("This line defines a function or method in {lang}. Functions are used to organize code into reusable blocks, making it easier to manage game logic like updating the player's position or handling input.")
    } else if line.contains('=') && !line.contains("if") {
        "This line initializes a variable. Variables store important game data, such as the player's position or speed, which are used to control how the game behaves.".to_string()
    } else if line.contains("if ") {
        "This line contains a conditional statement. It checks for a condition (e.g., a key press) and executes code if the condition is true, which is essential for handling player input and game events.".to_string()
    } else {
        return None;
    };
    Some(sentence)
}
