use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Game development languages the assistant knows how to prompt for.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    #[value(name = "cpp", alias = "c++")]
    Cpp,
    #[value(name = "csharp", alias = "cs", alias = "c#")]
    CSharp,
    #[value(name = "gdscript", alias = "gd")]
    GdScript,
    #[value(name = "javascript", alias = "js")]
    JavaScript,
    #[value(name = "python", alias = "py")]
    Python,
    #[value(name = "lua")]
    Lua,
    #[value(name = "haxe", alias = "hx")]
    Haxe,
    #[value(name = "rust", alias = "rs")]
    Rust,
}

pub const ALL: [Language; 8] = [
    Language::Cpp,
    Language::CSharp,
    Language::GdScript,
    Language::JavaScript,
    Language::Python,
    Language::Lua,
    Language::Haxe,
    Language::Rust,
];

impl Language {
    pub fn display_name(&self) -> &'static str {
        match self {
            Language::Cpp => "C++",
            Language::CSharp => "C# (Outside Unity)",
            Language::GdScript => "GDScript",
            Language::JavaScript => "JavaScript",
            Language::Python => "Python",
            Language::Lua => "Lua",
            Language::Haxe => "Haxe",
            Language::Rust => "Rust",
        }
    }

    /// Tag used on fenced code blocks, both in prompts and when parsing replies.
    pub fn fence_tag(&self) -> String {
        self.display_name().to_lowercase()
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        if let Some(l) = ALL.iter().find(|l| l.display_name().eq_ignore_ascii_case(needle)) {
            return Ok(*l);
        }
        <Language as ValueEnum>::from_str(needle, true).map_err(|_| {
            let names: Vec<&str> = ALL.iter().map(|l| l.display_name()).collect();
            format!("unknown language '{}' (choose one of: {})", needle, names.join(", "))
        })
    }
}
