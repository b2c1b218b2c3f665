use crate::lang::Language;

pub const EMPTY_CODE: &str = "Error: Code input is empty.";

enum Rule {
    /// At least one marker must appear.
    AnyOf(&'static [&'static str]),
    /// Every marker must appear.
    AllOf(&'static [&'static str]),
}

fn rule(lang: Language) -> (Rule, &'static str) {
    match lang {
        Language::Cpp => (
            Rule::AnyOf(&["std::", "using namespace std;", "cout"]),
            "Error: Code does not appear to be valid C++. Include standard library usage (e.g., 'using namespace std;' or 'std::cout').",
        ),
        Language::CSharp => (
            Rule::AllOf(&["class", "{"]),
            "Error: Code does not appear to be valid C#. Include a class definition with curly braces.",
        ),
        Language::GdScript => (
            Rule::AnyOf(&["extends", "func"]),
            "Error: Code does not appear to be valid GDScript. Include 'extends' and 'func' keywords.",
        ),
        Language::JavaScript => (
            Rule::AnyOf(&["function", "let", "const"]),
            "Error: Code does not appear to be valid JavaScript. Include function declarations or variable definitions.",
        ),
        Language::Python => (
            Rule::AnyOf(&["def", "import"]),
            "Error: Code does not appear to be valid Python. Include 'def' for functions or 'import' statements.",
        ),
        Language::Lua => (
            Rule::AnyOf(&["function", "local"]),
            "Error: Code does not appear to be valid Lua. Include 'function' or 'local' keywords.",
        ),
        Language::Haxe => (
            Rule::AnyOf(&["class", "function"]),
            "Error: Code does not appear to be valid Haxe. Include 'class' and 'function' keywords.",
        ),
        Language::Rust => (
            Rule::AnyOf(&["fn", "struct"]),
            "Error: Code does not appear to be valid Rust. Include 'fn' for functions or 'struct' definitions.",
        ),
    }
}

/// Shallow lexical check of generated code. Returns `(is_valid, message)`;
/// the message is empty when the code passes.
pub fn validate_code(code: &str, lang: Language) -> (bool, String) {
    if code.trim().is_empty() {
        return (false, EMPTY_CODE.to_string());
    }
    let (rule, message) = rule(lang);
    let ok = match rule {
        Rule::AnyOf(markers) => markers.iter().any(|m| code.contains(m)),
        Rule::AllOf(markers) => markers.iter().all(|m| code.contains(m)),
    };
    if ok {
        (true, String::new())
    } else {
        (false, message.to_string())
    }
}
