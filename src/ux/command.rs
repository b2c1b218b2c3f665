/// One line of REPL input. Commands start with `/`; anything else is an edit prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Quit,
    Language(Option<String>),
    Languages,
    Models,
    Model(String),
    Code,
    Load(String),
    Context(Option<String>),
    Templates,
    Template(usize),
    Generate(String),
    History,
    Edit(usize, String),
    Delete(usize),
    Show,
    Integrate,
    Fix,
    Export(String),
    Reset,
    Nothing,
}

pub const HELP: &str = "\
Type a change description to generate, or one of:
  /code                 paste game code (end with a line containing only '.')
  /load <path>          read game code from a file
  /context [text]       set (or clear) additional context
  /lang [name]          show or select the language   /languages  list them
  /models               list models                   /model <id|n>  select one
  /templates            list task templates           /template <n>  generate from one
  /gen <prompt>         generate with a prompt
  /history              show prompt history
  /edit <n> <text>      edit step n                   /del <n>  delete step n
  /show                 show the latest suggestion
  /integrate            accept the suggestion and clear the history
  /fix                  paste an error message and get a fix for the integrated code
  /export <path>        write the current code to a file
  /reset                start over with a new session
  /quit                 leave";

fn required<'a>(rest: &'a str, usage: &str) -> Result<&'a str, String> {
    if rest.is_empty() {
        Err(format!("usage: {usage}"))
    } else {
        Ok(rest)
    }
}

fn step_number(s: &str, usage: &str) -> Result<usize, String> {
    s.parse::<usize>().map_err(|_| format!("usage: {usage}"))
}

fn optional(rest: &str) -> Option<String> {
    (!rest.is_empty()).then(|| rest.to_string())
}

pub fn parse_command(line: &str) -> Result<Command, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(Command::Nothing);
    }
    let Some(body) = line.strip_prefix('/') else {
        return Ok(Command::Generate(line.to_string()));
    };

    let (name, rest) = match body.split_once(char::is_whitespace) {
        Some((n, r)) => (n, r.trim()),
        None => (body, ""),
    };

    let cmd = match name.to_lowercase().as_str() {
        "help" | "h" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        "lang" | "language" => Command::Language(optional(rest)),
        "languages" | "langs" => Command::Languages,
        "models" => Command::Models,
        "model" => Command::Model(required(rest, "/model <id|n>")?.to_string()),
        "code" | "paste" => Command::Code,
        "load" => Command::Load(required(rest, "/load <path>")?.to_string()),
        "context" | "ctx" => Command::Context(optional(rest)),
        "templates" => Command::Templates,
        "template" | "t" => Command::Template(step_number(rest, "/template <n>")?),
        "gen" | "generate" | "g" => Command::Generate(required(rest, "/gen <prompt>")?.to_string()),
        "history" | "hist" => Command::History,
        "edit" => {
            let usage = "/edit <n> <text>";
            let (n, text) = rest.split_once(char::is_whitespace).ok_or_else(|| format!("usage: {usage}"))?;
            Command::Edit(step_number(n, usage)?, required(text.trim(), usage)?.to_string())
        }
        "del" | "delete" | "rm" => Command::Delete(step_number(rest, "/del <n>")?),
        "show" => Command::Show,
        "integrate" => Command::Integrate,
        "fix" => Command::Fix,
        "export" | "save" => Command::Export(required(rest, "/export <path>")?.to_string()),
        "reset" => Command::Reset,
        other => return Err(format!("unknown command '/{other}' (try /help)")),
    };
    Ok(cmd)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_text_is_a_prompt() {
        assert_eq!(
            parse_command("  Add double jump  ").unwrap(),
            Command::Generate("Add double jump".into())
        );
        assert_eq!(parse_command("   ").unwrap(), Command::Nothing);
    }

    #[test]
    fn commands_with_arguments() {
        assert_eq!(parse_command("/edit 2 Make it faster").unwrap(), Command::Edit(2, "Make it faster".into()));
        assert_eq!(parse_command("/del 1").unwrap(), Command::Delete(1));
        assert_eq!(parse_command("/lang").unwrap(), Command::Language(None));
        assert_eq!(parse_command("/LANG py").unwrap(), Command::Language(Some("py".into())));
        assert_eq!(parse_command("/context Godot 4.2").unwrap(), Command::Context(Some("Godot 4.2".into())));
        assert_eq!(parse_command("/template 3").unwrap(), Command::Template(3));
    }

    #[test]
    fn malformed_commands_report_usage() {
        assert_eq!(parse_command("/edit two x").unwrap_err(), "usage: /edit <n> <text>");
        assert_eq!(parse_command("/edit 2").unwrap_err(), "usage: /edit <n> <text>");
        assert_eq!(parse_command("/del").unwrap_err(), "usage: /del <n>");
        assert!(parse_command("/frobnicate").unwrap_err().contains("unknown command"));
    }
}
