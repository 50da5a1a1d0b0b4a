use std::path::PathBuf;

/// One line typed at the interactive prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserCommand {
    Select(PathBuf),
    Classify,
    Regenerate,
    Download(Option<PathBuf>),
    Show,
    Help,
    Quit,
}

pub const HELP: &str = "\
Commands:
  select <path>     choose the CSV file to classify
  classify          send the selected file to the classifier
  regenerate        classify the same file again
  download [dir]    save the raw result as classified_logs.csv
  show              redraw the current state
  help              show this text
  quit              leave";

pub fn parse(line: &str) -> Result<Option<UserCommand>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let command = match word.to_ascii_lowercase().as_str() {
        "select" | "open" => {
            if rest.is_empty() {
                return Err("select needs a file path".to_string());
            }
            UserCommand::Select(PathBuf::from(unquote(rest)))
        }
        "classify" => UserCommand::Classify,
        "regenerate" | "retry" => UserCommand::Regenerate,
        "download" | "save" => {
            UserCommand::Download((!rest.is_empty()).then(|| PathBuf::from(unquote(rest))))
        }
        "show" => UserCommand::Show,
        "help" | "?" => UserCommand::Help,
        "quit" | "exit" => UserCommand::Quit,
        other => return Err(format!("unknown command {other:?}, try `help`")),
    };
    Ok(Some(command))
}

fn unquote(text: &str) -> &str {
    text.strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
        .unwrap_or(text)
}
