use log::warn;

use sgpt::handler::PromptHandler;
use sgpt::platform::ShellRunner;
use sgpt::repl::LineSource;

use super::input::TerminalInput;

const CHOICES: &str = "[E]xecute, [M]odify, [D]escribe, [A]bort:";

/// Follow-up to a generated shell command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellAction {
    Execute,
    Modify,
    Describe,
    Abort,
}

impl ShellAction {
    /// Parses an answer; an empty one picks the configured default. `y` is
    /// kept as an alias of execute.
    pub fn parse(answer: &str, default_execute: bool) -> Option<Self> {
        match answer.trim().to_ascii_lowercase().as_str() {
            "" if default_execute => Some(ShellAction::Execute),
            "" => Some(ShellAction::Abort),
            "e" | "y" => Some(ShellAction::Execute),
            "m" => Some(ShellAction::Modify),
            "d" => Some(ShellAction::Describe),
            "a" => Some(ShellAction::Abort),
            _ => None,
        }
    }
}

/// Offers to run, edit or explain `command` until the user runs or aborts.
pub async fn interact(
    mut command: String,
    input: &mut TerminalInput,
    shell: &dyn ShellRunner,
    describer: &mut dyn PromptHandler,
    default_execute: bool,
) -> anyhow::Result<()> {
    loop {
        let Some(answer) = input.read_line(CHOICES)? else {
            return Ok(());
        };
        match ShellAction::parse(&answer, default_execute) {
            Some(ShellAction::Execute) => {
                if let Err(err) = shell.execute(&command) {
                    warn!("shell command failed: {err}");
                    eprintln!("{err}");
                }
                return Ok(());
            }
            Some(ShellAction::Describe) => {
                describer.handle(&command).await?;
            }
            Some(ShellAction::Modify) => {
                if let Some(edited) = input.read_with_initial("Modify:", &command)? {
                    if !edited.trim().is_empty() {
                        command = edited;
                    }
                }
            }
            Some(ShellAction::Abort) => return Ok(()),
            None => continue,
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("e", false, Some(ShellAction::Execute))]
    #[case("Y", false, Some(ShellAction::Execute))]
    #[case(" m ", false, Some(ShellAction::Modify))]
    #[case("D", true, Some(ShellAction::Describe))]
    #[case("a", true, Some(ShellAction::Abort))]
    #[case("", true, Some(ShellAction::Execute))]
    #[case("", false, Some(ShellAction::Abort))]
    #[case("run it", false, None)]
    fn parses_answers(
        #[case] answer: &str,
        #[case] default_execute: bool,
        #[case] expected: Option<ShellAction>,
    ) {
        assert_eq!(ShellAction::parse(answer, default_execute), expected);
    }
}
