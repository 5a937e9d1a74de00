use std::path::PathBuf;

use clap::Parser;

use sgpt::batch::OutputFormat;
use sgpt::role::RoleSelection;
use sgpt::SgptError;

#[derive(Parser, Debug)]
#[command(
    name = "sgpt",
    version,
    about = "A command-line productivity tool powered by large language models"
)]
pub struct CliArgs {
    /// The prompt to generate completions for
    #[arg(index = 1)]
    pub prompt: Option<String>,
    /// Model to use
    #[arg(long)]
    pub model: Option<String>,
    /// Randomness of generated output
    #[arg(long, default_value_t = 0.0, value_parser = parse_temperature)]
    pub temperature: f32,
    /// Limits highest probable tokens (words)
    #[arg(long, default_value_t = 1.0, value_parser = parse_top_p)]
    pub top_p: f32,
    /// Prettify markdown output
    #[arg(long, overrides_with = "no_md")]
    pub md: bool,
    #[arg(long = "no-md", hide = true, overrides_with = "md")]
    pub no_md: bool,
    /// Open $EDITOR to provide a prompt
    #[arg(long)]
    pub editor: bool,
    /// Cache completion results
    #[arg(long, overrides_with = "no_cache")]
    pub cache: bool,
    #[arg(long = "no-cache", hide = true, overrides_with = "cache")]
    pub no_cache: bool,

    /// Generate and execute shell commands
    #[arg(long, short = 's')]
    pub shell: bool,
    /// Interactive mode for --shell option
    #[arg(long, overrides_with = "no_interaction")]
    pub interaction: bool,
    #[arg(long = "no-interaction", hide = true, overrides_with = "interaction")]
    pub no_interaction: bool,
    /// Describe a shell command
    #[arg(long, short = 'd')]
    pub describe_shell: bool,
    /// Generate only code
    #[arg(long, short = 'c')]
    pub code: bool,
    /// Allow function calls
    #[arg(long, overrides_with = "no_functions")]
    pub functions: bool,
    #[arg(long = "no-functions", hide = true, overrides_with = "functions")]
    pub no_functions: bool,

    /// Follow conversation with id, use "temp" for quick session
    #[arg(long)]
    pub chat: Option<String>,
    /// Start a REPL (Read–eval–print loop) session
    #[arg(long)]
    pub repl: Option<String>,
    /// Show all messages from provided chat id
    #[arg(long)]
    pub show_chat: Option<String>,
    /// List all existing chat ids
    #[arg(long, visible_alias = "lc")]
    pub list_chats: bool,
    /// Delete the chat with the given id
    #[arg(long)]
    pub delete_chat: Option<String>,
    /// Delete every stored chat
    #[arg(long)]
    pub delete_all_chats: bool,

    /// System role for GPT model
    #[arg(long)]
    pub role: Option<String>,
    /// Create role
    #[arg(long)]
    pub create_role: Option<String>,
    /// Show role
    #[arg(long)]
    pub show_role: Option<String>,
    /// List roles
    #[arg(long, visible_alias = "lr")]
    pub list_roles: bool,
    /// Delete role
    #[arg(long)]
    pub delete_role: Option<String>,

    /// Install shell integration (ZSH and Bash only)
    #[arg(long)]
    pub install_integration: bool,
    /// Install default functions
    #[arg(long)]
    pub install_functions: bool,
    /// Open the config file in $EDITOR
    #[arg(long)]
    pub edit_config: bool,

    /// Use the contents of a file as the prompt
    #[arg(long, value_name = "PATH")]
    pub file: Option<PathBuf>,
    /// Edit a file in $EDITOR, then use it as the prompt
    #[arg(long, value_name = "PATH")]
    pub edit_file: Option<PathBuf>,

    /// Read questions from a file and answer them one by one
    #[arg(long, value_name = "PATH")]
    pub batch: Option<PathBuf>,
    /// Where to save batch results
    #[arg(long, value_name = "PATH")]
    pub output: Option<PathBuf>,
    /// Format of saved batch results
    #[arg(long, value_enum, default_value_t = OutputFormat::Txt)]
    pub output_format: OutputFormat,

    /// Config file to use instead of ~/.config/shell_gpt/config.toml
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

impl CliArgs {
    pub fn role_selection(&self) -> RoleSelection {
        RoleSelection {
            role: self.role.clone(),
            shell: self.shell,
            describe_shell: self.describe_shell,
            code: self.code,
        }
    }

    pub fn markdown(&self, default: bool) -> bool {
        toggle(self.md, self.no_md, default)
    }

    pub fn use_cache(&self, default: bool) -> bool {
        toggle(self.cache, self.no_cache, default)
    }

    pub fn interaction(&self, default: bool) -> bool {
        toggle(self.interaction, self.no_interaction, default)
    }

    pub fn use_functions(&self, default: bool) -> bool {
        toggle(self.functions, self.no_functions, default)
    }

    /// Rejects flag combinations that cannot run together.
    pub fn validate(&self, stdin_passed: bool) -> Result<(), SgptError> {
        self.role_selection().kind()?;
        if self.chat.is_some() && self.repl.is_some() {
            return Err(SgptError::Usage(
                "--chat and --repl options cannot be used together.".to_string(),
            ));
        }
        if self.editor && stdin_passed {
            return Err(SgptError::Usage(
                "--editor option cannot be used with stdin input.".to_string(),
            ));
        }
        if self.batch.is_some() && self.repl.is_some() {
            return Err(SgptError::Usage(
                "--batch and --repl options cannot be used together.".to_string(),
            ));
        }
        let sources = [self.editor, self.file.is_some(), self.edit_file.is_some()]
            .iter()
            .filter(|set| **set)
            .count();
        if sources > 1 {
            return Err(SgptError::Usage(
                "Only one of --editor, --file and --edit-file can be used at a time.".to_string(),
            ));
        }
        Ok(())
    }
}

fn toggle(on: bool, off: bool, default: bool) -> bool {
    if on {
        true
    } else if off {
        false
    } else {
        default
    }
}

fn parse_temperature(raw: &str) -> Result<f32, String> {
    parse_in_range(raw, 0.0, 2.0)
}

fn parse_top_p(raw: &str) -> Result<f32, String> {
    parse_in_range(raw, 0.0, 1.0)
}

fn parse_in_range(raw: &str, min: f32, max: f32) -> Result<f32, String> {
    let value: f32 = raw
        .parse()
        .map_err(|_| format!("\"{raw}\" is not a number"))?;
    if (min..=max).contains(&value) {
        Ok(value)
    } else {
        Err(format!("{value} is not in {min}..={max}"))
    }
}
