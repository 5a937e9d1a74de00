//! Wires configuration, stores and the completion client into one run.

mod commands;
mod editor;
mod input;
mod interaction;
mod prompt;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use log::{debug, info};

use sgpt::backends::OpenAIClient;
use sgpt::batch::{read_questions, BatchProcessor};
use sgpt::cache::{CachedClient, ResponseCache};
use sgpt::chat::{CompletionClient, CompletionParams};
use sgpt::functions::FunctionRegistry;
use sgpt::handler::{ChatHandler, Completer, DefaultHandler, PromptHandler};
use sgpt::platform::{PlatformContext, ShellRunner, SystemShell};
use sgpt::render::{Printer, TerminalPrinter};
use sgpt::repl::ReplLoop;
use sgpt::role::{Role, RoleKind, RoleStore};
use sgpt::session::{ChatSessionStore, SessionKey};
use sgpt::SgptError;

use crate::args::CliArgs;
use crate::config::{load_config, AppConfig};
use crate::logging::init_logging;

use commands::Stores;
use input::TerminalInput;
use prompt::PipedInput;

pub async fn run() -> anyhow::Result<()> {
    let args = CliArgs::parse();
    let loaded = load_config(args.config.clone()).context("failed to load configuration")?;
    let _logger = init_logging(&loaded.config.logging, &loaded.paths)?;
    let config = loaded.config;
    info!("sgpt starting, config {}", loaded.paths.config_file.display());

    let platform = PlatformContext::resolve(&config.shell.os_name, &config.shell.shell_name);
    let roles = RoleStore::new(config.storage.role_dir(&loaded.paths));
    roles.initialize_defaults(&platform)?;
    let chats =
        ChatSessionStore::new(config.storage.chat_dir()).with_max_messages(config.chat.cache_length);
    let printer: Arc<dyn Printer> = Arc::new(TerminalPrinter::from_color_name(
        &config.ui.color,
        args.markdown(config.ui.prettify_markdown),
    ));

    let functions_dir = config.storage.functions_dir(&loaded.paths);
    let stores = Stores {
        roles: &roles,
        chats: &chats,
        functions_dir: &functions_dir,
        config_file: &loaded.paths.config_file,
        platform: &platform,
    };
    if commands::handle_management(&args, &stores, printer.as_ref())? {
        return Ok(());
    }

    let piped = prompt::read_piped_stdin()?;
    args.validate(piped.is_some())?;
    let role = roles.resolve(&args.role_selection())?;
    let prompt = prompt::resolve_prompt(&args, piped.as_ref())?;
    debug!("role \"{}\", prompt of {} bytes", role.name, prompt.len());

    let session = Session {
        completer: build_completer(&args, &config, &functions_dir, printer.clone())?,
        roles: &roles,
        chats: &chats,
        printer,
        shell: Arc::new(SystemShell::detect()),
        config: &config,
        args: &args,
    };
    session.dispatch(role, prompt, piped.as_ref()).await
}

fn build_completer(
    args: &CliArgs,
    config: &AppConfig,
    functions_dir: &std::path::Path,
    printer: Arc<dyn Printer>,
) -> anyhow::Result<Completer> {
    let api_key = config.api.resolve_api_key().ok_or_else(|| {
        SgptError::Usage(format!(
            "No API key found. Set {} or api.api_key in the config file.",
            config.api.api_key_env
        ))
    })?;
    let mut client = OpenAIClient::new(api_key, config.api.base_url.as_str(), config.api.timeout())?;

    let mut params = CompletionParams::new(
        args.model
            .clone()
            .unwrap_or_else(|| config.api.default_model.clone()),
    );
    params.temperature = args.temperature;
    params.top_p = args.top_p;
    params.use_cache = args.use_cache(config.cache.enabled);

    if args.use_functions(config.functions.enabled) {
        let registry = FunctionRegistry::load_dir(functions_dir)?;
        info!("offering {} functions to the model", registry.len());
        params.functions = registry.schemas();
        client = client.with_functions(registry);
    }

    let client: Arc<dyn CompletionClient> = if config.cache.enabled {
        let cache = ResponseCache::new(config.storage.cache_dir()).with_length(config.cache.length);
        Arc::new(CachedClient::new(client, cache))
    } else {
        Arc::new(client)
    };
    Ok(Completer::new(client, params, printer))
}

/// State shared by the prompt-handling modes of one invocation.
struct Session<'a> {
    completer: Completer,
    roles: &'a RoleStore,
    chats: &'a ChatSessionStore,
    printer: Arc<dyn Printer>,
    shell: Arc<dyn ShellRunner>,
    config: &'a AppConfig,
    args: &'a CliArgs,
}

impl Session<'_> {
    async fn dispatch(
        &self,
        role: Role,
        prompt: String,
        piped: Option<&PipedInput>,
    ) -> anyhow::Result<()> {
        let has_tail = piped.is_some_and(|p| p.has_tail);
        if let Some(path) = &self.args.batch {
            return self.batch(path, role).await;
        }
        if let Some(id) = &self.args.repl {
            return self.repl(SessionKey::new(id.as_str()), role, &prompt, has_tail).await;
        }
        if prompt.trim().is_empty() {
            return Err(SgptError::Usage(
                "Missing prompt. Pass it as an argument, through stdin, --editor or --file."
                    .to_string(),
            )
            .into());
        }

        let interactive = role.is_shell() && self.args.interaction(self.config.shell.interaction);
        let completion = match &self.args.chat {
            Some(id) => {
                let mut handler = self.chat_handler(SessionKey::new(id.as_str()), role)?;
                handler.handle(&prompt).await?
            }
            None => {
                let mut handler = DefaultHandler::new(self.completer.clone(), role);
                handler.handle(&prompt).await?
            }
        };

        if interactive {
            let mut input = TerminalInput::open(has_tail)?;
            let mut describer = self.describer()?;
            interaction::interact(
                completion,
                &mut input,
                self.shell.as_ref(),
                &mut describer,
                self.config.shell.default_execute,
            )
            .await?;
        }
        Ok(())
    }

    async fn batch(&self, path: &std::path::Path, role: Role) -> anyhow::Result<()> {
        let questions = read_questions(path)?;
        if questions.is_empty() {
            return Err(SgptError::MalformedInput(format!(
                "no questions found in {}",
                path.display()
            ))
            .into());
        }
        self.printer
            .notice(&format!("Loaded {} questions from {}", questions.len(), path.display()));

        let mut processor = BatchProcessor::new(self.args.output.clone());
        let printer = self.printer.as_ref();
        match &self.args.chat {
            Some(id) => {
                let mut handler = self.chat_handler(SessionKey::new(id.as_str()), role)?;
                processor.process(&questions, &mut handler, printer).await;
            }
            None => {
                let mut handler = DefaultHandler::new(self.completer.clone(), role);
                processor.process(&questions, &mut handler, printer).await;
            }
        }
        processor.print_summary(printer);
        let saved = processor.save(self.args.output_format)?;
        self.printer
            .notice(&format!("Results saved to {}", saved.display()));
        Ok(())
    }

    async fn repl(
        &self,
        key: SessionKey,
        role: Role,
        init_prompt: &str,
        has_tail: bool,
    ) -> anyhow::Result<()> {
        let handler = self.chat_handler(key, role)?;
        let kind = handler.role().kind();
        let history = if handler.is_initiated() {
            handler.session().messages().to_vec()
        } else {
            Vec::new()
        };
        let mut repl = ReplLoop::new(handler, kind, self.shell.clone(), self.printer.clone())
            .with_describer(Box::new(self.describer()?))
            .with_history(history);
        let mut input = TerminalInput::open(has_tail)?;
        repl.run(init_prompt, &mut input).await?;
        Ok(())
    }

    fn chat_handler(&self, key: SessionKey, role: Role) -> Result<ChatHandler, SgptError> {
        ChatHandler::open(
            self.completer.clone(),
            self.chats.clone(),
            key,
            role,
            self.roles,
        )
    }

    fn describer(&self) -> Result<DefaultHandler, SgptError> {
        let role = self.roles.get_kind(&RoleKind::DescribeShell)?;
        Ok(DefaultHandler::new(self.completer.clone(), role))
    }
}
