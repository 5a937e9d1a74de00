//! Prompt handlers: one-shot and session-bound completion paths.

use std::sync::Arc;

use async_trait::async_trait;
use log::debug;

use crate::chat::{CompletionClient, CompletionParams, CompletionRequest, Message};
use crate::error::SgptError;
use crate::render::Printer;
use crate::role::{Role, RoleKind, RoleStore};
use crate::session::{ChatSession, ChatSessionStore, SessionKey};

/// Turns a prompt into a rendered completion.
#[async_trait]
pub trait PromptHandler: Send {
    /// Sends `prompt`, prints the answer and returns its text.
    async fn handle(&mut self, prompt: &str) -> Result<String, SgptError>;
}

/// Client, sampling parameters and output shared by the handlers of one run.
#[derive(Clone)]
pub struct Completer {
    client: Arc<dyn CompletionClient>,
    params: CompletionParams,
    printer: Arc<dyn Printer>,
}

impl Completer {
    pub fn new(
        client: Arc<dyn CompletionClient>,
        params: CompletionParams,
        printer: Arc<dyn Printer>,
    ) -> Self {
        Self {
            client,
            params,
            printer,
        }
    }

    pub fn params(&self) -> &CompletionParams {
        &self.params
    }

    pub fn printer(&self) -> &Arc<dyn Printer> {
        &self.printer
    }

    /// Same client and output, but the model is offered no functions.
    pub fn without_functions(&self) -> Self {
        let mut params = self.params.clone();
        params.functions.clear();
        Self {
            params,
            ..self.clone()
        }
    }

    /// Functions stay on offer only for the general-purpose roles.
    pub fn for_role(&self, role: &Role) -> Self {
        match role.kind() {
            RoleKind::Default | RoleKind::Custom(_) => self.clone(),
            _ => self.without_functions(),
        }
    }

    async fn complete(&self, messages: Vec<Message>, role: &Role) -> Result<String, SgptError> {
        let request = CompletionRequest::new(messages, self.params.clone());
        let text = self.client.complete(&request).await?;
        self.printer.completion(&text, role.applies_markdown());
        Ok(text)
    }
}

/// Sends the role's system message and the prompt, nothing else.
pub struct DefaultHandler {
    completer: Completer,
    role: Role,
}

impl DefaultHandler {
    pub fn new(completer: Completer, role: Role) -> Self {
        Self {
            completer: completer.for_role(&role),
            role,
        }
    }

    pub fn role(&self) -> &Role {
        &self.role
    }
}

#[async_trait]
impl PromptHandler for DefaultHandler {
    async fn handle(&mut self, prompt: &str) -> Result<String, SgptError> {
        let messages = vec![
            Message::system().content(&self.role.role).build(),
            Message::user().content(prompt).build(),
        ];
        self.completer.complete(messages, &self.role).await
    }
}

/// Continues a persisted chat session, saving every completed round.
pub struct ChatHandler {
    completer: Completer,
    store: ChatSessionStore,
    session: ChatSession,
    role: Role,
}

impl ChatHandler {
    /// Opens the session under `key`.
    ///
    /// The `temp` session is discarded first, so it never outlives one
    /// invocation. When `role` is the default role and the session was
    /// started under another one, that role is picked up from `roles`;
    /// any other mismatch fails with [`SgptError::RoleMismatch`].
    pub fn open(
        completer: Completer,
        store: ChatSessionStore,
        key: SessionKey,
        role: Role,
        roles: &RoleStore,
    ) -> Result<Self, SgptError> {
        if key.is_temp() {
            store.invalidate(&key)?;
        }
        let role = match recorded_role(&store, &key)? {
            Some(name) if role.kind() == RoleKind::Default && name != role.name => {
                debug!("chat {key} continues with its role \"{name}\"");
                roles.get(&name)?
            }
            _ => role,
        };
        let session = store.load(&key, &role)?;
        Ok(Self {
            completer: completer.for_role(&role),
            store,
            session,
            role,
        })
    }

    pub fn session(&self) -> &ChatSession {
        &self.session
    }

    pub fn role(&self) -> &Role {
        &self.role
    }

    /// True when the session had history before this handler opened it.
    pub fn is_initiated(&self) -> bool {
        self.session.is_initiated()
    }
}

fn recorded_role(store: &ChatSessionStore, key: &SessionKey) -> Result<Option<String>, SgptError> {
    if !store.exists(key) {
        return Ok(None);
    }
    let messages = store.read(key)?;
    Ok(messages
        .first()
        .and_then(|msg| Role::name_in(&msg.content))
        .map(str::to_string))
}

#[async_trait]
impl PromptHandler for ChatHandler {
    async fn handle(&mut self, prompt: &str) -> Result<String, SgptError> {
        let user = Message::user().content(prompt).build();
        let history = self.session.request_history(&user);
        let text = self.completer.complete(history, &self.role).await?;
        let assistant = Message::assistant().content(&text).build();
        self.store.append_round(&mut self.session, user, assistant)?;
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::MessageRole;
    use crate::platform::PlatformContext;
    use crate::testing::{RecordingPrinter, ScriptedClient};

    struct Fixture {
        _dir: tempfile::TempDir,
        roles: RoleStore,
        store: ChatSessionStore,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let roles = RoleStore::new(dir.path().join("roles"));
        roles
            .initialize_defaults(&PlatformContext {
                os: "Linux".to_string(),
                shell: "bash".to_string(),
            })
            .unwrap();
        let store = ChatSessionStore::new(dir.path().join("chats"));
        Fixture {
            _dir: dir,
            roles,
            store,
        }
    }

    fn completer(client: &ScriptedClient, printer: &RecordingPrinter) -> Completer {
        Completer::new(
            Arc::new(client.clone()),
            CompletionParams::new("gpt-4o"),
            Arc::new(printer.clone()),
        )
    }

    #[tokio::test]
    async fn default_handler_sends_system_and_user() {
        let fx = fixture();
        let client = ScriptedClient::new(["ls -la"]);
        let printer = RecordingPrinter::default();
        let role = fx.roles.get_kind(&RoleKind::ShellCommand).unwrap();
        let mut handler = DefaultHandler::new(completer(&client, &printer), role);

        assert_eq!(handler.handle("list files").await.unwrap(), "ls -la");
        let request = &client.requests()[0];
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0].role, MessageRole::System);
        assert!(request.messages[0].content.starts_with("You are Shell Command Generator"));
        assert_eq!(printer.lines(), vec!["text: ls -la"]);
    }

    #[test]
    fn functions_are_dropped_for_builtin_task_roles() {
        let fx = fixture();
        let client = ScriptedClient::new(Vec::<String>::new());
        let printer = RecordingPrinter::default();
        let mut params = CompletionParams::new("gpt-4o");
        params.functions = crate::functions::FunctionsFile::defaults()
            .functions
            .iter()
            .map(|f| f.schema())
            .collect();
        let completer = Completer::new(Arc::new(client), params, Arc::new(printer));

        let shell = fx.roles.get_kind(&RoleKind::ShellCommand).unwrap();
        assert!(completer.for_role(&shell).params().functions.is_empty());
        let custom = Role::new("Poet", "Rhyme.", None);
        assert_eq!(completer.for_role(&custom).params().functions.len(), 1);
    }

    #[tokio::test]
    async fn markdown_roles_render_as_markdown() {
        let fx = fixture();
        let client = ScriptedClient::new(["**hi**"]);
        let printer = RecordingPrinter::default();
        let role = fx.roles.get_kind(&RoleKind::Default).unwrap();
        let mut handler = DefaultHandler::new(completer(&client, &printer), role);

        handler.handle("hello").await.unwrap();
        assert_eq!(printer.lines(), vec!["md: **hi**"]);
    }

    #[tokio::test]
    async fn chat_handler_sends_history_and_persists_rounds() {
        let fx = fixture();
        let client = ScriptedClient::new(["one", "two"]);
        let printer = RecordingPrinter::default();
        let role = fx.roles.get_kind(&RoleKind::Default).unwrap();
        let key = SessionKey::new("work");
        let mut handler = ChatHandler::open(
            completer(&client, &printer),
            fx.store.clone(),
            key.clone(),
            role,
            &fx.roles,
        )
        .unwrap();
        assert!(!handler.is_initiated());

        handler.handle("first").await.unwrap();
        handler.handle("second").await.unwrap();

        assert_eq!(client.requests()[1].messages.len(), 4);
        assert_eq!(fx.store.read(&key).unwrap().len(), 5);
        assert!(handler.is_initiated());
    }

    #[tokio::test]
    async fn failed_completion_leaves_session_untouched() {
        let fx = fixture();
        let client = ScriptedClient::with_results([Err("timeout".to_string())]);
        let printer = RecordingPrinter::default();
        let role = fx.roles.get_kind(&RoleKind::Default).unwrap();
        let key = SessionKey::new("work");
        let mut handler = ChatHandler::open(
            completer(&client, &printer),
            fx.store.clone(),
            key.clone(),
            role,
            &fx.roles,
        )
        .unwrap();

        let err = handler.handle("first").await.unwrap_err();
        assert!(matches!(err, SgptError::CompletionFailed(_)));
        assert!(!fx.store.exists(&key));
    }

    #[tokio::test]
    async fn default_role_adopts_the_session_role() {
        let fx = fixture();
        let client = ScriptedClient::new(["ls", "pwd"]);
        let printer = RecordingPrinter::default();
        let key = SessionKey::new("shell");
        let shell = fx.roles.get_kind(&RoleKind::ShellCommand).unwrap();
        ChatHandler::open(
            completer(&client, &printer),
            fx.store.clone(),
            key.clone(),
            shell,
            &fx.roles,
        )
        .unwrap()
        .handle("list")
        .await
        .unwrap();

        let default = fx.roles.get_kind(&RoleKind::Default).unwrap();
        let handler = ChatHandler::open(
            completer(&client, &printer),
            fx.store.clone(),
            key,
            default,
            &fx.roles,
        )
        .unwrap();
        assert!(handler.role().is_shell());
        assert!(handler.is_initiated());
    }

    #[tokio::test]
    async fn explicit_role_switch_is_rejected() {
        let fx = fixture();
        let client = ScriptedClient::new(["ls"]);
        let printer = RecordingPrinter::default();
        let key = SessionKey::new("shell");
        let shell = fx.roles.get_kind(&RoleKind::ShellCommand).unwrap();
        ChatHandler::open(
            completer(&client, &printer),
            fx.store.clone(),
            key.clone(),
            shell,
            &fx.roles,
        )
        .unwrap()
        .handle("list")
        .await
        .unwrap();

        let code = fx.roles.get_kind(&RoleKind::Code).unwrap();
        let result = ChatHandler::open(
            completer(&client, &printer),
            fx.store.clone(),
            key,
            code,
            &fx.roles,
        );
        assert!(matches!(result, Err(SgptError::RoleMismatch { .. })));
    }

    #[tokio::test]
    async fn temp_session_starts_fresh_each_time() {
        let fx = fixture();
        let client = ScriptedClient::new(["a"]);
        let printer = RecordingPrinter::default();
        let role = fx.roles.get_kind(&RoleKind::Default).unwrap();
        let mut handler = ChatHandler::open(
            completer(&client, &printer),
            fx.store.clone(),
            SessionKey::temp(),
            role.clone(),
            &fx.roles,
        )
        .unwrap();
        handler.handle("remember me").await.unwrap();

        let handler = ChatHandler::open(
            completer(&client, &printer),
            fx.store.clone(),
            SessionKey::temp(),
            role,
            &fx.roles,
        )
        .unwrap();
        assert!(!handler.is_initiated());
        assert_eq!(handler.session().messages().len(), 1);
    }
}
