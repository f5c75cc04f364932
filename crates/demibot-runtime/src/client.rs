//! The client: connection callbacks, routing and rehash.
//!
//! [`Client`] implements [`ConnectionHandler`]. The transport drives it:
//!
//! ```text
//! on_connected ──▶ Session created, chat log opened, "Connected at …"
//! on_signed_on ──▶ NickServ IDENTIFY, channels joined
//! on_message   ──▶ normalize ─┬─▶ built-in (inline)
//!                             ├─▶ plugin commands (one task each)
//!                             └─▶ privmsg handlers (one task each)
//! on_disconnected ──▶ "Disconnected at …", chat log closed, Session dropped
//! ```
//!
//! Between `on_disconnected` and the next `on_connected` the client is inert:
//! inbound events are ignored.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

use demibot_core::{
    BoxedTransport, ChatLogBackend, ConnectionHandler, EventKind, FileChatLog, TransportResult,
    timestamp,
};
use demibot_framework::{
    CommandLine, Dispatcher, Executor, Invocation, ModuleCatalog, ModuleSource, Outbox,
    PluginRegistry,
};

use crate::auth::{AdminList, Authorizer};
use crate::builtins::{Builtin, BuiltinCall};
use crate::chatlog::ChatLog;
use crate::config::{BotConfig, ConfigSource, validate_config};
use crate::error::ClientResult;
use crate::rehash::{RehashError, RehashResult, RehashStep, Rehasher};
use crate::session::{Session, SessionSettings};

// =============================================================================
// SessionOutbox
// =============================================================================

/// Replies go through the session's formatter to the transport.
struct SessionOutbox {
    transport: BoxedTransport,
    session: Arc<Session>,
}

#[async_trait]
impl Outbox for SessionOutbox {
    fn nickname(&self) -> String {
        self.session.nickname()
    }

    async fn say(&self, target: &str, text: &str) -> TransportResult<()> {
        let formatter = self.session.formatter();
        formatter
            .send(self.transport.as_ref(), target, text)
            .await
            .map(|_| ())
    }
}

// =============================================================================
// ClientBuilder
// =============================================================================

/// Builder for [`Client`].
///
/// ```rust,ignore
/// let client = Client::builder(transport, config)
///     .config_source(FileConfigSource::new("demibot.toml"))
///     .modules(ModuleCatalog::new().with(&GREET))
///     .build()?;
/// client.connect().await?;
/// ```
pub struct ClientBuilder {
    transport: BoxedTransport,
    config: BotConfig,
    config_source: Option<Arc<dyn ConfigSource>>,
    modules: Option<Arc<dyn ModuleSource>>,
    authorizer: Option<Arc<dyn Authorizer>>,
    chatlog_backend: Option<Arc<dyn ChatLogBackend>>,
    executor: Option<Executor>,
}

impl ClientBuilder {
    /// Where `rehash conf` reads the configuration from. Defaults to the
    /// initial configuration itself.
    pub fn config_source(mut self, source: impl ConfigSource + 'static) -> Self {
        self.config_source = Some(Arc::new(source));
        self
    }

    /// Where plugin modules come from. Defaults to an empty [`ModuleCatalog`].
    pub fn modules(mut self, source: impl ModuleSource + 'static) -> Self {
        self.modules = Some(Arc::new(source));
        self
    }

    /// Like [`modules`](Self::modules), keeping a handle to the source.
    pub fn shared_modules(mut self, source: Arc<dyn ModuleSource>) -> Self {
        self.modules = Some(source);
        self
    }

    /// Admin check. Defaults to [`AdminList`] built from `admins`.
    pub fn authorizer(mut self, authorizer: impl Authorizer + 'static) -> Self {
        self.authorizer = Some(Arc::new(authorizer));
        self
    }

    /// Chat log backend. Defaults to [`FileChatLog`].
    pub fn chatlog_backend(mut self, backend: impl ChatLogBackend + 'static) -> Self {
        self.chatlog_backend = Some(Arc::new(backend));
        self
    }

    /// Handler executor. Use [`Executor::with_reports`] to observe task outcomes.
    pub fn executor(mut self, executor: Executor) -> Self {
        self.executor = Some(executor);
        self
    }

    /// Validates the configuration and loads the initial module set.
    pub fn build(self) -> ClientResult<Client> {
        validate_config(&self.config)?;

        let config_source = self
            .config_source
            .unwrap_or_else(|| Arc::new(self.config.clone()));
        let modules = self
            .modules
            .unwrap_or_else(|| Arc::new(ModuleCatalog::new()));
        let authorizer = self
            .authorizer
            .unwrap_or_else(|| Arc::new(AdminList::from_config(&self.config)));
        let chatlog_backend = self
            .chatlog_backend
            .unwrap_or_else(|| Arc::new(FileChatLog));

        let registry = Arc::new(PluginRegistry::new());
        let dispatcher = Dispatcher::new(registry, self.executor.unwrap_or_default());
        dispatcher.set_matching(self.config.bot.command_matching);

        modules.configure(self.config.plugins.enabled.as_deref());
        let loaded = dispatcher
            .registry()
            .reload_from(modules.as_ref(), &self.config.plugins.settings)?;
        info!(modules = ?loaded, "Client ready");

        Ok(Client {
            transport: self.transport,
            config: RwLock::new(self.config),
            config_source,
            modules,
            authorizer,
            chatlog_backend,
            dispatcher,
            rehasher: Rehasher::new(),
            session: RwLock::new(None),
            deferred: TaskTracker::new(),
        })
    }
}

// =============================================================================
// Client
// =============================================================================

/// A demibot client bound to one transport.
pub struct Client {
    transport: BoxedTransport,
    config: RwLock<BotConfig>,
    config_source: Arc<dyn ConfigSource>,
    modules: Arc<dyn ModuleSource>,
    authorizer: Arc<dyn Authorizer>,
    chatlog_backend: Arc<dyn ChatLogBackend>,
    dispatcher: Dispatcher,
    rehasher: Rehasher,
    session: RwLock<Option<Arc<Session>>>,
    deferred: TaskTracker,
}

impl Client {
    pub fn builder(transport: BoxedTransport, config: BotConfig) -> ClientBuilder {
        ClientBuilder {
            transport,
            config,
            config_source: None,
            modules: None,
            authorizer: None,
            chatlog_backend: None,
            executor: None,
        }
    }

    /// Asks the transport to connect with the configured identity.
    pub async fn connect(&self) -> ClientResult<()> {
        let identity = self.config.read().identity.to_identity();
        info!(nickname = %identity.nickname, "Connecting");
        self.transport.connect(&identity).await?;
        Ok(())
    }

    /// The live session, if connected.
    pub fn session(&self) -> Option<Arc<Session>> {
        self.session.read().clone()
    }

    /// The current configuration.
    pub fn config(&self) -> BotConfig {
        self.config.read().clone()
    }

    pub fn registry(&self) -> &Arc<PluginRegistry> {
        self.dispatcher.registry()
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn rehasher(&self) -> &Rehasher {
        &self.rehasher
    }

    pub fn authorizer(&self) -> &dyn Authorizer {
        self.authorizer.as_ref()
    }

    /// Waits for every handler task and deferred reply submitted so far.
    pub async fn wait_idle(&self) {
        self.dispatcher.executor().wait_idle().await;
        self.deferred.close();
        self.deferred.wait().await;
        self.deferred.reopen();
    }

    fn outbox(&self, session: &Arc<Session>) -> Arc<dyn Outbox> {
        Arc::new(SessionOutbox {
            transport: Arc::clone(&self.transport),
            session: Arc::clone(session),
        })
    }

    /// Schedules `text` for `target` after `delay`. Dropped if the session
    /// ends first.
    pub(crate) fn defer(
        &self,
        session: &Arc<Session>,
        outbox: Arc<dyn Outbox>,
        target: String,
        delay: Duration,
        text: String,
    ) {
        let shutdown = session.shutdown_token().clone();
        debug!(target = %target, delay_secs = delay.as_secs(), "Deferred reply scheduled");
        self.deferred.spawn(async move {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    debug!(target = %target, "Deferred reply cancelled");
                }
                _ = tokio::time::sleep(delay) => {
                    if let Err(e) = outbox.say(&target, &text).await {
                        warn!(target = %target, error = %e, "Failed to send deferred reply");
                    }
                }
            }
        });
    }

    /// Pushes `config` into everything that caches a piece of it.
    fn apply_config(&self, session: &Session, config: &BotConfig) {
        session.apply_settings(SessionSettings::from_config(config));
        self.authorizer.refresh(config);
        self.dispatcher.set_matching(config.bot.command_matching);
        self.modules.configure(config.plugins.enabled.as_deref());
    }

    /// Runs a rehash. The caller has already checked admin rights.
    ///
    /// Steps abort at the first failure; earlier steps are not rolled back.
    pub async fn rehash(
        &self,
        session: &Arc<Session>,
        outbox: &Arc<dyn Outbox>,
        target: &str,
        reload_config: bool,
    ) -> RehashResult<()> {
        let ticket = self.rehasher.begin()?;
        info!(reload_config, "Rehash started");

        let outcome = self.run_rehash(session, outbox, target, reload_config).await;
        match &outcome {
            Ok(()) => info!("Rehash finished"),
            Err(e) => error!(step = %e.step, cause = %e.cause, "Rehash failed"),
        }
        ticket.finish(outcome)
    }

    async fn run_rehash(
        &self,
        session: &Arc<Session>,
        outbox: &Arc<dyn Outbox>,
        target: &str,
        reload_config: bool,
    ) -> RehashResult<()> {
        let current = self.config();
        self.apply_config(session, &current);
        debug!(step = %RehashStep::RefreshSession, "Rehash step done");

        if reload_config {
            let config = self
                .config_source
                .reload_config()
                .map_err(|e| RehashError::new(RehashStep::ReloadConfig, e))?;
            self.apply_config(session, &config);
            *self.config.write() = config;
            if let Err(e) = outbox.say(target, "Configuration reloaded.").await {
                warn!(target = %target, error = %e, "Failed to send rehash progress");
            }
            debug!(step = %RehashStep::ReloadConfig, "Rehash step done");
        }

        let available = self
            .modules
            .available()
            .map_err(|e| RehashError::new(RehashStep::UnloadRemoved, e))?;
        let removed = self.registry().retain_available(&available);
        debug!(step = %RehashStep::UnloadRemoved, ?removed, "Rehash step done");

        let settings = self.config.read().plugins.settings.clone();
        let loaded = self
            .registry()
            .reload_from(self.modules.as_ref(), &settings)
            .map_err(|e| RehashError::new(RehashStep::ReloadModules, e))?;
        debug!(step = %RehashStep::ReloadModules, ?loaded, "Rehash step done");

        Ok(())
    }

    /// Cancels the session's deferred replies and closes its chat log.
    fn end_session(&self, session: &Session) {
        session.shutdown_token().cancel();
        session
            .chatlog()
            .finish(&format!("Disconnected at {}", timestamp()));
    }

    /// Broadcasts an event to every handler registered for `kind`.
    fn broadcast(&self, session: &Arc<Session>, kind: EventKind, user: &str, target: &str, text: &str) {
        let outbox = self.outbox(session);
        self.dispatcher
            .dispatch(&outbox, Invocation::event(kind, user, target, text));
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("session", &self.session())
            .field("dispatcher", &self.dispatcher)
            .field("rehash", &self.rehasher.state())
            .finish_non_exhaustive()
    }
}

// =============================================================================
// ConnectionHandler
// =============================================================================

#[async_trait]
impl ConnectionHandler for Client {
    async fn on_connected(&self) {
        let stale = self.session.write().take();
        if let Some(stale) = stale {
            debug!("Replacing a session that never saw a disconnect");
            self.end_session(&stale);
        }

        let config = self.config();
        let backend = Arc::clone(&self.chatlog_backend);
        let chatlog = match ChatLog::open(Arc::clone(&backend), &config.bot.logfile) {
            Ok(chatlog) => chatlog,
            Err(e) => {
                warn!(error = %e, "Chat log unavailable, logging disabled");
                ChatLog::disabled(backend, &config.bot.logfile)
            }
        };
        chatlog.record(&format!("Connected at {}", timestamp()));

        let session = Arc::new(Session::new(
            config.identity.to_identity(),
            SessionSettings::from_config(&config),
            chatlog,
        ));
        *self.session.write() = Some(session);
        info!(server = %config.network.server, "Connected");
    }

    async fn on_signed_on(&self) {
        let Some(session) = self.session() else {
            warn!("Signed on without a session");
            return;
        };
        let settings = session.settings();

        if let Some(password) = &settings.nickserv_password {
            let identify = format!("IDENTIFY {password}");
            if let Err(e) = self.transport.send("NickServ", &identify).await {
                warn!(error = %e, "Failed to identify with NickServ");
            }
        }

        for channel in &settings.channels {
            match self.transport.join(channel).await {
                Ok(()) => {
                    session.mark_joined(channel);
                    session
                        .chatlog()
                        .record(&format!("Joined {channel} on {}", settings.server));
                    info!(channel = %channel, "Joined channel");
                }
                Err(e) => warn!(channel = %channel, error = %e, "Failed to join channel"),
            }
        }
    }

    async fn on_disconnected(&self, reason: &str) {
        let Some(session) = self.session.write().take() else {
            debug!(reason, "Disconnected without a session");
            return;
        };
        self.end_session(&session);
        info!(reason, "Disconnected");
    }

    async fn on_message(&self, user: &str, target: &str, text: &str) {
        let Some(session) = self.session() else {
            debug!(user, target, "Ignoring message without a session");
            return;
        };
        let normalized = session.normalize(user, target, text);
        let reply_target = normalized.reply_target.as_str();
        let outbox = self.outbox(&session);
        let prefix = session.prefix();

        if let Some(command) = CommandLine::parse(&normalized.text, &prefix) {
            let args = command.args.trim();
            match Builtin::lookup(command.name) {
                Some(builtin) => {
                    builtin
                        .run(BuiltinCall {
                            client: self,
                            session: &session,
                            outbox: &outbox,
                            user,
                            target: reply_target,
                            args,
                        })
                        .await;
                }
                None => {
                    let dispatched = self.dispatcher.dispatch(
                        &outbox,
                        Invocation::command(user, reply_target, command.name, args),
                    );
                    if dispatched == 0 {
                        debug!(command = command.name, "No handler for command");
                    }
                }
            }
        }

        self.dispatcher.dispatch(
            &outbox,
            Invocation::event(EventKind::Message, user, reply_target, normalized.text.as_str()),
        );
    }

    async fn on_notice(&self, user: &str, target: &str, text: &str) {
        let Some(session) = self.session() else {
            return;
        };
        let reply_target = session.reply_target(user, target);
        self.broadcast(&session, EventKind::Notice, user, &reply_target, text);
    }

    async fn on_action(&self, user: &str, target: &str, text: &str) {
        let Some(session) = self.session() else {
            return;
        };
        let reply_target = session.reply_target(user, target);
        self.broadcast(&session, EventKind::Action, user, &reply_target, text);
    }

    async fn on_nickname_collision(&self) {
        let Some(session) = self.session() else {
            warn!("Nickname collision without a session");
            return;
        };
        let Some(nickname) = session.next_nickname() else {
            error!(nickname = %session.nickname(), "Nickname retries exhausted");
            return;
        };
        if let Err(e) = self.transport.set_nick(&nickname).await {
            warn!(nickname = %nickname, error = %e, "Failed to request new nickname");
        }
    }

    async fn on_nick_changed(&self, old: &str, new: &str) {
        let Some(session) = self.session() else {
            return;
        };
        session.nick_changed(old, new);
        self.broadcast(&session, EventKind::NickChanged, old, new, new);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use serde_json::Value;
    use tokio::sync::mpsc::UnboundedReceiver;

    use demibot_framework::{
        BoxError, HandlerContext, LoadError, LoadResult, ModuleDescriptor, PluginModule,
        TaskReport, define_module, handler,
    };

    use super::*;
    use crate::testing::{MemoryChatLog, MockTransport};

    async fn hello(ctx: HandlerContext) -> Result<String, BoxError> {
        Ok(format!("{}, hello", ctx.nick()))
    }

    async fn shadow_ping(_ctx: HandlerContext) -> Result<String, BoxError> {
        Ok("plugin pong".to_string())
    }

    async fn seen(ctx: HandlerContext) -> Result<String, BoxError> {
        Ok(format!("seen: {}", ctx.text()))
    }

    async fn echo_payload(ctx: HandlerContext) -> Result<String, BoxError> {
        Ok(format!("{}|{}|{}", ctx.user(), ctx.target(), ctx.text()))
    }

    static HELLO: ModuleDescriptor = define_module! {
        name: "hello",
        commands: {
            "hello" => handler(hello),
            "ping" => handler(shadow_ping),
        },
    };

    static ALPHA: ModuleDescriptor = define_module! { name: "alpha" };

    static WATCH: ModuleDescriptor = define_module! {
        name: "watch",
        events: { Message => handler(seen) },
    };

    static ECHO_EVENTS: ModuleDescriptor = define_module! {
        name: "echo_events",
        events: {
            Notice => handler(echo_payload),
            Action => handler(echo_payload),
            NickChanged => handler(echo_payload),
        },
    };

    /// A source whose listing can be made to fail.
    #[derive(Default)]
    struct FlakySource {
        failing: AtomicBool,
        loads: AtomicUsize,
    }

    impl ModuleSource for FlakySource {
        fn available(&self) -> LoadResult<Vec<String>> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(LoadError::Source("disk on fire".to_string()));
            }
            Ok(vec!["alpha".to_string()])
        }

        fn load(&self, name: &str, config: Arc<Value>) -> LoadResult<PluginModule> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            match name {
                "alpha" => ALPHA.instantiate(config),
                other => Err(LoadError::NotFound(other.to_string())),
            }
        }
    }

    struct Harness {
        client: Client,
        transport: Arc<MockTransport>,
        chatlog: MemoryChatLog,
        reports: UnboundedReceiver<TaskReport>,
    }

    fn bot_config() -> BotConfig {
        let mut config = BotConfig::default();
        config.identity.nickname = "bot".to_string();
        config.network.channels = vec!["#x".to_string()];
        config.admins = vec!["root".to_string()];
        config
    }

    fn harness(config: BotConfig, modules: Arc<dyn ModuleSource>) -> Harness {
        harness_with(config, modules, |builder| builder)
    }

    fn harness_with(
        config: BotConfig,
        modules: Arc<dyn ModuleSource>,
        customize: impl FnOnce(ClientBuilder) -> ClientBuilder,
    ) -> Harness {
        let transport = MockTransport::new();
        let chatlog = MemoryChatLog::default();
        let (executor, reports) = Executor::with_reports();
        let builder = Client::builder(transport.clone(), config)
            .shared_modules(modules)
            .chatlog_backend(chatlog.clone())
            .executor(executor);
        let client = customize(builder).build().unwrap();
        Harness {
            client,
            transport,
            chatlog,
            reports,
        }
    }

    async fn connected(config: BotConfig, modules: ModuleCatalog) -> Harness {
        let h = harness(config, Arc::new(modules));
        h.client.on_connected().await;
        h
    }

    #[tokio::test]
    async fn test_ping_replies_in_channel() {
        let h = connected(bot_config(), ModuleCatalog::new()).await;
        h.client.on_message("alice!a@host", "#x", ".ping").await;
        assert_eq!(
            h.transport.sent(),
            vec![("#x".to_string(), "alice, Pong".to_string())]
        );
    }

    #[tokio::test]
    async fn test_private_ping_replies_to_sender() {
        let h = connected(bot_config(), ModuleCatalog::new()).await;
        h.client.on_message("alice!a@host", "bot", "ping").await;
        assert_eq!(
            h.transport.sent(),
            vec![("alice".to_string(), "alice, Pong".to_string())]
        );
    }

    #[tokio::test]
    async fn test_mention_routes_to_plugin_command() {
        let h = connected(bot_config(), ModuleCatalog::new().with(&HELLO)).await;
        h.client.on_message("alice!a@host", "#x", "bot: hello").await;
        h.client.wait_idle().await;
        assert_eq!(
            h.transport.sent(),
            vec![("#x".to_string(), "alice, hello".to_string())]
        );
    }

    #[tokio::test]
    async fn test_builtin_shadows_plugin_command() {
        let mut h = connected(bot_config(), ModuleCatalog::new().with(&HELLO)).await;
        h.client.on_message("alice!a@host", "#x", ".ping").await;
        h.client.wait_idle().await;

        assert_eq!(h.transport.texts(), vec!["alice, Pong"]);
        assert!(h.reports.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_plain_message_reaches_event_handlers() {
        let mut h = connected(bot_config(), ModuleCatalog::new().with(&WATCH)).await;
        h.client.on_message("alice!a@host", "#x", "hi there").await;
        h.client.wait_idle().await;

        assert_eq!(
            h.transport.sent(),
            vec![("#x".to_string(), "seen: hi there".to_string())]
        );
        let report = h.reports.try_recv().unwrap();
        assert_eq!(report.module, "watch");
        assert_eq!(report.handler, "handle_privmsg");
    }

    #[tokio::test]
    async fn test_channel_notice_replies_to_channel() {
        let mut h = connected(bot_config(), ModuleCatalog::new().with(&ECHO_EVENTS)).await;
        h.client.on_notice("alice!a@h", "#x", "bot: n1").await;
        h.client.wait_idle().await;

        assert_eq!(
            h.transport.sent(),
            vec![("#x".to_string(), "alice!a@h|#x|bot: n1".to_string())]
        );
        assert_eq!(h.reports.try_recv().unwrap().handler, "handle_noticed");
    }

    #[tokio::test]
    async fn test_private_action_replies_to_sender() {
        let mut h = connected(bot_config(), ModuleCatalog::new().with(&ECHO_EVENTS)).await;
        h.client.on_action("alice!a@h", "bot", "waves").await;
        h.client.wait_idle().await;

        assert_eq!(
            h.transport.sent(),
            vec![("alice".to_string(), "alice!a@h|alice!a@h|waves".to_string())]
        );
        assert_eq!(h.reports.try_recv().unwrap().handler, "handle_action");
    }

    #[tokio::test]
    async fn test_nick_change_broadcasts_old_and_new() {
        let mut h = connected(bot_config(), ModuleCatalog::new().with(&ECHO_EVENTS)).await;
        h.client.on_nick_changed("alice", "alicia").await;
        h.client.wait_idle().await;

        assert_eq!(
            h.transport.sent(),
            vec![("alicia".to_string(), "alice|alicia|alicia".to_string())]
        );
        assert_eq!(h.reports.try_recv().unwrap().handler, "handle_nick");
        assert_eq!(h.client.session().unwrap().nickname(), "bot");
    }

    #[tokio::test]
    async fn test_logs_toggle() {
        let h = connected(bot_config(), ModuleCatalog::new()).await;
        h.client.on_message("alice!a@host", "#x", ".logs").await;
        h.client.on_message("alice!a@host", "#x", ".logs off").await;
        h.client.on_message("alice!a@host", "#x", ".logs off").await;
        h.client.on_message("alice!a@host", "#x", ".logs on").await;

        assert_eq!(
            h.transport.texts(),
            vec![
                "logs are enabled. Use .logs off to disable logging.",
                "logs are now disabled.",
                "logs are disabled. Use .logs on to enable logging.",
                "logs are now enabled.",
            ]
        );
        assert!(h.chatlog.lines()[0].starts_with("Connected at "));
    }

    #[tokio::test]
    async fn test_rehash_from_non_admin_is_silent() {
        let h = connected(bot_config(), ModuleCatalog::new().with(&HELLO)).await;
        h.client.on_message("mallory!m@host", "#x", ".rehash").await;

        assert!(h.transport.sent().is_empty());
        assert_eq!(h.client.registry().names(), vec!["hello"]);
        assert!(h.client.rehasher().last_outcome().is_none());
    }

    #[tokio::test]
    async fn test_rehash_reloads_modules() {
        let h = connected(bot_config(), ModuleCatalog::new().with(&HELLO)).await;
        let before = h.client.registry().get("hello").unwrap();

        h.client.on_message("root!r@host", "#x", ".rehash").await;

        assert_eq!(h.transport.texts(), vec!["Rehash OK"]);
        let after = h.client.registry().get("hello").unwrap();
        assert!(!Arc::ptr_eq(&before, &after));
        assert_eq!(h.client.rehasher().last_outcome(), Some(Ok(())));
    }

    #[tokio::test]
    async fn test_rehash_aborts_when_source_fails() {
        let source = Arc::new(FlakySource::default());
        let h = harness(bot_config(), source.clone());
        h.client.on_connected().await;
        assert_eq!(source.loads.load(Ordering::SeqCst), 1);

        source.failing.store(true, Ordering::SeqCst);
        h.client.on_message("root!r@host", "#x", ".rehash").await;

        assert_eq!(
            h.transport.texts(),
            vec!["Rehash error: module source unavailable: disk on fire"]
        );
        assert_eq!(source.loads.load(Ordering::SeqCst), 1);
        assert_eq!(h.client.registry().names(), vec!["alpha"]);

        let err = h.client.rehasher().last_outcome().unwrap().unwrap_err();
        assert_eq!(err.step, RehashStep::UnloadRemoved);
    }

    #[tokio::test]
    async fn test_rehash_conf_applies_new_config() {
        let mut updated = bot_config();
        updated.bot.prefix = "!".to_string();
        updated.plugins.enabled = Some(vec!["hello".to_string()]);

        let modules = ModuleCatalog::new().with(&HELLO).with(&ALPHA);
        let h = harness_with(bot_config(), Arc::new(modules), |builder| {
            builder.config_source(updated)
        });
        h.client.on_connected().await;
        assert_eq!(h.client.registry().names(), vec!["alpha", "hello"]);

        h.client.on_message("root!r@host", "#x", ".rehash conf").await;
        assert_eq!(
            h.transport.texts(),
            vec!["Configuration reloaded.", "Rehash OK"]
        );
        assert_eq!(h.client.registry().names(), vec!["hello"]);
        assert_eq!(h.client.config().bot.prefix, "!");

        h.client.on_message("root!r@host", "#x", "!ping").await;
        assert_eq!(h.transport.texts().last().unwrap(), "root, Pong");
    }

    #[tokio::test]
    async fn test_nickname_collision_appends_suffix() {
        let mut config = bot_config();
        config.bot.max_nick_retries = Some(2);
        let h = connected(config, ModuleCatalog::new()).await;

        for _ in 0..3 {
            h.client.on_nickname_collision().await;
        }
        assert_eq!(*h.transport.nicks.lock(), vec!["bot_", "bot__"]);
    }

    #[tokio::test]
    async fn test_nick_change_updates_addressing() {
        let h = connected(bot_config(), ModuleCatalog::new()).await;
        h.client.on_nick_changed("bot", "demi").await;
        h.client.on_message("alice!a@host", "#x", "demi: ping").await;

        assert_eq!(h.transport.texts(), vec!["alice, Pong"]);
        assert!(h.chatlog.contains("bot is now known as demi"));
    }

    #[tokio::test]
    async fn test_signed_on_identifies_and_joins() {
        let mut config = bot_config();
        config.network.server = "irc.example.org".to_string();
        config.network.channels = vec!["#x".to_string(), "#y".to_string()];
        config.network.nickserv_password = Some("hunter2".to_string());
        let h = connected(config, ModuleCatalog::new()).await;

        h.client.on_signed_on().await;

        assert_eq!(
            h.transport.sent(),
            vec![("NickServ".to_string(), "IDENTIFY hunter2".to_string())]
        );
        assert_eq!(*h.transport.joins.lock(), vec!["#x", "#y"]);
        let session = h.client.session().unwrap();
        assert_eq!(session.channels(), vec!["#x", "#y"]);
        assert!(h.chatlog.contains("Joined #y on irc.example.org"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_fires_after_delay() {
        let h = connected(bot_config(), ModuleCatalog::new()).await;
        h.client
            .on_message("alice!a@host", "#x", ".timer 5 tea is ready")
            .await;

        tokio::time::sleep(Duration::from_secs(4)).await;
        assert!(h.transport.sent().is_empty());

        h.client.wait_idle().await;
        assert_eq!(
            h.transport.sent(),
            vec![("#x".to_string(), "alice, tea is ready".to_string())]
        );
    }

    #[tokio::test]
    async fn test_timer_with_bad_delay() {
        let h = connected(bot_config(), ModuleCatalog::new()).await;
        h.client.on_message("alice!a@host", "#x", ".timer soon tea").await;
        assert_eq!(h.transport.texts(), vec!["alice, 'soon' is not a valid delay"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disconnect_cancels_timers_and_goes_inert() {
        let h = connected(bot_config(), ModuleCatalog::new()).await;
        h.client.on_message("alice!a@host", "#x", ".timer 5 tea").await;

        h.client.on_disconnected("bye").await;
        h.client.wait_idle().await;
        h.client.on_message("alice!a@host", "#x", ".ping").await;

        assert!(h.transport.sent().is_empty());
        assert!(h.client.session().is_none());
        assert!(h.chatlog.lines().last().unwrap().starts_with("Disconnected at "));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reconnect_closes_previous_session() {
        let h = connected(bot_config(), ModuleCatalog::new()).await;
        h.client.on_message("alice!a@host", "#x", ".timer 5 tea").await;

        h.client.on_connected().await;
        h.client.wait_idle().await;

        assert!(h.transport.sent().is_empty());
        let lines = h.chatlog.lines();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Connected at "));
        assert!(lines[1].starts_with("Disconnected at "));
        assert!(lines[2].starts_with("Connected at "));
    }

    #[tokio::test]
    async fn test_connect_uses_configured_identity() {
        let h = harness(bot_config(), Arc::new(ModuleCatalog::new()));
        h.client.connect().await.unwrap();
        assert_eq!(h.transport.connects.lock()[0].nickname, "bot");
    }

    #[test]
    fn test_build_rejects_invalid_config() {
        let mut config = bot_config();
        config.bot.prefix = String::new();
        let result = Client::builder(MockTransport::new(), config).build();
        assert!(matches!(result, Err(crate::error::ClientError::Config(_))));
    }
}
