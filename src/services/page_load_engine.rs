//! Page-load engine for WebSession.
//!
//! One engine drives one tab's [`WebViewState`] through the load pipeline.
//! The engine is an actor: callers on any task send commands through the
//! handle and the mailbox orders them, so the state is single-threaded by
//! construction rather than by caller discipline.
//!
//! DNS resolution runs as a spawned task reporting back through the mailbox
//! with a generation tag; a superseded or cancelled resolution's completion
//! is discarded, never applied to state. Resolution failure is recoverable:
//! the load proceeds with the unresolved URL.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::services::dns_resolver::{DomainNameResolver, HostResolverTrait};
use crate::services::page_context::{NativeApp, PageContextTrait, PluginProgram};
use crate::services::web_view_state::{LoadRequest, WebViewAction, WebViewState};
use crate::types::errors::{DnsError, WebLoadError};
use crate::types::site::{Site, UrlInfo};

/// Trait for page-state observers. Methods default to no-ops.
pub trait WebViewObserverTrait: Send + Sync {
    /// The pipeline produced a request; the web view should load it.
    fn load_request(&self, _request: &LoadRequest) {}
    /// The engine was reset to a new site; the web view must be rebuilt.
    fn recreate_web_view(&self, _site: &Site) {}
    /// A navigation was taken over by a native application.
    fn open_native_app(&self, _app: &NativeApp) {}
    /// JavaScript was toggled on the current page.
    fn apply_javascript(&self, _enabled: bool) {}
    /// A plugin program should be injected into the page.
    fn inject_plugin(&self, _program: &PluginProgram) {}
}

enum EngineCommand {
    Load(oneshot::Sender<Result<(), WebLoadError>>),
    OpenLink(UrlInfo, oneshot::Sender<Result<(), WebLoadError>>),
    Reload(oneshot::Sender<Result<(), WebLoadError>>),
    GoBack(oneshot::Sender<Result<(), WebLoadError>>),
    GoForward(oneshot::Sender<Result<(), WebLoadError>>),
    DidCommitNavigation(oneshot::Sender<Result<(), WebLoadError>>),
    DidFinishLoading(oneshot::Sender<Result<(), WebLoadError>>),
    SetJavaScript(bool, oneshot::Sender<Result<(), WebLoadError>>),
    ResetToSite(Site, oneshot::Sender<Result<(), WebLoadError>>),
    CancelResolution(oneshot::Sender<()>),
    Attach(Arc<dyn WebViewObserverTrait>, oneshot::Sender<()>),
    Detach(Arc<dyn WebViewObserverTrait>, oneshot::Sender<()>),
    State(oneshot::Sender<WebViewState>),
}

enum InternalMsg {
    ResolutionComplete {
        generation: u64,
        result: Result<UrlInfo, DnsError>,
    },
}

/// Handle to a per-tab page-load actor.
#[derive(Clone)]
pub struct PageLoadEngine {
    tx: mpsc::Sender<EngineCommand>,
}

impl PageLoadEngine {
    /// Spawns the engine actor for `site`, starting in the initialized state.
    /// The resolution discipline is read from the context once, here; feature
    /// toggles are re-read on every load.
    pub fn new(
        site: Site,
        context: Arc<dyn PageContextTrait>,
        host_resolver: Arc<dyn HostResolverTrait>,
    ) -> Self {
        let (tx, rx) = mpsc::channel(32);
        let (internal_tx, internal_rx) = mpsc::unbounded_channel();
        let resolver = Arc::new(DomainNameResolver::new(
            host_resolver,
            context.dns_concurrency(),
        ));
        let actor = EngineActor {
            state: WebViewState::Initialized(site),
            context,
            resolver,
            observers: Vec::new(),
            resolution: None,
            generation: 0,
            internal_tx,
        };
        tokio::spawn(actor.run(rx, internal_rx));
        Self { tx }
    }

    /// Starts the load pipeline from the initialized state.
    pub async fn load(&self) -> Result<(), WebLoadError> {
        self.command(EngineCommand::Load).await
    }

    /// Activates a link from the viewing state. Native-app redirects are
    /// decided here, before any state-machine action is issued.
    pub async fn open_link(&self, url_info: UrlInfo) -> Result<(), WebLoadError> {
        self.command(|reply| EngineCommand::OpenLink(url_info, reply))
            .await
    }

    pub async fn reload(&self) -> Result<(), WebLoadError> {
        self.command(EngineCommand::Reload).await
    }

    pub async fn go_back(&self) -> Result<(), WebLoadError> {
        self.command(EngineCommand::GoBack).await
    }

    pub async fn go_forward(&self) -> Result<(), WebLoadError> {
        self.command(EngineCommand::GoForward).await
    }

    /// The web view committed a pending navigation.
    pub async fn did_commit_navigation(&self) -> Result<(), WebLoadError> {
        self.command(EngineCommand::DidCommitNavigation).await
    }

    /// The web view finished rendering; the visited site is persisted through
    /// the page context.
    pub async fn did_finish_loading(&self) -> Result<(), WebLoadError> {
        self.command(EngineCommand::DidFinishLoading).await
    }

    pub async fn set_javascript_enabled(&self, enabled: bool) -> Result<(), WebLoadError> {
        self.command(|reply| EngineCommand::SetJavaScript(enabled, reply))
            .await
    }

    /// Drops the current page and restarts the pipeline for `site`.
    pub async fn reset_to_site(&self, site: Site) -> Result<(), WebLoadError> {
        self.command(|reply| EngineCommand::ResetToSite(site, reply))
            .await
    }

    /// Cancels any in-flight resolution. Idempotent: cancelling a completed
    /// or already-cancelled resolution is a no-op.
    pub async fn cancel_resolution(&self) {
        let (reply_tx, reply_rx) = oneshot::channel();
        if self
            .tx
            .send(EngineCommand::CancelResolution(reply_tx))
            .await
            .is_ok()
        {
            let _ = reply_rx.await;
        }
    }

    pub async fn attach(&self, observer: Arc<dyn WebViewObserverTrait>) {
        let (reply_tx, reply_rx) = oneshot::channel();
        if self
            .tx
            .send(EngineCommand::Attach(observer, reply_tx))
            .await
            .is_ok()
        {
            let _ = reply_rx.await;
        }
    }

    pub async fn detach(&self, observer: Arc<dyn WebViewObserverTrait>) {
        let (reply_tx, reply_rx) = oneshot::channel();
        if self
            .tx
            .send(EngineCommand::Detach(observer, reply_tx))
            .await
            .is_ok()
        {
            let _ = reply_rx.await;
        }
    }

    pub async fn state(&self) -> Option<WebViewState> {
        let (reply_tx, reply_rx) = oneshot::channel();
        if self.tx.send(EngineCommand::State(reply_tx)).await.is_err() {
            return None;
        }
        reply_rx.await.ok()
    }

    async fn command(
        &self,
        make: impl FnOnce(oneshot::Sender<Result<(), WebLoadError>>) -> EngineCommand,
    ) -> Result<(), WebLoadError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        if self.tx.send(make(reply_tx)).await.is_err() {
            log::error!("page load engine actor is gone; command dropped");
            return Ok(());
        }
        reply_rx.await.unwrap_or(Ok(()))
    }
}

struct EngineActor {
    state: WebViewState,
    context: Arc<dyn PageContextTrait>,
    resolver: Arc<DomainNameResolver>,
    observers: Vec<Arc<dyn WebViewObserverTrait>>,
    resolution: Option<JoinHandle<()>>,
    generation: u64,
    internal_tx: mpsc::UnboundedSender<InternalMsg>,
}

impl EngineActor {
    async fn run(
        mut self,
        mut rx: mpsc::Receiver<EngineCommand>,
        mut internal_rx: mpsc::UnboundedReceiver<InternalMsg>,
    ) {
        loop {
            tokio::select! {
                command = rx.recv() => match command {
                    Some(command) => self.handle(command).await,
                    None => break,
                },
                Some(msg) = internal_rx.recv() => self.handle_internal(msg),
            }
        }
        self.cancel_resolution();
    }

    async fn handle(&mut self, command: EngineCommand) {
        match command {
            EngineCommand::Load(reply) => {
                let _ = reply.send(self.drive());
            }
            EngineCommand::OpenLink(url_info, reply) => {
                let _ = reply.send(self.open_link(url_info));
            }
            EngineCommand::Reload(reply) => {
                let _ = reply.send(self.apply(WebViewAction::Reload));
            }
            EngineCommand::GoBack(reply) => {
                let _ = reply.send(self.apply(WebViewAction::GoBack));
            }
            EngineCommand::GoForward(reply) => {
                let _ = reply.send(self.apply(WebViewAction::GoForward));
            }
            EngineCommand::DidCommitNavigation(reply) => {
                let _ = reply.send(self.apply(WebViewAction::Load));
            }
            EngineCommand::DidFinishLoading(reply) => {
                let _ = reply.send(self.did_finish_loading().await);
            }
            EngineCommand::SetJavaScript(enabled, reply) => {
                let _ = reply.send(self.set_javascript(enabled));
            }
            EngineCommand::ResetToSite(site, reply) => {
                let _ = reply.send(self.reset_to_site(site));
            }
            EngineCommand::CancelResolution(reply) => {
                self.cancel_resolution();
                let _ = reply.send(());
            }
            EngineCommand::Attach(observer, reply) => {
                self.observers.push(observer);
                let _ = reply.send(());
            }
            EngineCommand::Detach(observer, reply) => {
                self.observers.retain(|o| !Arc::ptr_eq(o, &observer));
                let _ = reply.send(());
            }
            EngineCommand::State(reply) => {
                let _ = reply.send(self.state.clone());
            }
        }
    }

    fn handle_internal(&mut self, msg: InternalMsg) {
        match msg {
            InternalMsg::ResolutionComplete { generation, result } => {
                if generation != self.generation {
                    log::debug!("discarding superseded resolution result");
                    return;
                }
                self.resolution = None;
                let ip = match result {
                    Ok(resolved) => resolved.ip(),
                    Err(e) => {
                        log::warn!("DNS resolution failed, loading unresolved URL: {}", e);
                        None
                    }
                };
                if self.apply(WebViewAction::AttachResolvedAddress(ip)).is_ok() {
                    let _ = self.drive();
                }
            }
        }
    }

    /// Advances the pipeline until it needs outside input: an in-flight
    /// resolution, the web view's load callbacks, or the viewing state.
    fn drive(&mut self) -> Result<(), WebLoadError> {
        loop {
            match &self.state {
                WebViewState::Initialized(_) => {
                    self.apply(WebViewAction::PreparePlugins)?;
                }
                WebViewState::PendingPlugins(settings, _) => {
                    let program = self.context.plugin_program();
                    if settings.can_load_plugins && program.is_some() {
                        self.apply(WebViewAction::InjectPlugins)?;
                        if let Some(program) = program {
                            self.notify(|o| o.inject_plugin(&program));
                        }
                    } else {
                        self.apply(WebViewAction::CheckDohStatus)?;
                    }
                }
                WebViewState::InjectingPlugins(..) => {
                    self.apply(WebViewAction::CheckDohStatus)?;
                }
                WebViewState::PendingDohStatus(..) => {
                    // DoH status is re-read from the context on every load.
                    if self.context.is_doh_enabled() {
                        self.apply(WebViewAction::CheckResolutionSupport)?;
                    } else {
                        self.apply(WebViewAction::CreateRequest)?;
                    }
                }
                WebViewState::CheckingDnResolveSupport(_, url) => {
                    if url.host_is_ip() || !self.context.is_doh_eligible_host(url.host()) {
                        self.apply(WebViewAction::CreateRequest)?;
                    } else {
                        let preresolved = url.ip();
                        self.apply(WebViewAction::ResolveDomainName)?;
                        if preresolved.is_some() {
                            // A fast path already attached an address; do not
                            // issue a second network resolution.
                            self.apply(WebViewAction::AttachResolvedAddress(preresolved))?;
                        } else {
                            self.spawn_resolution();
                            return Ok(());
                        }
                    }
                }
                WebViewState::ResolvingDn(..) => return Ok(()),
                WebViewState::CreatingRequest(..) => {
                    self.apply(WebViewAction::UpdateWebView)?;
                }
                WebViewState::UpdatingWebView(_, _, request) => {
                    let request = request.clone();
                    self.apply(WebViewAction::Load)?;
                    self.notify(|o| o.load_request(&request));
                    return Ok(());
                }
                _ => return Ok(()),
            }
        }
    }

    fn open_link(&mut self, url_info: UrlInfo) -> Result<(), WebLoadError> {
        // The redirect decision happens before any action is issued; a
        // native-app takeover never touches the state machine.
        if self.context.allows_native_app_redirects() {
            if let Some(app) = self.context.native_app_for_host(url_info.host()) {
                self.notify(|o| o.open_native_app(&app));
                return Ok(());
            }
        }
        self.apply(WebViewAction::LoadNextLink(url_info))?;
        // Any previous resolution is superseded by the new navigation.
        self.cancel_resolution();
        self.drive()
    }

    async fn did_finish_loading(&mut self) -> Result<(), WebLoadError> {
        self.apply(WebViewAction::DidFinishLoading)?;
        if let WebViewState::Viewing(settings, url) = &self.state {
            let site = Site::new(url.clone(), *settings);
            if let Err(e) = self.context.persist_visited_site(&site).await {
                log::warn!("failed to persist visited site: {}", e);
            }
        }
        Ok(())
    }

    fn set_javascript(&mut self, enabled: bool) -> Result<(), WebLoadError> {
        self.apply(WebViewAction::ChangeJavaScript(enabled))?;
        self.notify(|o| o.apply_javascript(enabled));
        self.apply(WebViewAction::JavaScriptUpdated)
    }

    fn reset_to_site(&mut self, site: Site) -> Result<(), WebLoadError> {
        self.apply(WebViewAction::ResetToSite(site.clone()))?;
        // Any previous resolution is superseded by the reset; a rejected
        // reset above must not disturb an in-flight load.
        self.cancel_resolution();
        self.notify(|o| o.recreate_web_view(&site));
        // Reset immediately re-enters the pipeline.
        self.drive()
    }

    fn spawn_resolution(&mut self) {
        let url = match &self.state {
            WebViewState::ResolvingDn(_, url) => url.clone(),
            _ => return,
        };
        self.cancel_resolution();
        let generation = self.generation;
        let resolver = self.resolver.clone();
        let internal_tx = self.internal_tx.clone();
        self.resolution = Some(tokio::spawn(async move {
            let result = resolver.resolve(url).await;
            let _ = internal_tx.send(InternalMsg::ResolutionComplete { generation, result });
        }));
    }

    /// Aborts any in-flight resolution and invalidates its completion, so a
    /// result already queued in the mailbox is discarded too. Idempotent.
    fn cancel_resolution(&mut self) {
        if let Some(handle) = self.resolution.take() {
            handle.abort();
        }
        self.generation += 1;
    }

    fn apply(&mut self, action: WebViewAction) -> Result<(), WebLoadError> {
        match self.state.apply(action) {
            Ok(next) => {
                self.state = next;
                Ok(())
            }
            Err(e) => {
                // Invalid transitions are driver bugs: always reported, and
                // the state is left unchanged.
                log::error!("page load transition rejected: {}", e);
                Err(e)
            }
        }
    }

    fn notify(&self, f: impl Fn(&dyn WebViewObserverTrait)) {
        for observer in &self.observers {
            f(observer.as_ref());
        }
    }
}
