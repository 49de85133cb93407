//! Page-load state machine for WebSession.
//!
//! A tab's web content moves through a fixed pipeline of named states, from
//! "about to load" to "rendered". The transition function is pure and total
//! over the declared (state, action) pairs; any other pair is a hard
//! [`WebLoadError::UnexpectedStateForAction`] — it signals a driver bug, and
//! the driver keeps the state unchanged.

use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use url::Url;

use crate::types::errors::WebLoadError;
use crate::types::site::{Site, SiteSettings, UrlInfo};

/// The in-progress request artifact carried by the later pipeline states.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadRequest {
    pub url: Url,
}

impl LoadRequest {
    fn for_url(url_info: &UrlInfo) -> Self {
        Self {
            url: url_info.transport_url(),
        }
    }
}

/// Progress of one tab's page load. Each state carries exactly the settings
/// and URL needed to resume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WebViewState {
    Initialized(Site),
    PendingPlugins(SiteSettings, UrlInfo),
    InjectingPlugins(SiteSettings, UrlInfo),
    PendingDohStatus(SiteSettings, UrlInfo),
    CheckingDnResolveSupport(SiteSettings, UrlInfo),
    ResolvingDn(SiteSettings, UrlInfo),
    CreatingRequest(SiteSettings, UrlInfo),
    UpdatingWebView(SiteSettings, UrlInfo, LoadRequest),
    FinishingLoading(SiteSettings, UrlInfo),
    Viewing(SiteSettings, UrlInfo),
    WaitingForNavigation(SiteSettings, UrlInfo),
    UpdatingJs(SiteSettings, UrlInfo, bool),
}

/// Commands the driver can issue against a [`WebViewState`].
#[derive(Debug, Clone, PartialEq)]
pub enum WebViewAction {
    PreparePlugins,
    InjectPlugins,
    CheckDohStatus,
    CheckResolutionSupport,
    ResolveDomainName,
    /// Resolution finished: attach the address, or none when resolution
    /// failed and the load proceeds with the unresolved URL.
    AttachResolvedAddress(Option<IpAddr>),
    /// Short-circuit straight to request creation when DoH does not apply.
    CreateRequest,
    UpdateWebView,
    Load,
    DidFinishLoading,
    Reload,
    GoBack,
    GoForward,
    LoadNextLink(UrlInfo),
    ChangeJavaScript(bool),
    JavaScriptUpdated,
    ResetToSite(Site),
}

impl WebViewState {
    pub fn name(&self) -> &'static str {
        match self {
            WebViewState::Initialized(_) => "initialized",
            WebViewState::PendingPlugins(..) => "pendingPlugins",
            WebViewState::InjectingPlugins(..) => "injectingPlugins",
            WebViewState::PendingDohStatus(..) => "pendingDohStatus",
            WebViewState::CheckingDnResolveSupport(..) => "checkingDnResolveSupport",
            WebViewState::ResolvingDn(..) => "resolvingDn",
            WebViewState::CreatingRequest(..) => "creatingRequest",
            WebViewState::UpdatingWebView(..) => "updatingWebView",
            WebViewState::FinishingLoading(..) => "finishingLoading",
            WebViewState::Viewing(..) => "viewing",
            WebViewState::WaitingForNavigation(..) => "waitingForNavigation",
            WebViewState::UpdatingJs(..) => "updatingJs",
        }
    }

    /// Applies `action`, producing the next state. Undeclared pairs fail and
    /// leave the receiver for the driver to keep.
    pub fn apply(&self, action: WebViewAction) -> Result<WebViewState, WebLoadError> {
        use WebViewAction as A;
        use WebViewState as S;

        let action_name = action.name();
        match (self, action) {
            (S::Initialized(site), A::PreparePlugins) => Ok(S::PendingPlugins(
                site.settings(),
                site.url_info().clone(),
            )),

            (S::PendingPlugins(settings, url), A::InjectPlugins) => {
                Ok(S::InjectingPlugins(*settings, url.clone()))
            }
            // Plugins disabled or none registered: skip injection entirely.
            (S::PendingPlugins(settings, url), A::CheckDohStatus) => {
                Ok(S::PendingDohStatus(*settings, url.clone()))
            }
            (S::InjectingPlugins(settings, url), A::CheckDohStatus) => {
                Ok(S::PendingDohStatus(*settings, url.clone()))
            }

            (S::PendingDohStatus(settings, url), A::CheckResolutionSupport) => {
                Ok(S::CheckingDnResolveSupport(*settings, url.clone()))
            }
            // DoH disabled: no resolution pipeline at all.
            (S::PendingDohStatus(settings, url), A::CreateRequest) => {
                Ok(S::CreatingRequest(*settings, url.clone()))
            }

            (S::CheckingDnResolveSupport(settings, url), A::ResolveDomainName) => {
                Ok(S::ResolvingDn(*settings, url.clone()))
            }
            // Host is an IP literal, not DoH-eligible, or already resolved.
            (S::CheckingDnResolveSupport(settings, url), A::CreateRequest) => {
                Ok(S::CreatingRequest(*settings, url.clone()))
            }

            (S::ResolvingDn(settings, url), A::AttachResolvedAddress(ip)) => {
                let url = match ip {
                    Some(ip) => url.with_ip(ip),
                    None => url.clone(),
                };
                Ok(S::CreatingRequest(*settings, url))
            }

            (S::CreatingRequest(settings, url), A::UpdateWebView) => Ok(S::UpdatingWebView(
                *settings,
                url.clone(),
                LoadRequest::for_url(url),
            )),

            (S::UpdatingWebView(settings, url, _), A::Load) => {
                Ok(S::FinishingLoading(*settings, url.clone()))
            }
            (S::WaitingForNavigation(settings, url), A::Load) => {
                Ok(S::FinishingLoading(*settings, url.clone()))
            }

            (S::FinishingLoading(settings, url), A::DidFinishLoading) => {
                Ok(S::Viewing(*settings, url.clone()))
            }

            (S::Viewing(settings, url), A::Reload)
            | (S::Viewing(settings, url), A::GoBack)
            | (S::Viewing(settings, url), A::GoForward) => {
                Ok(S::WaitingForNavigation(*settings, url.clone()))
            }

            // Link activation re-enters the pipeline with the new URL.
            (S::Viewing(settings, _), A::LoadNextLink(url)) => {
                Ok(S::PendingPlugins(*settings, url))
            }

            // JS toggling bypasses the plugin/DoH pipeline; DoH state is
            // re-read from the context on every load, never cached here.
            (S::Viewing(settings, url), A::ChangeJavaScript(enabled)) => {
                Ok(S::UpdatingJs(*settings, url.clone(), enabled))
            }
            (S::UpdatingJs(settings, url, enabled), A::JavaScriptUpdated) => {
                let mut settings = *settings;
                settings.is_js_enabled = *enabled;
                Ok(S::Viewing(settings, url.clone()))
            }

            (S::Viewing(..), A::ResetToSite(site))
            | (S::WaitingForNavigation(..), A::ResetToSite(site)) => Ok(S::Initialized(site)),

            (state, _) => Err(WebLoadError::UnexpectedStateForAction {
                state: state.name(),
                action: action_name,
            }),
        }
    }
}

impl WebViewAction {
    pub fn name(&self) -> &'static str {
        match self {
            WebViewAction::PreparePlugins => "preparePlugins",
            WebViewAction::InjectPlugins => "injectPlugins",
            WebViewAction::CheckDohStatus => "checkDohStatus",
            WebViewAction::CheckResolutionSupport => "checkResolutionSupport",
            WebViewAction::ResolveDomainName => "resolveDomainName",
            WebViewAction::AttachResolvedAddress(_) => "attachResolvedAddress",
            WebViewAction::CreateRequest => "createRequest",
            WebViewAction::UpdateWebView => "updateWebView",
            WebViewAction::Load => "load",
            WebViewAction::DidFinishLoading => "didFinishLoading",
            WebViewAction::Reload => "reload",
            WebViewAction::GoBack => "goBack",
            WebViewAction::GoForward => "goForward",
            WebViewAction::LoadNextLink(_) => "loadNextLink",
            WebViewAction::ChangeJavaScript(_) => "changeJavaScript",
            WebViewAction::JavaScriptUpdated => "javaScriptUpdated",
            WebViewAction::ResetToSite(_) => "resetToSite",
        }
    }
}
