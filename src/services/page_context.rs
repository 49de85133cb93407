//! Page context collaborator for WebSession.
//!
//! The embedding application exposes feature toggles, the plugin program to
//! inject, native-app lookups, and a persistence callback through this
//! boundary. The page-load engine re-reads toggles on every load rather than
//! caching them in state.

use async_trait::async_trait;
use std::collections::HashMap;

use crate::types::errors::StorageError;
use crate::types::site::Site;

/// Concurrency discipline used for domain name resolution, chosen by a
/// runtime flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConcurrencyKind {
    /// Push-stream: the result arrives as the single item of a stream.
    Stream,
    /// Future/publisher: the result is produced by a spawned task and awaited
    /// through its handle.
    Publisher,
    /// Plain suspend/await.
    #[default]
    Await,
}

/// A JavaScript program injected into pages at load time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginProgram {
    pub name: String,
    pub source: String,
}

/// A native application that can take over a navigation for its host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeApp {
    pub identifier: String,
    pub launch_url: String,
}

/// Trait defining the page context interface.
#[async_trait]
pub trait PageContextTrait: Send + Sync {
    fn is_javascript_enabled(&self) -> bool;
    fn is_doh_enabled(&self) -> bool;
    fn allows_native_app_redirects(&self) -> bool;
    fn dns_concurrency(&self) -> ConcurrencyKind;
    fn plugin_program(&self) -> Option<PluginProgram>;
    /// Whether the host may be resolved over DoH at all (opt-in list).
    fn is_doh_eligible_host(&self, host: &str) -> bool;
    fn native_app_for_host(&self, host: &str) -> Option<NativeApp>;
    /// Records that the current tab now shows `site`, after a successful load.
    async fn persist_visited_site(&self, site: &Site) -> Result<(), StorageError>;
}

/// Plain config-backed context for wiring and the demo.
#[derive(Debug, Clone, Default)]
pub struct StaticPageContext {
    pub javascript_enabled: bool,
    pub doh_enabled: bool,
    pub native_app_redirects: bool,
    pub concurrency: ConcurrencyKind,
    pub plugin: Option<PluginProgram>,
    /// Hosts eligible for DoH resolution. Empty means every host qualifies.
    pub doh_eligible_hosts: Vec<String>,
    pub native_apps: HashMap<String, NativeApp>,
}

#[async_trait]
impl PageContextTrait for StaticPageContext {
    fn is_javascript_enabled(&self) -> bool {
        self.javascript_enabled
    }

    fn is_doh_enabled(&self) -> bool {
        self.doh_enabled
    }

    fn allows_native_app_redirects(&self) -> bool {
        self.native_app_redirects
    }

    fn dns_concurrency(&self) -> ConcurrencyKind {
        self.concurrency
    }

    fn plugin_program(&self) -> Option<PluginProgram> {
        self.plugin.clone()
    }

    fn is_doh_eligible_host(&self, host: &str) -> bool {
        self.doh_eligible_hosts.is_empty()
            || self.doh_eligible_hosts.iter().any(|h| h == host)
    }

    fn native_app_for_host(&self, host: &str) -> Option<NativeApp> {
        self.native_apps.get(host).cloned()
    }

    async fn persist_visited_site(&self, _site: &Site) -> Result<(), StorageError> {
        Ok(())
    }
}
