//! WebSession — a browser session engine: tab registry, page-load state
//! machine, and DNS-over-HTTPS resolution.
//!
//! Entry point: runs an interactive console demo exercising each component.

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;

use async_trait::async_trait;

use websession::managers::selection::{NearbySelectionStrategy, TabSelectionStrategyTrait};
use websession::managers::tab_registry::TabRegistry;
use websession::services::dns_resolver::{DomainNameResolver, HostResolverTrait};
use websession::services::page_context::{
    ConcurrencyKind, NativeApp, PageContextTrait, StaticPageContext,
};
use websession::services::page_load_engine::PageLoadEngine;
use websession::services::web_view_state::{WebViewAction, WebViewState};
use websession::storage::InMemoryTabStorage;
use websession::types::errors::DnsError;
use websession::types::policy::TabPolicy;
use websession::types::site::{Site, SiteSettings, UrlInfo};
use websession::types::tab::{Tab, TabContent, VisualState};

#[tokio::main]
async fn main() {
    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║              WebSession v{} — Demo Mode                   ║", env!("CARGO_PKG_VERSION"));
    println!("║     Tab registry, page-load pipeline, DoH resolution       ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();

    demo_registry().await;
    demo_selection_strategy();
    demo_state_machine();
    demo_dns_resolution().await;
    demo_page_load().await;

    println!();
    println!("═══════════════════════════════════════════════════════════════");
    println!("  ✅ All components demonstrated successfully!");
    println!("═══════════════════════════════════════════════════════════════");
}

fn section(name: &str) {
    println!("───────────────────────────────────────────────────────────────");
    println!("  📦 {}", name);
    println!("───────────────────────────────────────────────────────────────");
}

fn example_site(url: &str) -> Site {
    let url_info = UrlInfo::parse(url).expect("demo URL is valid");
    Site::new(url_info, SiteSettings::default())
}

async fn demo_registry() {
    section("Tab Registry");

    let registry = TabRegistry::new(
        Arc::new(InMemoryTabStorage::new()),
        TabPolicy::default(),
        Box::new(NearbySelectionStrategy),
    );

    let a = Tab::new(TabContent::Homepage, VisualState::Selected);
    let b = Tab::new(
        TabContent::Site(example_site("https://www.rust-lang.org/learn")),
        VisualState::Selected,
    );
    let b_id = b.id;
    registry.add_tab(a).await;
    registry.add_tab(b).await;
    println!("  Added 2 tabs, count = {}", registry.tabs_count().await);
    println!("  Selected: {}", registry.selected_tab_id().await);

    registry.close_tab_with_id(b_id).await;
    println!(
        "  Closed selected tab -> count = {}, selected = {}",
        registry.tabs_count().await,
        registry.selected_tab_id().await
    );

    registry.close_all().await;
    println!(
        "  close_all -> count = {} (replacement tab, never empty)",
        registry.tabs_count().await
    );

    let snapshot = registry.session_snapshot().await;
    println!(
        "  Session snapshot: {} tab(s), {} bytes of JSON",
        snapshot.tabs.len(),
        snapshot.to_json().map(|j| j.len()).unwrap_or(0)
    );
    println!("  ✓ TabRegistry OK");
    println!();
}

fn demo_selection_strategy() {
    section("Selection Strategy (nearby)");

    let strategy = NearbySelectionStrategy;
    println!(
        "  5 tabs, selected 2, remove 2 -> {}",
        strategy.next_selected_index(4, 2, 2)
    );
    println!(
        "  5 tabs, selected 4, remove 4 -> {}",
        strategy.next_selected_index(4, 4, 4)
    );
    println!(
        "  5 tabs, selected 2, remove 0 -> {}",
        strategy.next_selected_index(4, 2, 0)
    );
    println!("  ✓ NearbySelectionStrategy OK");
    println!();
}

fn demo_state_machine() {
    section("Page Load State Machine");

    let site = example_site("https://docs.rs/tokio");
    let mut state = WebViewState::Initialized(site);
    let pipeline = [
        WebViewAction::PreparePlugins,
        WebViewAction::InjectPlugins,
        WebViewAction::CheckDohStatus,
        WebViewAction::CheckResolutionSupport,
        WebViewAction::ResolveDomainName,
        WebViewAction::AttachResolvedAddress(Some(IpAddr::V4(Ipv4Addr::new(203, 0, 113, 7)))),
        WebViewAction::UpdateWebView,
        WebViewAction::Load,
        WebViewAction::DidFinishLoading,
    ];
    for action in pipeline {
        let name = action.name();
        state = state.apply(action).expect("demo pipeline is valid");
        println!("  {} -> {}", name, state.name());
    }

    let rejected = state.apply(WebViewAction::DidFinishLoading);
    println!("  didFinishLoading from viewing -> {:?}", rejected.err());
    println!("  ✓ WebViewState OK");
    println!();
}

struct FixedResolver(IpAddr);

#[async_trait]
impl HostResolverTrait for FixedResolver {
    async fn resolve_host(&self, _host: &str) -> Result<IpAddr, DnsError> {
        Ok(self.0)
    }
}

async fn demo_dns_resolution() {
    section("DNS Resolver Strategies");

    let ip = IpAddr::V4(Ipv4Addr::new(198, 51, 100, 23));
    let url = UrlInfo::parse("https://example.com/page").expect("demo URL is valid");
    for kind in [
        ConcurrencyKind::Await,
        ConcurrencyKind::Publisher,
        ConcurrencyKind::Stream,
    ] {
        let resolver = DomainNameResolver::new(Arc::new(FixedResolver(ip)), kind);
        let resolved = resolver.resolve(url.clone()).await.expect("resolves");
        println!(
            "  {:?}: {} -> {}",
            kind,
            url.url(),
            resolved.transport_url()
        );
    }
    println!("  ✓ DomainNameResolver OK");
    println!();
}

async fn demo_page_load() {
    section("Page Load Engine (end to end)");

    let mut native_apps = HashMap::new();
    native_apps.insert(
        "music.example.com".to_string(),
        NativeApp {
            identifier: "com.example.music".to_string(),
            launch_url: "music://open".to_string(),
        },
    );
    let context = Arc::new(StaticPageContext {
        javascript_enabled: true,
        doh_enabled: true,
        native_app_redirects: true,
        concurrency: ConcurrencyKind::Await,
        plugin: None,
        doh_eligible_hosts: Vec::new(),
        native_apps,
    });
    println!(
        "  Context: DoH={}, JS={}, discipline={:?}",
        context.is_doh_enabled(),
        context.is_javascript_enabled(),
        context.dns_concurrency()
    );

    let resolver = Arc::new(FixedResolver(IpAddr::V4(Ipv4Addr::new(192, 0, 2, 80))));
    let engine = PageLoadEngine::new(example_site("https://example.com/"), context, resolver);

    engine.load().await.expect("load starts");
    // Let the spawned resolution report back through the mailbox.
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    engine.did_finish_loading().await.expect("finish");
    if let Some(state) = engine.state().await {
        println!("  After load: state = {}", state.name());
    }

    engine.reload().await.expect("reload");
    engine.did_commit_navigation().await.expect("commit");
    engine.did_finish_loading().await.expect("finish");
    if let Some(state) = engine.state().await {
        println!("  After reload round-trip: state = {}", state.name());
    }

    engine.set_javascript_enabled(false).await.expect("toggle JS");
    if let Some(state) = engine.state().await {
        println!("  After JS toggle: state = {}", state.name());
    }
    println!("  ✓ PageLoadEngine OK");
}
