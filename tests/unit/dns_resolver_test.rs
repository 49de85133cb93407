use std::net::{IpAddr, Ipv4Addr};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use websession::services::dns_resolver::{DomainNameResolver, HostResolverTrait};
use websession::services::page_context::ConcurrencyKind;
use websession::types::errors::DnsError;
use websession::types::site::UrlInfo;

const RESOLVED: IpAddr = IpAddr::V4(Ipv4Addr::new(198, 51, 100, 7));

/// Counts transport lookups so tests can assert idempotence.
#[derive(Default)]
struct CountingResolver {
    calls: AtomicUsize,
}

impl CountingResolver {
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HostResolverTrait for CountingResolver {
    async fn resolve_host(&self, _host: &str) -> Result<IpAddr, DnsError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(RESOLVED)
    }
}

struct FailingResolver;

#[async_trait]
impl HostResolverTrait for FailingResolver {
    async fn resolve_host(&self, host: &str) -> Result<IpAddr, DnsError> {
        Err(DnsError::ResolutionFailed(format!("NXDOMAIN {}", host)))
    }
}

fn url(input: &str) -> UrlInfo {
    UrlInfo::parse(input).unwrap()
}

#[tokio::test]
async fn test_all_disciplines_attach_the_resolved_address() {
    for kind in [
        ConcurrencyKind::Await,
        ConcurrencyKind::Publisher,
        ConcurrencyKind::Stream,
    ] {
        let resolver = DomainNameResolver::new(Arc::new(CountingResolver::default()), kind);
        let resolved = resolver.resolve(url("https://example.com/a")).await.unwrap();
        assert_eq!(resolved.ip(), Some(RESOLVED), "discipline {:?}", kind);
        assert_eq!(
            resolved.transport_url().host_str(),
            Some("198.51.100.7"),
            "discipline {:?}",
            kind
        );
    }
}

#[tokio::test]
async fn test_all_disciplines_surface_resolution_failure() {
    for kind in [
        ConcurrencyKind::Await,
        ConcurrencyKind::Publisher,
        ConcurrencyKind::Stream,
    ] {
        let resolver = DomainNameResolver::new(Arc::new(FailingResolver), kind);
        let err = resolver
            .resolve(url("https://down.example/"))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            DnsError::ResolutionFailed("NXDOMAIN down.example".to_string()),
            "discipline {:?}",
            kind
        );
    }
}

#[tokio::test]
async fn test_already_resolved_url_skips_the_transport() {
    let counting = Arc::new(CountingResolver::default());
    let resolver = DomainNameResolver::new(counting.clone(), ConcurrencyKind::Await);

    let preresolved = url("https://example.com/").with_ip(RESOLVED);
    let out = resolver.resolve(preresolved.clone()).await.unwrap();
    assert_eq!(out, preresolved);
    assert_eq!(counting.calls(), 0, "no network call for a resolved URL");
}

#[tokio::test]
async fn test_repeated_resolution_is_idempotent() {
    let counting = Arc::new(CountingResolver::default());
    let resolver = DomainNameResolver::new(counting.clone(), ConcurrencyKind::Await);

    let first = resolver.resolve(url("https://example.com/")).await.unwrap();
    let second = resolver.resolve(first.clone()).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(counting.calls(), 1, "second call must not resolve again");
}

#[test]
fn test_url_without_host_is_rejected_at_parse() {
    assert_eq!(
        UrlInfo::parse("data:text/plain,hello").unwrap_err(),
        DnsError::MissingHost
    );
}

#[test]
fn test_malformed_url_is_rejected_at_parse() {
    assert!(matches!(
        UrlInfo::parse("not a url"),
        Err(DnsError::ResolutionFailed(_))
    ));
}

// Resolution state is part of identity: same host, different transport target.
#[test]
fn test_resolved_and_unresolved_urls_compare_unequal() {
    let unresolved = url("https://example.com/page");
    let resolved = unresolved.with_ip(RESOLVED);
    assert_ne!(unresolved, resolved);
    assert!(unresolved.same_host(&resolved));
    assert_eq!(unresolved.transport_url().host_str(), Some("example.com"));
    assert_eq!(resolved.transport_url().host_str(), Some("198.51.100.7"));
}

#[test]
fn test_ip_literal_hosts_are_detected() {
    assert!(url("https://192.0.2.10/index.html").host_is_ip());
    assert!(url("http://[2001:db8::1]/").host_is_ip());
    assert!(!url("https://example.com/").host_is_ip());
}
