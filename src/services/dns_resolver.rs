//! Domain name resolution for WebSession.
//!
//! [`DomainNameResolver`] turns a URL into the same URL carrying a resolved
//! IP address, under one of three interchangeable concurrency disciplines
//! (push-stream, spawned future, plain await). All three satisfy the same
//! contract; the page-load engine neither knows nor cares which one runs.
//!
//! The resolution transport is behind [`HostResolverTrait`]; the `network`
//! feature provides [`DohHostResolver`] on trust-dns with a DoH
//! configuration.

use async_trait::async_trait;
use futures_util::StreamExt;
use std::net::IpAddr;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::services::page_context::ConcurrencyKind;
use crate::types::errors::DnsError;
use crate::types::site::UrlInfo;

/// Transport collaborator: resolve a hostname to one address.
#[async_trait]
pub trait HostResolverTrait: Send + Sync {
    async fn resolve_host(&self, host: &str) -> Result<IpAddr, DnsError>;
}

/// Resolves URLs under a configured concurrency discipline.
pub struct DomainNameResolver {
    host_resolver: Arc<dyn HostResolverTrait>,
    kind: ConcurrencyKind,
}

impl DomainNameResolver {
    pub fn new(host_resolver: Arc<dyn HostResolverTrait>, kind: ConcurrencyKind) -> Self {
        Self {
            host_resolver,
            kind,
        }
    }

    pub fn kind(&self) -> ConcurrencyKind {
        self.kind
    }

    /// Resolves `url_info`'s host and attaches the address.
    ///
    /// Idempotent under repeated calls: a URL that already carries an address
    /// is returned as-is without touching the transport.
    pub async fn resolve(&self, url_info: UrlInfo) -> Result<UrlInfo, DnsError> {
        if url_info.ip().is_some() {
            return Ok(url_info);
        }
        let host = url_info.host().to_string();
        if host.is_empty() {
            return Err(DnsError::MissingHost);
        }
        let ip = match self.kind {
            ConcurrencyKind::Await => self.host_resolver.resolve_host(&host).await?,
            ConcurrencyKind::Publisher => self.resolve_via_future(host).await?,
            ConcurrencyKind::Stream => self.resolve_via_stream(host).await?,
        };
        Ok(url_info.with_ip(ip))
    }

    /// Future/publisher discipline: the lookup runs as its own task and the
    /// result is awaited through the join handle.
    async fn resolve_via_future(&self, host: String) -> Result<IpAddr, DnsError> {
        let resolver = self.host_resolver.clone();
        let handle = tokio::spawn(async move { resolver.resolve_host(&host).await });
        match handle.await {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => Err(DnsError::Cancelled),
            Err(e) => Err(DnsError::ResolutionFailed(e.to_string())),
        }
    }

    /// Push-stream discipline: the lookup publishes its result as the single
    /// item of a stream, and the caller takes the first element.
    async fn resolve_via_stream(&self, host: String) -> Result<IpAddr, DnsError> {
        let (tx, rx) = mpsc::channel(1);
        let resolver = self.host_resolver.clone();
        tokio::spawn(async move {
            let result = resolver.resolve_host(&host).await;
            let _ = tx.send(result).await;
        });
        ReceiverStream::new(rx)
            .next()
            .await
            .unwrap_or(Err(DnsError::Cancelled))
    }
}

/// DoH-backed host resolver on trust-dns (Cloudflare HTTPS endpoints).
#[cfg(feature = "network")]
pub struct DohHostResolver {
    resolver: trust_dns_resolver::TokioAsyncResolver,
}

#[cfg(feature = "network")]
impl DohHostResolver {
    pub fn cloudflare() -> Self {
        use trust_dns_resolver::config::{ResolverConfig, ResolverOpts};
        Self {
            resolver: trust_dns_resolver::TokioAsyncResolver::tokio(
                ResolverConfig::cloudflare_https(),
                ResolverOpts::default(),
            ),
        }
    }
}

#[cfg(feature = "network")]
#[async_trait]
impl HostResolverTrait for DohHostResolver {
    async fn resolve_host(&self, host: &str) -> Result<IpAddr, DnsError> {
        let lookup = self
            .resolver
            .lookup_ip(host)
            .await
            .map_err(|e| DnsError::ResolutionFailed(e.to_string()))?;
        lookup
            .iter()
            .next()
            .ok_or_else(|| DnsError::ResolutionFailed(format!("no addresses for {}", host)))
    }
}
