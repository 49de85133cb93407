use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use url::{Host, Url};

use crate::types::errors::DnsError;

/// Per-load settings captured when a site is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteSettings {
    pub is_private: bool,
    pub block_popups: bool,
    pub is_js_enabled: bool,
    pub can_load_plugins: bool,
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self {
            is_private: false,
            block_popups: true,
            is_js_enabled: true,
            can_load_plugins: true,
        }
    }
}

/// A URL plus its resolution state.
///
/// Two values for the same host compare unequal when only one of them carries
/// a resolved address: they name the same page but a different transport
/// target. Use [`UrlInfo::same_host`] for host-only comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlInfo {
    url: Url,
    ip: Option<IpAddr>,
}

impl UrlInfo {
    pub fn parse(input: &str) -> Result<Self, DnsError> {
        let url = Url::parse(input).map_err(|e| DnsError::ResolutionFailed(e.to_string()))?;
        if url.host_str().is_none() {
            return Err(DnsError::MissingHost);
        }
        Ok(Self { url, ip: None })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn scheme(&self) -> &str {
        self.url.scheme()
    }

    /// The domain name (or IP literal) this URL names.
    pub fn host(&self) -> &str {
        self.url.host_str().unwrap_or_default()
    }

    pub fn path(&self) -> &str {
        self.url.path()
    }

    pub fn query(&self) -> Option<&str> {
        self.url.query()
    }

    pub fn ip(&self) -> Option<IpAddr> {
        self.ip
    }

    /// True when the URL's host is already an IP literal, so name resolution
    /// would be meaningless.
    pub fn host_is_ip(&self) -> bool {
        matches!(self.url.host(), Some(Host::Ipv4(_)) | Some(Host::Ipv6(_)))
    }

    /// Returns a copy carrying the resolved address.
    pub fn with_ip(&self, ip: IpAddr) -> Self {
        Self {
            url: self.url.clone(),
            ip: Some(ip),
        }
    }

    /// Host-only equality, ignoring resolution state.
    pub fn same_host(&self, other: &UrlInfo) -> bool {
        self.host() == other.host()
    }

    /// The URL to actually hand to the network layer: the original URL with
    /// the host swapped for its IP literal once resolved.
    pub fn transport_url(&self) -> Url {
        match self.ip {
            Some(ip) => {
                let mut url = self.url.clone();
                if url.set_ip_host(ip).is_err() {
                    return self.url.clone();
                }
                url
            }
            None => self.url.clone(),
        }
    }
}

/// An immutable value describing a loaded page's URL and per-load settings.
/// A new `Site` is built on every navigation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Site {
    url_info: UrlInfo,
    settings: SiteSettings,
}

impl Site {
    pub fn new(url_info: UrlInfo, settings: SiteSettings) -> Self {
        Self { url_info, settings }
    }

    pub fn url_info(&self) -> &UrlInfo {
        &self.url_info
    }

    pub fn settings(&self) -> SiteSettings {
        self.settings
    }
}
