//! SSRF-protected fetching of declaration documents.
//!
//! Declaration URLs are attacker-influenceable (any annotated page can point
//! the resolver at its own origin), so every request is vetted before it
//! leaves the process: HTTPS only, hostname resolved and checked against the
//! private/internal range table, redirects re-validated hop by hop, response
//! size and wall-clock time bounded. All failure paths degrade to `None`;
//! refusals are indistinguishable from "not found" on purpose, so a client
//! able to trigger fetches cannot map internal network topology.

use std::{collections::HashSet, net::IpAddr, time::Duration};

use http::{StatusCode, header};
use log::{debug, warn};
use tokio::net::lookup_host;
use typed_builder::TypedBuilder;
use url::{Host, Url};

use crate::{ErrorKind, Result};

/// Maximum number of 301/302 redirects followed per fetch
pub const MAX_REDIRECTS: usize = 3;
/// Hard wall-clock bound on a fetch, including all redirect hops
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(5);
/// Maximum accepted declaration body size
pub const MAX_DECLARATION_BYTES: usize = 64 * 1024;

/// Hosts fetched without a DNS pre-check. The raw-content host serves
/// `.clawmark.yml` for every GitHub repository and is not attacker-routable.
fn default_trusted_hosts() -> HashSet<String> {
    HashSet::from_iter([String::from("raw.githubusercontent.com")])
}

/// Whether an IP address falls into a private, loopback, link-local or
/// otherwise internal range that declaration fetching must never reach.
///
/// Covers IPv4 `127.0.0.0/8`, `10.0.0.0/8`, `172.16.0.0/12`,
/// `192.168.0.0/16`, `169.254.0.0/16` (cloud metadata lives here) and
/// `0.0.0.0`; IPv6 `::1`, `fe80::/10` and `fc00::/7`.
#[must_use]
pub fn is_private_ip(addr: IpAddr) -> bool {
    match addr {
        IpAddr::V4(v4) => {
            v4.is_loopback()
                || v4.is_private()
                || v4.is_link_local()
                || v4.is_unspecified()
        }
        IpAddr::V6(v6) => {
            v6.is_loopback()
                || v6.is_unspecified()
                // fe80::/10, link-local
                || (v6.segments()[0] & 0xffc0) == 0xfe80
                // fc00::/7, unique-local
                || (v6.segments()[0] & 0xfe00) == 0xfc00
        }
    }
}

/// Builder for [`SafeFetcher`].
#[derive(TypedBuilder, Debug, Clone)]
#[builder(field_defaults(default))]
pub struct FetcherBuilder {
    /// Wall-clock bound per fetch, redirects included
    #[builder(default = DEFAULT_FETCH_TIMEOUT)]
    timeout: Duration,
    /// Responses larger than this are aborted mid-stream
    #[builder(default = MAX_DECLARATION_BYTES)]
    max_size: usize,
    /// 301/302 hops followed before giving up
    #[builder(default = MAX_REDIRECTS)]
    max_redirects: usize,
    /// When `true` (the default), refuse any non-`https` URL.
    ///
    /// Only meant to be turned off under a test harness whose mock server
    /// speaks plain HTTP.
    #[builder(default = true)]
    require_https: bool,
    /// When `true` (the default), resolve hostnames and refuse private,
    /// loopback and link-local destinations
    #[builder(default = true)]
    block_private_ips: bool,
    /// Hosts exempt from the DNS pre-check
    #[builder(default_code = "default_trusted_hosts()")]
    trusted_hosts: HashSet<String>,
}

impl Default for FetcherBuilder {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl FetcherBuilder {
    /// Instantiate a [`SafeFetcher`].
    ///
    /// # Errors
    ///
    /// Returns an `Err` if the underlying request client cannot be created.
    pub fn fetcher(self) -> Result<SafeFetcher> {
        // Redirects are handled manually so that every hop goes through the
        // same URL vetting as the initial request.
        let client = reqwest::ClientBuilder::new()
            .gzip(true)
            .redirect(reqwest::redirect::Policy::none())
            .timeout(self.timeout)
            .build()
            .map_err(ErrorKind::BuildRequestClient)?;

        Ok(SafeFetcher {
            client,
            timeout: self.timeout,
            max_size: self.max_size,
            max_redirects: self.max_redirects,
            require_https: self.require_https,
            block_private_ips: self.block_private_ips,
            trusted_hosts: self.trusted_hosts,
        })
    }
}

/// HTTPS-only, SSRF-protected HTTP client for declaration documents.
///
/// See [`FetcherBuilder`] for configuration; defaults are the strict
/// production settings.
#[derive(Debug, Clone)]
pub struct SafeFetcher {
    client: reqwest::Client,
    timeout: Duration,
    max_size: usize,
    max_redirects: usize,
    require_https: bool,
    block_private_ips: bool,
    trusted_hosts: HashSet<String>,
}

impl SafeFetcher {
    /// Fetch a declaration document body.
    ///
    /// Never errors: refused URLs, network failures, non-200 responses,
    /// oversized bodies and timeouts all yield `None`.
    pub async fn fetch(&self, url: &Url) -> Option<String> {
        match tokio::time::timeout(self.timeout, self.fetch_with_redirects(url)).await {
            Ok(body) => body,
            Err(_) => {
                debug!("fetch of {url} timed out after {:?}", self.timeout);
                None
            }
        }
    }

    async fn fetch_with_redirects(&self, url: &Url) -> Option<String> {
        let mut current = url.clone();
        let mut redirects_left = self.max_redirects;

        loop {
            if !self.is_allowed(&current).await {
                return None;
            }

            let response = match self.client.get(current.clone()).send().await {
                Ok(response) => response,
                Err(e) => {
                    debug!("fetch of {current} failed: {e}");
                    return None;
                }
            };

            let status = response.status();
            if status == StatusCode::MOVED_PERMANENTLY || status == StatusCode::FOUND {
                if redirects_left == 0 {
                    debug!("fetch of {current} exceeded {} redirects", self.max_redirects);
                    return None;
                }
                let location = response.headers().get(header::LOCATION)?.to_str().ok()?;
                // Resolving against the current URL supports relative
                // redirects; the next loop iteration re-validates the target
                current = current.join(location).ok()?;
                redirects_left -= 1;
                continue;
            }

            if status != StatusCode::OK {
                debug!("fetch of {current} returned status {status}");
                return None;
            }

            return self.read_bounded_body(response).await;
        }
    }

    /// Stream the body, aborting the moment it exceeds the size cap
    async fn read_bounded_body(&self, mut response: reqwest::Response) -> Option<String> {
        let url = response.url().clone();
        let mut bytes: Vec<u8> = Vec::new();

        loop {
            match response.chunk().await {
                Ok(Some(chunk)) => {
                    if bytes.len() + chunk.len() > self.max_size {
                        warn!("response from {url} exceeded {} bytes, aborting", self.max_size);
                        return None;
                    }
                    bytes.extend_from_slice(&chunk);
                }
                Ok(None) => break,
                Err(e) => {
                    debug!("reading response body from {url} failed: {e}");
                    return None;
                }
            }
        }

        String::from_utf8(bytes).ok()
    }

    /// Vet a URL before any request is issued
    async fn is_allowed(&self, url: &Url) -> bool {
        if self.require_https && url.scheme() != "https" {
            debug!("refusing non-https URL {url}");
            return false;
        }
        if !matches!(url.scheme(), "http" | "https") {
            return false;
        }

        let Some(host) = url.host() else {
            return false;
        };

        if !self.block_private_ips {
            return true;
        }

        match host {
            Host::Domain(domain) if self.trusted_hosts.contains(domain) => true,
            Host::Domain(domain) => {
                let port = url.port_or_known_default().unwrap_or(443);
                match lookup_host((domain, port)).await {
                    Ok(mut addrs) => {
                        // Refuse if any resolved address is internal; a
                        // multi-record answer mixing public and private IPs
                        // is exactly the DNS-rebinding shape we guard against
                        if addrs.any(|addr| is_private_ip(addr.ip())) {
                            debug!("refusing {url}: resolves to a private address");
                            false
                        } else {
                            true
                        }
                    }
                    Err(e) => {
                        // DNS failure fails closed
                        debug!("refusing {url}: DNS resolution failed: {e}");
                        false
                    }
                }
            }
            Host::Ipv4(addr) => !is_private_ip(IpAddr::V4(addr)),
            Host::Ipv6(addr) => !is_private_ip(IpAddr::V6(addr)),
        }
    }
}
