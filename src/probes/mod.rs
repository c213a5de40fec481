// Copyright (c) 2025 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Network probes used by the scanners.
//!
//! Each probe is a trait so scanners can be exercised against in-process
//! fakes. Probe results keep "timed out" apart from "absent" or "refused":
//! scanners decide what each means, the probes only report it.

pub mod dns;
pub mod http;
pub mod tcp;
pub mod tls;

use async_trait::async_trait;
use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use crate::errors::ScannerResult;

pub use dns::HickoryDnsProbe;
pub use http::ReqwestHttpProbe;
pub use tcp::TokioTcpProbe;
pub use tls::{CertificateInfo, RustlsTlsProbe, TlsInspection};

/// Outcome of a TXT lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxtLookup {
    /// One string per TXT record, segments concatenated
    Found(Vec<String>),
    /// NXDOMAIN, no TXT records, or resolver error
    Absent,
    TimedOut,
}

impl TxtLookup {
    /// Records, treating timeouts as absent
    pub fn records(&self) -> &[String] {
        match self {
            TxtLookup::Found(records) => records,
            _ => &[],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortState {
    Open,
    Closed,
    Filtered,
}

impl PortState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PortState::Open => "open",
            PortState::Closed => "closed",
            PortState::Filtered => "filtered",
        }
    }
}

/// Response summary for header inspection
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub url: String,
    pub status_code: u16,
    /// Lowercased header names
    pub headers: HashMap<String, String>,
    pub duration_ms: u64,
}

impl HttpResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }
}

/// Result of a plain-HTTP request with redirects disabled
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaintextProbe {
    Refused,
    TimedOut,
    Response {
        status: u16,
        location: Option<String>,
        body_len: usize,
    },
}

#[async_trait]
pub trait DnsProbe: Send + Sync {
    async fn txt_records(&self, name: &str) -> TxtLookup;

    async fn resolve_ip(&self, host: &str) -> ScannerResult<IpAddr>;
}

#[async_trait]
pub trait TlsProbe: Send + Sync {
    /// Handshake without trust validation and describe what was presented
    async fn inspect(&self, host: &str, port: u16) -> ScannerResult<TlsInspection>;
}

#[async_trait]
pub trait TcpProbe: Send + Sync {
    async fn connect(&self, addr: SocketAddr) -> PortState;
}

#[async_trait]
pub trait HttpProbe: Send + Sync {
    /// GET the site root over HTTPS, falling back to HTTP
    async fn fetch_headers(&self, host: &str) -> ScannerResult<HttpResponse>;

    /// GET `http://host/` without following redirects
    async fn fetch_plaintext(&self, host: &str) -> PlaintextProbe;
}
