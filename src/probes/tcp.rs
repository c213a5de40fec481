// Copyright (c) 2025 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::debug;

use super::{PortState, TcpProbe};

/// TCP connect probe. A completed handshake is `Open`, an explicit
/// rejection `Closed`, and no answer before the deadline `Filtered`.
pub struct TokioTcpProbe {
    connect_timeout: Duration,
}

impl TokioTcpProbe {
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }
}

#[async_trait]
impl TcpProbe for TokioTcpProbe {
    async fn connect(&self, addr: SocketAddr) -> PortState {
        match timeout(self.connect_timeout, TcpStream::connect(addr)).await {
            Ok(Ok(_stream)) => PortState::Open,
            Ok(Err(e)) if e.kind() == ErrorKind::ConnectionRefused => {
                debug!(%addr, outcome = "refused", "Port closed");
                PortState::Closed
            }
            Ok(Err(e)) => {
                debug!(%addr, outcome = "unreachable", error = %e, "Port unreachable");
                PortState::Filtered
            }
            Err(_) => {
                debug!(%addr, outcome = "timeout", "Port filtered");
                PortState::Filtered
            }
        }
    }
}
