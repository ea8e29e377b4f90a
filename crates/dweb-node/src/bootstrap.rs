//! Startup dialing of bootstrap peers.
//!
//! Peers are dialed one after another, each attempt bounded by the
//! configured timeout. A failing peer is logged and skipped; resolution
//! may still succeed through routes discovered later, so bootstrap itself
//! never fails.

use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use dweb_types::error::{DwebError, Result};

use crate::peer::PeerAddr;

/// Opens a connection to a peer.
pub trait Dialer {
    fn dial(&self, peer: &PeerAddr, timeout: Duration) -> Result<()>;
}

/// Dials peers with a plain TCP connect.
#[derive(Debug, Default, Clone, Copy)]
pub struct TcpDialer;

impl Dialer for TcpDialer {
    fn dial(&self, peer: &PeerAddr, timeout: Duration) -> Result<()> {
        let fail = |reason: String| DwebError::BootstrapPeer {
            peer: peer.raw.clone(),
            reason,
        };

        let addr = peer
            .socket_target()
            .to_socket_addrs()
            .map_err(|e| fail(format!("DNS resolution failed: {e}")))?
            .next()
            .ok_or_else(|| fail("no addresses".to_string()))?;

        TcpStream::connect_timeout(&addr, timeout)
            .map_err(|e| fail(format!("TCP connect failed: {e}")))?;
        Ok(())
    }
}

/// Outcome of a bootstrap round.
#[derive(Debug, Default)]
pub struct BootstrapReport {
    pub connected: Vec<PeerAddr>,
    /// Configured address and the error it produced.
    pub failed: Vec<(String, DwebError)>,
}

impl BootstrapReport {
    pub fn attempted(&self) -> usize {
        self.connected.len() + self.failed.len()
    }
}

/// Dial every configured peer in order.
pub fn bootstrap_peers(peers: &[String], dialer: &dyn Dialer, timeout: Duration) -> BootstrapReport {
    let mut report = BootstrapReport::default();

    for raw in peers {
        let attempt = PeerAddr::parse(raw).and_then(|peer| {
            dialer.dial(&peer, timeout)?;
            Ok(peer)
        });
        match attempt {
            Ok(peer) => {
                log::info!("Connected to bootstrap peer {peer}");
                report.connected.push(peer);
            },
            Err(e) => {
                log::warn!("Skipping bootstrap peer: {e}");
                report.failed.push((raw.clone(), e));
            },
        }
    }

    log::info!(
        "Bootstrap finished: {}/{} peers connected",
        report.connected.len(),
        report.attempted(),
    );
    report
}
