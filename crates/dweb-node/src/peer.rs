//! Bootstrap peer addresses.
//!
//! Only the subset of multiaddr needed to reach a peer over TCP is
//! understood: a host component (`ip4`, `ip6`, `dns`, `dns4`, `dns6`)
//! followed by `tcp/<port>`, optionally followed by transport markers
//! (`ws`, `wss`, `tls`) and a trailing `p2p/<peer-id>`.

use std::fmt;

use dweb_types::error::{DwebError, Result};

/// A dialable bootstrap peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerAddr {
    /// The multiaddr as configured.
    pub raw: String,
    pub host: String,
    pub port: u16,
    pub peer_id: Option<String>,
}

impl PeerAddr {
    /// Parse a multiaddr string such as
    /// `/dns4/node0.preload.ipfs.io/tcp/443/wss/p2p/QmZMx...`.
    pub fn parse(raw: &str) -> Result<Self> {
        let fail = |reason: &str| DwebError::BootstrapPeer {
            peer: raw.to_string(),
            reason: reason.to_string(),
        };

        let rest = raw
            .strip_prefix('/')
            .ok_or_else(|| fail("multiaddr must start with '/'"))?;
        let mut parts = rest.split('/');

        let mut host = None;
        let mut port = None;
        let mut peer_id = None;

        while let Some(proto) = parts.next() {
            match proto {
                "ip4" | "ip6" | "dns" | "dns4" | "dns6" => {
                    let value = parts.next().filter(|v| !v.is_empty());
                    host = Some(value.ok_or_else(|| fail("missing host"))?.to_string());
                },
                "dnsaddr" => return Err(fail("dnsaddr needs TXT resolution")),
                "tcp" => {
                    let value = parts.next().ok_or_else(|| fail("missing tcp port"))?;
                    port = Some(value.parse::<u16>().map_err(|_| fail("bad tcp port"))?);
                },
                "udp" | "quic" | "quic-v1" | "webtransport" => {
                    return Err(fail("only tcp transports are dialable"));
                },
                "ws" | "wss" | "tls" | "http" | "https" => {},
                "p2p" | "ipfs" => {
                    let value = parts.next().filter(|v| !v.is_empty());
                    peer_id = Some(value.ok_or_else(|| fail("missing peer id"))?.to_string());
                },
                "" => {},
                other => return Err(fail(&format!("unsupported protocol {other}"))),
            }
        }

        Ok(Self {
            raw: raw.to_string(),
            host: host.ok_or_else(|| fail("no host component"))?,
            port: port.ok_or_else(|| fail("no tcp component"))?,
            peer_id,
        })
    }

    /// `host:port` suitable for socket address resolution.
    pub fn socket_target(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

impl fmt::Display for PeerAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_dns4_wss_with_peer_id() {
        let addr = PeerAddr::parse(
            "/dns4/node0.preload.ipfs.io/tcp/443/wss/p2p/QmZMxNdpMkewiVZLMRxaNxUeZpDUb34pWjodAZ8rnjqDFc",
        )
        .unwrap();
        assert_eq!(addr.host, "node0.preload.ipfs.io");
        assert_eq!(addr.port, 443);
        assert_eq!(
            addr.peer_id.as_deref(),
            Some("QmZMxNdpMkewiVZLMRxaNxUeZpDUb34pWjodAZ8rnjqDFc")
        );
        assert_eq!(addr.socket_target(), "node0.preload.ipfs.io:443");
    }

    #[test]
    fn parse_ip6_brackets_target() {
        let addr = PeerAddr::parse("/ip6/::1/tcp/4001").unwrap();
        assert_eq!(addr.socket_target(), "[::1]:4001");
        assert_eq!(addr.peer_id, None);
    }

    #[test]
    fn legacy_ipfs_component_is_peer_id() {
        let addr = PeerAddr::parse("/ip4/127.0.0.1/tcp/4001/ipfs/QmPeer").unwrap();
        assert_eq!(addr.peer_id.as_deref(), Some("QmPeer"));
    }

    #[test]
    fn reject_non_tcp_and_dnsaddr() {
        assert!(PeerAddr::parse("/ip4/1.2.3.4/udp/4001/quic-v1").is_err());
        assert!(PeerAddr::parse("/dnsaddr/bootstrap.libp2p.io/p2p/QmNno").is_err());
    }

    #[test]
    fn reject_malformed() {
        for bad in ["", "ip4/1.2.3.4/tcp/1", "/ip4/1.2.3.4", "/tcp/80", "/ip4/1.2.3.4/tcp/x"] {
            let err = PeerAddr::parse(bad).unwrap_err();
            assert!(
                format!("{err}").contains("bootstrap peer"),
                "unexpected error for {bad:?}: {err}"
            );
        }
    }
}
