//! Peer-to-peer node plumbing for dweb-nav.
//!
//! Dials the configured bootstrap peers (sequentially, each attempt
//! time-bounded, failures non-fatal) and exposes a [`GatewayResolver`]
//! that fetches `/ipfs/` and `/ipns/` paths from an HTTP gateway.

pub mod bootstrap;
pub mod gateway;
pub mod node;
pub mod peer;

pub use bootstrap::{BootstrapReport, Dialer, TcpDialer, bootstrap_peers};
pub use gateway::GatewayResolver;
pub use node::Node;
pub use peer::PeerAddr;
