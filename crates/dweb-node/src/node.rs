//! A started node: bootstrap report plus its resolution collaborator.

use dweb_types::config::NodeSettings;
use dweb_types::error::Result;

use crate::bootstrap::{BootstrapReport, Dialer, bootstrap_peers};
use crate::gateway::GatewayResolver;

/// A running node.
pub struct Node {
    resolver: GatewayResolver,
    report: BootstrapReport,
}

impl Node {
    /// Dial the bootstrap peers and set up the gateway resolver.
    ///
    /// Peer failures are recorded in the report; only an unusable gateway
    /// configuration is an error.
    pub fn start(settings: &NodeSettings, dialer: &dyn Dialer) -> Result<Self> {
        let resolver = GatewayResolver::new(&settings.gateway_url)?;
        log::info!(
            "Starting node: {} bootstrap peers, gateway {}",
            settings.bootstrap_peers.len(),
            settings.gateway_url,
        );
        let report = bootstrap_peers(&settings.bootstrap_peers, dialer, settings.dial_timeout());
        if report.connected.is_empty() && !settings.bootstrap_peers.is_empty() {
            log::warn!("No bootstrap peer reachable; continuing with gateway routing only");
        }
        Ok(Self { resolver, report })
    }

    pub fn resolver(&self) -> &GatewayResolver {
        &self.resolver
    }

    /// Consume the node, keeping only its resolver.
    pub fn into_resolver(self) -> GatewayResolver {
        self.resolver
    }

    pub fn report(&self) -> &BootstrapReport {
        &self.report
    }
}
