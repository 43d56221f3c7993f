//! System setup and initialization

use crate::error::CliError;
use lxpkg_config::Config;
use lxpkg_errors::Error;
use lxpkg_events::EventSender;
use lxpkg_index::DescriptorIndex;
use lxpkg_net::{NetClient, NetConfig};
use lxpkg_ops::{OpsContextBuilder, OpsCtx};
use tracing::{debug, info};

/// Builds the components an operations context needs
pub struct SystemSetup {
    config: Config,
    index: Option<DescriptorIndex>,
    net: Option<NetClient>,
}

impl SystemSetup {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            index: None,
            net: None,
        }
    }

    /// Scan the source tree and create the network client
    pub fn initialize(&mut self) -> Result<(), CliError> {
        info!("Initializing lxpkg components");
        self.init_index()?;
        self.init_net()?;
        Ok(())
    }

    fn init_index(&mut self) -> Result<(), CliError> {
        let roots = self.config.roots();
        // artifacts land in the build root, which may sit inside the source tree
        let index = DescriptorIndex::scan_excluding(roots.source_tree, vec![roots.build])?;
        info!(
            root = %index.root().display(),
            descriptors = index.len(),
            "descriptor index ready"
        );
        self.index = Some(index);
        Ok(())
    }

    fn init_net(&mut self) -> Result<(), CliError> {
        let net_config = NetConfig::from(&self.config.network);
        debug!(
            timeout = ?net_config.timeout,
            retries = net_config.retry_count,
            "network client configured"
        );
        self.net = Some(NetClient::new(net_config)?);
        Ok(())
    }

    /// Assemble the operations context
    pub fn into_context(self, tx: EventSender) -> Result<OpsCtx, CliError> {
        let index = self
            .index
            .ok_or_else(|| Error::internal("index not initialized"))?;
        let net = self
            .net
            .ok_or_else(|| Error::internal("net not initialized"))?;

        let ctx = OpsContextBuilder::new()
            .with_index(index)
            .with_net(net)
            .with_event_sender(tx)
            .with_config(self.config)
            .build()?;
        Ok(ctx)
    }
}
