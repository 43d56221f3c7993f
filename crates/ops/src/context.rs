//! Operations context for dependency injection

use lxpkg_builder::PrivilegeEscalation;
use lxpkg_config::{Config, Roots};
use lxpkg_errors::Error;
use lxpkg_events::{EventEmitter, EventSender};
use lxpkg_index::DescriptorIndex;
use lxpkg_net::NetClient;
use std::sync::Arc;

/// Operations context providing access to all pipeline components
#[derive(Debug)]
pub struct OpsCtx {
    /// Filesystem roots the pipeline works against
    pub roots: Roots,
    /// Descriptor index of the source tree
    pub index: Arc<DescriptorIndex>,
    /// Network client
    pub net: NetClient,
    /// Strategy for commands containing `sudo`
    pub escalation: Arc<dyn PrivilegeEscalation>,
    /// Shell used to run build commands
    pub shell: String,
    /// Event sender for progress reporting
    pub tx: EventSender,
    /// System configuration
    pub config: Config,
}

impl EventEmitter for OpsCtx {
    fn event_sender(&self) -> Option<&EventSender> {
        Some(&self.tx)
    }
}

/// Builder for the operations context
#[derive(Default)]
pub struct OpsContextBuilder {
    roots: Option<Roots>,
    index: Option<Arc<DescriptorIndex>>,
    net: Option<NetClient>,
    escalation: Option<Arc<dyn PrivilegeEscalation>>,
    shell: Option<String>,
    tx: Option<EventSender>,
    config: Option<Config>,
}

impl OpsContextBuilder {
    /// Create new context builder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set filesystem roots
    #[must_use]
    pub fn with_roots(mut self, roots: Roots) -> Self {
        self.roots = Some(roots);
        self
    }

    /// Set descriptor index
    #[must_use]
    pub fn with_index(mut self, index: DescriptorIndex) -> Self {
        self.index = Some(Arc::new(index));
        self
    }

    /// Set network client
    #[must_use]
    pub fn with_net(mut self, net: NetClient) -> Self {
        self.net = Some(net);
        self
    }

    /// Set privilege escalation strategy
    #[must_use]
    pub fn with_escalation(mut self, escalation: Arc<dyn PrivilegeEscalation>) -> Self {
        self.escalation = Some(escalation);
        self
    }

    /// Set the shell build commands run under
    #[must_use]
    pub fn with_shell(mut self, shell: impl Into<String>) -> Self {
        self.shell = Some(shell.into());
        self
    }

    /// Set event sender
    #[must_use]
    pub fn with_event_sender(mut self, tx: EventSender) -> Self {
        self.tx = Some(tx);
        self
    }

    /// Set configuration
    #[must_use]
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Build the context
    ///
    /// Roots, shell and escalation fall back to what the configuration
    /// says when they were not set explicitly.
    ///
    /// # Errors
    ///
    /// Returns an error if the index, network client or event sender is
    /// missing, or the configured escalation strategy cannot be built.
    pub fn build(self) -> Result<OpsCtx, Error> {
        let config = self.config.unwrap_or_default();

        let index = self
            .index
            .ok_or_else(|| Error::internal("index is required"))?;
        let net = self
            .net
            .ok_or_else(|| Error::internal("net client is required"))?;
        let tx = self
            .tx
            .ok_or_else(|| Error::internal("event sender is required"))?;

        let escalation = match self.escalation {
            Some(escalation) => escalation,
            None => lxpkg_builder::privilege::from_config(&config.build.escalation)?,
        };
        let roots = self.roots.unwrap_or_else(|| config.roots());
        let shell = self.shell.unwrap_or_else(|| config.build.shell.clone());

        Ok(OpsCtx {
            roots,
            index,
            net,
            escalation,
            shell,
            tx,
            config,
        })
    }
}
