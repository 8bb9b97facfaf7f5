//! Loading session settings and opening sessions from them.

use statecast_core::StateHost;
use statecast_sync::{Capability, ChannelSession, SyncConfig, SyncHooks, SyncOptions};

use crate::error::Result;

/// Parse a [`SyncConfig`] from JSON. Missing flags take their defaults.
pub fn load_config(json: &str) -> Result<SyncConfig> {
    let config: SyncConfig = serde_json::from_str(json)?;
    tracing::debug!(
        channel = %config.channel,
        request_state = config.request_state,
        skip_first = config.skip_first,
        skip_older = config.skip_older,
        "loaded sync config"
    );
    Ok(config)
}

/// Open a session with default projections and traced hooks.
pub fn connect<H: StateHost>(
    host: H,
    config: SyncConfig,
    capability: Capability,
) -> Result<ChannelSession<H>> {
    let hooks = SyncHooks::traced(config.channel.clone());
    let options = SyncOptions::from_config(config).with_hooks(hooks);
    Ok(ChannelSession::connect(host, options, capability)?)
}
