use std::time::Duration;

use postbox_core::AutoCreate;

/// Runtime-level options shared by every message store the runtime hosts.
#[derive(Debug, Clone)]
pub struct RuntimeOptions {
    /// Provisioning policy for stores discovered by a refresh sweep.
    pub auto_build_message_storage_on_startup: AutoCreate,
    /// Interval between background refresh sweeps.
    pub refresh_interval: Duration,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            auto_build_message_storage_on_startup: AutoCreate::CreateOrUpdate,
            refresh_interval: Duration::from_secs(30),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runtime_options_defaults() {
        let options = RuntimeOptions::default();
        assert_eq!(
            options.auto_build_message_storage_on_startup,
            AutoCreate::CreateOrUpdate
        );
        assert_eq!(options.refresh_interval, Duration::from_secs(30));
    }
}
