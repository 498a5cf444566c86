use std::collections::BTreeMap;

use crate::config::Config;

pub mod geomessage;

/// Internal report type tag for spot reports.
pub const SPOT_REPORT_TYPE: &str = "spot_report";

/// Maps internal report type tags to the type name actually sent on the wire.
///
/// Older listeners expect different names for some report types, so the mapping is configurable.
/// Unmapped types go out unchanged.
#[derive(Debug, Clone, Default)]
pub struct OutboundTypes {
    renames: BTreeMap<String, String>,
}

impl OutboundTypes {
    pub fn with_rename(mut self, internal: impl Into<String>, outbound: impl Into<String>) -> Self {
        self.renames.insert(internal.into(), outbound.into());
        self
    }

    pub fn outbound_name<'a>(&'a self, internal: &'a str) -> &'a str {
        self.renames
            .get(internal)
            .map(String::as_str)
            .unwrap_or(internal)
    }
}

impl From<&Config> for OutboundTypes {
    fn from(config: &Config) -> Self {
        Self {
            renames: config.message_types.clone(),
        }
    }
}
