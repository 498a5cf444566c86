/// Sender configuration.
///
/// Loaded from a TOML file, all keys optional:
///
/// ```toml
/// unique-designation = "Alpha1"
///
/// [transport]
/// destination = "255.255.255.255:45678"
///
/// [message-types]
/// spot_report = "spotrep"
/// ```
use std::{collections::BTreeMap, fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::{transport::DEFAULT_UDP_PORT, Error, SRResult};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Config {
    /// Sending unit's designation, sent by `SpotReportSender::send_report`. Omitted from messages
    /// when unset.
    pub unique_designation: Option<String>,
    pub transport: TransportConfig,
    /// Internal report type → outbound type name.
    pub message_types: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct TransportConfig {
    /// `host:port` datagrams are sent to.
    pub destination: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            destination: format!("255.255.255.255:{DEFAULT_UDP_PORT}"),
        }
    }
}

impl Config {
    pub fn from_toml_str(s: &str) -> SRResult<Self> {
        toml::from_str(s).map_err(|e| Error::Config(e.to_string()))
    }

    pub fn load(path: &Path) -> SRResult<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read {}: {e}", path.display())))?;
        toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("invalid config at {}: {e}", path.display())))
    }
}

#[cfg(test)]
mod test {
    use std::io::Write;

    use super::*;
    use crate::protocol::{OutboundTypes, SPOT_REPORT_TYPE};

    #[test]
    fn test_defaults_from_empty() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config.unique_designation, None);
        assert_eq!(config.transport.destination, "255.255.255.255:45678");
        assert!(config.message_types.is_empty());
    }

    #[test]
    fn test_full_config() {
        let config = Config::from_toml_str(
            r#"
            unique-designation = "Alpha1"

            [transport]
            destination = "10.0.0.255:5000"

            [message-types]
            spot_report = "spotrep"
            "#,
        )
        .unwrap();
        assert_eq!(config.unique_designation.as_deref(), Some("Alpha1"));
        assert_eq!(config.transport.destination, "10.0.0.255:5000");
        let types = OutboundTypes::from(&config);
        assert_eq!(types.outbound_name(SPOT_REPORT_TYPE), "spotrep");
    }

    #[test]
    fn test_invalid_config() {
        assert!(matches!(
            Config::from_toml_str("unique-designation = 7"),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "unique-designation = \"Bravo2\"").unwrap();
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.unique_designation.as_deref(), Some("Bravo2"));

        let mut bad = tempfile::NamedTempFile::new().unwrap();
        writeln!(bad, "unique-designation = 7").unwrap();
        let msg = Config::load(bad.path()).unwrap_err().to_string();
        assert!(msg.starts_with("Config error: invalid config at "), "{msg}");
        assert_eq!(msg.matches("Config error").count(), 1, "{msg}");

        let missing = file.path().with_extension("missing");
        assert!(matches!(Config::load(&missing), Err(Error::Config(_))));
    }
}
