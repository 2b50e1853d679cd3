use log::warn;
use once_cell::sync::OnceCell;
use serde_derive::Deserialize;

static INSTANCE: OnceCell<RuntimeConfig> = OnceCell::new();

/// Process-wide configuration. Falls back to defaults if `init` was never
/// called.
pub fn instance() -> &'static RuntimeConfig {
    INSTANCE.get_or_init(RuntimeConfig::new)
}

/// Installs the process-wide configuration. Returns `false` if it was
/// already set.
pub fn init(config: RuntimeConfig) -> bool {
    INSTANCE.set(config).is_ok()
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Address of the command listener.
    pub addr: String,
    pub metrics_addr: String,
    pub enable_metrics: bool,
    /// Longest accepted request line, newline included.
    pub max_request_bytes: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl RuntimeConfig {
    pub fn new() -> Self {
        RuntimeConfig {
            addr: "0.0.0.0:5555".to_string(),
            metrics_addr: "0.0.0.0:5565".to_string(),
            enable_metrics: true,
            max_request_bytes: 4096,
        }
    }

    pub fn parse(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /// Reads `path`, falling back to defaults when the file is missing or
    /// malformed.
    pub fn from_toml(path: &str) -> Self {
        let contents = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => {
                warn!(
                    "Something went wrong reading the runtime config file {}, {:?}",
                    path, e
                );
                return RuntimeConfig::new();
            }
        };
        match Self::parse(&contents) {
            Ok(c) => c,
            Err(e) => {
                warn!(
                    "Something went wrong parsing the runtime config file {}, {:?}",
                    path, e
                );
                RuntimeConfig::new()
            }
        }
    }
}
