use serde::{Deserialize, Serialize};

use crate::workload::WorkloadKind;

/// Autodown configuration file (YAML).
///
/// Example `config.yaml`:
/// ```yaml
/// dry-run: false
/// kinds: [Deployment, StatefulSet]
/// exclude-namespaces: [kube-system]
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AutodownConfigFile {
    #[serde(default, alias = "dry-run")]
    pub dry_run: Option<bool>,
    /// Kinds to scan; `None` means every supported kind.
    #[serde(default)]
    pub kinds: Option<Vec<WorkloadKind>>,
    #[serde(default, alias = "exclude-namespaces")]
    pub exclude_namespaces: Vec<String>,
}

/// Load a YAML config file, returning the default if the file doesn't exist.
pub fn load_config_file<T: serde::de::DeserializeOwned + Default>(path: &str) -> anyhow::Result<T> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Ok(T::default());
        }
        Err(e) => return Err(e.into()),
    };
    // an empty file deserializes to unit, not to the defaults
    if content.trim().is_empty() {
        return Ok(T::default());
    }
    let config: T = serde_yaml::from_str(&content)?;
    Ok(config)
}
