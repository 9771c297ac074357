use chainhost_client::config::LoopbackConfig;
use chainhost_client::ClientConfig;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CliConfig {
    #[serde(default)]
    pub client: ClientConfig,
    #[serde(default)]
    pub engine: LoopbackConfig,
    #[serde(default)]
    pub chains: Vec<ChainEntry>,
}

/// One `[[chains]]` table. Relative paths are taken from the config file's directory.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChainEntry {
    pub name: String,
    pub spec: PathBuf,
    pub database: Option<PathBuf>,
    /// Names of earlier entries offered as relay chain candidates.
    #[serde(default)]
    pub relay_chains: Vec<String>,
    #[serde(default)]
    pub disable_json_rpc: bool,
}

impl CliConfig {
    pub fn from_toml(input: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(input)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, std::io::Error> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        let mut config = Self::from_toml(&contents)
            .map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidData, err))?;
        if let Some(base) = path.parent() {
            config.rebase(base);
        }
        Ok(config)
    }

    pub fn chain(&self, name: &str) -> Option<&ChainEntry> {
        self.chains.iter().find(|entry| entry.name == name)
    }

    fn rebase(&mut self, base: &Path) {
        for entry in &mut self.chains {
            if entry.spec.is_relative() {
                entry.spec = base.join(&entry.spec);
            }
            if let Some(database) = entry.database.as_mut().filter(|path| path.is_relative()) {
                *database = base.join(&*database);
            }
        }
    }
}
