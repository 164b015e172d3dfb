use {
    crate::{fetcher::MAX_PAGE_SIZE, network::NetworkId},
    anyhow::{anyhow, ensure},
    serde::{Deserialize, Serialize},
    std::{collections::HashSet, path::Path},
    url::Url,
};

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Configuration {
    /// How many token balances a single batch query returns at most.
    #[serde(default = "default_max_count")]
    pub max_count: u32,

    /// Networks with a batch balance endpoint.
    #[serde(default)]
    pub networks: Vec<Network>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Network {
    pub id: NetworkId,
    /// JSON-RPC endpoint serving batch balance queries.
    pub endpoint: Url,
}

fn default_max_count() -> u32 {
    MAX_PAGE_SIZE
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            max_count: default_max_count(),
            networks: Vec::new(),
        }
    }
}

impl Configuration {
    pub async fn from_path<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        match toml::from_str::<Self>(&tokio::fs::read_to_string(&path).await?) {
            Ok(self_) => self_.validate(),
            Err(err) if std::env::var("TOML_TRACE_ERROR").is_ok_and(|v| v == "1") => Err(anyhow!(
                "failed to parse TOML config at {}: {err:#?}",
                path.as_ref().display()
            )),
            Err(_) => Err(anyhow!(
                "failed to parse TOML config at: {}. Set TOML_TRACE_ERROR=1 to print parsing \
                 error but this may leak secrets.",
                path.as_ref().display()
            )),
        }
    }

    pub fn validate(self) -> anyhow::Result<Self> {
        ensure!(
            (1..=MAX_PAGE_SIZE).contains(&self.max_count),
            "max-count must be between 1 and {MAX_PAGE_SIZE}, got {}",
            self.max_count
        );

        let mut seen = HashSet::new();
        for network in &self.networks {
            ensure!(
                seen.insert(&network.id),
                "network {} is configured more than once",
                network.id
            );
            ensure!(
                network.id.batch_provider_slug().is_some(),
                "network {} has no batch balance support",
                network.id
            );
            ensure!(
                matches!(network.endpoint.scheme(), "http" | "https"),
                "endpoint of network {} must be an http(s) url",
                network.id
            );
        }
        Ok(self)
    }

    pub fn network(&self, id: &NetworkId) -> Option<&Network> {
        self.networks.iter().find(|network| &network.id == id)
    }
}
