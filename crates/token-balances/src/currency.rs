use {
    crate::{denom::Denom, network::NetworkId},
    std::{
        collections::{HashMap, HashSet},
        sync::RwLock,
    },
    thiserror::Error,
};

/// Display information of a currency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrencyMetadata {
    pub denom: Denom,
    pub symbol: String,
    pub decimals: u8,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("unknown currency {denom} on {network}")]
    Unknown { network: NetworkId, denom: Denom },
    #[error("currency resolution failed: {0}")]
    Other(String),
}

/// Source of currency metadata. Also learns about tokens that were first seen
/// in balance responses.
#[cfg_attr(any(test, feature = "test-util"), mockall::automock)]
pub trait CurrencyResolving: Send + Sync {
    fn resolve(&self, network: &NetworkId, denom: &Denom)
    -> Result<CurrencyMetadata, ResolveError>;

    /// Registers denominations found in balance responses. Registering a
    /// denomination more than once has no further effect.
    fn register_discovered(&self, network: &NetworkId, denoms: HashSet<Denom>);
}

/// In memory currency catalog.
#[derive(Debug, Default)]
pub struct StaticCurrencies {
    currencies: RwLock<HashMap<(NetworkId, Denom), CurrencyMetadata>>,
    discovered: RwLock<HashMap<NetworkId, HashSet<Denom>>>,
}

impl StaticCurrencies {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, network: NetworkId, currency: CurrencyMetadata) {
        self.currencies
            .write()
            .unwrap()
            .insert((network, currency.denom.clone()), currency);
    }

    /// Denominations registered through
    /// [`CurrencyResolving::register_discovered`] that have no metadata yet.
    pub fn unknown(&self, network: &NetworkId) -> HashSet<Denom> {
        let currencies = self.currencies.read().unwrap();
        self.discovered
            .read()
            .unwrap()
            .get(network)
            .into_iter()
            .flatten()
            .filter(|denom| !currencies.contains_key(&(network.clone(), (*denom).clone())))
            .cloned()
            .collect()
    }
}

impl CurrencyResolving for StaticCurrencies {
    fn resolve(
        &self,
        network: &NetworkId,
        denom: &Denom,
    ) -> Result<CurrencyMetadata, ResolveError> {
        self.currencies
            .read()
            .unwrap()
            .get(&(network.clone(), denom.clone()))
            .cloned()
            .ok_or_else(|| ResolveError::Unknown {
                network: network.clone(),
                denom: denom.clone(),
            })
    }

    fn register_discovered(&self, network: &NetworkId, denoms: HashSet<Denom>) {
        self.discovered
            .write()
            .unwrap()
            .entry(network.clone())
            .or_default()
            .extend(denoms);
    }
}
