use {
    crate::{
        config::Configuration,
        currency::CurrencyResolving,
        denom::Denom,
        fetcher::BatchBalanceFetching,
        network::{BalanceKey, NetworkId, is_hex_address_with_checksum},
        observe,
        parent::{InFlightFetches, SharedBalances},
        view::BalanceView,
    },
    dashmap::DashMap,
    std::sync::Arc,
};

/// Hands out balance views backed by one [`SharedBalances`] per account and
/// network.
pub struct Registry {
    config: Configuration,
    fetcher: Arc<dyn BatchBalanceFetching>,
    currencies: Arc<dyn CurrencyResolving>,
    parents: DashMap<BalanceKey, Arc<SharedBalances>>,
    in_flight: Arc<InFlightFetches>,
}

impl Registry {
    pub fn new(
        config: Configuration,
        fetcher: Arc<dyn BatchBalanceFetching>,
        currencies: Arc<dyn CurrencyResolving>,
    ) -> Self {
        Self {
            config,
            fetcher,
            currencies,
            parents: DashMap::new(),
            in_flight: Arc::new(InFlightFetches::labelled("token_balances")),
        }
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    /// Returns a view of the `denom` balance of `address`.
    ///
    /// Returns `None` if the balance can't be served by batch queries: the
    /// token is not an ERC-20 token, the network has no batch endpoint or the
    /// address is not a checksummed hex address. Callers should use a
    /// different balance source in that case.
    pub fn view(&self, network: &NetworkId, address: &str, denom: &str) -> Option<BalanceView> {
        let contract = denom.parse::<Denom>().ok()?.erc20_contract()?;
        let endpoint = &self.config.network(network)?.endpoint;
        if !network.is_evm()
            || network.batch_provider_slug().is_none()
            || !is_hex_address_with_checksum(address)
        {
            return None;
        }

        let key = BalanceKey::new(network.clone(), address);
        // The entry keeps its shard locked until the cache is inserted, so
        // concurrent first lookups of a key create one cache.
        let parent = self
            .parents
            .entry(key.clone())
            .or_insert_with(|| {
                observe::parent_created(&key);
                Arc::new(SharedBalances::new(
                    key.clone(),
                    endpoint.clone(),
                    self.config.max_count,
                    self.fetcher.clone(),
                    self.currencies.clone(),
                    self.in_flight.clone(),
                ))
            })
            .value()
            .clone();

        observe::view_created(&key, &contract);
        Some(BalanceView::new(parent, contract))
    }

    /// The shared cache of an account, if a view of it was ever requested.
    pub fn parent(&self, network: &NetworkId, address: &str) -> Option<Arc<SharedBalances>> {
        self.parents
            .get(&BalanceKey::new(network.clone(), address))
            .map(|parent| parent.value().clone())
    }

    /// Number of shared caches.
    pub fn len(&self) -> usize {
        self.parents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }
}
