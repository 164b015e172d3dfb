use {
    crate::{
        currency::CurrencyResolving,
        fetcher::{BatchBalanceFetching, BatchQuery},
        network::BalanceKey,
        observe,
        response::BatchResponse,
    },
    futures::FutureExt,
    request_sharing::BoxRequestSharing,
    std::sync::{Arc, Mutex},
    thiserror::Error,
    url::Url,
};

/// A failed batch fetch. Cloneable so that every caller waiting on the same
/// fetch receives it.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("failed to fetch balances: {0}")]
pub struct FetchError(String);

impl FetchError {
    pub fn new(err: &anyhow::Error) -> Self {
        Self(format!("{err:#}"))
    }
}

/// Batch fetches currently in flight, shared by all caches of a
/// [`crate::Registry`].
pub type InFlightFetches = BoxRequestSharing<BalanceKey, Result<(), FetchError>>;

#[derive(Default)]
struct State {
    response: Option<Arc<BatchResponse>>,
    error: Option<FetchError>,
    started: bool,
}

/// Balances of all tokens of one account on one network, shared by every
/// [`crate::BalanceView`] of that account.
///
/// At most one batch fetch per cache is in flight at any time; concurrent
/// [`SharedBalances::fetch`] calls wait for the same outcome. A failed fetch
/// keeps the previous response around.
pub struct SharedBalances {
    key: BalanceKey,
    /// `None` for keys that can't be fetched.
    query: Option<BatchQuery>,
    fetcher: Arc<dyn BatchBalanceFetching>,
    currencies: Arc<dyn CurrencyResolving>,
    state: Arc<Mutex<State>>,
    in_flight: Arc<InFlightFetches>,
}

impl SharedBalances {
    pub fn new(
        key: BalanceKey,
        endpoint: Url,
        max_count: u32,
        fetcher: Arc<dyn BatchBalanceFetching>,
        currencies: Arc<dyn CurrencyResolving>,
        in_flight: Arc<InFlightFetches>,
    ) -> Self {
        let query = key
            .hex_address()
            .filter(|_| key.can_fetch())
            .map(|address| BatchQuery {
                endpoint,
                address,
                max_count,
            });
        Self {
            key,
            query,
            fetcher,
            currencies,
            state: Default::default(),
            in_flight,
        }
    }

    pub fn key(&self) -> &BalanceKey {
        &self.key
    }

    pub fn can_fetch(&self) -> bool {
        self.query.is_some()
    }

    pub(crate) fn currencies(&self) -> &dyn CurrencyResolving {
        self.currencies.as_ref()
    }

    /// The latest successfully fetched response.
    pub fn response(&self) -> Option<Arc<BatchResponse>> {
        self.state.lock().unwrap().response.clone()
    }

    /// The error of the latest fetch, `None` if it succeeded.
    pub fn last_error(&self) -> Option<FetchError> {
        self.state.lock().unwrap().error.clone()
    }

    pub fn is_fetching(&self) -> bool {
        self.in_flight.is_in_flight(&self.key)
    }

    /// Whether a fetch was ever requested.
    pub fn is_started(&self) -> bool {
        self.state.lock().unwrap().started
    }

    /// Fetches the balances or, if a fetch is already in flight, waits for
    /// that one to finish. Returns immediately for keys that can't be fetched.
    pub async fn fetch(&self) -> Result<(), FetchError> {
        let Some(query) = self.query.clone() else {
            observe::fetch_skipped(&self.key);
            return Ok(());
        };
        self.state.lock().unwrap().started = true;

        let mut joined = true;
        let fetch = self.in_flight.shared_or_else(self.key.clone(), |key| {
            joined = false;
            execute(
                key.clone(),
                query,
                self.fetcher.clone(),
                self.currencies.clone(),
                self.state.clone(),
            )
            .boxed()
        });
        if joined {
            observe::fetch_joined(&self.key);
        }
        fetch.await
    }

    /// Returns the cached response, fetching only if there is none yet.
    pub async fn wait_response(&self) -> Result<Option<Arc<BatchResponse>>, FetchError> {
        if let Some(response) = self.response() {
            return Ok(Some(response));
        }
        self.fetch().await?;
        Ok(self.response())
    }

    /// Fetches (or joins the running fetch) and returns the resulting
    /// response.
    pub async fn wait_fresh_response(&self) -> Result<Option<Arc<BatchResponse>>, FetchError> {
        self.fetch().await?;
        Ok(self.response())
    }
}

/// Runs one batch fetch and publishes its outcome. Only ever runs once per
/// in flight fetch, no matter how many callers wait for it.
async fn execute(
    key: BalanceKey,
    query: BatchQuery,
    fetcher: Arc<dyn BatchBalanceFetching>,
    currencies: Arc<dyn CurrencyResolving>,
    state: Arc<Mutex<State>>,
) -> Result<(), FetchError> {
    observe::fetching(&key);
    match fetcher.fetch_balances(&query).await {
        Ok(response) => {
            observe::fetched(&key, &response);
            if let Some(page_key) = &response.continuation {
                observe::continuation_ignored(&key, page_key);
            }
            let discovered = response.discovered_denoms();
            {
                let mut state = state.lock().unwrap();
                state.response = Some(Arc::new(response));
                state.error = None;
            }
            if !discovered.is_empty() {
                observe::discovered(&key, &discovered);
                currencies.register_discovered(key.network(), discovered);
            }
            Ok(())
        }
        Err(err) => {
            let err = FetchError::new(&err);
            observe::fetch_failed(&key, &err);
            state.lock().unwrap().error = Some(err.clone());
            Err(err)
        }
    }
}
