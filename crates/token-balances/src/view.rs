use {
    crate::{
        amount::Amount,
        currency::{CurrencyMetadata, ResolveError},
        denom::Denom,
        observe,
        parent::{FetchError, SharedBalances},
        response::{BatchResponse, EntryError},
    },
    alloy_primitives::Address,
    std::sync::{Arc, OnceLock},
};

/// Balance of a single token, derived from the response of the account's
/// [`SharedBalances`].
///
/// Views are cheap and never cache responses themselves: every read looks at
/// the current response of the shared cache. Fetching is delegated to the
/// shared cache as well, so any number of views trigger at most one request.
pub struct BalanceView {
    parent: Arc<SharedBalances>,
    contract: Address,
    denom: Denom,
    currency: OnceLock<Result<CurrencyMetadata, ResolveError>>,
}

impl BalanceView {
    pub fn new(parent: Arc<SharedBalances>, contract: Address) -> Self {
        Self {
            parent,
            contract,
            denom: Denom::Erc20(contract),
            currency: OnceLock::new(),
        }
    }

    pub fn parent(&self) -> &Arc<SharedBalances> {
        &self.parent
    }

    pub fn denom(&self) -> &Denom {
        &self.denom
    }

    /// Metadata of the view's token. Resolution happens once; a view whose
    /// token is unknown stays unable to report a balance.
    pub fn currency(&self) -> Result<&CurrencyMetadata, ResolveError> {
        self.currency
            .get_or_init(|| {
                let key = self.parent.key();
                let currency = self.parent.currencies().resolve(key.network(), &self.denom);
                if let Err(err) = &currency {
                    observe::resolution_failed(key, &self.denom, err);
                }
                currency
            })
            .as_ref()
            .map_err(Clone::clone)
    }

    /// The token balance according to the latest response. Tokens without a
    /// known balance report a zero amount that is not ready.
    pub fn balance(&self) -> Result<Amount, ResolveError> {
        let currency = self.currency()?.clone();

        let Some(response) = self.parent.response() else {
            return Ok(Amount::not_ready(currency));
        };
        let Some(entry) = response.entry(self.contract) else {
            return Ok(Amount::not_ready(currency));
        };
        match entry.raw_balance {
            Some(raw) => Ok(Amount::new(currency, raw)),
            None => {
                if let Some(err) = &entry.error {
                    observe::entry_error(self.parent.key(), &self.contract, err);
                }
                Ok(Amount::not_ready(currency))
            }
        }
    }

    /// The provider's diagnostic for this token, if the latest response
    /// carries one.
    pub fn entry_error(&self) -> Option<EntryError> {
        self.parent
            .response()?
            .entry(self.contract)?
            .error
            .clone()
    }

    pub fn response(&self) -> Option<Arc<BatchResponse>> {
        self.parent.response()
    }

    pub fn last_error(&self) -> Option<FetchError> {
        self.parent.last_error()
    }

    pub fn is_fetching(&self) -> bool {
        self.parent.is_fetching()
    }

    pub fn is_started(&self) -> bool {
        self.parent.is_started()
    }

    pub async fn fetch(&self) -> Result<(), FetchError> {
        self.parent.fetch().await
    }

    pub async fn wait_response(&self) -> Result<Option<Arc<BatchResponse>>, FetchError> {
        self.parent.wait_response().await
    }

    pub async fn wait_fresh_response(&self) -> Result<Option<Arc<BatchResponse>>, FetchError> {
        self.parent.wait_fresh_response().await
    }
}
