//! Observability of the balance caches. Every function represents an event
//! that is meaningful to the system; it logs the event and updates metrics
//! where the event is worth measuring.

use {
    crate::{
        currency::ResolveError,
        denom::Denom,
        network::BalanceKey,
        parent::FetchError,
        response::{BatchResponse, EntryError},
    },
    alloy_primitives::Address,
    std::collections::HashSet,
};

/// A balance cache was created for a key seen for the first time.
pub fn parent_created(key: &BalanceKey) {
    tracing::debug!(%key, "created shared balance cache");
    Metrics::get().parents.inc();
}

pub fn view_created(key: &BalanceKey, contract: &Address) {
    tracing::trace!(%key, %contract, "created balance view");
}

/// A fetch was requested for a key that can never be fetched.
pub fn fetch_skipped(key: &BalanceKey) {
    tracing::trace!(%key, "skipped balance fetch for inert key");
    Metrics::get()
        .batch_fetches
        .with_label_values(&[key.network().as_str(), "skipped"])
        .inc();
}

/// A fetch request joined a batch fetch that was already in flight.
pub fn fetch_joined(key: &BalanceKey) {
    tracing::trace!(%key, "joined in flight balance fetch");
    Metrics::get()
        .joined_fetches
        .with_label_values(&[key.network().as_str()])
        .inc();
}

/// A batch fetch is about to be sent.
pub fn fetching(key: &BalanceKey) {
    tracing::debug!(%key, "fetching balances");
}

pub fn fetched(key: &BalanceKey, response: &BatchResponse) {
    tracing::debug!(%key, entries = response.entries.len(), "fetched balances");
    Metrics::get()
        .batch_fetches
        .with_label_values(&[key.network().as_str(), "success"])
        .inc();
}

pub fn fetch_failed(key: &BalanceKey, err: &FetchError) {
    tracing::warn!(%key, ?err, "failed to fetch balances");
    Metrics::get()
        .batch_fetches
        .with_label_values(&[key.network().as_str(), "failure"])
        .inc();
}

/// The provider has more balances than fit on one page.
pub fn continuation_ignored(key: &BalanceKey, page_key: &str) {
    tracing::debug!(%key, page_key, "ignoring further pages of balances");
}

/// Tokens with a positive balance are handed to the currency registry.
pub fn discovered(key: &BalanceKey, denoms: &HashSet<Denom>) {
    tracing::debug!(%key, ?denoms, "registering discovered tokens");
    Metrics::get()
        .discovered_tokens
        .with_label_values(&[key.network().as_str()])
        .inc_by(u64::try_from(denoms.len()).unwrap_or(u64::MAX));
}

pub fn unparsable_balance(account: &Address, contract: &Address, balance: &str) {
    tracing::warn!(%account, %contract, balance, "ignoring unparsable token balance");
}

/// The provider reported an error instead of a balance for a token.
pub fn entry_error(key: &BalanceKey, contract: &Address, err: &EntryError) {
    tracing::debug!(
        %key,
        %contract,
        code = err.code,
        message = %err.message,
        "token balance unavailable"
    );
}

pub fn resolution_failed(key: &BalanceKey, denom: &Denom, err: &ResolveError) {
    tracing::warn!(%key, %denom, ?err, "failed to resolve currency");
}

#[derive(prometheus_metric_storage::MetricStorage)]
#[metric(subsystem = "token_balances")]
struct Metrics {
    /// Batch balance fetches by network and outcome.
    #[metric(labels("network", "result"))]
    batch_fetches: prometheus::IntCounterVec,

    /// Fetch requests that were served by an already running batch fetch.
    #[metric(labels("network"))]
    joined_fetches: prometheus::IntCounterVec,

    /// Tokens with a positive balance forwarded to the currency registry.
    #[metric(labels("network"))]
    discovered_tokens: prometheus::IntCounterVec,

    /// Number of shared balance caches.
    parents: prometheus::IntGauge,
}

impl Metrics {
    fn get() -> &'static Self {
        Metrics::instance(::observe::metrics::get_storage_registry()).unwrap()
    }
}
