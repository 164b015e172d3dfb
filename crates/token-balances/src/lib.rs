//! Shared, deduplicated batch balance fetching.
//!
//! A [`Registry`] keeps one [`SharedBalances`] per account and network. The
//! shared cache fetches all ERC-20 balances of the account with a single batch
//! query, runs at most one such query at a time and feeds newly seen tokens
//! back to the currency catalog. [`BalanceView`]s derive the balance of one
//! token from the shared response.

pub mod amount;
pub mod config;
pub mod currency;
pub mod denom;
pub mod dto;
pub mod fetcher;
pub mod network;
mod observe;
pub mod parent;
pub mod registry;
pub mod response;
pub mod view;

pub use {
    amount::Amount,
    config::Configuration,
    currency::{CurrencyMetadata, CurrencyResolving, ResolveError, StaticCurrencies},
    denom::Denom,
    fetcher::{BatchBalanceFetching, BatchQuery},
    network::{BalanceKey, NetworkId},
    parent::{FetchError, InFlightFetches, SharedBalances},
    registry::Registry,
    response::{BatchResponse, EntryError, TokenBalanceEntry},
    view::BalanceView,
};
