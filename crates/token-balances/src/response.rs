use {
    crate::denom::Denom,
    alloy_primitives::{Address, U256},
    std::collections::HashSet,
};

/// Per token diagnostic reported by the batch balance provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryError {
    pub code: i64,
    pub message: String,
}

/// Balance of one token contract within a batch response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenBalanceEntry {
    pub contract: Address,
    /// `None` if the provider could not determine the balance.
    pub raw_balance: Option<U256>,
    pub error: Option<EntryError>,
}

/// Balances of many tokens of one account, as returned by a single batch
/// query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchResponse {
    pub entries: Vec<TokenBalanceEntry>,
    /// Provider token to request the next page. Pagination is not supported,
    /// so only the first page of balances is ever known.
    pub continuation: Option<String>,
}

impl BatchResponse {
    pub fn entry(&self, contract: Address) -> Option<&TokenBalanceEntry> {
        self.entries.iter().find(|entry| entry.contract == contract)
    }

    /// Denominations of all tokens the account holds a positive balance of.
    pub fn discovered_denoms(&self) -> HashSet<Denom> {
        self.entries
            .iter()
            .filter(|entry| entry.raw_balance.is_some_and(|balance| !balance.is_zero()))
            .map(|entry| Denom::Erc20(entry.contract))
            .collect()
    }
}
