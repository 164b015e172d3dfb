//! Wire format of the `alchemy_getTokenBalances` JSON-RPC result.

use {
    crate::{
        observe,
        response::{BatchResponse, EntryError, TokenBalanceEntry},
    },
    alloy_primitives::{Address, U256},
    serde::{Deserialize, Serialize},
};

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenBalances {
    pub address: Address,
    pub token_balances: Vec<TokenBalance>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenBalance {
    pub contract_address: Address,
    /// Decimal or `0x` prefixed hexadecimal integer.
    pub token_balance: Option<String>,
    pub error: Option<Error>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Error {
    pub code: i64,
    pub message: String,
}

impl TokenBalances {
    pub fn into_domain(self) -> BatchResponse {
        BatchResponse {
            entries: self
                .token_balances
                .into_iter()
                .map(|balance| balance.into_domain(&self.address))
                .collect(),
            continuation: self.page_key,
        }
    }
}

impl TokenBalance {
    fn into_domain(self, account: &Address) -> TokenBalanceEntry {
        let raw_balance = self.token_balance.as_deref().and_then(|balance| {
            let parsed = parse_raw_balance(balance);
            if parsed.is_none() {
                observe::unparsable_balance(account, &self.contract_address, balance);
            }
            parsed
        });
        TokenBalanceEntry {
            contract: self.contract_address,
            raw_balance,
            error: self.error.map(|err| EntryError {
                code: err.code,
                message: err.message,
            }),
        }
    }
}

/// Parses a raw integer balance written in decimal or `0x` prefixed hex.
pub fn parse_raw_balance(balance: &str) -> Option<U256> {
    let balance = balance.trim();
    match balance.strip_prefix("0x") {
        Some(hex) => U256::from_str_radix(hex, 16).ok(),
        None => U256::from_str_radix(balance, 10).ok(),
    }
}
