use {
    crate::response::BatchResponse,
    alloy_primitives::Address,
    async_trait::async_trait,
    serde_json::json,
    url::Url,
};

/// JSON-RPC method of the third party batch balance API.
pub const METHOD: &str = "alchemy_getTokenBalances";

/// Largest page the batch balance API returns.
pub const MAX_PAGE_SIZE: u32 = 100;

/// One batch balance request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchQuery {
    /// JSON-RPC endpoint of the network the account lives on.
    pub endpoint: Url,
    pub address: Address,
    pub max_count: u32,
}

impl BatchQuery {
    /// JSON-RPC parameters of the request for [`METHOD`].
    pub fn params(&self) -> serde_json::Value {
        json!([
            self.address.to_checksum(None),
            "erc20",
            { "maxCount": self.max_count }
        ])
    }
}

#[cfg_attr(any(test, feature = "test-util"), mockall::automock)]
#[async_trait]
pub trait BatchBalanceFetching: Send + Sync {
    /// Fetches the first page of token balances of an account with a single
    /// request. Implementations own timeouts and transport level retries.
    async fn fetch_balances(&self, query: &BatchQuery) -> anyhow::Result<BatchResponse>;
}

#[cfg(test)]
mod tests {
    use {super::*, alloy_primitives::address};

    #[test]
    fn request_params() {
        let query = BatchQuery {
            endpoint: "https://eth.example.org/v2/key".parse().unwrap(),
            address: address!("95222290dd7278aa3ddd389cc1e1d165cc4bafe5"),
            max_count: MAX_PAGE_SIZE,
        };

        assert_eq!(
            query.params(),
            json!([
                "0x95222290DD7278Aa3Ddd389Cc1E1d165CC4BAfe5",
                "erc20",
                { "maxCount": 100 }
            ])
        );
    }
}
