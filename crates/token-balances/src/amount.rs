use {
    crate::currency::CurrencyMetadata,
    alloy_primitives::U256,
    bigdecimal::{
        BigDecimal,
        num_bigint::{BigInt, Sign},
    },
    std::fmt,
};

/// A token amount in its currency's smallest unit.
///
/// An amount that is not ready is zero only because its real value is not
/// known yet, which is different from a known zero balance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Amount {
    currency: CurrencyMetadata,
    raw: U256,
    ready: bool,
}

impl Amount {
    pub fn new(currency: CurrencyMetadata, raw: U256) -> Self {
        Self {
            currency,
            raw,
            ready: true,
        }
    }

    pub fn not_ready(currency: CurrencyMetadata) -> Self {
        Self {
            currency,
            raw: U256::ZERO,
            ready: false,
        }
    }

    pub fn currency(&self) -> &CurrencyMetadata {
        &self.currency
    }

    pub fn raw(&self) -> U256 {
        self.raw
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn is_zero(&self) -> bool {
        self.raw.is_zero()
    }

    /// The amount in whole units of the currency.
    pub fn to_decimal(&self) -> BigDecimal {
        let raw = BigInt::from_bytes_be(Sign::Plus, &self.raw.to_be_bytes::<32>());
        BigDecimal::new(raw, i64::from(self.currency.decimals))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.to_decimal().normalized(), self.currency.symbol)
    }
}
