use {
    alloy_primitives::Address,
    std::{fmt, str::FromStr},
    thiserror::Error,
};

/// Denomination kind of ERC-20 tokens.
pub const ERC20: &str = "erc20";

/// A minimal denomination, written as `<kind>:<identifier>` for tokens (for
/// example `erc20:0xdAC17F958D2ee523a2206206994597C13D831ec7`) and as a bare
/// name for the network's native currency.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Denom {
    Native(String),
    Erc20(Address),
    Other { kind: String, identifier: String },
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InvalidDenom {
    #[error("empty denomination")]
    Empty,
    #[error("invalid erc20 contract address {0:?}")]
    Erc20Address(String),
}

impl Denom {
    /// The token contract for denominations that can be queried in batch.
    pub fn erc20_contract(&self) -> Option<Address> {
        match self {
            Self::Erc20(contract) => Some(*contract),
            _ => None,
        }
    }
}

impl FromStr for Denom {
    type Err = InvalidDenom;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            None if s.is_empty() => Err(InvalidDenom::Empty),
            None => Ok(Self::Native(s.to_owned())),
            Some((ERC20, contract)) => contract
                .parse()
                .map(Self::Erc20)
                .map_err(|_| InvalidDenom::Erc20Address(contract.to_owned())),
            Some((kind, identifier)) => Ok(Self::Other {
                kind: kind.to_owned(),
                identifier: identifier.to_owned(),
            }),
        }
    }
}

impl fmt::Display for Denom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Native(name) => f.write_str(name),
            Self::Erc20(contract) => write!(f, "{ERC20}:{}", contract.to_checksum(None)),
            Self::Other { kind, identifier } => write!(f, "{kind}:{identifier}"),
        }
    }
}
