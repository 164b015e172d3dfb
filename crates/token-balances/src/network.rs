use {
    alloy_primitives::Address,
    derive_more::Display,
    serde::{Deserialize, Serialize},
    std::str::FromStr,
    thiserror::Error,
};

/// Networks for which the third party batch balance API is available, mapped
/// to the provider's short name of the network.
const BATCH_NETWORKS: &[(&str, &str)] = &[
    ("eip155:1", "eth"),
    ("eip155:10", "opt"),
    ("eip155:137", "polygon"),
    ("eip155:8453", "base"),
    ("eip155:42161", "arb"),
];

/// Namespace of EVM networks in CAIP-2 identifiers.
const EVM_NAMESPACE: &str = "eip155";

/// A CAIP-2 network identifier like `eip155:1`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Display, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NetworkId(String);

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid network identifier {0:?}, expected `<namespace>:<reference>`")]
pub struct InvalidNetworkId(String);

impl NetworkId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn namespace(&self) -> &str {
        self.0.split_once(':').map_or(&self.0, |(namespace, _)| namespace)
    }

    pub fn is_evm(&self) -> bool {
        self.namespace() == EVM_NAMESPACE
    }

    /// The batch balance provider's short name for this network, `None` if the
    /// network has no batch balance support.
    pub fn batch_provider_slug(&self) -> Option<&'static str> {
        BATCH_NETWORKS
            .iter()
            .find(|(id, _)| *id == self.0)
            .map(|(_, slug)| *slug)
    }
}

impl FromStr for NetworkId {
    type Err = InvalidNetworkId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some((namespace, reference)) if !namespace.is_empty() && !reference.is_empty() => {
                Ok(Self(s.to_owned()))
            }
            _ => Err(InvalidNetworkId(s.to_owned())),
        }
    }
}

impl TryFrom<String> for NetworkId {
    type Error = InvalidNetworkId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<NetworkId> for String {
    fn from(value: NetworkId) -> Self {
        value.0
    }
}

/// Whether `address` is a `0x` prefixed hex address that is either written
/// in a single case or carries a valid EIP-55 checksum.
pub fn is_hex_address_with_checksum(address: &str) -> bool {
    let Some(hex) = address.strip_prefix("0x") else {
        return false;
    };
    if hex.len() != 40 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return false;
    }

    let has_lower = hex.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = hex.chars().any(|c| c.is_ascii_uppercase());
    if !(has_lower && has_upper) {
        return true;
    }
    Address::parse_checksummed(address, None).is_ok()
}

/// Identifies the balances of one account on one network. There is exactly one
/// shared balance cache per key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display)]
#[display("{network}/{address}")]
pub struct BalanceKey {
    network: NetworkId,
    address: String,
}

impl BalanceKey {
    pub fn new(network: NetworkId, address: impl Into<String>) -> Self {
        Self {
            network,
            address: address.into(),
        }
    }

    pub fn network(&self) -> &NetworkId {
        &self.network
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// The account address, `None` if the key's address is not a hex address.
    pub fn hex_address(&self) -> Option<Address> {
        self.address.parse().ok()
    }

    /// Whether balances for this key can be fetched at all. Keys that can't
    /// are inert rather than failing.
    pub fn can_fetch(&self) -> bool {
        self.hex_address().is_some() && self.network.batch_provider_slug().is_some()
    }
}
