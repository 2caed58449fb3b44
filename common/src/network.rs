use serde::{Deserialize, Serialize};
use std::str::FromStr;

// Endpoints a deployment target exposes
// Only `node` is dialed by the CLI, the rest is kept for display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkEndpoints {
    pub node: &'static str,
    pub indexer: &'static str,
    pub indexer_ws: &'static str,
    pub proof_server: &'static str,
}

const STANDALONE_ENDPOINTS: NetworkEndpoints = NetworkEndpoints {
    node: "http://127.0.0.1:8080",
    indexer: "http://127.0.0.1:8088/api/v3/graphql",
    indexer_ws: "ws://127.0.0.1:8088/api/v3/graphql/ws",
    proof_server: "http://127.0.0.1:6300",
};

const PREVIEW_ENDPOINTS: NetworkEndpoints = NetworkEndpoints {
    node: "https://rpc.preview.midnight.network",
    indexer: "https://indexer.preview.midnight.network/api/v3/graphql",
    indexer_ws: "wss://indexer.preview.midnight.network/api/v3/graphql/ws",
    proof_server: "http://127.0.0.1:6300",
};

const PREPROD_ENDPOINTS: NetworkEndpoints = NetworkEndpoints {
    node: "https://rpc.preprod.midnight.network",
    indexer: "https://indexer.preprod.midnight.network/api/v3/graphql",
    indexer_ws: "wss://indexer.preprod.midnight.network/api/v3/graphql/ws",
    proof_server: "http://127.0.0.1:6300",
};

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display,
)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Network {
    // Local development node
    #[default]
    Standalone,
    Preview,
    Preprod,
}

impl Network {
    pub fn endpoints(&self) -> &'static NetworkEndpoints {
        match self {
            Self::Standalone => &STANDALONE_ENDPOINTS,
            Self::Preview => &PREVIEW_ENDPOINTS,
            Self::Preprod => &PREPROD_ENDPOINTS,
        }
    }

    pub fn is_standalone(&self) -> bool {
        *self == Self::Standalone
    }
}

impl FromStr for Network {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "standalone" | "undeployed" => Ok(Self::Standalone),
            "preview" => Ok(Self::Preview),
            "preprod" => Ok(Self::Preprod),
            _ => Err(format!("Unknown network '{s}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_names() {
        assert_eq!(Network::Preprod.to_string(), "preprod");
        assert_eq!("Preview".parse::<Network>(), Ok(Network::Preview));
        assert_eq!("undeployed".parse::<Network>(), Ok(Network::Standalone));
        assert!("mainnet".parse::<Network>().is_err());
    }

    #[test]
    fn test_network_endpoints() {
        assert_eq!(Network::Standalone.endpoints().node, "http://127.0.0.1:8080");
        assert!(Network::Preview.endpoints().indexer.contains("preview"));
        assert!(Network::Preprod.endpoints().indexer_ws.starts_with("wss://"));
    }
}
