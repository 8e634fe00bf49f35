use serde::{Deserialize, Serialize};

/// QuiverQuant subscription tier, ordered `Public < Hobbyist < Trader < Enterprise`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuiverTier {
    Public,
    Hobbyist,
    Trader,
    Enterprise,
}

impl QuiverTier {
    /// Rank 1..4.
    pub fn rank(&self) -> u8 {
        match self {
            QuiverTier::Public => 1,
            QuiverTier::Hobbyist => 2,
            QuiverTier::Trader => 3,
            QuiverTier::Enterprise => 4,
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "public" => Some(QuiverTier::Public),
            "hobbyist" => Some(QuiverTier::Hobbyist),
            "trader" => Some(QuiverTier::Trader),
            "enterprise" => Some(QuiverTier::Enterprise),
            _ => None,
        }
    }
}

/// Endpoint gating tier: `tier_k` requires user rank `>= k+1`,
/// i.e. `tier_1` endpoints require Hobbyist (rank 2) or higher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndpointTier {
    Tier1,
    Tier2,
    Tier3,
}

impl EndpointTier {
    fn required_rank(&self) -> u8 {
        match self {
            EndpointTier::Tier1 => 2,
            EndpointTier::Tier2 => 3,
            EndpointTier::Tier3 => 4,
        }
    }
}

/// `tierAllows(endpointTier, userTier)`: monotonic in user tier, antitonic in
/// endpoint tier.
pub fn tier_allows(endpoint: EndpointTier, user: QuiverTier) -> bool {
    user.rank() >= endpoint.required_rank()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier1_requires_hobbyist_or_above() {
        assert!(!tier_allows(EndpointTier::Tier1, QuiverTier::Public));
        assert!(tier_allows(EndpointTier::Tier1, QuiverTier::Hobbyist));
        assert!(tier_allows(EndpointTier::Tier1, QuiverTier::Trader));
    }

    #[test]
    fn tier3_requires_enterprise() {
        assert!(!tier_allows(EndpointTier::Tier3, QuiverTier::Trader));
        assert!(tier_allows(EndpointTier::Tier3, QuiverTier::Enterprise));
    }

    #[test]
    fn monotonic_in_user_antitonic_in_endpoint() {
        let tiers = [QuiverTier::Public, QuiverTier::Hobbyist, QuiverTier::Trader, QuiverTier::Enterprise];
        let endpoints = [EndpointTier::Tier1, EndpointTier::Tier2, EndpointTier::Tier3];
        for e in endpoints {
            let mut last = false;
            for &u in &tiers {
                let allowed = tier_allows(e, u);
                // once allowed at a lower rank, it must stay allowed at higher ranks
                assert!(!(last && !allowed));
                last = allowed;
            }
        }
    }
}
