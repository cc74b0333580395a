//! Asset universe models

/// One entry of the ranked asset universe read from the `ASSETS` table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    pub asset_id: i64,
    /// Key used to query the price source (the CoinGecko coin id)
    pub external_id: String,
}

impl Asset {
    pub fn new(asset_id: i64, external_id: impl Into<String>) -> Self {
        Self {
            asset_id,
            external_id: external_id.into(),
        }
    }
}
