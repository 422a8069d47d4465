use serde::{Deserialize, Serialize};

/// Normalized trade facts read from a document.
///
/// Every scalar is optional; a document that carries none of them still
/// produces an `ExtractedTradeData` with all fields `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedTradeData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trade_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uti: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usi: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trade_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maturity_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notional_amount: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_type: Option<String>,
    #[serde(default)]
    pub counterparties: Vec<CounterpartyInfo>,
}

impl ExtractedTradeData {
    /// Number of scalar fields that resolved to a value.
    pub fn populated_fields(&self) -> usize {
        [
            &self.trade_id,
            &self.uti,
            &self.usi,
            &self.trade_date,
            &self.effective_date,
            &self.maturity_date,
            &self.notional_amount,
            &self.currency,
            &self.product_type,
        ]
        .iter()
        .filter(|field| field.is_some())
        .count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CounterpartyInfo {
    pub lei: String,
    pub role: CounterpartyRole,
    pub trading_capacity: TradingCapacity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CounterpartyRole {
    PartyA,
    PartyB,
}

/// Capacity a counterparty acts in. Extraction only ever reports principals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradingCapacity {
    Principal,
}
