use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;

// ==============================================================================
// Stored Records
// ==============================================================================

/// One security's institutional flow on one trading day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct DailyRecord {
    pub date: NaiveDate,
    pub code: String,
    pub name: String,
    /// Net institutional buy value (foreign ex-dealer + investment trust + dealer), may be negative
    pub net: f64,
    /// Total trade value, never negative
    pub val: f64,
}

// ==============================================================================
// Raw API Rows
// ==============================================================================

/// A row as published by the exchange. Amounts are thousands-separated text;
/// a field that is absent or null stays `None`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawFlowRecord {
    #[serde(rename = "Code", default, deserialize_with = "lenient_text")]
    pub code: Option<String>,
    #[serde(rename = "Name", default, deserialize_with = "lenient_text")]
    pub name: Option<String>,
    #[serde(rename = "TradeValue", default, deserialize_with = "lenient_text")]
    pub trade_value: Option<String>,
    #[serde(rename = "ForeignInvestorsBuy", default, deserialize_with = "lenient_text")]
    pub foreign_buy: Option<String>,
    #[serde(rename = "ForeignInvestorsSell", default, deserialize_with = "lenient_text")]
    pub foreign_sell: Option<String>,
    #[serde(rename = "InvestmentTrustBuy", default, deserialize_with = "lenient_text")]
    pub trust_buy: Option<String>,
    #[serde(rename = "InvestmentTrustSell", default, deserialize_with = "lenient_text")]
    pub trust_sell: Option<String>,
    #[serde(rename = "DealerBuy", default, deserialize_with = "lenient_text")]
    pub dealer_buy: Option<String>,
    #[serde(rename = "DealerSell", default, deserialize_with = "lenient_text")]
    pub dealer_sell: Option<String>,
}

/// Accepts strings and bare JSON numbers; null becomes `None`.
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        Some(serde_json::Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}
