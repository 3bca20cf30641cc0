use chrono::NaiveDate;
use tracing::debug;

use crate::models::{DailyRecord, RawFlowRecord};

/// Parses a locale-formatted amount such as `"1,234,567"` or `"-3,000.5"`.
///
/// Returns `None` for blank, non-numeric, or non-finite input.
pub fn parse_amount(text: &str) -> Option<f64> {
    let cleaned: String = text.trim().chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() {
        return None;
    }

    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Net institutional buy value, or `None` unless all six legs parse.
pub fn net_buy(raw: &RawFlowRecord) -> Option<f64> {
    let amount = |field: &Option<String>| field.as_deref().and_then(parse_amount);

    let foreign = amount(&raw.foreign_buy)? - amount(&raw.foreign_sell)?;
    let trust = amount(&raw.trust_buy)? - amount(&raw.trust_sell)?;
    let dealer = amount(&raw.dealer_buy)? - amount(&raw.dealer_sell)?;

    Some(foreign + trust + dealer)
}

/// Turns one exchange row into a record for `date`, or `None` if it cannot be fully parsed.
pub fn normalize_record(raw: &RawFlowRecord, date: NaiveDate) -> Option<DailyRecord> {
    let code = raw.code.as_deref().map(str::trim).filter(|c| !c.is_empty())?;
    let name = raw
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or(code);

    let net = net_buy(raw)?;
    let val = raw
        .trade_value
        .as_deref()
        .and_then(parse_amount)
        .filter(|v| *v >= 0.0)?;

    Some(DailyRecord {
        date,
        code: code.to_string(),
        name: name.to_string(),
        net,
        val,
    })
}

/// Normalizes a whole payload, silently dropping rows that do not parse.
pub fn normalize(rows: &[RawFlowRecord], date: NaiveDate) -> Vec<DailyRecord> {
    let records: Vec<DailyRecord> = rows
        .iter()
        .filter_map(|raw| normalize_record(raw, date))
        .collect();

    let dropped = rows.len() - records.len();
    if dropped > 0 {
        debug!("Dropped {} of {} rows that failed to parse", dropped, rows.len());
    }

    records
}
