//! Turning free-text reasoning-model replies into typed assumptions.
//!
//! Replies carry percentages (`8.5` meaning 8.5%); everything returned from
//! here is in decimals.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

use super::ProviderError;
use crate::models::{
    AssumptionKind, AssumptionRequest, Assumptions, DcfAssumptions, MultiplesAssumptions,
};

// `.*?` ends the capture at the first closing fence.
static FENCED_JSON: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```(?:json)?\s*(\{.*?\})\s*```").expect("fence pattern is valid")
});

pub const KEY_GROWTH_RATES: &str = "stage_1_fcfe_growth_rates_pct";
pub const KEY_PERPETUAL_GROWTH: &str = "perpetual_growth_rate_g_pct";
pub const KEY_RISK_FREE_RATE: &str = "risk_free_rate_pct";
pub const KEY_EQUITY_RISK_PREMIUM: &str = "equity_risk_premium_pct";
pub const KEY_PE_MULTIPLE: &str = "selected_pe_multiple_value";
pub const KEY_PE_TYPE: &str = "selected_pe_multiple_type";
pub const KEY_EPS: &str = "selected_eps_value";
pub const KEY_EPS_TYPE: &str = "selected_eps_type";

const DCF_JUSTIFICATIONS: [&str; 3] = [
    "justification_stage_1_growth",
    "justification_perpetual_growth",
    "justification_ke",
];
const MULTIPLES_JUSTIFICATIONS: [&str; 2] =
    ["justification_pe_multiple", "justification_eps_selection"];

/// Pull the JSON object out of a reply.
///
/// A fenced code block wins; otherwise everything from the first `{` to the
/// last `}` is tried.
pub fn extract_json(text: &str) -> Result<Value, ProviderError> {
    let candidate = match FENCED_JSON.captures(text).and_then(|c| c.get(1)) {
        Some(m) => m.as_str(),
        None => match (text.find('{'), text.rfind('}')) {
            (Some(start), Some(end)) if start < end => &text[start..=end],
            _ => return Err(ProviderError::malformed("reply contains no JSON object")),
        },
    };

    let value: Value = serde_json::from_str(candidate)
        .map_err(|e| ProviderError::malformed(format!("reply JSON does not parse: {e}")))?;
    if value.is_object() {
        Ok(value)
    } else {
        Err(ProviderError::malformed("reply JSON is not an object"))
    }
}

/// Parse a reply for whichever kind the request asked for.
pub fn parse_reply(text: &str, request: &AssumptionRequest) -> Result<Assumptions, ProviderError> {
    assumptions_from_value(&extract_json(text)?, request)
}

pub fn assumptions_from_value(
    value: &Value,
    request: &AssumptionRequest,
) -> Result<Assumptions, ProviderError> {
    match request.kind {
        AssumptionKind::Dcf => dcf_from_value(value, request).map(Assumptions::Dcf),
        AssumptionKind::Multiples => multiples_from_value(value).map(Assumptions::Multiples),
    }
}

pub fn parse_dcf_reply(
    text: &str,
    request: &AssumptionRequest,
) -> Result<DcfAssumptions, ProviderError> {
    dcf_from_value(&extract_json(text)?, request)
}

pub fn parse_multiples_reply(text: &str) -> Result<MultiplesAssumptions, ProviderError> {
    multiples_from_value(&extract_json(text)?)
}

fn as_object(value: &Value) -> Result<&Map<String, Value>, ProviderError> {
    value
        .as_object()
        .ok_or_else(|| ProviderError::malformed("assumptions must be a JSON object"))
}

/// A finite number, or a string holding one (a trailing `%` is tolerated).
fn number(field: &str, value: &Value) -> Result<f64, ProviderError> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok(),
        Value::Null => {
            return Err(ProviderError::malformed(format!("{field} is null")));
        }
        _ => None,
    };
    match parsed {
        Some(v) if v.is_finite() => Ok(v),
        _ => Err(ProviderError::malformed(format!(
            "{field} is not a number: {value}"
        ))),
    }
}

fn required<'a>(obj: &'a Map<String, Value>, field: &str) -> Result<&'a Value, ProviderError> {
    obj.get(field)
        .ok_or_else(|| ProviderError::malformed(format!("missing field {field}")))
}

fn percent(obj: &Map<String, Value>, field: &str) -> Result<f64, ProviderError> {
    Ok(number(field, required(obj, field)?)? / 100.0)
}

fn optional_percent(obj: &Map<String, Value>, field: &str) -> Result<Option<f64>, ProviderError> {
    match obj.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => Ok(Some(number(field, v)? / 100.0)),
    }
}

fn label(obj: &Map<String, Value>, field: &str) -> String {
    obj.get(field)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or("unspecified")
        .to_string()
}

fn justification(obj: &Map<String, Value>, fields: &[&str]) -> String {
    fields
        .iter()
        .filter_map(|f| obj.get(*f).and_then(Value::as_str))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn dcf_from_value(
    value: &Value,
    request: &AssumptionRequest,
) -> Result<DcfAssumptions, ProviderError> {
    let obj = as_object(value)?;

    let rates = required(obj, KEY_GROWTH_RATES)?
        .as_array()
        .ok_or_else(|| ProviderError::malformed(format!("{KEY_GROWTH_RATES} must be a list")))?;
    if rates.len() != request.horizon_years {
        return Err(ProviderError::malformed(format!(
            "{KEY_GROWTH_RATES} has {} entries, expected {}",
            rates.len(),
            request.horizon_years
        )));
    }
    let growth_rates = rates
        .iter()
        .enumerate()
        .map(|(i, v)| number(&format!("{KEY_GROWTH_RATES}[{i}]"), v).map(|pct| pct / 100.0))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(DcfAssumptions {
        growth_rates,
        perpetual_growth_rate: percent(obj, KEY_PERPETUAL_GROWTH)?,
        risk_free_rate: optional_percent(obj, KEY_RISK_FREE_RATE)?
            .unwrap_or(request.market.risk_free_rate),
        equity_risk_premium: optional_percent(obj, KEY_EQUITY_RISK_PREMIUM)?
            .unwrap_or(request.market.equity_risk_premium),
        justification: justification(obj, &DCF_JUSTIFICATIONS),
    })
}

fn multiples_from_value(value: &Value) -> Result<MultiplesAssumptions, ProviderError> {
    let obj = as_object(value)?;
    Ok(MultiplesAssumptions {
        pe_multiple: number(KEY_PE_MULTIPLE, required(obj, KEY_PE_MULTIPLE)?)?,
        pe_basis: label(obj, KEY_PE_TYPE),
        eps_base: number(KEY_EPS, required(obj, KEY_EPS)?)?,
        eps_basis: label(obj, KEY_EPS_TYPE),
        justification: justification(obj, &MULTIPLES_JUSTIFICATIONS),
    })
}
