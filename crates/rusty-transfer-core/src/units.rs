//! Amount parsing and display formatting.

use alloy::primitives::utils::{format_units, parse_units, ParseUnits};
use alloy::primitives::U256;
use chrono::DateTime;

use crate::error::ChainError;

pub const ETHER_DECIMALS: u8 = 18;

const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Parse a user-entered decimal amount into base units.
pub fn parse_amount(text: &str, decimals: u8) -> Result<U256, ChainError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ChainError::InvalidInput("amount is required".to_owned()));
    }
    if text.starts_with('-') {
        return Err(ChainError::InvalidInput(format!(
            "amount must not be negative: {text}"
        )));
    }

    let mut parts = text.splitn(2, '.');
    let whole = parts.next().unwrap_or_default();
    let fraction = parts.next().unwrap_or_default();
    let well_formed = !(whole.is_empty() && fraction.is_empty())
        && whole.chars().all(|c| c.is_ascii_digit())
        && fraction.chars().all(|c| c.is_ascii_digit());
    if !well_formed {
        return Err(ChainError::InvalidInput(format!("invalid amount: {text}")));
    }
    if fraction.len() > usize::from(decimals) {
        return Err(ChainError::InvalidInput(format!(
            "amount {text} has more than {decimals} decimal places"
        )));
    }

    let normalized = match (whole.is_empty(), fraction.is_empty()) {
        (_, true) => whole.to_owned(),
        (true, false) => format!("0.{fraction}"),
        (false, false) => format!("{whole}.{fraction}"),
    };

    match parse_units(&normalized, decimals) {
        Ok(ParseUnits::U256(value)) => Ok(value),
        Ok(ParseUnits::I256(_)) => Err(ChainError::InvalidInput(format!(
            "amount must not be negative: {text}"
        ))),
        Err(e) => Err(ChainError::InvalidInput(format!("invalid amount {text}: {e}"))),
    }
}

/// Format base units as a decimal string, trimmed to at least one fractional digit.
pub fn format_amount(value: U256, decimals: u8) -> String {
    match format_units(value, decimals) {
        Ok(mut formatted) => {
            trim_decimal(&mut formatted);
            formatted
        }
        Err(_) => value.to_string(),
    }
}

pub fn format_gwei(value: U256) -> String {
    match format_units(value, "gwei") {
        Ok(mut formatted) => {
            trim_decimal(&mut formatted);
            formatted
        }
        Err(_) => value.to_string(),
    }
}

/// Unix seconds as a UTC date-time string; empty when out of range.
pub fn format_timestamp(secs: u64) -> String {
    i64::try_from(secs)
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .map(|dt| dt.format(DATE_TIME_FORMAT).to_string())
        .unwrap_or_default()
}

fn trim_decimal(value: &mut String) {
    if value.contains('.') {
        while value.ends_with('0') {
            value.pop();
        }
        if value.ends_with('.') {
            value.push('0');
        }
    }
}
