// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use time::OffsetDateTime;
use time::macros::format_description;

pub const CURRENCY_SYMBOL: &str = "£";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    InvalidNumber,
    NegativeNumber,
    PercentOutOfRange,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidNumber => f.write_str("invalid number"),
            Self::NegativeNumber => f.write_str("negative number"),
            Self::PercentOutOfRange => f.write_str("percentage outside 0-100"),
        }
    }
}

impl std::error::Error for ParseError {}

pub type ParseResult<T> = std::result::Result<T, ParseError>;

/// Parses a non-negative amount, accepting an optional currency symbol and
/// thousands separators (`£1,250.50`).
pub fn parse_amount(input: &str) -> ParseResult<f64> {
    let trimmed = input.trim();
    let digits = trimmed
        .strip_prefix(CURRENCY_SYMBOL)
        .unwrap_or(trimmed)
        .replace(',', "");
    if digits.is_empty() {
        return Err(ParseError::InvalidNumber);
    }
    let value = digits
        .parse::<f64>()
        .map_err(|_| ParseError::InvalidNumber)?;
    if !value.is_finite() {
        return Err(ParseError::InvalidNumber);
    }
    if value < 0.0 {
        return Err(ParseError::NegativeNumber);
    }
    Ok(value)
}

pub fn parse_optional_amount(input: &str) -> ParseResult<f64> {
    if input.trim().is_empty() {
        return Ok(0.0);
    }
    parse_amount(input)
}

/// Parses a percentage in [0, 100]; a trailing `%` is allowed.
pub fn parse_percent(input: &str) -> ParseResult<f64> {
    let trimmed = input.trim();
    let value = parse_amount(trimmed.strip_suffix('%').unwrap_or(trimmed))?;
    if value > 100.0 {
        return Err(ParseError::PercentOutOfRange);
    }
    Ok(value)
}

pub fn format_currency(value: f64) -> String {
    let cents = (value * 100.0).round();
    let sign = if cents < 0.0 { "-" } else { "" };
    let cents = cents.abs() as u64;
    format!(
        "{sign}{CURRENCY_SYMBOL}{}.{:02}",
        comma_format(cents / 100),
        cents % 100
    )
}

pub fn format_percent(value: f64) -> String {
    format!("{value:.1}%")
}

pub fn format_hours(value: f64) -> String {
    format!("{value:.1}")
}

pub fn format_timestamp(value: OffsetDateTime) -> String {
    value
        .format(&format_description!("[year]-[month]-[day] [hour]:[minute]"))
        .unwrap_or_else(|_| "1970-01-01 00:00".to_owned())
}

fn comma_format(value: u64) -> String {
    let digits = value.to_string();
    let mut output = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            output.push(',');
        }
        output.push(ch);
    }
    output
}
