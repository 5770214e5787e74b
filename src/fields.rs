use serde_json::Value;

use crate::model::board::CustomFieldDef;
use crate::model::card::CardField;

/// Resolve a custom field definition by human-readable name.
///
/// Lookup is a case-insensitive exact match; the first matching definition in
/// iteration order wins when the board carries duplicate names.
pub fn find_field<'a>(defs: &'a [CustomFieldDef], name: &str) -> Option<&'a CustomFieldDef> {
    defs.iter().find(|d| d.name.eq_ignore_ascii_case(name))
}

/// Raw value of `def`'s field on a card, or None when the definition is
/// absent or the card carries no entry for it.
pub fn field_value<'a>(
    card_fields: &'a [CardField],
    def: Option<&CustomFieldDef>,
) -> Option<&'a Value> {
    let def = def?;
    card_fields
        .iter()
        .find(|cf| cf.id == def.id)
        .map(|cf| &cf.value)
}

/// Like [`field_value`], stringified. Null and empty-string values degrade
/// to None so callers can gate on "field actually filled in".
pub fn field_text(card_fields: &[CardField], def: Option<&CustomFieldDef>) -> Option<String> {
    let text = match field_value(card_fields, def)? {
        Value::Null => return None,
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Parse the numeric value stored in a text-typed custom field.
///
/// The raw scalar is stringified and read as a base-10 integer by its leading
/// numeric prefix: `"100abc"` -> 100, `"1500.75"` -> 1500 (truncation, not
/// rounding). Null, empty, and non-numeric values all parse to 0, and the
/// result never goes below 0.
pub fn parse_token_value(raw: &Value) -> i64 {
    let text = match raw {
        Value::Null => return 0,
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    let trimmed = text.trim_start();
    let digits: String = trimmed.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return 0;
    }
    // Longer-than-i64 digit runs saturate rather than fail.
    digits.parse::<i64>().unwrap_or(i64::MAX).max(0)
}

/// Accumulation law for the tracked token counter: add, saturating at a
/// floor of 0. Deliberately not idempotent across runs; the caller is
/// responsible for invoking it at most once per unit of work.
pub fn accumulate_tokens(current: i64, delta: i64) -> i64 {
    current.saturating_add(delta).max(0)
}
