//! Parsing of the basket update form.
//!
//! The form posts one `action` field plus, for updates, a `count_<p>_<c>_<s>`
//! field per line. Everything is turned into a [`BasketCommand`] here so the
//! rest of the code never looks at raw field names.

use super::{Basket, BasketKey};
use crate::error::{AppError, AppResult};

const COUNT_PREFIX: &str = "count_";
const REMOVE_PREFIX: &str = "remove_";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BasketCommand {
    /// Save new counts and stay on the basket.
    Update(Vec<(BasketKey, i64)>),
    /// Save new counts and continue to order placement.
    Order(Vec<(BasketKey, i64)>),
    Remove(BasketKey),
    Clear,
}

impl BasketCommand {
    pub fn from_form(fields: &[(String, String)]) -> AppResult<Self> {
        let action = fields
            .iter()
            .find(|(name, _)| name == "action")
            .map(|(_, value)| value.trim())
            .ok_or_else(|| AppError::BadRequest("missing basket action".into()))?;

        match action {
            "update" => Ok(BasketCommand::Update(count_changes(fields))),
            "order" => Ok(BasketCommand::Order(count_changes(fields))),
            "clear" => Ok(BasketCommand::Clear),
            other => match other.strip_prefix(REMOVE_PREFIX) {
                Some(suffix) => parse_key(suffix)
                    .map(BasketCommand::Remove)
                    .ok_or_else(|| AppError::BadRequest("invalid basket item".into())),
                None => Err(AppError::BadRequest(format!(
                    "unknown basket action '{other}'"
                ))),
            },
        }
    }

    /// Apply to `basket`. Returns whether anything was removed by a `Remove`.
    pub fn apply(&self, basket: &mut Basket) -> bool {
        match self {
            BasketCommand::Update(changes) | BasketCommand::Order(changes) => {
                basket.update(changes.iter().copied());
                false
            }
            BasketCommand::Remove(key) => basket.remove(key),
            BasketCommand::Clear => {
                basket.clear();
                false
            }
        }
    }
}

/// Parse `<product>_<color>_<size>`. Color and size fall back to `None` when
/// empty or not a number; a bad product id rejects the whole key.
pub fn parse_key(suffix: &str) -> Option<BasketKey> {
    let mut parts = suffix.split('_');
    let product = parts.next()?.trim().parse::<i32>().ok()?;
    let color = parts.next().and_then(parse_optional_id);
    let size = parts.next().and_then(parse_optional_id);
    Some(BasketKey::new(product, color, size))
}

/// Counts that do not parse count as zero, which removes the line.
pub fn parse_count(value: &str) -> i64 {
    value.trim().parse::<i64>().unwrap_or(0)
}

fn parse_optional_id(segment: &str) -> Option<i32> {
    segment.trim().parse::<i32>().ok()
}

fn count_changes(fields: &[(String, String)]) -> Vec<(BasketKey, i64)> {
    fields
        .iter()
        .filter_map(|(name, value)| {
            let key = parse_key(name.strip_prefix(COUNT_PREFIX)?)?;
            Some((key, parse_count(value)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn empty_color_segment_parses_as_none() {
        let command =
            BasketCommand::from_form(&form(&[("action", "update"), ("count_1__2", "3")])).unwrap();
        assert_eq!(
            command,
            BasketCommand::Update(vec![(BasketKey::new(1, None, Some(2)), 3)])
        );
    }

    #[test]
    fn update_with_count_field_changes_matching_line() {
        let mut basket = Basket::new();
        basket.add(BasketKey::new(1, None, Some(2)));

        BasketCommand::from_form(&form(&[("action", "update"), ("count_1__2", "3")]))
            .unwrap()
            .apply(&mut basket);

        assert_eq!(basket.lines()[0].count, 3);
    }

    #[test]
    fn zero_and_garbage_counts_remove_lines() {
        let mut basket = Basket::new();
        basket.add(BasketKey::new(1, None, None));
        basket.add(BasketKey::new(2, None, None));
        basket.add(BasketKey::new(3, None, None));

        BasketCommand::from_form(&form(&[
            ("action", "update"),
            ("count_1__", "0"),
            ("count_2__", "lots"),
            ("count_3__", " 4 "),
        ]))
        .unwrap()
        .apply(&mut basket);

        assert_eq!(basket.len(), 1);
        assert_eq!(basket.lines()[0].product, 3);
        assert_eq!(basket.lines()[0].count, 4);
    }

    #[test]
    fn malformed_count_field_names_are_skipped() {
        let command = BasketCommand::from_form(&form(&[
            ("action", "order"),
            ("count_x_1_2", "3"),
            ("csrf", "abc"),
            ("count_5_a_", "2"),
        ]))
        .unwrap();

        assert_eq!(
            command,
            BasketCommand::Order(vec![(BasketKey::new(5, None, None), 2)])
        );
    }

    #[test]
    fn remove_action_carries_key() {
        let command = BasketCommand::from_form(&form(&[("action", "remove_4_7_")])).unwrap();
        assert_eq!(command, BasketCommand::Remove(BasketKey::new(4, Some(7), None)));
    }

    #[test]
    fn remove_of_missing_line_leaves_others_alone() {
        let mut basket = Basket::new();
        basket.add(BasketKey::new(4, None, None));

        let removed = BasketCommand::Remove(BasketKey::new(4, Some(7), None)).apply(&mut basket);

        assert!(!removed);
        assert_eq!(basket.len(), 1);
    }

    #[test]
    fn clear_action() {
        assert_eq!(
            BasketCommand::from_form(&form(&[("action", "clear")])).unwrap(),
            BasketCommand::Clear
        );
    }

    #[test]
    fn missing_or_unknown_action_is_rejected() {
        assert!(matches!(
            BasketCommand::from_form(&form(&[("count_1__", "1")])),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            BasketCommand::from_form(&form(&[("action", "explode")])),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            BasketCommand::from_form(&form(&[("action", "remove_x__")])),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn key_with_missing_segments() {
        assert_eq!(parse_key("9"), Some(BasketKey::new(9, None, None)));
        assert_eq!(parse_key("9_1"), Some(BasketKey::new(9, Some(1), None)));
        assert_eq!(parse_key(""), None);
    }
}
