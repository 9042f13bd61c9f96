//! Input validation helpers and date-key handling
//!
//! Day documents are keyed by plain `YYYY-MM-DD` strings carrying no
//! timezone metadata; keys are built from the caller's local clock. The
//! keys sort lexicographically in date order, which is what range scans
//! rely on.

use crate::errors::DomainError;
use crate::models::FoodItem;
use chrono::{Local, NaiveDate};

/// Upper bound on a single water log, ml
const MAX_WATER_ML: i64 = 10_000;

/// Format a calendar date as a storage key
pub fn format_date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Parse a storage key back into a calendar date
pub fn parse_date_key(key: &str) -> Result<NaiveDate, DomainError> {
    NaiveDate::parse_from_str(key, "%Y-%m-%d")
        .map_err(|_| DomainError::validation(format!("Invalid date key: {key} (use YYYY-MM-DD)")))
}

/// Today's key from the local clock, deliberately not timezone-normalized
pub fn today_local_key() -> String {
    format_date_key(Local::now().date_naive())
}

/// Inclusive key window covering one calendar month.
///
/// The upper bound is always `-31`; short months simply have no keys above
/// their last day, and string comparison handles the rest.
pub fn month_window(year: i32, month: u32) -> Result<(String, String), DomainError> {
    if !(1..=12).contains(&month) {
        return Err(DomainError::validation(format!("Invalid month: {month}")));
    }
    if !(1900..=9999).contains(&year) {
        return Err(DomainError::validation(format!("Invalid year: {year}")));
    }
    Ok((
        format!("{year:04}-{month:02}-01"),
        format!("{year:04}-{month:02}-31"),
    ))
}

/// Validate a single water log amount
pub fn validate_water_amount(amount_ml: i64) -> Result<(), DomainError> {
    if amount_ml <= 0 {
        return Err(DomainError::validation(
            "Water amount must be greater than 0 ml",
        ));
    }
    if amount_ml > MAX_WATER_ML {
        return Err(DomainError::validation(format!(
            "Water amount cannot exceed {MAX_WATER_ML} ml"
        )));
    }
    Ok(())
}

/// Validate a dish name used for a text analysis lookup
pub fn validate_dish_name(name: &str) -> Result<(), DomainError> {
    if name.trim().is_empty() {
        return Err(DomainError::validation("Dish name cannot be empty"));
    }
    Ok(())
}

/// Validate an analyzed item against the gateway's output contract:
/// non-empty name, all numeric fields present and non-negative.
pub fn validate_food_item(item: &FoodItem) -> Result<(), DomainError> {
    if item.name.trim().is_empty() {
        return Err(DomainError::validation("Analyzed item has an empty name"));
    }
    if !item.nutrition().is_valid() {
        return Err(DomainError::validation(format!(
            "Analyzed item '{}' has a negative nutrition value",
            item.name
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_key_round_trip() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 3).unwrap();
        let key = format_date_key(date);
        assert_eq!(key, "2025-06-03");
        assert_eq!(parse_date_key(&key).unwrap(), date);
    }

    #[test]
    fn test_bad_date_keys_rejected() {
        assert!(parse_date_key("2025/06/03").is_err());
        assert!(parse_date_key("03-06-2025").is_err());
        assert!(parse_date_key("").is_err());
    }

    #[test]
    fn test_month_window_bounds() {
        let (start, end) = month_window(2025, 2).unwrap();
        assert_eq!(start, "2025-02-01");
        assert_eq!(end, "2025-02-31");
        // Every real February key falls inside the window
        assert!(start.as_str() <= "2025-02-28" && "2025-02-28" <= end.as_str());
        assert!(month_window(2025, 13).is_err());
        assert!(month_window(2025, 0).is_err());
    }

    #[test]
    fn test_water_amount_bounds() {
        assert!(validate_water_amount(250).is_ok());
        assert!(validate_water_amount(0).is_err());
        assert!(validate_water_amount(-10).is_err());
        assert!(validate_water_amount(10_001).is_err());
    }

    #[test]
    fn test_dish_name_must_be_non_empty() {
        assert!(validate_dish_name("Palak Paneer").is_ok());
        assert!(validate_dish_name("   ").is_err());
    }

    #[test]
    fn test_food_item_contract() {
        let mut item = FoodItem {
            name: "Jeera Rice".to_string(),
            portion_size: "1 cup".to_string(),
            description: String::new(),
            calories: 210.0,
            protein: 4.0,
            carbs: 45.0,
            fat: 3.0,
        };
        assert!(validate_food_item(&item).is_ok());

        item.protein = -1.0;
        assert!(validate_food_item(&item).is_err());

        item.protein = 4.0;
        item.name = " ".to_string();
        assert!(validate_food_item(&item).is_err());
    }
}
