use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::repo_types::{LotFields, ParkingLot};
use crate::error::{ParkingError, ParkingResult};

/// Prices are stored as `NUMERIC(10, 2)`, so they must stay below 10^8.
const PRICE_LIMIT: Decimal = Decimal::from_parts(100_000_000, 0, 0, false, 0);
pub const MAX_SPOTS: i32 = 10_000;

/// Lot form as posted by the admin. Numbers arrive as text and are checked in
/// [`LotForm::validate`].
#[derive(Debug, Deserialize)]
pub struct LotForm {
    pub name: String,
    pub price: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub pin: Option<String>,
    pub max_spots: String,
}

impl LotForm {
    pub fn validate(self) -> ParkingResult<LotFields> {
        let location_name = self.name.trim().to_string();
        if location_name.is_empty() {
            return Err(ParkingError::Validation("Lot name is required".into()));
        }

        let price = Decimal::from_str(self.price.trim())
            .map_err(|_| ParkingError::Validation(format!("Invalid price '{}'", self.price)))?
            .round_dp(2);
        if price.is_sign_negative() {
            return Err(ParkingError::Validation("Price cannot be negative".into()));
        }
        if price >= PRICE_LIMIT {
            return Err(ParkingError::Validation(format!(
                "Price must be less than {PRICE_LIMIT}"
            )));
        }

        let max_spots: i32 = self.max_spots.trim().parse().map_err(|_| {
            ParkingError::Validation(format!("Invalid number of spots '{}'", self.max_spots))
        })?;
        if max_spots < 0 {
            return Err(ParkingError::Validation(
                "Number of spots cannot be negative".into(),
            ));
        }
        if max_spots > MAX_SPOTS {
            return Err(ParkingError::Validation(format!(
                "A lot can have at most {MAX_SPOTS} spots"
            )));
        }

        Ok(LotFields {
            location_name,
            price,
            address: self.address.trim().to_string(),
            pin_code: self
                .pin
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty()),
            max_spots,
        })
    }
}

/// Current lot values, used to pre-fill the edit form.
#[derive(Debug, Serialize)]
pub struct EditLotView {
    pub action: String,
    pub lot: ParkingLot,
    pub spot_count: usize,
    pub occupied_spots: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(price: &str, max_spots: &str) -> LotForm {
        LotForm {
            name: "  Central  ".into(),
            price: price.into(),
            address: "1 Main St".into(),
            pin: Some("".into()),
            max_spots: max_spots.into(),
        }
    }

    #[test]
    fn parses_and_trims() {
        let fields = form("12.5", "4").validate().expect("valid");
        assert_eq!(fields.location_name, "Central");
        assert_eq!(fields.price, Decimal::new(125, 1));
        assert_eq!(fields.max_spots, 4);
        assert_eq!(fields.pin_code, None);
    }

    #[test]
    fn rejects_bad_numbers() {
        assert!(matches!(form("ten", "4").validate(), Err(ParkingError::Validation(_))));
        assert!(matches!(form("-1", "4").validate(), Err(ParkingError::Validation(_))));
        assert!(matches!(form("10", "-2").validate(), Err(ParkingError::Validation(_))));
        assert!(matches!(form("10", "2.5").validate(), Err(ParkingError::Validation(_))));
    }

    #[test]
    fn rejects_prices_the_database_cannot_hold() {
        assert!(matches!(
            form("79228162514264337593543950335", "4").validate(),
            Err(ParkingError::Validation(_))
        ));
        assert!(matches!(
            form("100000000", "4").validate(),
            Err(ParkingError::Validation(_))
        ));
        assert!(matches!(
            form("99999999.999", "4").validate(),
            Err(ParkingError::Validation(_))
        ));
        let fields = form("99999999.99", "4").validate().expect("valid");
        assert_eq!(fields.price, Decimal::new(9_999_999_999, 2));
    }

    #[test]
    fn caps_spot_count() {
        assert_eq!(form("10", "10000").validate().expect("valid").max_spots, MAX_SPOTS);
        assert!(matches!(
            form("10", "10001").validate(),
            Err(ParkingError::Validation(_))
        ));
        assert!(matches!(
            form("10", "2147483647").validate(),
            Err(ParkingError::Validation(_))
        ));
    }

    #[test]
    fn zero_spots_is_allowed() {
        assert_eq!(form("0", "0").validate().expect("valid").max_spots, 0);
    }
}
