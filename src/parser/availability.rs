//! Seat-availability parser: the per-session JSON endpoint returns one
//! record per seat tier, keyed by a fixed numeric seat-type code.

use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::types::Availability;

pub const SEAT_TYPE_VIP: u8 = 2;
pub const SEAT_TYPE_REGULAR: u8 = 3;
pub const SEAT_TYPE_STANDING: u8 = 4;

/// Wire shape of one seat-type record.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatTypeRaw {
    pub seat_type: u8,
    pub amount: i64,
    pub is_sale: bool,
}

/// A tier is available only when seats remain AND the on-sale flag is set.
/// A missing required seat-type code is a fatal input error.
pub fn parse_availability(seats: &[SeatTypeRaw]) -> Result<Availability> {
    let flag = |code: u8| -> Result<bool> {
        seats
            .iter()
            .find(|s| s.seat_type == code)
            .map(|s| s.amount > 0 && s.is_sale)
            .ok_or(AppError::MissingSeatType(code))
    };

    Ok(Availability {
        vip: flag(SEAT_TYPE_VIP)?,
        regular: flag(SEAT_TYPE_REGULAR)?,
        standing: flag(SEAT_TYPE_STANDING)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seat(seat_type: u8, amount: i64, is_sale: bool) -> SeatTypeRaw {
        SeatTypeRaw { seat_type, amount, is_sale }
    }

    #[test]
    fn zero_amount_is_unavailable_regardless_of_sale_flag() {
        let seats = [seat(2, 0, true), seat(3, 5, true), seat(4, 1, true)];
        let a = parse_availability(&seats).unwrap();
        assert!(!a.vip);
        assert!(a.regular);
        assert!(a.standing);
    }

    #[test]
    fn off_sale_tier_is_unavailable_even_with_stock() {
        let seats = [seat(2, 10, false), seat(3, 10, true), seat(4, 0, false)];
        let a = parse_availability(&seats).unwrap();
        assert!(!a.vip);
        assert!(a.regular);
        assert!(!a.standing);
    }

    #[test]
    fn missing_seat_type_is_fatal() {
        let seats = [seat(2, 1, true), seat(3, 1, true)];
        assert!(matches!(
            parse_availability(&seats),
            Err(AppError::MissingSeatType(4))
        ));
    }

    #[test]
    fn extra_unknown_codes_are_ignored() {
        let seats = [
            seat(2, 1, true),
            seat(3, 0, true),
            seat(4, 2, true),
            seat(9, 100, true),
        ];
        let a = parse_availability(&seats).unwrap();
        assert!(a.vip && !a.regular && a.standing);
    }

    #[test]
    fn wire_records_deserialize_from_camel_case() {
        let raw = r#"[{"seatType":2,"amount":3,"isSale":true}]"#;
        let seats: Vec<SeatTypeRaw> = serde_json::from_str(raw).unwrap();
        assert_eq!(seats[0].seat_type, 2);
        assert_eq!(seats[0].amount, 3);
        assert!(seats[0].is_sale);
    }
}
