use chrono::NaiveDate;
use diesel::prelude::*;
use serde::Deserialize;

use crate::catalog::room_details;
use crate::error::{AppError, FieldErrors};
use crate::models::{BookingStatus, Room, RoomType, RoomView};
use crate::schema::{bookings, room_types, rooms};

/// A validated half-open stay: nights run from `check_in` up to but not
/// including `check_out`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StayRange {
    check_in: NaiveDate,
    check_out: NaiveDate,
}

impl StayRange {
    pub fn new(check_in: NaiveDate, check_out: NaiveDate) -> Result<Self, AppError> {
        if check_out <= check_in {
            return Err(AppError::field(
                "checkOut",
                "The check out date must be a date after check in.",
            ));
        }
        Ok(Self { check_in, check_out })
    }

    pub fn check_in(&self) -> NaiveDate {
        self.check_in
    }

    pub fn check_out(&self) -> NaiveDate {
        self.check_out
    }
}

/// Guest counts, with the same bounds the booking form enforces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Party {
    pub adults: i32,
    pub children: i32,
}

impl Party {
    pub fn new(adults: i32, children: i32) -> Result<Self, AppError> {
        let mut errors = FieldErrors::new();
        if adults < 1 {
            errors
                .entry("adults".to_owned())
                .or_default()
                .push("The adults field must be at least 1.".to_owned());
        }
        if children < 0 {
            errors
                .entry("children".to_owned())
                .or_default()
                .push("The children field must be at least 0.".to_owned());
        }
        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }
        Ok(Self { adults, children })
    }

    pub fn total(&self) -> i32 {
        self.adults + self.children
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AvailabilityQuery {
    #[serde(alias = "checkIn")]
    pub check_in: NaiveDate,
    #[serde(alias = "checkOut")]
    pub check_out: NaiveDate,
    pub adults: i32,
    #[serde(default)]
    pub children: i32,
}

impl AvailabilityQuery {
    pub fn validate(&self) -> Result<(StayRange, Party), AppError> {
        let stay = StayRange::new(self.check_in, self.check_out);
        let party = Party::new(self.adults, self.children);
        match (stay, party) {
            (Ok(stay), Ok(party)) => Ok((stay, party)),
            (Err(AppError::Validation(mut a)), Err(AppError::Validation(b))) => {
                a.extend(b);
                Err(AppError::Validation(a))
            }
            (Err(e), _) | (_, Err(e)) => Err(e),
        }
    }
}

/// Ids of rooms holding a non-cancelled booking that shares a night with `stay`.
pub fn booked_room_ids(conn: &mut PgConnection, stay: &StayRange) -> Result<Vec<i64>, AppError> {
    let ids = bookings::table
        .filter(bookings::status.ne(BookingStatus::Cancelled))
        .filter(bookings::check_in.lt(stay.check_out()))
        .filter(bookings::check_out.gt(stay.check_in()))
        .select(bookings::room_id)
        .distinct()
        .load::<i64>(conn)?;

    Ok(ids)
}

/// Whether a single room is free for `stay`, ignoring `exclude_booking`
/// (used when an existing booking is being moved).
pub fn room_is_free(
    conn: &mut PgConnection,
    room_id: i64,
    stay: &StayRange,
    exclude_booking: Option<i64>,
) -> Result<bool, AppError> {
    let mut query = bookings::table
        .filter(bookings::room_id.eq(room_id))
        .filter(bookings::status.ne(BookingStatus::Cancelled))
        .filter(bookings::check_in.lt(stay.check_out()))
        .filter(bookings::check_out.gt(stay.check_in()))
        .select(bookings::id)
        .into_boxed();
    if let Some(id) = exclude_booking {
        query = query.filter(bookings::id.ne(id));
    }

    let clash: Option<i64> = query.first(conn).optional()?;
    Ok(clash.is_none())
}

/// Rooms that are switched on, large enough for the party, and carry no
/// overlapping active booking. Ordered by room id.
pub fn find_available_rooms(
    conn: &mut PgConnection,
    stay: &StayRange,
    party: &Party,
) -> Result<Vec<RoomView>, AppError> {
    let busy = booked_room_ids(conn, stay)?;

    let rows: Vec<(Room, RoomType)> = rooms::table
        .inner_join(room_types::table)
        .filter(rooms::available.eq(true))
        .filter(rooms::capacity.ge(party.total()))
        .filter(rooms::id.ne_all(busy))
        .order(rooms::id.asc())
        .select((Room::as_select(), RoomType::as_select()))
        .load(conn)?;

    log::debug!(
        "{} rooms free between {} and {} for {} guests",
        rows.len(),
        stay.check_in(),
        stay.check_out(),
        party.total()
    );

    rows.iter()
        .map(|(room, room_type)| room_details(room, room_type))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, m, d).unwrap()
    }

    #[test]
    fn rejects_empty_and_inverted_ranges() {
        assert!(StayRange::new(day(6, 3), day(6, 3)).is_err());
        assert!(StayRange::new(day(6, 3), day(6, 1)).is_err());
        assert!(StayRange::new(day(6, 1), day(6, 2)).is_ok());
    }

    #[test]
    fn party_bounds() {
        assert_eq!(Party::new(2, 1).unwrap().total(), 3);
        assert!(Party::new(0, 2).is_err());
        assert!(Party::new(1, -1).is_err());
    }

    #[test]
    fn query_validation_collects_every_field() {
        let query = AvailabilityQuery {
            check_in: day(6, 3),
            check_out: day(6, 1),
            adults: 0,
            children: 0,
        };
        match query.validate() {
            Err(AppError::Validation(errors)) => {
                assert!(errors.contains_key("checkOut"));
                assert!(errors.contains_key("adults"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
