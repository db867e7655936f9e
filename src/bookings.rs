use bigdecimal::BigDecimal;
use chrono::{NaiveDate, Utc};
use diesel::prelude::*;
use rand::Rng;

use crate::availability::{room_is_free, Party, StayRange};
use crate::catalog::{lock_room, room_details};
use crate::error::{AppError, FieldErrors};
use crate::guests::upsert_guest;
use crate::models::{
    price_number, Booking, BookingChanges, BookingStatus, BookingSummary, BookingView,
    DashboardView, GuestInfo, NewBooking, PaymentMethod, Room, RoomType,
};
use crate::schema::{bookings, room_types, rooms, users};
use crate::storage::{discard, store_proof, validate_proof, BlobStore, UploadedFile};
use crate::validation::{absorb, check_guest_info, finish, push};

pub const REFERENCE_LEN: usize = 8;
const REFERENCE_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const REFERENCE_ATTEMPTS: usize = 5;
const RECENT_LIMIT: i64 = 5;
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Nights billed for a stay; a stay always costs at least one night.
pub fn nights_between(check_in: NaiveDate, check_out: NaiveDate) -> i64 {
    (check_out - check_in).num_days().max(1)
}

pub fn total_price(nightly: &BigDecimal, nights: i64) -> BigDecimal {
    (nightly * BigDecimal::from(nights)).with_scale(2)
}

pub fn generate_reference<R: Rng>(rng: &mut R) -> String {
    (0..REFERENCE_LEN)
        .map(|_| REFERENCE_CHARSET[rng.random_range(0..REFERENCE_CHARSET.len())] as char)
        .collect()
}

#[derive(Debug, Clone)]
pub struct CreateBookingRequest {
    pub stay: StayRange,
    pub party: Party,
    pub room_id: i64,
    pub guest_info: GuestInfo,
    pub payment_method: PaymentMethod,
    pub user_id: Option<i64>,
}

/// Administrative edit. Every field is optional; absent fields keep their
/// current value.
#[derive(Debug, Clone, Default)]
pub struct BookingPatch {
    pub room_id: Option<i64>,
    pub check_in: Option<NaiveDate>,
    pub check_out: Option<NaiveDate>,
    pub adults: Option<i32>,
    pub children: Option<i32>,
    pub total_price: Option<BigDecimal>,
    pub payment_method: Option<PaymentMethod>,
    pub status: Option<BookingStatus>,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub special_requests: Option<Option<String>>,
}

fn unused_reference(conn: &mut PgConnection) -> Result<String, AppError> {
    let mut rng = rand::rng();
    for _ in 0..REFERENCE_ATTEMPTS {
        let candidate = generate_reference(&mut rng);
        let taken: bool = diesel::select(diesel::dsl::exists(
            bookings::table.filter(bookings::booking_reference.eq(&candidate)),
        ))
        .get_result(conn)?;
        if !taken {
            return Ok(candidate);
        }
        log::warn!("booking reference {} already taken, drawing again", candidate);
    }
    Err(AppError::ReferenceCollision)
}

fn ensure_user(conn: &mut PgConnection, user_id: i64) -> Result<(), AppError> {
    let known: bool = diesel::select(diesel::dsl::exists(users::table.find(user_id))).get_result(conn)?;
    if known {
        Ok(())
    } else {
        Err(AppError::Unauthorized)
    }
}

/// Create a pending booking.
///
/// Input is validated before anything is touched. The room row is locked and
/// its availability re-checked inside the same transaction that writes the
/// guest and the booking. The proof file is written last, just before the
/// insert, and removed again if the transaction does not commit.
pub fn create_booking(
    conn: &mut PgConnection,
    store: &dyn BlobStore,
    request: &CreateBookingRequest,
    proof: Option<&UploadedFile>,
) -> Result<Booking, AppError> {
    let mut errors = FieldErrors::new();
    absorb(&mut errors, check_guest_info(&request.guest_info))?;
    let checked = match validate_proof(proof) {
        Ok(checked) => Some(checked),
        Err(e @ (AppError::MissingFile | AppError::FileTooLarge { .. } | AppError::UnsupportedFileType))
            if !errors.is_empty() =>
        {
            push(&mut errors, "paymentProof", e.to_string());
            None
        }
        Err(e) => return Err(e),
    };
    finish(errors)?;
    let checked = checked.ok_or(AppError::MissingFile)?;

    let stay = request.stay;
    let party = request.party;
    let mut stored: Option<String> = None;

    let result = conn.transaction(|conn| {
        if let Some(user_id) = request.user_id {
            ensure_user(conn, user_id)?;
        }

        let room = lock_room(conn, request.room_id)?;
        if !room.available || room.capacity < party.total() {
            return Err(AppError::RoomUnavailable);
        }
        if !room_is_free(conn, room.id, &stay, None)? {
            return Err(AppError::RoomUnavailable);
        }

        let nights = nights_between(stay.check_in(), stay.check_out());
        let price = total_price(&room.price, nights);

        let guest = upsert_guest(conn, &request.guest_info)?;
        let reference = unused_reference(conn)?;

        let path = store_proof(store, &checked)?;
        stored = Some(path.clone());

        let info = &request.guest_info;
        let row = NewBooking {
            booking_reference: &reference,
            user_id: request.user_id,
            room_id: room.id,
            guest_id: Some(guest.id),
            check_in: stay.check_in(),
            check_out: stay.check_out(),
            adults: party.adults,
            children: party.children,
            total_price: price,
            guest_full_name: info.full_name.trim(),
            guest_email: info.email.trim(),
            guest_phone: info.phone.trim(),
            guest_address: info.address.trim(),
            guest_special_requests: info.special_requests.as_deref().map(str::trim),
            payment_method: request.payment_method,
            payment_proof: &path,
            status: BookingStatus::Pending,
        };

        let booking = diesel::insert_into(bookings::table)
            .values(&row)
            .returning(Booking::as_returning())
            .get_result(conn)?;

        Ok(booking)
    });

    match result {
        Ok(booking) => {
            log::info!(
                "created booking {} for room {} ({} to {})",
                booking.booking_reference,
                booking.room_id,
                booking.check_in,
                booking.check_out
            );
            Ok(booking)
        }
        Err(e) => {
            if let Some(path) = stored {
                discard(store, &path);
            }
            Err(e)
        }
    }
}

fn load_joined(
    conn: &mut PgConnection,
    reference: &str,
) -> Result<(Booking, Room, RoomType, Option<String>), AppError> {
    bookings::table
        .inner_join(rooms::table.inner_join(room_types::table))
        .left_join(users::table)
        .filter(bookings::booking_reference.eq(reference))
        .select((
            Booking::as_select(),
            Room::as_select(),
            RoomType::as_select(),
            users::name.nullable(),
        ))
        .first(conn)
        .optional()?
        .ok_or(AppError::NotFound("booking"))
}

pub fn booking_view(
    store: &dyn BlobStore,
    booking: Booking,
    room: &Room,
    room_type: &RoomType,
    user_name: Option<String>,
    today: NaiveDate,
) -> Result<BookingView, AppError> {
    Ok(BookingView {
        id: booking.id,
        room: room_details(room, room_type)?,
        guest_id: booking.guest_id,
        user_id: booking.user_id,
        user_name,
        check_in: booking.check_in,
        check_out: booking.check_out,
        nights: booking.nights(),
        adults: booking.adults,
        children: booking.children,
        total_price: price_number(&booking.total_price),
        status: booking.status,
        can_cancel: booking.guest_can_cancel(today),
        payment_method: booking.payment_method,
        payment_proof: store.url_for(&booking.payment_proof),
        guest_info: booking.guest_info(),
        created_at: booking.created_at.format(TIMESTAMP_FORMAT).to_string(),
        booking_reference: booking.booking_reference,
    })
}

/// Read-only projection of a booking. With `scope` set, bookings owned by
/// anyone else are reported as missing.
pub fn get_booking_details(
    conn: &mut PgConnection,
    store: &dyn BlobStore,
    reference: &str,
    scope: Option<i64>,
    today: NaiveDate,
) -> Result<BookingView, AppError> {
    let (booking, room, room_type, user_name) = load_joined(conn, reference)?;
    if let Some(owner) = scope {
        if booking.user_id != Some(owner) {
            return Err(AppError::NotFound("booking"));
        }
    }
    booking_view(store, booking, &room, &room_type, user_name, today)
}

fn find_for_update(conn: &mut PgConnection, reference: &str) -> Result<Booking, AppError> {
    bookings::table
        .filter(bookings::booking_reference.eq(reference))
        .select(Booking::as_select())
        .for_update()
        .first(conn)
        .optional()?
        .ok_or(AppError::NotFound("booking"))
}

/// Guest self-service cancellation: only the owner, only while pending, and
/// only before the check-in date.
pub fn cancel_booking(
    conn: &mut PgConnection,
    reference: &str,
    requesting_user: Option<i64>,
    today: NaiveDate,
) -> Result<Booking, AppError> {
    conn.transaction(|conn| {
        let booking = find_for_update(conn, reference)?;

        if requesting_user.is_none() || booking.user_id != requesting_user {
            return Err(AppError::CancellationNotAllowed(
                "booking does not belong to this account",
            ));
        }
        if booking.status != BookingStatus::Pending {
            return Err(AppError::CancellationNotAllowed(
                "only pending bookings can be cancelled",
            ));
        }
        if booking.check_in <= today {
            return Err(AppError::CancellationNotAllowed(
                "check-in date has already been reached",
            ));
        }

        let cancelled = diesel::update(bookings::table.find(booking.id))
            .set((
                bookings::status.eq(BookingStatus::Cancelled),
                bookings::updated_at.eq(Utc::now().naive_utc()),
            ))
            .returning(Booking::as_returning())
            .get_result(conn)?;

        log::info!("booking {} cancelled by user {:?}", reference, requesting_user);
        Ok(cancelled)
    })
}

/// Overrides land in a NUMERIC(10,2) column: at most 8 integer digits and
/// 2 decimal places.
const PRICE_CEILING: i64 = 100_000_000;

fn check_price_override(errors: &mut FieldErrors, price: &BigDecimal) {
    if *price < BigDecimal::from(0) {
        push(errors, "totalPrice", "The total price must be at least 0.");
    } else if *price >= BigDecimal::from(PRICE_CEILING) {
        push(errors, "totalPrice", "The total price may not be greater than 99999999.99.");
    }
    let (_, scale) = price.normalized().as_bigint_and_exponent();
    if scale > 2 {
        push(errors, "totalPrice", "The total price may not have more than 2 decimal places.");
    }
}

fn merged_guest_info(current: &Booking, patch: &BookingPatch) -> GuestInfo {
    let base = current.guest_info();
    GuestInfo {
        full_name: patch.full_name.clone().unwrap_or(base.full_name),
        email: patch.email.clone().unwrap_or(base.email),
        phone: patch.phone.clone().unwrap_or(base.phone),
        address: patch.address.clone().unwrap_or(base.address),
        special_requests: patch.special_requests.clone().unwrap_or(base.special_requests),
    }
}

/// Administrative update. Status may be set to any value. A replacement
/// proof is written before the transaction; the old file is removed only
/// once the new row has committed, the new one is removed if it has not.
pub fn update_booking(
    conn: &mut PgConnection,
    store: &dyn BlobStore,
    reference: &str,
    patch: &BookingPatch,
    new_proof: Option<&UploadedFile>,
) -> Result<Booking, AppError> {
    let checked = match new_proof {
        Some(file) => Some(validate_proof(Some(file))?),
        None => None,
    };

    let new_path = match &checked {
        Some(proof) => {
            // no file is written for a booking that does not exist
            let known: bool = diesel::select(diesel::dsl::exists(
                bookings::table.filter(bookings::booking_reference.eq(reference)),
            ))
            .get_result(conn)?;
            if !known {
                return Err(AppError::NotFound("booking"));
            }
            Some(store_proof(store, proof)?)
        }
        None => None,
    };

    let result = conn.transaction(|conn| {
        let current = find_for_update(conn, reference)?;

        let mut errors = FieldErrors::new();
        let stay = absorb(
            &mut errors,
            StayRange::new(
                patch.check_in.unwrap_or(current.check_in),
                patch.check_out.unwrap_or(current.check_out),
            ),
        )?;
        let party = absorb(
            &mut errors,
            Party::new(
                patch.adults.unwrap_or(current.adults),
                patch.children.unwrap_or(current.children),
            ),
        )?;
        if let Some(price) = &patch.total_price {
            check_price_override(&mut errors, price);
        }
        let info = merged_guest_info(&current, patch);
        absorb(&mut errors, check_guest_info(&info))?;

        let room_id = patch.room_id.unwrap_or(current.room_id);
        let room = match lock_room(conn, room_id) {
            Ok(room) => Some(room),
            Err(AppError::RoomNotFound(_)) => {
                push(&mut errors, "roomId", "The selected room is invalid.");
                None
            }
            Err(e) => return Err(e),
        };

        finish(errors)?;
        let (stay, party, room) = match (stay, party, room) {
            (Some(stay), Some(party), Some(room)) => (stay, party, room),
            _ => return Err(AppError::Validation(FieldErrors::new())),
        };

        let moved = room_id != current.room_id
            || stay.check_in() != current.check_in
            || stay.check_out() != current.check_out;

        let status = patch.status.unwrap_or(current.status);
        if moved
            && status != BookingStatus::Cancelled
            && !room_is_free(conn, room.id, &stay, Some(current.id))?
        {
            return Err(AppError::RoomUnavailable);
        }

        if status != current.status && !current.status.can_transition_to(status) {
            log::warn!(
                "booking {} forced from {} to {} by administrator",
                reference,
                current.status,
                status
            );
        }

        let total = match &patch.total_price {
            Some(price) => price.with_scale(2),
            None if moved => total_price(
                &room.price,
                nights_between(stay.check_in(), stay.check_out()),
            ),
            None => current.total_price.clone(),
        };

        let changes = BookingChanges {
            room_id: Some(room.id),
            check_in: Some(stay.check_in()),
            check_out: Some(stay.check_out()),
            adults: Some(party.adults),
            children: Some(party.children),
            total_price: Some(total),
            guest_full_name: Some(info.full_name.trim().to_owned()),
            guest_email: Some(info.email.trim().to_owned()),
            guest_phone: Some(info.phone.trim().to_owned()),
            guest_address: Some(info.address.trim().to_owned()),
            guest_special_requests: Some(info.special_requests.clone()),
            payment_method: Some(patch.payment_method.unwrap_or(current.payment_method)),
            payment_proof: new_path.clone(),
            status: Some(status),
            updated_at: Some(Utc::now().naive_utc()),
        };

        let updated = diesel::update(bookings::table.find(current.id))
            .set(&changes)
            .returning(Booking::as_returning())
            .get_result(conn)?;

        Ok((updated, current.payment_proof))
    });

    match result {
        Ok((updated, old_proof)) => {
            if new_path.is_some() && old_proof != updated.payment_proof {
                discard(store, &old_proof);
            }
            log::info!("booking {} updated", reference);
            Ok(updated)
        }
        Err(e) => {
            if let Some(path) = new_path {
                discard(store, &path);
            }
            Err(e)
        }
    }
}

/// Remove a booking outright; its proof file goes afterwards.
pub fn delete_booking(
    conn: &mut PgConnection,
    store: &dyn BlobStore,
    reference: &str,
) -> Result<Booking, AppError> {
    let deleted = diesel::delete(bookings::table.filter(bookings::booking_reference.eq(reference)))
        .returning(Booking::as_returning())
        .get_result(conn)
        .optional()?
        .ok_or(AppError::NotFound("booking"))?;

    discard(store, &deleted.payment_proof);
    log::info!("booking {} deleted", reference);
    Ok(deleted)
}

fn summarize(
    booking: &Booking,
    room: &Room,
    room_type: &RoomType,
    today: NaiveDate,
) -> BookingSummary {
    BookingSummary {
        id: booking.id,
        reference: booking.booking_reference.clone(),
        room_type: room_type.name.clone(),
        room_number: room.room_number.clone(),
        check_in: booking.check_in,
        check_out: booking.check_out,
        nights: booking.nights(),
        adults: booking.adults,
        children: booking.children,
        total_price: price_number(&booking.total_price),
        status: booking.status,
        can_cancel: booking.guest_can_cancel(today),
        payment_method: booking.payment_method,
        user_id: booking.user_id,
        guest_name: booking.guest_full_name.clone(),
        created_at: booking.created_at.format(TIMESTAMP_FORMAT).to_string(),
    }
}

fn load_summaries(
    conn: &mut PgConnection,
    owner: Option<i64>,
    limit: Option<i64>,
    today: NaiveDate,
) -> Result<Vec<BookingSummary>, AppError> {
    let mut query = bookings::table
        .inner_join(rooms::table.inner_join(room_types::table))
        .select((Booking::as_select(), Room::as_select(), RoomType::as_select()))
        .order((bookings::created_at.desc(), bookings::id.desc()))
        .into_boxed();
    if let Some(user_id) = owner {
        query = query.filter(bookings::user_id.eq(user_id));
    }
    if let Some(n) = limit {
        query = query.limit(n);
    }

    let rows: Vec<(Booking, Room, RoomType)> = query.load(conn)?;
    Ok(rows
        .iter()
        .map(|(booking, room, room_type)| summarize(booking, room, room_type, today))
        .collect())
}

pub fn list_user_bookings(
    conn: &mut PgConnection,
    user_id: i64,
    today: NaiveDate,
) -> Result<Vec<BookingSummary>, AppError> {
    load_summaries(conn, Some(user_id), None, today)
}

pub fn list_all_bookings(conn: &mut PgConnection, today: NaiveDate) -> Result<Vec<BookingSummary>, AppError> {
    load_summaries(conn, None, None, today)
}

pub fn user_dashboard(
    conn: &mut PgConnection,
    user_id: i64,
    today: NaiveDate,
) -> Result<DashboardView, AppError> {
    use crate::schema::bookings::dsl::{bookings as all_bookings, check_out, status, user_id as owner};

    let mine = || all_bookings.filter(owner.eq(user_id));

    let pending_bookings = mine()
        .filter(status.eq(BookingStatus::Pending))
        .count()
        .get_result(conn)?;
    let active_bookings = mine()
        .filter(status.eq(BookingStatus::Confirmed))
        .filter(check_out.ge(today))
        .count()
        .get_result(conn)?;
    let completed_bookings = mine()
        .filter(
            status
                .eq(BookingStatus::Completed)
                .or(status.eq(BookingStatus::Confirmed).and(check_out.lt(today))),
        )
        .count()
        .get_result(conn)?;
    let cancelled_bookings = mine()
        .filter(status.eq(BookingStatus::Cancelled))
        .count()
        .get_result(conn)?;

    let recent_bookings = load_summaries(conn, Some(user_id), Some(RECENT_LIMIT), today)?;

    Ok(DashboardView {
        pending_bookings,
        active_bookings,
        completed_bookings,
        cancelled_bookings,
        recent_bookings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};
    use std::str::FromStr;

    fn day(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, m, d).unwrap()
    }

    #[test]
    fn two_night_stay_in_a_standard_room() {
        let nights = nights_between(day(6, 1), day(6, 3));
        assert_eq!(nights, 2);
        assert_eq!(
            total_price(&BigDecimal::from(2500), nights),
            BigDecimal::from_str("5000.00").unwrap()
        );
    }

    #[test]
    fn stays_bill_at_least_one_night() {
        assert_eq!(nights_between(day(6, 1), day(6, 1)), 1);
        assert_eq!(nights_between(day(6, 1), day(6, 2)), 1);
    }

    #[test]
    fn price_law_holds_across_month_boundaries() {
        let nightly = BigDecimal::from_str("4000.50").unwrap();
        for (check_in, check_out, nights) in [
            (day(1, 30), day(2, 2), 3),
            (day(2, 27), day(3, 1), 2),
            (day(12, 31), NaiveDate::from_ymd_opt(2026, 1, 2).unwrap(), 2),
        ] {
            assert_eq!(nights_between(check_in, check_out), nights);
            assert_eq!(
                total_price(&nightly, nights_between(check_in, check_out)),
                (&nightly * BigDecimal::from(nights)).with_scale(2)
            );
        }
    }

    #[test]
    fn references_are_eight_uppercase_alphanumerics() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let reference = generate_reference(&mut rng);
            assert_eq!(reference.len(), REFERENCE_LEN);
            assert!(crate::validation::is_booking_reference(&reference), "{reference}");
        }
    }

    #[test]
    fn references_vary() {
        let mut rng = StdRng::seed_from_u64(42);
        let a = generate_reference(&mut rng);
        let b = generate_reference(&mut rng);
        assert_ne!(a, b);
    }

    fn override_errors(raw: &str) -> Vec<String> {
        let mut errors = FieldErrors::new();
        check_price_override(&mut errors, &BigDecimal::from_str(raw).unwrap());
        errors.remove("totalPrice").unwrap_or_default()
    }

    #[test]
    fn price_overrides_must_fit_the_column() {
        assert!(override_errors("0").is_empty());
        assert!(override_errors("4500.50").is_empty());
        assert!(override_errors("1.990").is_empty());
        assert!(override_errors("99999999.99").is_empty());

        assert_eq!(
            override_errors("100000000000"),
            vec!["The total price may not be greater than 99999999.99.".to_owned()]
        );
        assert_eq!(
            override_errors("1.999"),
            vec!["The total price may not have more than 2 decimal places.".to_owned()]
        );
        assert_eq!(override_errors("-1").len(), 1);
    }

    fn booking(status: BookingStatus, check_in: NaiveDate) -> Booking {
        let stamp = day(5, 1).and_hms_opt(9, 30, 0).unwrap();
        Booking {
            id: 1,
            booking_reference: "ABCD1234".into(),
            user_id: Some(9),
            room_id: 1,
            guest_id: Some(1),
            check_in,
            check_out: check_in + chrono::Days::new(2),
            adults: 2,
            children: 0,
            total_price: BigDecimal::from(5000),
            guest_full_name: "Maria Santos".into(),
            guest_email: "maria@example.com".into(),
            guest_phone: "09171234567".into(),
            guest_address: "Manila".into(),
            guest_special_requests: None,
            payment_method: PaymentMethod::Gcash,
            payment_proof: "bookings/payment_proofs/x.png".into(),
            status,
            created_at: stamp,
            updated_at: stamp,
        }
    }

    #[test]
    fn confirmed_bookings_are_not_self_cancellable() {
        let today = day(5, 20);
        assert!(booking(BookingStatus::Pending, day(6, 1)).guest_can_cancel(today));
        assert!(!booking(BookingStatus::Confirmed, day(6, 1)).guest_can_cancel(today));
        assert!(!booking(BookingStatus::Cancelled, day(6, 1)).guest_can_cancel(today));
    }

    #[test]
    fn cancellation_closes_on_check_in_day() {
        let b = booking(BookingStatus::Pending, day(6, 1));
        assert!(b.guest_can_cancel(day(5, 31)));
        assert!(!b.guest_can_cancel(day(6, 1)));
        assert!(!b.guest_can_cancel(day(6, 2)));
    }

    #[test]
    fn patch_merges_guest_snapshot() {
        let current = booking(BookingStatus::Pending, day(6, 1));
        let patch = BookingPatch {
            phone: Some("09998887777".into()),
            special_requests: Some(Some("Crib please".into())),
            ..Default::default()
        };
        let merged = merged_guest_info(&current, &patch);
        assert_eq!(merged.full_name, "Maria Santos");
        assert_eq!(merged.phone, "09998887777");
        assert_eq!(merged.special_requests.as_deref(), Some("Crib please"));

        let clear = BookingPatch {
            special_requests: Some(None),
            ..Default::default()
        };
        assert_eq!(merged_guest_info(&current, &clear).special_requests, None);
    }

    #[test]
    fn view_echoes_snapshot_and_proof_url() {
        let dir = tempfile::tempdir().unwrap();
        let store = crate::storage::LocalDiskStore::new(dir.path(), "http://hotel.test");
        let b = booking(BookingStatus::Pending, day(6, 1));
        let stamp = day(5, 1).and_hms_opt(0, 0, 0).unwrap();
        let room = Room {
            id: 1,
            room_number: "1011".into(),
            floor: 1,
            price: BigDecimal::from(2500),
            capacity: 3,
            available: true,
            room_type_id: 1,
            created_at: stamp,
            updated_at: stamp,
        };
        let room_type = RoomType {
            id: 1,
            name: "Standard".into(),
            base_price: BigDecimal::from(2500),
            features: serde_json::json!({ "freeWifi": true }),
            created_at: stamp,
            updated_at: stamp,
        };

        let view = booking_view(&store, b, &room, &room_type, Some("maria".into()), day(5, 20)).unwrap();
        assert_eq!(view.booking_reference, "ABCD1234");
        assert_eq!(view.nights, 2);
        assert_eq!(view.total_price, 5000.0);
        assert!(view.can_cancel);
        assert_eq!(
            view.payment_proof,
            "http://hotel.test/storage/bookings/payment_proofs/x.png"
        );
        assert_eq!(view.guest_info.email, "maria@example.com");
        assert_eq!(view.created_at, "2025-05-01 09:30:00");
    }
}
