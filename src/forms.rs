//! Turning multipart booking forms into lifecycle requests.

use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::NaiveDate;

use crate::availability::{Party, StayRange};
use crate::bookings::{BookingPatch, CreateBookingRequest};
use crate::error::{AppError, FieldErrors};
use crate::models::{BookingStatus, GuestInfo, PaymentMethod};
use crate::multipart::FormData;
use crate::validation::{absorb, check_guest_info, finish, push};

pub const PROOF_FIELD: &str = "paymentProof";
const DATE_FORMAT: &str = "%Y-%m-%d";

fn required<'a>(form: &'a FormData, errors: &mut FieldErrors, key: &str, label: &str) -> Option<&'a str> {
    let value = form.text(key);
    if value.is_none() {
        push(errors, key, format!("The {} field is required.", label));
    }
    value
}

fn date(errors: &mut FieldErrors, key: &str, label: &str, raw: &str) -> Option<NaiveDate> {
    match NaiveDate::parse_from_str(raw, DATE_FORMAT) {
        Ok(d) => Some(d),
        Err(_) => {
            push(errors, key, format!("The {} is not a valid date.", label));
            None
        }
    }
}

fn integer<T: FromStr>(errors: &mut FieldErrors, key: &str, label: &str, raw: &str) -> Option<T> {
    match raw.parse::<T>() {
        Ok(n) => Some(n),
        Err(_) => {
            push(errors, key, format!("The {} field must be an integer.", label));
            None
        }
    }
}

fn parsed<T: FromStr>(errors: &mut FieldErrors, key: &str, message: &str, raw: &str) -> Option<T> {
    match raw.parse::<T>() {
        Ok(v) => Some(v),
        Err(_) => {
            push(errors, key, message);
            None
        }
    }
}

/// Guest details as submitted, without trimming beyond what [`FormData::text`]
/// already does.
fn guest_info(form: &FormData) -> GuestInfo {
    let get = |key: &str| form.text(key).unwrap_or_default().to_owned();
    GuestInfo {
        full_name: get("guestInfo.fullName"),
        email: get("guestInfo.email"),
        phone: get("guestInfo.phone"),
        address: get("guestInfo.address"),
        special_requests: form.text("guestInfo.specialRequests").map(str::to_owned),
    }
}

/// Parse and validate the public booking form. Every problem is reported at
/// once, the payment proof included.
pub fn create_request(form: &FormData, user_id: Option<i64>) -> Result<CreateBookingRequest, AppError> {
    let mut errors = FieldErrors::new();

    let check_in = required(form, &mut errors, "checkIn", "check in")
        .and_then(|raw| date(&mut errors, "checkIn", "check in", raw));
    let check_out = required(form, &mut errors, "checkOut", "check out")
        .and_then(|raw| date(&mut errors, "checkOut", "check out", raw));
    let adults = required(form, &mut errors, "adults", "adults")
        .and_then(|raw| integer::<i32>(&mut errors, "adults", "adults", raw));
    let children = required(form, &mut errors, "children", "children")
        .and_then(|raw| integer::<i32>(&mut errors, "children", "children", raw));
    let room_id = required(form, &mut errors, "roomId", "room")
        .and_then(|raw| parsed::<i64>(&mut errors, "roomId", "The selected room is invalid.", raw));
    let payment_method = required(form, &mut errors, "paymentMethod", "payment method").and_then(|raw| {
        parsed::<PaymentMethod>(&mut errors, "paymentMethod", "The selected payment method is invalid.", raw)
    });

    let stay = match (check_in, check_out) {
        (Some(check_in), Some(check_out)) => absorb(&mut errors, StayRange::new(check_in, check_out))?,
        _ => None,
    };
    let party = match (adults, children) {
        (Some(adults), Some(children)) => absorb(&mut errors, Party::new(adults, children))?,
        _ => None,
    };

    let info = guest_info(form);
    absorb(&mut errors, check_guest_info(&info))?;

    if form.file(PROOF_FIELD).map_or(true, |f| f.bytes.is_empty()) {
        push(&mut errors, PROOF_FIELD, AppError::MissingFile.to_string());
    }

    finish(errors)?;

    match (stay, party, room_id, payment_method) {
        (Some(stay), Some(party), Some(room_id), Some(payment_method)) => Ok(CreateBookingRequest {
            stay,
            party,
            room_id,
            guest_info: info,
            payment_method,
            user_id,
        }),
        _ => Err(AppError::Validation(FieldErrors::new())),
    }
}

/// Parse the administrative edit form. Absent keys leave the booking as is;
/// an explicitly blank `guestInfo.specialRequests` clears it.
pub fn booking_patch(form: &FormData) -> Result<BookingPatch, AppError> {
    let mut errors = FieldErrors::new();
    let mut patch = BookingPatch::default();

    if let Some(raw) = form.text("roomId") {
        patch.room_id = parsed(&mut errors, "roomId", "The selected room is invalid.", raw);
    }
    if let Some(raw) = form.text("checkIn") {
        patch.check_in = date(&mut errors, "checkIn", "check in", raw);
    }
    if let Some(raw) = form.text("checkOut") {
        patch.check_out = date(&mut errors, "checkOut", "check out", raw);
    }
    if let Some(raw) = form.text("adults") {
        patch.adults = integer(&mut errors, "adults", "adults", raw);
    }
    if let Some(raw) = form.text("children") {
        patch.children = integer(&mut errors, "children", "children", raw);
    }
    if let Some(raw) = form.text("totalPrice") {
        patch.total_price = parsed::<BigDecimal>(&mut errors, "totalPrice", "The total price must be a number.", raw);
    }
    if let Some(raw) = form.text("paymentMethod") {
        patch.payment_method = parsed(
            &mut errors,
            "paymentMethod",
            "The selected payment method is invalid.",
            raw,
        );
    }
    if let Some(raw) = form.text("status") {
        patch.status = parsed::<BookingStatus>(&mut errors, "status", "The selected status is invalid.", raw);
    }

    patch.full_name = form.text("guestInfo.fullName").map(str::to_owned);
    patch.email = form.text("guestInfo.email").map(str::to_owned);
    patch.phone = form.text("guestInfo.phone").map(str::to_owned);
    patch.address = form.text("guestInfo.address").map(str::to_owned);
    if form.has("guestInfo.specialRequests") {
        patch.special_requests = Some(form.text("guestInfo.specialRequests").map(str::to_owned));
    }

    finish(errors)?;
    Ok(patch)
}
