use diesel::prelude::*;

use crate::error::AppError;
use crate::models::{Guest, GuestInfo, NewGuest};

/// Emails are compared case-insensitively: surrounding whitespace is dropped
/// and the whole address lowercased before it is stored or looked up.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Insert the guest, or refresh the contact details of the guest already on
/// file under the same (normalized) email.
pub fn upsert_guest(conn: &mut PgConnection, info: &GuestInfo) -> Result<Guest, AppError> {
    use crate::schema::guests::dsl::*;

    let key = normalize_email(&info.email);
    let row = NewGuest {
        full_name: info.full_name.trim(),
        email: &key,
        phone: info.phone.trim(),
        address: info.address.trim(),
        special_requests: info.special_requests.as_deref().map(str::trim),
    };

    let guest = diesel::insert_into(guests)
        .values(&row)
        .on_conflict(email)
        .do_update()
        .set((&row, updated_at.eq(diesel::dsl::now)))
        .returning(Guest::as_returning())
        .get_result(conn)?;

    Ok(guest)
}

pub fn find_guest_by_email(conn: &mut PgConnection, raw_email: &str) -> Result<Option<Guest>, AppError> {
    use crate::schema::guests::dsl::*;

    let guest = guests
        .filter(email.eq(normalize_email(raw_email)))
        .select(Guest::as_select())
        .first(conn)
        .optional()?;

    Ok(guest)
}
