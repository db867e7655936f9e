use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use bigdecimal::{BigDecimal, ToPrimitive};
use chrono::{NaiveDate, NaiveDateTime};
use diesel::{
    deserialize::{self, FromSql},
    pg::{Pg, PgValue},
    prelude::*,
    serialize::{self, Output, ToSql},
    sql_types::Text,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::AppError;
use crate::schema::{bookings, guests, room_types, rooms, users};

/// Feature name to whether the room type offers it.
pub type RoomFeatures = BTreeMap<String, bool>;

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Serialize)]
#[diesel(table_name = room_types, check_for_backend(diesel::pg::Pg))]
pub struct RoomType {
    pub id: i64,
    pub name: String,
    pub base_price: BigDecimal,
    pub features: serde_json::Value,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl RoomType {
    /// Feature flags are stored as JSONB; anything other than a flat
    /// string-to-bool object is treated as a corrupt row.
    pub fn feature_flags(&self) -> Result<RoomFeatures, AppError> {
        serde_json::from_value(self.features.clone()).map_err(|e| {
            AppError::CorruptRecord(format!("room type {} features: {}", self.name, e))
        })
    }
}

#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = room_types)]
pub struct NewRoomType {
    pub name: String,
    pub base_price: BigDecimal,
    pub features: serde_json::Value,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Serialize)]
#[diesel(table_name = rooms, check_for_backend(diesel::pg::Pg))]
pub struct Room {
    pub id: i64,
    pub room_number: String,
    pub floor: i32,
    pub price: BigDecimal,
    pub capacity: i32,
    pub available: bool,
    pub room_type_id: i64,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = rooms)]
pub struct NewRoom {
    pub room_number: String,
    pub floor: i32,
    pub price: BigDecimal,
    pub capacity: i32,
    pub available: bool,
    pub room_type_id: i64,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Serialize)]
#[diesel(table_name = guests, check_for_backend(diesel::pg::Pg))]
pub struct Guest {
    pub id: i64,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub special_requests: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = guests)]
#[diesel(treat_none_as_null = true)]
pub struct NewGuest<'a> {
    pub full_name: &'a str,
    pub email: &'a str,
    pub phone: &'a str,
    pub address: &'a str,
    pub special_requests: Option<&'a str>,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Serialize)]
#[diesel(table_name = users, check_for_backend(diesel::pg::Pg))]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub is_admin: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub is_admin: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsExpression, FromSqlRow)]
#[diesel(sql_type = crate::schema::sql_types::BookingStatus)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

impl BookingStatus {
    pub const ALL: [BookingStatus; 4] = [
        BookingStatus::Pending,
        BookingStatus::Confirmed,
        BookingStatus::Cancelled,
        BookingStatus::Completed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Completed => "completed",
        }
    }

    /// Moves allowed by the booking state machine. Cancelled and completed
    /// are terminal; administrators may still override through an update.
    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        use BookingStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed) | (Pending, Cancelled) | (Pending, Completed)
                | (Confirmed, Completed) | (Confirmed, Cancelled)
        )
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BookingStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("Unrecognized booking status: {}", s))
    }
}

impl ToSql<crate::schema::sql_types::BookingStatus, Pg> for BookingStatus {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        <str as ToSql<Text, Pg>>::to_sql(self.as_str(), out)
    }
}

impl FromSql<crate::schema::sql_types::BookingStatus, Pg> for BookingStatus {
    fn from_sql(bytes: PgValue) -> deserialize::Result<Self> {
        let raw = <String as FromSql<Text, Pg>>::from_sql(bytes)?;
        raw.parse::<BookingStatus>().map_err(Into::into)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsExpression, FromSqlRow)]
#[diesel(sql_type = crate::schema::sql_types::PaymentMethod)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Gcash,
    Paypal,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Gcash => "gcash",
            PaymentMethod::Paypal => "paypal",
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gcash" => Ok(PaymentMethod::Gcash),
            "paypal" => Ok(PaymentMethod::Paypal),
            other => Err(format!("Unrecognized payment method: {}", other)),
        }
    }
}

impl ToSql<crate::schema::sql_types::PaymentMethod, Pg> for PaymentMethod {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        <str as ToSql<Text, Pg>>::to_sql(self.as_str(), out)
    }
}

impl FromSql<crate::schema::sql_types::PaymentMethod, Pg> for PaymentMethod {
    fn from_sql(bytes: PgValue) -> deserialize::Result<Self> {
        let raw = <String as FromSql<Text, Pg>>::from_sql(bytes)?;
        raw.parse::<PaymentMethod>().map_err(Into::into)
    }
}

/// Contact details as captured on a booking. Kept apart from [`Guest`] so a
/// later profile edit never rewrites history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GuestInfo {
    #[validate(length(max = 255, message = "The full name may not be greater than 255 characters."))]
    pub full_name: String,
    #[validate(
        email(message = "The email must be a valid email address."),
        length(max = 255, message = "The email may not be greater than 255 characters.")
    )]
    pub email: String,
    #[validate(length(max = 20, message = "The phone may not be greater than 20 characters."))]
    pub phone: String,
    #[validate(length(max = 500, message = "The address may not be greater than 500 characters."))]
    pub address: String,
    #[validate(length(max = 2000, message = "The special requests may not be greater than 2000 characters."))]
    pub special_requests: Option<String>,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Serialize)]
#[diesel(table_name = bookings, check_for_backend(diesel::pg::Pg))]
pub struct Booking {
    pub id: i64,
    pub booking_reference: String,
    pub user_id: Option<i64>,
    pub room_id: i64,
    pub guest_id: Option<i64>,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub adults: i32,
    pub children: i32,
    pub total_price: BigDecimal,
    pub guest_full_name: String,
    pub guest_email: String,
    pub guest_phone: String,
    pub guest_address: String,
    pub guest_special_requests: Option<String>,
    pub payment_method: PaymentMethod,
    pub payment_proof: String,
    pub status: BookingStatus,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Booking {
    pub fn guest_info(&self) -> GuestInfo {
        GuestInfo {
            full_name: self.guest_full_name.clone(),
            email: self.guest_email.clone(),
            phone: self.guest_phone.clone(),
            address: self.guest_address.clone(),
            special_requests: self.guest_special_requests.clone(),
        }
    }

    pub fn nights(&self) -> i64 {
        crate::bookings::nights_between(self.check_in, self.check_out)
    }

    /// Guests may only withdraw a booking nobody has acted on yet, and only
    /// before the day of arrival.
    pub fn guest_can_cancel(&self, today: NaiveDate) -> bool {
        self.status == BookingStatus::Pending && self.check_in > today
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = bookings)]
pub struct NewBooking<'a> {
    pub booking_reference: &'a str,
    pub user_id: Option<i64>,
    pub room_id: i64,
    pub guest_id: Option<i64>,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub adults: i32,
    pub children: i32,
    pub total_price: BigDecimal,
    pub guest_full_name: &'a str,
    pub guest_email: &'a str,
    pub guest_phone: &'a str,
    pub guest_address: &'a str,
    pub guest_special_requests: Option<&'a str>,
    pub payment_method: PaymentMethod,
    pub payment_proof: &'a str,
    pub status: BookingStatus,
}

#[derive(Debug, Default, AsChangeset)]
#[diesel(table_name = bookings)]
pub struct BookingChanges {
    pub room_id: Option<i64>,
    pub check_in: Option<NaiveDate>,
    pub check_out: Option<NaiveDate>,
    pub adults: Option<i32>,
    pub children: Option<i32>,
    pub total_price: Option<BigDecimal>,
    pub guest_full_name: Option<String>,
    pub guest_email: Option<String>,
    pub guest_phone: Option<String>,
    pub guest_address: Option<String>,
    pub guest_special_requests: Option<Option<String>>,
    pub payment_method: Option<PaymentMethod>,
    pub payment_proof: Option<String>,
    pub status: Option<BookingStatus>,
    pub updated_at: Option<NaiveDateTime>,
}

// Request/Response models for API

pub(crate) fn price_number(price: &BigDecimal) -> f64 {
    price.to_f64().unwrap_or_default()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomView {
    pub id: i64,
    pub room_number: String,
    pub floor: i32,
    pub price: f64,
    pub capacity: i32,
    pub available: bool,
    #[serde(rename = "type")]
    pub room_type: String,
    pub features: RoomFeatures,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingView {
    pub id: i64,
    pub booking_reference: String,
    pub room: RoomView,
    pub guest_id: Option<i64>,
    pub user_id: Option<i64>,
    pub user_name: Option<String>,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub nights: i64,
    pub adults: i32,
    pub children: i32,
    pub total_price: f64,
    pub status: BookingStatus,
    pub can_cancel: bool,
    pub payment_method: PaymentMethod,
    pub payment_proof: String,
    pub guest_info: GuestInfo,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingSummary {
    pub id: i64,
    pub reference: String,
    pub room_type: String,
    pub room_number: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub nights: i64,
    pub adults: i32,
    pub children: i32,
    pub total_price: f64,
    pub status: BookingStatus,
    pub can_cancel: bool,
    pub payment_method: PaymentMethod,
    pub user_id: Option<i64>,
    pub guest_name: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub pending_bookings: i64,
    pub active_bookings: i64,
    pub completed_bookings: i64,
    pub cancelled_bookings: i64,
    pub recent_bookings: Vec<BookingSummary>,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse {
    pub message: String,
}
