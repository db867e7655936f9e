#[macro_use]
extern crate diesel;

pub mod availability;
pub mod bookings;
pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod forms;
pub mod guests;
pub mod identity;
pub mod models;
pub mod multipart;
pub mod routes;
pub mod schema;
pub mod storage;
pub mod validation;
