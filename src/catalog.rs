use bigdecimal::BigDecimal;
use diesel::prelude::*;

use crate::error::AppError;
use crate::models::{price_number, NewRoom, NewRoomType, Room, RoomType, RoomView};
use crate::schema::{room_types, rooms};

pub fn room_details(room: &Room, room_type: &RoomType) -> Result<RoomView, AppError> {
    Ok(RoomView {
        id: room.id,
        room_number: room.room_number.clone(),
        floor: room.floor,
        price: price_number(&room.price),
        capacity: room.capacity,
        available: room.available,
        room_type: room_type.name.clone(),
        features: room_type.feature_flags()?,
    })
}

pub fn list_rooms(conn: &mut PgConnection) -> Result<Vec<RoomView>, AppError> {
    let rows: Vec<(Room, RoomType)> = rooms::table
        .inner_join(room_types::table)
        .order(rooms::id.asc())
        .select((Room::as_select(), RoomType::as_select()))
        .load(conn)?;

    rows.iter()
        .map(|(room, room_type)| room_details(room, room_type))
        .collect()
}

pub fn get_room(conn: &mut PgConnection, room_id: i64) -> Result<(Room, RoomType), AppError> {
    rooms::table
        .inner_join(room_types::table)
        .filter(rooms::id.eq(room_id))
        .select((Room::as_select(), RoomType::as_select()))
        .first(conn)
        .optional()?
        .ok_or(AppError::RoomNotFound(room_id))
}

/// Locks the room row for the rest of the surrounding transaction so two
/// bookings for the same room are decided one after the other.
pub fn lock_room(conn: &mut PgConnection, room_id: i64) -> Result<Room, AppError> {
    rooms::table
        .filter(rooms::id.eq(room_id))
        .select(Room::as_select())
        .for_update()
        .first(conn)
        .optional()?
        .ok_or(AppError::RoomNotFound(room_id))
}

struct SeedType {
    name: &'static str,
    base_price: i64,
    features: &'static [&'static str],
}

const SEED_TYPES: [SeedType; 2] = [
    SeedType {
        name: "Standard",
        base_price: 2500,
        features: &["workDesk", "freeWifi", "flatScreenTv", "coffeeMaker"],
    },
    SeedType {
        name: "Deluxe",
        base_price: 4000,
        features: &[
            "premiumBedding",
            "miniBar",
            "enhancedWifi",
            "luxuryBathroom",
            "privateBalcony",
            "roomService",
            "smartTv",
        ],
    },
];

// (floor, room type, capacity)
const SEED_FLOORS: [(i32, &str, i32); 3] = [(1, "Standard", 3), (2, "Standard", 3), (3, "Deluxe", 5)];

const ROOMS_PER_FLOOR: i32 = 5;

/// Idempotent catalog seed. Room types are upserted by name, rooms that
/// already exist on a floor are left untouched. Returns how many rooms were
/// inserted.
pub fn seed_catalog(conn: &mut PgConnection) -> Result<usize, AppError> {
    conn.transaction(|conn| {
        let mut inserted = 0;

        for seed in &SEED_TYPES {
            let features: serde_json::Map<String, serde_json::Value> = seed
                .features
                .iter()
                .map(|f| ((*f).to_owned(), serde_json::Value::Bool(true)))
                .collect();
            let row = NewRoomType {
                name: seed.name.to_owned(),
                base_price: BigDecimal::from(seed.base_price),
                features: serde_json::Value::Object(features),
            };

            let room_type: RoomType = diesel::insert_into(room_types::table)
                .values(&row)
                .on_conflict(room_types::name)
                .do_update()
                .set(&row)
                .returning(RoomType::as_returning())
                .get_result(conn)?;

            for (floor, _, capacity) in SEED_FLOORS.iter().filter(|(_, t, _)| *t == seed.name) {
                let new_rooms: Vec<NewRoom> = (1..=ROOMS_PER_FLOOR)
                    .map(|n| NewRoom {
                        room_number: format!("{}01{}", floor, n),
                        floor: *floor,
                        price: room_type.base_price.clone(),
                        capacity: *capacity,
                        available: true,
                        room_type_id: room_type.id,
                    })
                    .collect();

                inserted += diesel::insert_into(rooms::table)
                    .values(&new_rooms)
                    .on_conflict((rooms::floor, rooms::room_number))
                    .do_nothing()
                    .execute(conn)?;
            }
        }

        log::info!("catalog seeded, {} new rooms", inserted);
        Ok(inserted)
    })
}
