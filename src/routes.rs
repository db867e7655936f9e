use actix_multipart::Multipart;
use actix_web::{delete, error, get, post, put, web, HttpResponse, Responder};
use chrono::{NaiveDate, Utc};

use crate::availability::{self, AvailabilityQuery};
use crate::bookings;
use crate::catalog;
use crate::db::DbPool;
use crate::error::AppError;
use crate::forms::{self, PROOF_FIELD};
use crate::identity::{require_admin, Identity};
use crate::models::ApiResponse;
use crate::multipart::read_form;
use crate::storage::{content_type_for, BlobStore, MAX_PROOF_BYTES};
use crate::validation::is_booking_reference;

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Malformed references can never match a booking, so they are answered
/// without a database round trip.
fn checked_reference(raw: String) -> Result<String, AppError> {
    if is_booking_reference(&raw) {
        Ok(raw)
    } else {
        Err(AppError::NotFound("booking"))
    }
}

#[get("/rooms")]
async fn list_rooms(pool: web::Data<DbPool>) -> actix_web::Result<impl Responder> {
    let rooms = web::block(move || {
        let mut conn = pool.get()?;
        catalog::list_rooms(&mut conn)
    })
    .await??;

    Ok(HttpResponse::Ok().json(rooms))
}

#[get("/rooms/{id}")]
async fn show_room(pool: web::Data<DbPool>, path: web::Path<i64>) -> actix_web::Result<impl Responder> {
    let room_id = path.into_inner();

    let room = web::block(move || {
        let mut conn = pool.get()?;
        let (room, room_type) = catalog::get_room(&mut conn, room_id)?;
        catalog::room_details(&room, &room_type)
    })
    .await??;

    Ok(HttpResponse::Ok().json(room))
}

#[get("/available-rooms")]
async fn available_rooms(
    pool: web::Data<DbPool>,
    query: web::Query<AvailabilityQuery>,
) -> actix_web::Result<impl Responder> {
    let (stay, party) = query.validate()?;

    let rooms = web::block(move || {
        let mut conn = pool.get()?;
        availability::find_available_rooms(&mut conn, &stay, &party)
    })
    .await??;

    Ok(HttpResponse::Ok().json(rooms))
}

#[post("/bookings")]
async fn create_booking(
    pool: web::Data<DbPool>,
    store: web::Data<dyn BlobStore>,
    identity: Identity,
    payload: Multipart,
) -> actix_web::Result<impl Responder> {
    let form = read_form(payload, MAX_PROOF_BYTES).await?;
    let request = forms::create_request(&form, identity.user_id())?;
    let today = today();

    let view = web::block(move || {
        let mut conn = pool.get()?;
        let booking = bookings::create_booking(&mut conn, store.get_ref(), &request, form.file(PROOF_FIELD))?;
        bookings::get_booking_details(&mut conn, store.get_ref(), &booking.booking_reference, None, today)
    })
    .await??;

    Ok(HttpResponse::Created().json(view))
}

#[get("/bookings/{reference}")]
async fn show_booking(
    pool: web::Data<DbPool>,
    store: web::Data<dyn BlobStore>,
    path: web::Path<String>,
) -> actix_web::Result<impl Responder> {
    let reference = checked_reference(path.into_inner())?;
    let today = today();

    let view = web::block(move || {
        let mut conn = pool.get()?;
        bookings::get_booking_details(&mut conn, store.get_ref(), &reference, None, today)
    })
    .await??;

    Ok(HttpResponse::Ok().json(view))
}

#[get("/my/bookings")]
async fn my_bookings(pool: web::Data<DbPool>, identity: Identity) -> actix_web::Result<impl Responder> {
    let user_id = identity.require()?;
    let today = today();

    let list = web::block(move || {
        let mut conn = pool.get()?;
        bookings::list_user_bookings(&mut conn, user_id, today)
    })
    .await??;

    Ok(HttpResponse::Ok().json(list))
}

#[get("/my/bookings/{reference}")]
async fn my_booking(
    pool: web::Data<DbPool>,
    store: web::Data<dyn BlobStore>,
    identity: Identity,
    path: web::Path<String>,
) -> actix_web::Result<impl Responder> {
    let user_id = identity.require()?;
    let reference = checked_reference(path.into_inner())?;
    let today = today();

    let view = web::block(move || {
        let mut conn = pool.get()?;
        bookings::get_booking_details(&mut conn, store.get_ref(), &reference, Some(user_id), today)
    })
    .await??;

    Ok(HttpResponse::Ok().json(view))
}

#[post("/my/bookings/{reference}/cancel")]
async fn cancel_my_booking(
    pool: web::Data<DbPool>,
    store: web::Data<dyn BlobStore>,
    identity: Identity,
    path: web::Path<String>,
) -> actix_web::Result<impl Responder> {
    let user_id = identity.require()?;
    let reference = checked_reference(path.into_inner())?;
    let today = today();

    let view = web::block(move || {
        let mut conn = pool.get()?;
        bookings::cancel_booking(&mut conn, &reference, Some(user_id), today)?;
        bookings::get_booking_details(&mut conn, store.get_ref(), &reference, Some(user_id), today)
    })
    .await??;

    Ok(HttpResponse::Ok().json(view))
}

#[get("/my/dashboard")]
async fn my_dashboard(pool: web::Data<DbPool>, identity: Identity) -> actix_web::Result<impl Responder> {
    let user_id = identity.require()?;
    let today = today();

    let dashboard = web::block(move || {
        let mut conn = pool.get()?;
        bookings::user_dashboard(&mut conn, user_id, today)
    })
    .await??;

    Ok(HttpResponse::Ok().json(dashboard))
}

#[get("/admin/bookings")]
async fn admin_bookings(pool: web::Data<DbPool>, identity: Identity) -> actix_web::Result<impl Responder> {
    identity.require()?;
    let today = today();

    let list = web::block(move || {
        let mut conn = pool.get()?;
        require_admin(&mut conn, identity)?;
        bookings::list_all_bookings(&mut conn, today)
    })
    .await??;

    Ok(HttpResponse::Ok().json(list))
}

#[get("/admin/bookings/{reference}")]
async fn admin_booking(
    pool: web::Data<DbPool>,
    store: web::Data<dyn BlobStore>,
    identity: Identity,
    path: web::Path<String>,
) -> actix_web::Result<impl Responder> {
    identity.require()?;
    let reference = checked_reference(path.into_inner())?;
    let today = today();

    let view = web::block(move || {
        let mut conn = pool.get()?;
        require_admin(&mut conn, identity)?;
        bookings::get_booking_details(&mut conn, store.get_ref(), &reference, None, today)
    })
    .await??;

    Ok(HttpResponse::Ok().json(view))
}

#[put("/admin/bookings/{reference}")]
async fn admin_update_booking(
    pool: web::Data<DbPool>,
    store: web::Data<dyn BlobStore>,
    identity: Identity,
    path: web::Path<String>,
    payload: Multipart,
) -> actix_web::Result<impl Responder> {
    identity.require()?;
    let reference = checked_reference(path.into_inner())?;
    let form = read_form(payload, MAX_PROOF_BYTES).await?;
    let patch = forms::booking_patch(&form)?;
    let today = today();

    let view = web::block(move || {
        let mut conn = pool.get()?;
        let admin = require_admin(&mut conn, identity)?;
        bookings::update_booking(&mut conn, store.get_ref(), &reference, &patch, form.file(PROOF_FIELD))?;
        log::info!("booking {} edited by administrator {}", reference, admin.id);
        bookings::get_booking_details(&mut conn, store.get_ref(), &reference, None, today)
    })
    .await??;

    Ok(HttpResponse::Ok().json(view))
}

#[delete("/admin/bookings/{reference}")]
async fn admin_delete_booking(
    pool: web::Data<DbPool>,
    store: web::Data<dyn BlobStore>,
    identity: Identity,
    path: web::Path<String>,
) -> actix_web::Result<impl Responder> {
    identity.require()?;
    let reference = checked_reference(path.into_inner())?;

    let deleted = web::block(move || {
        let mut conn = pool.get()?;
        require_admin(&mut conn, identity)?;
        bookings::delete_booking(&mut conn, store.get_ref(), &reference)
    })
    .await??;

    Ok(HttpResponse::Ok().json(ApiResponse {
        message: format!("Booking {} deleted successfully", deleted.booking_reference),
    }))
}

#[get("/storage/{path:.*}")]
async fn stored_file(
    store: web::Data<dyn BlobStore>,
    path: web::Path<String>,
) -> actix_web::Result<impl Responder> {
    let path = path.into_inner();
    let content_type = content_type_for(&path);

    let bytes = web::block(move || store.read(&path)).await??;

    Ok(HttpResponse::Ok().content_type(content_type).body(bytes))
}

/// Register every route plus the extractor configuration they rely on.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::QueryConfig::default().error_handler(|err, _req| {
        let response = HttpResponse::UnprocessableEntity().json(ApiResponse {
            message: err.to_string(),
        });
        error::InternalError::from_response(err, response).into()
    }))
    .service(list_rooms)
    .service(show_room)
    .service(available_rooms)
    .service(create_booking)
    .service(show_booking)
    .service(my_bookings)
    .service(my_booking)
    .service(cancel_my_booking)
    .service(my_dashboard)
    .service(admin_bookings)
    .service(admin_booking)
    .service(admin_update_booking)
    .service(admin_delete_booking)
    .service(stored_file);
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use actix_web::{http::StatusCode, test, App};
    use diesel::r2d2::{ConnectionManager, Pool};

    use super::*;
    use crate::storage::LocalDiskStore;

    const BOUNDARY: &str = "----innkeeper-test";

    // never connects; every request exercised here fails before needing it
    fn idle_pool() -> DbPool {
        let manager = ConnectionManager::new("postgres://localhost:1/unreachable");
        Pool::builder()
            .min_idle(Some(0))
            .connection_timeout(Duration::from_millis(200))
            .build_unchecked(manager)
    }

    fn multipart_body(fields: &[(&str, &str)]) -> String {
        let mut body = String::new();
        for (name, value) in fields {
            body.push_str(&format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            ));
        }
        body.push_str(&format!("--{BOUNDARY}--\r\n"));
        body
    }

    macro_rules! app {
        ($dir:expr) => {{
            let store: Arc<dyn BlobStore> = Arc::new(LocalDiskStore::new($dir, "http://localhost:8080"));
            test::init_service(
                App::new()
                    .app_data(web::Data::new(idle_pool()))
                    .app_data(web::Data::from(store))
                    .configure(configure),
            )
            .await
        }};
    }

    #[actix_web::test]
    async fn inverted_dates_are_unprocessable() {
        let dir = tempfile::tempdir().unwrap();
        let app = app!(dir.path());
        let req = test::TestRequest::get()
            .uri("/available-rooms?check_in=2025-06-03&check_out=2025-06-01&adults=2")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert!(body["errors"]["checkOut"].is_array());
    }

    #[actix_web::test]
    async fn malformed_query_is_unprocessable() {
        let dir = tempfile::tempdir().unwrap();
        let app = app!(dir.path());
        let req = test::TestRequest::get()
            .uri("/available-rooms?check_in=soon&adults=2")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[actix_web::test]
    async fn booking_without_proof_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let app = app!(dir.path());
        let body = multipart_body(&[
            ("checkIn", "2025-06-01"),
            ("checkOut", "2025-06-03"),
            ("adults", "2"),
            ("roomId", "1"),
            ("paymentMethod", "gcash"),
            ("guestInfo[fullName]", "Maria Santos"),
            ("guestInfo[email]", "maria@example.com"),
            ("guestInfo[phone]", "09171234567"),
            ("guestInfo[address]", "Manila"),
        ]);
        let req = test::TestRequest::post()
            .uri("/bookings")
            .insert_header((
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            ))
            .set_payload(body)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert!(body["errors"]["paymentProof"].is_array());
        assert!(body["errors"].get("checkOut").is_none());
    }

    #[actix_web::test]
    async fn malformed_reference_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let app = app!(dir.path());
        let req = test::TestRequest::get().uri("/bookings/abc").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn personal_and_admin_routes_need_identity() {
        let dir = tempfile::tempdir().unwrap();
        let app = app!(dir.path());
        for req in [
            test::TestRequest::get().uri("/admin/bookings").to_request(),
            test::TestRequest::delete().uri("/admin/bookings/ABCD1234").to_request(),
            test::TestRequest::get().uri("/my/bookings").to_request(),
            test::TestRequest::get().uri("/my/dashboard").to_request(),
            test::TestRequest::post().uri("/my/bookings/ABCD1234/cancel").to_request(),
        ] {
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        }
    }

    #[actix_web::test]
    async fn serves_stored_proofs() {
        let dir = tempfile::tempdir().unwrap();
        let disk = LocalDiskStore::new(dir.path(), "http://localhost:8080");
        let path = disk.put("bookings/payment_proofs", "scan.pdf", b"%PDF-1.4").unwrap();
        let app = app!(dir.path());

        let req = test::TestRequest::get().uri(&format!("/storage/{path}")).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get("content-type").unwrap(),
            "application/pdf"
        );
        assert_eq!(test::read_body(resp).await.as_ref(), b"%PDF-1.4");

        let req = test::TestRequest::get()
            .uri("/storage/bookings/payment_proofs/missing.png")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
