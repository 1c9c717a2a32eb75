pub mod appointments;
pub mod doctors;
pub mod health;
pub mod swagger;
pub mod users;

use actix_web::{web, HttpResponse};
use mongodb::bson::{doc, oid::ObjectId, Document};
use serde_json::Value;

use crate::models::ErrorResponse;
use crate::utils::StoreError;

/// Registers every route on the app. Shared by `main` and the handler tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(health::root))
        .route("/health", web::get().to(health::health_check))
        // Doctors
        .route("/doctors", web::get().to(doctors::list_doctors))
        .route("/doctors", web::post().to(doctors::add_doctor))
        .route("/approvedDoctors", web::get().to(doctors::approved_doctors))
        .route("/pendingDoctors", web::get().to(doctors::pending_doctors))
        .route("/doctors/{email}", web::get().to(doctors::get_doctor_by_email))
        .route("/doctors/{id}", web::put().to(doctors::update_doctor))
        .route("/doctors/{id}", web::delete().to(doctors::delete_doctor))
        .route("/approve/{id}", web::put().to(doctors::approve_doctor))
        // Appointments (a.k.a. patients)
        .route("/appointments", web::post().to(appointments::create_appointment))
        .route("/appointments", web::get().to(appointments::list_appointments))
        .route("/patients/{id}", web::get().to(appointments::get_patient))
        .route("/patients/{id}", web::delete().to(appointments::delete_patient))
        // Users
        .route("/users", web::post().to(users::add_user))
        .route("/users", web::put().to(users::upsert_user))
        .route("/users/{email}", web::get().to(users::check_student));
}

/// Logs the underlying failure and answers with the endpoint's fixed message.
pub(crate) fn store_failure(message: &str, err: StoreError) -> HttpResponse {
    log::error!("❌ {} {}", message, err);
    HttpResponse::InternalServerError().json(ErrorResponse {
        error: message.to_string(),
    })
}

pub(crate) fn id_filter(id: &str) -> Result<Document, StoreError> {
    let oid = ObjectId::parse_str(id).map_err(|_| StoreError::InvalidId(id.to_string()))?;
    Ok(doc! { "_id": oid })
}

/// BSON has no unsigned 64-bit integer; integers past `i64::MAX` are stored
/// as doubles.
fn widen_unsigned(value: Value) -> Value {
    match value {
        Value::Number(n) if n.as_i64().is_none() && n.is_u64() => {
            n.as_f64().map_or(Value::Null, Value::from)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(widen_unsigned).collect()),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, value)| (key, widen_unsigned(value)))
                .collect(),
        ),
        other => other,
    }
}

/// JSON request bodies are stored as-is; anything but an object is refused.
pub(crate) fn body_to_object(body: Value) -> Result<Document, StoreError> {
    match widen_unsigned(body) {
        Value::Object(map) => Ok(mongodb::bson::to_document(&map)?),
        other => Err(StoreError::InvalidDocument(format!(
            "expected a JSON object, got {}",
            other
        ))),
    }
}
