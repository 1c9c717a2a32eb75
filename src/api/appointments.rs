use actix_web::{web, HttpResponse};
use mongodb::bson::doc;
use serde_json::Value;

use super::{body_to_object, id_filter, store_failure};
use crate::database::DocumentStore;
use crate::models::{
    document_to_json, documents_to_json, Collection, DeleteAck, ErrorResponse, InsertAck,
};

// Appointments double as "patients": both route families hit the same collection.

#[utoipa::path(
    post,
    path = "/appointments",
    tag = "Appointments",
    request_body = Value,
    responses(
        (status = 200, description = "Appointment inserted", body = InsertAck),
        (status = 500, description = "Store failure", body = ErrorResponse)
    )
)]
pub async fn create_appointment(
    db: web::Data<dyn DocumentStore>,
    body: web::Json<Value>,
) -> HttpResponse {
    const FAILURE: &str = "Failed to create appointment.";

    let appointment = match body_to_object(body.into_inner()) {
        Ok(appointment) => appointment,
        Err(e) => return store_failure(FAILURE, e),
    };
    log::info!("📅 POST /appointments - {} field(s)", appointment.len());

    match db.insert_one(Collection::Appointments, appointment).await {
        Ok(ack) => HttpResponse::Ok().json(ack),
        Err(e) => store_failure(FAILURE, e),
    }
}

#[utoipa::path(
    get,
    path = "/appointments",
    tag = "Appointments",
    responses(
        (status = 200, description = "Every appointment document"),
        (status = 500, description = "Store failure", body = ErrorResponse)
    )
)]
pub async fn list_appointments(db: web::Data<dyn DocumentStore>) -> HttpResponse {
    match db.find(Collection::Appointments, doc! {}).await {
        Ok(appointments) => HttpResponse::Ok().json(documents_to_json(appointments)),
        Err(e) => store_failure("Failed to fetch appointments.", e),
    }
}

#[utoipa::path(
    get,
    path = "/patients/{id}",
    tag = "Appointments",
    params(
        ("id" = String, Path, description = "Appointment identifier")
    ),
    responses(
        (status = 200, description = "The appointment, or null"),
        (status = 500, description = "Store failure", body = ErrorResponse)
    )
)]
pub async fn get_patient(
    db: web::Data<dyn DocumentStore>,
    id: web::Path<String>,
) -> HttpResponse {
    const FAILURE: &str = "Failed to fetch patient.";
    log::info!("🔍 GET /patients/{}", id);

    let filter = match id_filter(&id) {
        Ok(filter) => filter,
        Err(e) => return store_failure(FAILURE, e),
    };

    match db.find_one(Collection::Appointments, filter).await {
        Ok(patient) => HttpResponse::Ok().json(patient.map(document_to_json)),
        Err(e) => store_failure(FAILURE, e),
    }
}

#[utoipa::path(
    delete,
    path = "/patients/{id}",
    tag = "Appointments",
    params(
        ("id" = String, Path, description = "Appointment identifier")
    ),
    responses(
        (status = 200, description = "Deletion acknowledged", body = DeleteAck),
        (status = 500, description = "Store failure", body = ErrorResponse)
    )
)]
pub async fn delete_patient(
    db: web::Data<dyn DocumentStore>,
    id: web::Path<String>,
) -> HttpResponse {
    const FAILURE: &str = "Failed to delete patient.";
    log::info!("🗑️  DELETE /patients/{}", id);

    let filter = match id_filter(&id) {
        Ok(filter) => filter,
        Err(e) => return store_failure(FAILURE, e),
    };

    match db.delete_one(Collection::Appointments, filter).await {
        Ok(ack) => HttpResponse::Ok().json(ack),
        Err(e) => store_failure(FAILURE, e),
    }
}
