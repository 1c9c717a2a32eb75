use actix_multipart::{Multipart, MultipartError};
use actix_web::{web, HttpResponse};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use futures::stream::TryStreamExt;
use mongodb::bson::{doc, spec::BinarySubtype, Binary, Document};
use serde_json::Value;

use super::{body_to_object, id_filter, store_failure};
use crate::database::DocumentStore;
use crate::models::{
    document_to_json, documents_to_json, Collection, DeleteAck, ErrorResponse, InsertAck,
    UpdateAck,
};
use crate::utils::StoreError;

const IMAGE_FIELD: &str = "image";
const NO_IMAGE: &str = "No image uploaded.";
const MALFORMED_UPLOAD: &str = "Malformed upload.";

/// Multipart form accepted by `POST /doctors`. Only used for the API docs.
#[allow(dead_code)]
#[derive(utoipa::ToSchema)]
pub struct DoctorUpload {
    #[schema(value_type = String, format = Binary)]
    pub image: Vec<u8>,
    pub email: Option<String>,
    pub approved: Option<String>,
}

/// Stores `approved` as the string the clients filter on, whichever form arrived.
fn normalize_approved(document: &mut Document) {
    if let Ok(flag) = document.get_bool("approved") {
        document.insert("approved", flag.to_string());
    }
}

async fn list_by(db: &dyn DocumentStore, filter: Document, failure: &str) -> HttpResponse {
    match db.find(Collection::Doctors, filter).await {
        Ok(doctors) => {
            log::debug!("🩺 {} doctor(s) returned", doctors.len());
            HttpResponse::Ok().json(documents_to_json(doctors))
        }
        Err(e) => store_failure(failure, e),
    }
}

#[utoipa::path(
    get,
    path = "/doctors",
    tag = "Doctors",
    responses(
        (status = 200, description = "Every doctor document"),
        (status = 500, description = "Store failure", body = ErrorResponse)
    )
)]
pub async fn list_doctors(db: web::Data<dyn DocumentStore>) -> HttpResponse {
    list_by(db.get_ref(), doc! {}, "Failed to fetch doctors.").await
}

#[utoipa::path(
    get,
    path = "/approvedDoctors",
    tag = "Doctors",
    responses(
        (status = 200, description = "Doctors with approved = \"true\""),
        (status = 500, description = "Store failure", body = ErrorResponse)
    )
)]
pub async fn approved_doctors(db: web::Data<dyn DocumentStore>) -> HttpResponse {
    list_by(db.get_ref(), doc! { "approved": "true" }, "Failed to fetch approved doctors.").await
}

#[utoipa::path(
    get,
    path = "/pendingDoctors",
    tag = "Doctors",
    responses(
        (status = 200, description = "Doctors with approved = \"false\""),
        (status = 500, description = "Store failure", body = ErrorResponse)
    )
)]
pub async fn pending_doctors(db: web::Data<dyn DocumentStore>) -> HttpResponse {
    list_by(db.get_ref(), doc! { "approved": "false" }, "Failed to fetch pending doctors.").await
}

#[utoipa::path(
    get,
    path = "/doctors/{email}",
    tag = "Doctors",
    params(
        ("email" = String, Path, description = "Doctor email")
    ),
    responses(
        (status = 200, description = "First doctor with this email, or null"),
        (status = 500, description = "Store failure", body = ErrorResponse)
    )
)]
pub async fn get_doctor_by_email(
    db: web::Data<dyn DocumentStore>,
    email: web::Path<String>,
) -> HttpResponse {
    let email = email.into_inner();
    log::info!("🔍 GET /doctors/{}", email);

    match db.find_one(Collection::Doctors, doc! { "email": &email }).await {
        Ok(doctor) => HttpResponse::Ok().json(doctor.map(document_to_json)),
        Err(e) => store_failure("Failed to fetch doctor.", e),
    }
}

/// Reads the form: text parts become fields, the `image` file part is kept
/// as raw bytes. Other file parts are dropped.
async fn read_doctor_form(
    mut payload: Multipart,
) -> Result<(Document, Option<Vec<u8>>), MultipartError> {
    let mut fields = Document::new();
    let mut image = None;

    while let Some(mut field) = payload.try_next().await? {
        let (name, is_file) = match field.content_disposition() {
            Some(disposition) => (
                disposition.get_name().unwrap_or_default().to_string(),
                disposition.get_filename().is_some(),
            ),
            None => (String::new(), false),
        };

        let mut data = Vec::new();
        while let Some(chunk) = field.try_next().await? {
            data.extend_from_slice(&chunk);
        }

        if is_file {
            if name == IMAGE_FIELD {
                image = Some(data);
            }
        } else if !name.is_empty() {
            fields.insert(name, String::from_utf8_lossy(&data).into_owned());
        }
    }

    Ok((fields, image))
}

fn embed_image(doctor: &mut Document, raw: &[u8]) -> Result<(), StoreError> {
    let encoded = STANDARD.encode(raw);
    let bytes = STANDARD
        .decode(encoded)
        .map_err(|e| StoreError::InvalidDocument(format!("image: {}", e)))?;

    doctor.insert(
        IMAGE_FIELD,
        Binary {
            subtype: BinarySubtype::Generic,
            bytes,
        },
    );
    Ok(())
}

fn bad_upload(message: &str) -> HttpResponse {
    HttpResponse::BadRequest().json(ErrorResponse {
        error: message.to_string(),
    })
}

/// A request that is not multipart carries no image; a multipart body that
/// breaks mid-read is reported as corrupt.
fn unreadable_form(err: &MultipartError) -> HttpResponse {
    match err {
        MultipartError::ContentTypeMissing
        | MultipartError::ContentTypeParse
        | MultipartError::ContentTypeIncompatible => bad_upload(NO_IMAGE),
        _ => bad_upload(MALFORMED_UPLOAD),
    }
}

#[utoipa::path(
    post,
    path = "/doctors",
    tag = "Doctors",
    request_body(content = DoctorUpload, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Doctor inserted", body = InsertAck),
        (status = 400, description = "No image uploaded, or corrupt form", body = ErrorResponse),
        (status = 500, description = "Store failure", body = ErrorResponse)
    )
)]
pub async fn add_doctor(db: web::Data<dyn DocumentStore>, payload: Multipart) -> HttpResponse {
    let (mut doctor, image) = match read_doctor_form(payload).await {
        Ok(form) => form,
        Err(e) => {
            log::warn!("⚠️  POST /doctors - unreadable form: {}", e);
            return unreadable_form(&e);
        }
    };

    let Some(raw) = image else {
        log::warn!("⚠️  POST /doctors - no image uploaded");
        return bad_upload(NO_IMAGE);
    };

    log::info!(
        "📝 POST /doctors - {} field(s), image {} bytes",
        doctor.len(),
        raw.len()
    );

    if let Err(e) = embed_image(&mut doctor, &raw) {
        return store_failure("Failed to add doctor.", e);
    }
    normalize_approved(&mut doctor);

    match db.insert_one(Collection::Doctors, doctor).await {
        Ok(ack) => {
            log::info!("✅ Doctor added: {}", ack.inserted_id);
            HttpResponse::Ok().json(ack)
        }
        Err(e) => store_failure("Failed to add doctor.", e),
    }
}

#[utoipa::path(
    put,
    path = "/doctors/{id}",
    tag = "Doctors",
    params(
        ("id" = String, Path, description = "Doctor identifier")
    ),
    request_body = Value,
    responses(
        (status = 200, description = "Fields replaced", body = UpdateAck),
        (status = 500, description = "Store failure", body = ErrorResponse)
    )
)]
pub async fn update_doctor(
    db: web::Data<dyn DocumentStore>,
    id: web::Path<String>,
    body: web::Json<Value>,
) -> HttpResponse {
    const FAILURE: &str = "Failed to update doctor.";
    log::info!("🔧 PUT /doctors/{}", id);

    let filter = match id_filter(&id) {
        Ok(filter) => filter,
        Err(e) => return store_failure(FAILURE, e),
    };
    let mut changes = match body_to_object(body.into_inner()) {
        Ok(changes) => changes,
        Err(e) => return store_failure(FAILURE, e),
    };
    normalize_approved(&mut changes);

    match db.update_one(Collection::Doctors, filter, changes, false).await {
        Ok(ack) => HttpResponse::Ok().json(ack),
        Err(e) => store_failure(FAILURE, e),
    }
}

#[utoipa::path(
    delete,
    path = "/doctors/{id}",
    tag = "Doctors",
    params(
        ("id" = String, Path, description = "Doctor identifier")
    ),
    responses(
        (status = 200, description = "Deletion acknowledged, maybe of nothing", body = DeleteAck),
        (status = 500, description = "Store failure", body = ErrorResponse)
    )
)]
pub async fn delete_doctor(
    db: web::Data<dyn DocumentStore>,
    id: web::Path<String>,
) -> HttpResponse {
    const FAILURE: &str = "Failed to delete doctor.";
    log::info!("🗑️  DELETE /doctors/{}", id);

    let filter = match id_filter(&id) {
        Ok(filter) => filter,
        Err(e) => return store_failure(FAILURE, e),
    };

    match db.delete_one(Collection::Doctors, filter).await {
        Ok(ack) => HttpResponse::Ok().json(ack),
        Err(e) => store_failure(FAILURE, e),
    }
}

#[utoipa::path(
    put,
    path = "/approve/{id}",
    tag = "Doctors",
    params(
        ("id" = String, Path, description = "Doctor identifier")
    ),
    responses(
        (status = 200, description = "approved set to \"true\"", body = UpdateAck),
        (status = 500, description = "Store failure", body = ErrorResponse)
    )
)]
pub async fn approve_doctor(
    db: web::Data<dyn DocumentStore>,
    id: web::Path<String>,
) -> HttpResponse {
    const FAILURE: &str = "Failed to approve doctor.";
    log::info!("✅ PUT /approve/{}", id);

    let filter = match id_filter(&id) {
        Ok(filter) => filter,
        Err(e) => return store_failure(FAILURE, e),
    };

    match db
        .update_one(Collection::Doctors, filter, doc! { "approved": "true" }, false)
        .await
    {
        Ok(ack) => HttpResponse::Ok().json(ack),
        Err(e) => store_failure(FAILURE, e),
    }
}
