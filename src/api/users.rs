use actix_web::{web, HttpResponse};
use mongodb::bson::{doc, Bson, Document};
use serde_json::Value;

use super::{body_to_object, store_failure};
use crate::database::DocumentStore;
use crate::models::{Collection, ErrorResponse, InsertAck, StudentCheck, UpdateAck};

const STUDENT_ROLE: &str = "student";

fn is_student(user: Option<&Document>) -> bool {
    user.and_then(|u| u.get_str("roles").ok()) == Some(STUDENT_ROLE)
}

#[utoipa::path(
    post,
    path = "/users",
    tag = "Users",
    request_body = Value,
    responses(
        (status = 200, description = "User inserted", body = InsertAck),
        (status = 500, description = "Store failure", body = ErrorResponse)
    )
)]
pub async fn add_user(db: web::Data<dyn DocumentStore>, body: web::Json<Value>) -> HttpResponse {
    const FAILURE: &str = "Failed to add user.";

    let user = match body_to_object(body.into_inner()) {
        Ok(user) => user,
        Err(e) => return store_failure(FAILURE, e),
    };
    log::info!("👤 POST /users - {}", user.get_str("email").unwrap_or("<no email>"));

    match db.insert_one(Collection::Users, user).await {
        Ok(ack) => HttpResponse::Ok().json(ack),
        Err(e) => store_failure(FAILURE, e),
    }
}

/// Replaces the given fields on the user with the body's email, creating
/// the user when none exists.
#[utoipa::path(
    put,
    path = "/users",
    tag = "Users",
    request_body = Value,
    responses(
        (status = 200, description = "User updated or created", body = UpdateAck),
        (status = 500, description = "Store failure", body = ErrorResponse)
    )
)]
pub async fn upsert_user(db: web::Data<dyn DocumentStore>, body: web::Json<Value>) -> HttpResponse {
    const FAILURE: &str = "Failed to upsert user.";

    let user = match body_to_object(body.into_inner()) {
        Ok(user) => user,
        Err(e) => return store_failure(FAILURE, e),
    };
    let email = user.get("email").cloned().unwrap_or(Bson::Null);
    log::info!("👤 PUT /users - {}", email);

    match db
        .update_one(Collection::Users, doc! { "email": email }, user, true)
        .await
    {
        Ok(ack) => {
            if ack.upserted_count > 0 {
                log::info!("✅ User created");
            }
            HttpResponse::Ok().json(ack)
        }
        Err(e) => store_failure(FAILURE, e),
    }
}

#[utoipa::path(
    get,
    path = "/users/{email}",
    tag = "Users",
    params(
        ("email" = String, Path, description = "User email")
    ),
    responses(
        (status = 200, description = "Student role check", body = StudentCheck),
        (status = 500, description = "Store failure", body = ErrorResponse)
    )
)]
pub async fn check_student(
    db: web::Data<dyn DocumentStore>,
    email: web::Path<String>,
) -> HttpResponse {
    let email = email.into_inner();
    log::info!("🔍 GET /users/{}", email);

    match db.find_one(Collection::Users, doc! { "email": &email }).await {
        Ok(user) => HttpResponse::Ok().json(StudentCheck {
            student: is_student(user.as_ref()),
        }),
        Err(e) => store_failure("Failed to check user role.", e),
    }
}
