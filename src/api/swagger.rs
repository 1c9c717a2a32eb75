use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "SmartCare Gateway API",
        version = "1.0.0",
        description = "CRUD gateway over the clinic-booking collections.\n\n\
            **Collections:**\n\
            - doctors (approval flag stored as the string \"true\"/\"false\")\n\
            - Appointments (also addressed as patients)\n\
            - users (upserted by email)\n\n\
            Every failure answers `{\"error\": \"...\"}`."
    ),
    paths(
        // Health
        crate::api::health::root,
        crate::api::health::health_check,

        // Doctors
        crate::api::doctors::list_doctors,
        crate::api::doctors::approved_doctors,
        crate::api::doctors::pending_doctors,
        crate::api::doctors::get_doctor_by_email,
        crate::api::doctors::add_doctor,
        crate::api::doctors::update_doctor,
        crate::api::doctors::delete_doctor,
        crate::api::doctors::approve_doctor,

        // Appointments
        crate::api::appointments::create_appointment,
        crate::api::appointments::list_appointments,
        crate::api::appointments::get_patient,
        crate::api::appointments::delete_patient,

        // Users
        crate::api::users::add_user,
        crate::api::users::upsert_user,
        crate::api::users::check_student,
    ),
    components(
        schemas(
            crate::api::health::HealthResponse,
            crate::api::doctors::DoctorUpload,
            crate::models::InsertAck,
            crate::models::UpdateAck,
            crate::models::DeleteAck,
            crate::models::StudentCheck,
            crate::models::ErrorResponse,
        )
    ),
    tags(
        (name = "Health", description = "Root greeting and service health."),
        (name = "Doctors", description = "Doctor profiles, approval workflow and image upload."),
        (name = "Appointments", description = "Appointment documents, also served as patients."),
        (name = "Users", description = "User accounts and the student role check."),
    )
)]
pub struct ApiDoc;
