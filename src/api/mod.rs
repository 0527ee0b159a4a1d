pub mod aiforged;
pub mod health;
pub mod params;

use actix_web::web;

pub use aiforged::ControllerOptions;

use crate::utils::ApiError;

/// Registers every route of the service. The caller supplies `web::Data<Context>`.
pub fn configure(options: ControllerOptions) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg| {
        cfg.app_data(web::Data::new(options))
            // Unreadable JSON bodies answer with the same envelope as handler errors
            .app_data(
                web::JsonConfig::default()
                    .error_handler(|err, _req| ApiError::validation(err.to_string()).into()),
            )
            .route("/health", web::get().to(health::health_check))
            .service(
                web::scope(aiforged::ROUTE_PREFIX)
                    .route("/GetCurrentUser", web::get().to(aiforged::get_current_user))
                    .route("/Incoming", web::post().to(aiforged::incoming))
                    .route("/GetDocuments", web::get().to(aiforged::get_documents))
                    .route("/Upload", web::post().to(aiforged::upload))
                    .route("/Process", web::post().to(aiforged::process))
                    .route("/SetDocStatus", web::put().to(aiforged::set_doc_status))
                    .route("/DeleteDoc", web::delete().to(aiforged::delete_doc))
                    .route("/Extract", web::get().to(aiforged::extract)),
            );
    }
}
