use actix_web::{web, HttpResponse};

pub mod payments;
pub mod sessions;
pub mod shared;
pub mod webhook;

pub use shared::ApiResponse;

pub async fn hello() -> HttpResponse {
    HttpResponse::Ok().json(ApiResponse::success_with_message(
        None::<()>,
        "PayLinkr API is running",
    ))
}

pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiResponse::success_with_message(None::<()>, "healthy"))
}

/// Route tree, shared by the server and the integration test harness.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(hello))
        .route("/health", web::get().to(health))
        .service(
            web::scope("/api/v1")
                .service(
                    web::scope("/sessions")
                        .route("/clock-in", web::post().to(sessions::clock_in))
                        .route("", web::get().to(sessions::get_sessions))
                        .route("/{id}", web::get().to(sessions::get_session))
                        .route("/{id}/start-break", web::post().to(sessions::start_break))
                        .route("/{id}/end-break", web::post().to(sessions::end_break))
                        .route("/{id}/clock-out", web::post().to(sessions::clock_out))
                        .route("/{id}/approve", web::post().to(sessions::approve_session))
                        .route("/{id}/reject", web::post().to(sessions::reject_session)),
                )
                .service(
                    web::scope("/payroll").route("/run", web::post().to(payments::run_payroll)),
                )
                .service(
                    web::scope("/payments")
                        .route("", web::get().to(payments::get_payments))
                        .route("/{id}", web::get().to(payments::get_payment))
                        .route("/{id}/approve", web::post().to(payments::approve_payment))
                        .route("/{id}/cancel", web::post().to(payments::cancel_payment)),
                )
                .service(
                    web::scope("/webhook")
                        .route("/provider-callback", web::post().to(webhook::provider_callback)),
                ),
        );
}
