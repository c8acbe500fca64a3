use actix_web::web;

use crate::handlers::{create_handler, redirect_handler, stats_handler};

// Configure short URL routes. The catch-all redirect must be registered last;
// codes shadowed by earlier routes are listed in `id_generator::RESERVED_CODES`.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/shorten", web::post().to(create_handler))
            .route("/stats/{code}", web::get().to(stats_handler)),
    );
    cfg.route("/{code}", web::get().to(redirect_handler));
}
