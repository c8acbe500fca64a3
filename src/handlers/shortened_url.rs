use actix_web::{http::header::LOCATION, web, Either, HttpRequest, HttpResponse, Responder};
use log::{debug, info};

use crate::{
    config::Config,
    models::{CreateShortenedUrlDto, ShortenedUrlResponseDto, ShortenedUrlStatsDto},
    repositories::ShortenedUrlRepository,
    services::{ShortenedUrlService, ShortenedUrlServiceTrait},
    types::Result,
};

pub type ShortenedUrlServiceType = ShortenedUrlService<ShortenedUrlRepository>;

/// Create payloads arrive as JSON from the API or as a plain HTML form post
pub type CreatePayload = Either<web::Json<CreateShortenedUrlDto>, web::Form<CreateShortenedUrlDto>>;

/// Builds the public short URL for `code`
fn short_url_for(req: &HttpRequest, config: &Config, code: &str) -> String {
    let base = match &config.server.public_base_url {
        Some(url) => url.as_str().trim_end_matches('/').to_string(),
        None => {
            let info = req.connection_info();
            format!("{}://{}", info.scheme(), info.host())
        }
    };
    format!("{}/{}", base, code)
}

/// Create shortened URL route handler
pub async fn create_handler(
    req: HttpRequest,
    payload: CreatePayload,
    service: web::Data<ShortenedUrlServiceType>,
    config: web::Data<Config>,
) -> Result<impl Responder> {
    let dto = match payload {
        Either::Left(json) => json.into_inner(),
        Either::Right(form) => form.into_inner(),
    };

    let created = service.create(dto).await?;
    Ok(HttpResponse::Ok().json(ShortenedUrlResponseDto {
        short_url: short_url_for(&req, &config, &created.code),
    }))
}

/// Redirect route handler
pub async fn redirect_handler(
    path: web::Path<String>,
    service: web::Data<ShortenedUrlServiceType>,
) -> Result<impl Responder> {
    let code = path.into_inner();
    debug!("Redirect requested for code: {}", code);

    let entry = service.resolve(&code).await?;

    info!("Redirecting '{}' to '{}'", code, entry.url);
    Ok(HttpResponse::Found()
        .insert_header((LOCATION, entry.url))
        .finish())
}

/// Stats route handler
pub async fn stats_handler(
    path: web::Path<String>,
    service: web::Data<ShortenedUrlServiceType>,
) -> Result<impl Responder> {
    let code = path.into_inner();
    let entry = service.stats(&code).await?;
    Ok(HttpResponse::Ok().json(ShortenedUrlStatsDto { code, entry }))
}
