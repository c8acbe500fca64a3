use std::time::Instant;

use actix_cors::Cors;
use actix_web::{
    body::MessageBody,
    dev::{RequestHead, Service, ServiceFactory, ServiceRequest, ServiceResponse},
    error::{JsonPayloadError, UrlencodedError},
    http::{
        header::{HeaderName, HeaderValue, CONTENT_TYPE, HOST},
        Method,
    },
    middleware::Logger,
    web, App, HttpRequest, HttpServer,
};
use env_logger::Env;
use log::{debug, info};
use url::Url;
use uuid::Uuid;

use crate::{
    config::{Config, Environment},
    db::Database,
    errors::AppError,
    routes, services,
    types::AppState,
};

// Custom result type for the application
pub type AppResult<T> = Result<T, AppError>;

const REQUEST_ID_HEADER: &str = "x-request-id";

// Setup logging with custom format and configuration
fn setup_logging(config: &Config) -> Result<(), AppError> {
    let log_level = match config.app.environment {
        Environment::Development => config.app.log_level.clone(),
        Environment::Testing => "debug,actix_web=info".to_string(),
        Environment::Production => "info,actix_web=warn".to_string(),
    };

    let env = Env::default()
        .filter_or("RUST_LOG", log_level)
        .write_style_or("RUST_LOG_STYLE", "always");

    env_logger::try_init_from_env(env)
        .map_err(|e| AppError::Logger(format!("Failed to initialize logger: {}", e)))
}

// Browsers may read API responses only from the service's own origin and the
// configured ones (`PUBLIC_BASE_URL`, `CORS_ALLOWED_ORIGIN`)
fn cors(config: &Config) -> Cors {
    let mut cors = Cors::default()
        .allowed_origin_fn(is_same_origin)
        .allowed_methods(vec![Method::GET, Method::POST])
        .allowed_header(CONTENT_TYPE)
        .max_age(3600);

    if let Some(base) = &config.server.public_base_url {
        cors = cors.allowed_origin(&base.origin().ascii_serialization());
    }

    match &config.server.cors_allowed_origin {
        Some(origin) => cors.allowed_origin(origin),
        None => cors,
    }
}

// An `Origin` whose authority equals the request's `Host`
fn is_same_origin(origin: &HeaderValue, req: &RequestHead) -> bool {
    let host = req.headers().get(HOST).and_then(|h| h.to_str().ok());
    let origin = origin.to_str().ok().and_then(|o| Url::parse(o).ok());

    match (host, origin) {
        (Some(host), Some(origin)) => origin.host_str().is_some_and(|name| {
            let authority = match origin.port() {
                Some(port) => format!("{}:{}", name, port),
                None => name.to_string(),
            };
            authority.eq_ignore_ascii_case(host)
        }),
        _ => false,
    }
}

fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::Validation(format!("Invalid JSON body: {}", err)).into()
}

fn form_error_handler(err: UrlencodedError, _req: &HttpRequest) -> actix_web::Error {
    AppError::Validation(format!("Invalid form body: {}", err)).into()
}

/// Builds the application: shared state, body limits, middleware and routes.
pub fn build_app(
    config: Config,
    db: Database,
    start_time: Instant,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let log_format = if config.app.environment == Environment::Production {
        "%a \"%r\" %s %b %T"
    } else {
        "%a \"%r\" %s %b %T \"%{Referer}i\" \"%{User-Agent}i\" %{x-request-id}o"
    };
    let cors = cors(&config);

    App::new()
        .app_data(web::Data::new(AppState {
            start_time,
            db: db.clone(),
            version: config.app.version.clone(),
        }))
        .app_data(web::Data::new(config))
        .app_data(web::JsonConfig::default().limit(32 * 1024).error_handler(json_error_handler))
        .app_data(web::FormConfig::default().limit(32 * 1024).error_handler(form_error_handler))
        // Fresh request ID on every response; registered first so the Logger sees it
        .wrap_fn(|req, srv| {
            let request_id = Uuid::new_v4().to_string();
            let fut = srv.call(req);
            async move {
                let mut res = fut.await?;
                if let Ok(value) = HeaderValue::from_str(&request_id) {
                    res.headers_mut()
                        .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
                }
                Ok(res)
            }
        })
        .wrap(Logger::new(log_format))
        .wrap(cors)
        .configure(|cfg| services::register(db, cfg))
        .configure(routes::configure_routes)
}

pub async fn server() -> AppResult<()> {
    let config = Config::load()?;

    setup_logging(&config)?;

    let start_time = Instant::now();

    info!("Starting {} v{}", config.app.name, config.app.version);
    info!("Environment: {:?}", config.app.environment);
    info!(
        "Binding to {}:{} with {} workers",
        config.server.host, config.server.port, config.server.workers
    );

    if config.app.environment == Environment::Development {
        debug!("Debug logging enabled");
        debug!("Full configuration: {:?}", config);
    }

    // Unreadable store files abort startup here unless recovery is configured
    let db = Database::open(&config.store).await?;
    info!("Store ready at {}", db.path().display());

    let app_config = config.clone();

    HttpServer::new(move || build_app(app_config.clone(), db.clone(), start_time))
        .workers(config.server.workers)
        .bind((config.server.host, config.server.port))?
        .run()
        .await?;

    info!("Server stopped");
    Ok(())
}
