use actix_web::{http::header::ContentType, web, HttpResponse, Responder};

use crate::types::{AppState, HealthStatus};

mod shortened_url;

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html>
  <head><title>URL Shortener</title></head>
  <body style="font-family: Arial, sans-serif; padding: 20px;">
    <h2>URL Shortener</h2>
    <form id="shorten" method="POST" action="/api/shorten">
      <input name="url" id="url" placeholder="https://example.com" style="width: 400px" required />
      <input name="customAlias" id="customAlias" placeholder="custom alias (optional)" />
      <button type="submit">Shorten</button>
    </form>
    <p id="result"></p>
    <script>
      document.getElementById('shorten').addEventListener('submit', async (e) => {
        e.preventDefault();
        const body = { url: document.getElementById('url').value };
        const alias = document.getElementById('customAlias').value;
        if (alias) body.customAlias = alias;
        const res = await fetch('/api/shorten', {
          method: 'POST',
          headers: { 'Content-Type': 'application/json' },
          body: JSON.stringify(body)
        });
        const data = await res.json();
        const result = document.getElementById('result');
        if (res.ok) {
          result.textContent = 'Short URL: ';
          const link = document.createElement('a');
          link.href = data.shortUrl;
          link.textContent = data.shortUrl;
          result.appendChild(link);
        } else {
          result.textContent = 'Error: ' + (data.message || 'unknown');
        }
      });
    </script>
  </body>
</html>
"#;

// Handler function for the root route "/"
async fn index() -> impl Responder {
    HttpResponse::Ok()
        .content_type(ContentType::html())
        .body(INDEX_HTML)
}

// Handler function for the health check endpoint
async fn health_check(data: web::Data<AppState>) -> impl Responder {
    let uptime = data.start_time.elapsed().as_secs();
    let db_health = data.db.health_check().await;

    let status = HealthStatus {
        status: String::from("OK"),
        version: data.version.clone(),
        db_health: Some(db_health),
        uptime_seconds: uptime,
    };

    HttpResponse::Ok().json(status)
}

// Configure all routes function
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(index));
    cfg.route("/health", web::get().to(health_check));
    shortened_url::configure_routes(cfg);
}
