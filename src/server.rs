use crate::error::ProbeError;
use crate::monitor::Monitor;
use actix_web::http::StatusCode;
use actix_web::{App, HttpResponse, HttpServer, middleware, web};
use serde::Deserialize;
use serde_json::json;

const ALLOW_HEADERS: &str = "authorization, x-client-info, apikey, content-type";
const ALLOW_METHODS: &str = "POST, OPTIONS";

#[derive(Debug, Deserialize)]
struct MonitorRequest {
    url: Option<String>,
}

/// Registers the monitoring endpoint on `/` and `/monitor-website`
pub fn configure(cfg: &mut web::ServiceConfig) {
    for path in ["/", "/monitor-website"] {
        cfg.service(
            web::resource(path)
                .route(web::post().to(monitor_website))
                .route(web::method(actix_web::http::Method::OPTIONS).to(preflight)),
        );
    }
}

/// Permissive CORS headers added to every response
pub fn cors_headers() -> middleware::DefaultHeaders {
    middleware::DefaultHeaders::new()
        .add(("Access-Control-Allow-Origin", "*"))
        .add(("Access-Control-Allow-Headers", ALLOW_HEADERS))
        .add(("Access-Control-Allow-Methods", ALLOW_METHODS))
}

/// Serves the endpoint until the process is stopped
pub async fn serve(listen: &str, monitor: Monitor) -> std::io::Result<()> {
    let monitor = web::Data::new(monitor);

    tracing::info!(listen = %listen, "Starting monitoring endpoint");

    HttpServer::new(move || {
        App::new()
            .app_data(monitor.clone())
            .wrap(cors_headers())
            .configure(configure)
    })
    .bind(listen)?
    .run()
    .await
}

async fn preflight() -> HttpResponse {
    HttpResponse::Ok().finish()
}

async fn monitor_website(monitor: web::Data<Monitor>, body: web::Bytes) -> HttpResponse {
    let request: MonitorRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => return error_response(&ProbeError::InvalidRequest(e.to_string())),
    };

    let Some(url) = request.url.filter(|u| !u.trim().is_empty()) else {
        return error_response(&ProbeError::MissingUrl);
    };

    match monitor.check(&url).await {
        Ok(result) => HttpResponse::Ok().json(result),
        Err(e) => error_response(&e),
    }
}

fn error_response(error: &ProbeError) -> HttpResponse {
    let status = if error.is_validation() {
        tracing::info!(error = %error, "Rejected monitoring request");
        StatusCode::BAD_REQUEST
    } else {
        tracing::error!(error = %error, "Monitoring request failed");
        StatusCode::INTERNAL_SERVER_ERROR
    };

    HttpResponse::build(status).json(json!({ "error": error.to_string() }))
}
