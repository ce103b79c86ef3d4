#![allow(dead_code)]

use actix_web::dev::Server;
use actix_web::{App, HttpResponse, HttpServer, web};
use flate2::Compression;
use flate2::write::GzEncoder;
use std::io::Write;
use std::net::SocketAddr;
use std::time::Duration;

pub const OPTIMIZED_HTML: &str = include_str!("../static/optimized.html");
pub const BARE_HTML: &str = include_str!("../static/bare.html");
pub const MESSY_HTML: &str = include_str!("../static/messy.html");
pub const NOT_FOUND_HTML: &str = include_str!("../static/not-found.html");
pub const PAGESPEED_JSON: &str = include_str!("../static/pagespeed.json");

fn html(body: &'static str) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(body)
}

async fn optimized() -> HttpResponse {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(OPTIMIZED_HTML.as_bytes())
        .expect("gzip write should succeed");
    let compressed = encoder.finish().expect("gzip finish should succeed");

    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .insert_header(("Content-Encoding", "gzip"))
        .body(compressed)
}

/// Starts a fixture site on an ephemeral port and returns its base URL (no trailing slash).
///
/// `/robots.txt` answers 200 and `/sitemap.xml` answers a 301 without a `Location` header.
pub async fn get_test_server_url() -> String {
    let http_server = HttpServer::new(|| {
        App::new()
            .route("/", web::get().to(optimized))
            .route("/bare", web::get().to(|| async { html(BARE_HTML) }))
            .route("/messy", web::get().to(|| async { html(MESSY_HTML) }))
            .route(
                "/not-found",
                web::get().to(|| async {
                    HttpResponse::NotFound()
                        .content_type("text/html")
                        .body(NOT_FOUND_HTML)
                }),
            )
            .route(
                "/unavailable",
                web::get().to(|| async {
                    HttpResponse::ServiceUnavailable().body("Service Unavailable")
                }),
            )
            .route(
                "/slow",
                web::get().to(|| async {
                    tokio::time::sleep(Duration::from_secs(3)).await;
                    html(BARE_HTML)
                }),
            )
            .service(
                web::resource("/robots.txt")
                    .to(|| async { HttpResponse::Ok().body("User-agent: *\nDisallow:\n") }),
            )
            .service(
                web::resource("/sitemap.xml")
                    .to(|| async { HttpResponse::MovedPermanently().finish() }),
            )
            .route(
                "/pagespeed",
                web::get().to(|| async {
                    HttpResponse::Ok()
                        .content_type("application/json")
                        .body(PAGESPEED_JSON)
                }),
            )
            .route(
                "/pagespeed-error",
                web::get().to(|| async {
                    HttpResponse::BadRequest().body(r#"{"error":{"code":400}}"#)
                }),
            )
    })
    .workers(2)
    .bind(("127.0.0.1", 0))
    .expect("Failed to bind test server");

    spawn_server(http_server.addrs().first(), http_server.run())
}

/// A site serving only `/`, so both `/robots.txt` and `/sitemap.xml` answer 404
pub async fn get_bare_site_url() -> String {
    let http_server =
        HttpServer::new(|| App::new().route("/", web::get().to(|| async { html(BARE_HTML) })))
            .workers(1)
            .bind(("127.0.0.1", 0))
            .expect("Failed to bind test server");

    spawn_server(http_server.addrs().first(), http_server.run())
}

fn spawn_server(addr: Option<&SocketAddr>, server: Server) -> String {
    let addr = addr.cloned().expect("No address bound");

    tokio::spawn(async move {
        if let Err(e) = server.await {
            eprintln!("Test server error: {}", e);
        }
    });

    format!("http://{}", addr)
}

/// A local URL nothing listens on
pub fn unreachable_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("Failed to bind probe port");
    let addr = listener.local_addr().expect("No local address");
    drop(listener);
    format!("http://{}/", addr)
}
