mod api;
mod blob;
mod config;
mod display;
mod error;
mod logging;
mod render;
mod request;

use crate::api::QrClient;
use crate::config::Config;
use crate::error::RequestError;
use crate::render::QrRenderer;
use crate::request::QrRequest;
use axum::extract::State;
use axum::{
    extract::Form,
    http::{header, StatusCode, Uri},
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    routing::post,
    Json, Router,
};
use clap::{value_parser, Arg, ArgAction, ArgMatches};
use lazy_static::lazy_static;
use serde::Deserialize;
use std::process::exit;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};

const ELEMENT_ID: &str = "qrCode";

lazy_static! {
    static ref INDEX_HTML: &'static str = include_str!("../web/index.html");
}

type SharedRenderer = Arc<QrRenderer>;

#[derive(Deserialize)]
struct GenerateForm {
    #[serde(default)]
    event_id: String,
    #[serde(default)]
    data: String,
}

async fn show_index(State(renderer): State<SharedRenderer>) -> impl IntoResponse {
    let element = renderer.element();
    let src = element.source().unwrap_or_default();
    Html(INDEX_HTML.replace("{element}", element.id()).replace("{src}", &src))
}

async fn handle_generate(State(renderer): State<SharedRenderer>, Form(input): Form<GenerateForm>) -> Response {
    let request = match QrRequest::from_form(&input.event_id, &input.data) {
        Ok(request) => request,
        Err(e) => {
            warn!("Rejected form input: {e}");
            return (StatusCode::BAD_REQUEST, e.to_string()).into_response();
        }
    };
    // Failures only reach the diagnostics channel, the page is shown as before.
    renderer.generate_qr_code(&request).await;
    Redirect::to("/").into_response()
}

async fn serve_blob(State(renderer): State<SharedRenderer>, uri: Uri) -> Response {
    match renderer.store().resolve(uri.path()) {
        None => (StatusCode::NOT_FOUND, "Blob not found.").into_response(),
        Some(image) => {
            let content_type = image
                .content_type
                .unwrap_or_else(|| String::from("application/octet-stream"));
            (
                [(header::CONTENT_TYPE, content_type), (header::CACHE_CONTROL, String::from("no-store"))],
                image.bytes,
            )
                .into_response()
        }
    }
}

async fn show_diagnostics(State(renderer): State<SharedRenderer>) -> impl IntoResponse {
    Json(renderer.diagnostics().snapshot())
}

fn app(renderer: SharedRenderer) -> Router {
    Router::new()
        .route("/", get(show_index))
        .route("/generate", post(handle_generate))
        .route("/blob/:id", get(serve_blob))
        .route("/diagnostics", get(show_diagnostics))
        .with_state(renderer)
}

/// Request given on the command line, overriding the one from config
fn cli_request(matches: &ArgMatches) -> Result<Option<QrRequest>, RequestError> {
    if let Some(id) = matches.get_one::<u64>("event-id") {
        return QrRequest::event(*id).map(Some);
    }
    if let Some(data) = matches.get_one::<String>("data") {
        return QrRequest::payload(data.as_str()).map(Some);
    }
    Ok(None)
}

async fn save_qr_code(client: &QrClient, request: &QrRequest, output: &str) {
    let image = match client.fetch(request).await {
        Ok(image) => image,
        Err(e) => {
            error!(kind = e.kind(), "Error: {e} ({request})");
            exit(1);
        }
    };
    if let Err(e) = tokio::fs::write(output, &image.bytes).await {
        error!("Error writing {output}: {e}");
        exit(1);
    }
    info!(size = image.bytes.len(), "Saved QR code for {request} to {output}");
}

fn cli() -> clap::Command {
    clap::Command::new("QR Viewer")
        .version("0.1")
        .about("Shows QR codes fetched from a QR generation service on a web page.")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .help("Path to config file")
                .value_parser(value_parser!(String))
        )
        .arg(
            Arg::new("generate")
                .short('g')
                .long("generate")
                .help("Generate and print new config file (example)")
                .num_args(0)
                .action(ArgAction::SetTrue)
        )
        .arg(
            Arg::new("event-id")
                .long("event-id")
                .help("Event whose QR code is shown at startup")
                .value_parser(value_parser!(u64))
                .conflicts_with("data")
        )
        .arg(
            Arg::new("data")
                .long("data")
                .help("Payload whose QR code is shown at startup")
                .value_parser(value_parser!(String))
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .help("Fetch the QR code once, write the image to this file and exit")
                .value_parser(value_parser!(String))
        )
}

#[tokio::main]
async fn main() {
    let matches = cli().get_matches();

    if matches.get_flag("generate") {
        println!("{}", include_str!("../config_example.toml"));
        return;
    }

    let config = if let Some(c) = matches.get_one::<String>("config") {
        match Config::load(c) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("{e}");
                exit(1);
            }
        }
    } else {
        eprintln!("Error: You must supply config path");
        exit(1);
    };

    if let Err(e) = logging::init(&config.log_level) {
        eprintln!("{e}");
        exit(1);
    }

    let request = match cli_request(&matches) {
        Ok(Some(request)) => Some(request),
        Ok(None) => config.startup_request().unwrap_or_else(|e| {
            error!("{e}");
            exit(1);
        }),
        Err(e) => {
            error!("Invalid command line request: {e}");
            exit(1);
        }
    };

    let client = QrClient::new(&config.api_url);

    if let Some(output) = matches.get_one::<String>("output") {
        match request {
            Some(request) => save_qr_code(&client, &request, output).await,
            None => {
                error!("Nothing to fetch: give --event-id, --data or set one in config");
                exit(1);
            }
        }
        return;
    }

    let addr = match config.listen_addr() {
        Ok(addr) => addr,
        Err(e) => {
            error!("{e}");
            exit(1);
        }
    };

    let renderer = Arc::new(QrRenderer::new(client, ELEMENT_ID));
    if let Some(request) = request {
        let renderer = renderer.clone();
        tokio::spawn(async move {
            renderer.generate_qr_code(&request).await;
        });
    }

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Error binding {addr}: {e}");
            exit(1);
        }
    };
    info!("Listening on {} with QR service at {}", addr, &config.api_url);

    if let Err(e) = axum::serve(listener, app(renderer.clone()))
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("Server error: {e}");
    }

    renderer.element().clear();
    info!(live_blobs = renderer.store().len(), "Stopped");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
