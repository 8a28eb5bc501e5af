use crate::config::AppState;
use crate::{csvout, filter, geojson, logger, response, upstream};
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Method, Request, Response};
use std::convert::Infallible;
use std::sync::atomic::Ordering;
use std::sync::Arc;

/// GeoJSON endpoint, consumed by the map frontend.
const GEOJSON_PATH: &str = "/api/studentaqis";
/// CSV endpoint, served as a file download.
const CSV_PATH: &str = "/api/studentdata";

/// Check HTTP method and return early response if not GET/HEAD
/// Returns Some(response) for OPTIONS/405, None to continue processing
fn check_http_method(method: &Method, enable_cors: bool) -> Option<Response<Full<Bytes>>> {
    match method {
        &Method::GET | &Method::HEAD => None,
        &Method::OPTIONS => Some(response::build_options_response(enable_cors)),
        _ => {
            logger::log_warning(&format!("Method not allowed: {method}"));
            Some(response::build_405_response())
        }
    }
}

/// Validate Content-Length header against max body size
/// Returns Some(413 response) if too large, None otherwise
fn check_body_size(
    req: &Request<hyper::body::Incoming>,
    max_body_size: u64,
) -> Option<Response<Full<Bytes>>> {
    let content_length = req.headers().get("content-length")?;
    content_length.to_str().map_or_else(
        |_| {
            logger::log_warning("Content-Length header contains non-ASCII characters");
            None
        },
        |size_str| match size_str.parse::<u64>() {
            Ok(size) if size > max_body_size => {
                logger::log_error(&format!(
                    "Request body too large: {size} bytes (max: {max_body_size})"
                ));
                Some(response::build_413_response())
            }
            Err(_) => {
                logger::log_warning(&format!(
                    "Invalid Content-Length value: '{size_str}', skipping size check"
                ));
                None
            }
            _ => None,
        },
    )
}

pub async fn handle_request(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let method = req.method();
    let uri = req.uri();
    let is_head = *method == Method::HEAD;

    let access_log = state.cached_access_log.load(Ordering::Relaxed);
    if access_log {
        logger::log_request(method, uri, req.version());
    }

    // Check HTTP method
    if let Some(resp) = check_http_method(method, state.config.http.enable_cors) {
        return Ok(resp);
    }

    // Check body size
    if let Some(resp) = check_body_size(&req, state.config.http.max_body_size) {
        return Ok(resp);
    }

    logger::log_headers_count(req.headers().len(), state.config.logging.show_headers);

    let query = uri.query().unwrap_or("");
    let response = match uri.path() {
        GEOJSON_PATH => handle_geojson(query, &state, is_head).await,
        CSV_PATH => handle_csv(query, &state, is_head).await,
        _ => response::build_404_response(),
    };

    if access_log {
        logger::log_response(response.status());
    }
    Ok(response)
}

/// Shared front half of both endpoints: parse the filter, fetch upstream.
/// Every failure short-circuits into a plain-text 500; no partial output is
/// ever flushed.
async fn fetch_for_query(
    query: &str,
    state: &Arc<AppState>,
) -> Result<upstream::StudentResult, Response<Full<Bytes>>> {
    let filter = filter::parse_query(query).map_err(|e| {
        logger::log_warning(&format!("Rejected query: {e}"));
        response::build_error_response(&format!("Could not parse time: {e}"))
    })?;

    upstream::fetch_student_data(&state.client, &state.config.upstream.base_url, &filter)
        .await
        .map_err(|e| {
            logger::log_error(&format!("Upstream fetch failed: {e}"));
            response::build_error_response(&format!("Could not fetch student data: {e}"))
        })
}

async fn handle_geojson(
    query: &str,
    state: &Arc<AppState>,
    is_head: bool,
) -> Response<Full<Bytes>> {
    let data = match fetch_for_query(query, state).await {
        Ok(data) => data,
        Err(resp) => return resp,
    };

    let collection = geojson::feature_collection(&data);
    match serde_json::to_vec(&collection) {
        Ok(body) => response::build_json_response(body, &state.config.http, is_head),
        Err(e) => {
            logger::log_error(&format!("GeoJSON serialization failed: {e}"));
            response::build_error_response(&format!("Could not marshal geojson: {e}"))
        }
    }
}

async fn handle_csv(query: &str, state: &Arc<AppState>, is_head: bool) -> Response<Full<Bytes>> {
    let data = match fetch_for_query(query, state).await {
        Ok(data) => data,
        Err(resp) => return resp,
    };

    match csvout::write_csv(&data) {
        Ok(body) => response::build_csv_response(body, &state.config.http, is_head),
        Err(e) => {
            logger::log_error(&format!("CSV write failed: {e}"));
            response::build_error_response(&format!("Could not write csv: {e}"))
        }
    }
}
