use crate::config::HttpConfig;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;

const CSV_FILENAME: &str = "studentdata.csv";

/// Raw JSON bytes as produced by the GeoJSON formatter. No content-type
/// override; map clients fetch this with their own Accept handling.
pub fn build_json_response(
    body: Vec<u8>,
    http_config: &HttpConfig,
    is_head: bool,
) -> Response<Full<Bytes>> {
    let mut builder = Response::builder()
        .status(200)
        .header("Server", &http_config.server_name);

    if http_config.enable_cors {
        builder = builder.header("Access-Control-Allow-Origin", "*");
    }

    let payload = if is_head { Bytes::new() } else { Bytes::from(body) };
    builder
        .body(Full::new(payload))
        .expect("Failed to build response")
}

/// CSV document served as a file download.
pub fn build_csv_response(
    body: Vec<u8>,
    http_config: &HttpConfig,
    is_head: bool,
) -> Response<Full<Bytes>> {
    let mut builder = Response::builder()
        .status(200)
        .header("Content-Type", "text/csv; charset=utf-8")
        .header(
            "Content-Disposition",
            format!("attachment; filename={CSV_FILENAME}"),
        )
        .header("Server", &http_config.server_name);

    if http_config.enable_cors {
        builder = builder.header("Access-Control-Allow-Origin", "*");
    }

    let payload = if is_head { Bytes::new() } else { Bytes::from(body) };
    builder
        .body(Full::new(payload))
        .expect("Failed to build csv response")
}

/// Plain-text 500. Every pipeline failure ends here, whether the root cause
/// was client input or the upstream call.
pub fn build_error_response(message: &str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(500)
        .header("Content-Type", "text/plain")
        .body(Full::new(Bytes::from(message.to_string())))
        .expect("Failed to build error response")
}

pub fn build_404_response() -> Response<Full<Bytes>> {
    Response::builder()
        .status(404)
        .header("Content-Type", "text/plain")
        .body(Full::new(Bytes::from("Not Found")))
        .expect("Failed to build 404 response")
}

pub fn build_405_response() -> Response<Full<Bytes>> {
    Response::builder()
        .status(405)
        .header("Content-Type", "text/plain")
        .header("Allow", "GET, HEAD, OPTIONS")
        .body(Full::new(Bytes::from("Method Not Allowed")))
        .expect("Failed to build 405 response")
}

pub fn build_413_response() -> Response<Full<Bytes>> {
    Response::builder()
        .status(413)
        .header("Content-Type", "text/plain")
        .body(Full::new(Bytes::from("Request Entity Too Large")))
        .expect("Failed to build 413 response")
}

pub fn build_options_response(enable_cors: bool) -> Response<Full<Bytes>> {
    let mut builder = Response::builder()
        .status(204)
        .header("Allow", "GET, HEAD, OPTIONS");

    if enable_cors {
        builder = builder
            .header("Access-Control-Allow-Origin", "*")
            .header("Access-Control-Allow-Methods", "GET, HEAD, OPTIONS");
    }

    builder
        .body(Full::new(Bytes::new()))
        .expect("Failed to build options response")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn http_config() -> HttpConfig {
        HttpConfig {
            server_name: "Luftdata/test".to_string(),
            enable_cors: false,
            max_body_size: 1024,
        }
    }

    #[test]
    fn test_csv_response_forces_download() {
        let resp = build_csv_response(b"a,b\n".to_vec(), &http_config(), false);
        assert_eq!(resp.status(), 200);
        assert_eq!(
            resp.headers().get("Content-Disposition").unwrap(),
            "attachment; filename=studentdata.csv"
        );
    }

    #[test]
    fn test_error_response_is_plain_text_500() {
        let resp = build_error_response("Could not parse time: bad input");
        assert_eq!(resp.status(), 500);
        assert_eq!(resp.headers().get("Content-Type").unwrap(), "text/plain");
    }

    #[test]
    fn test_head_strips_body() {
        let resp = build_json_response(b"{}".to_vec(), &http_config(), true);
        assert_eq!(resp.status(), 200);
    }

    #[test]
    fn test_cors_header_when_enabled() {
        let mut cfg = http_config();
        cfg.enable_cors = true;
        let resp = build_json_response(Vec::new(), &cfg, false);
        assert_eq!(
            resp.headers().get("Access-Control-Allow-Origin").unwrap(),
            "*"
        );
    }
}
