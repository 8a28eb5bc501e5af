//! Fetching and decoding of the upstream measurement API.

use crate::config::HttpClient;
use crate::filter::{StudentFilter, TIME_LAYOUT};
use crate::logger;
use http_body_util::BodyExt;
use hyper::Uri;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

/// Ordered result set as returned by the upstream API.
#[derive(Debug, Deserialize, PartialEq)]
pub struct StudentResult {
    #[serde(default)]
    pub data: Vec<StudentRecord>,
}

#[derive(Debug, Deserialize, PartialEq)]
pub struct StudentRecord {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type", default)]
    pub record_type: String,
    pub attributes: Measurement,
}

/// One sensor reading. Field values are passed through verbatim; no range
/// validation happens anywhere in the pipeline.
#[derive(Debug, Deserialize, PartialEq)]
pub struct Measurement {
    #[serde(rename = "Latitude", default)]
    pub latitude: f64,
    #[serde(rename = "Longitude", default)]
    pub longitude: f64,
    #[serde(rename = "PmTen", default)]
    pub pm_ten: f64,
    #[serde(rename = "PmTwoFive", default)]
    pub pm_two_five: f64,
    #[serde(rename = "Humidity", default)]
    pub humidity: f64,
    #[serde(rename = "Temperature", default)]
    pub temperature: f64,
    #[serde(rename = "Timestamp", default)]
    pub date: String,
}

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("invalid upstream URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("invalid upstream URI: {0}")]
    Uri(#[from] hyper::http::uri::InvalidUri),
    #[error("could not download data from upstream: {0}")]
    Request(#[from] hyper_util::client::legacy::Error),
    #[error("could not read upstream response body: {0}")]
    Body(#[from] hyper::Error),
    #[error("could not decode upstream response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Build the upstream query URL for a filter.
///
/// Exactly one of `within`/`area` is forwarded, `within` taking priority, and
/// at most one of `plotmap`/`plotchart`, `plotmap` taking priority. All values
/// go through the query serializer, so `area` free text is percent-encoded.
pub fn build_data_url(base_url: &str, filter: &StudentFilter) -> Result<Url, url::ParseError> {
    let mut url = Url::parse(base_url)?.join("/api/data")?;
    {
        let mut pairs = url.query_pairs_mut();
        pairs.append_pair("totime", &filter.to_time.format(TIME_LAYOUT).to_string());
        pairs.append_pair("fromtime", &filter.from_time.format(TIME_LAYOUT).to_string());

        if !filter.within.is_empty() {
            pairs.append_pair("within", &filter.within);
        } else if !filter.area.is_empty() {
            pairs.append_pair("area", &filter.area);
        }

        if !filter.plot_map.is_empty() {
            pairs.append_pair("plotmap", &filter.plot_map);
        } else if !filter.plot_chart.is_empty() {
            pairs.append_pair("plotchart", &filter.plot_chart);
        }
    }
    Ok(url)
}

/// Fetch and decode the student-collected data matching `filter`.
///
/// Decode failures are surfaced, not swallowed: an upstream body that is not
/// the expected JSON shape fails the request.
pub async fn fetch_student_data(
    client: &HttpClient,
    base_url: &str,
    filter: &StudentFilter,
) -> Result<StudentResult, UpstreamError> {
    let url = build_data_url(base_url, filter)?;
    logger::log_upstream_fetch(url.as_str());

    let uri: Uri = url.as_str().parse()?;
    let response = client.get(uri).await?;
    let body = response.into_body().collect().await?.to_bytes();

    Ok(serde_json::from_slice(&body)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;
    use hyper_util::client::legacy::Client;
    use hyper_util::rt::TokioExecutor;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    const BASE: &str = "http://localhost:8000";

    fn make_filter() -> StudentFilter {
        StudentFilter {
            from_time: NaiveDateTime::parse_from_str("2020-01-01T00:00:00", TIME_LAYOUT)
                .unwrap(),
            to_time: NaiveDateTime::parse_from_str("2020-01-02T00:00:00", TIME_LAYOUT).unwrap(),
            within: String::new(),
            area: String::new(),
            plot_map: String::new(),
            plot_chart: String::new(),
        }
    }

    fn query_keys(url: &Url) -> Vec<String> {
        url.query_pairs().map(|(k, _)| k.into_owned()).collect()
    }

    #[test]
    fn test_url_with_time_range_only() {
        let url = build_data_url(BASE, &make_filter()).unwrap();
        assert_eq!(url.path(), "/api/data");
        assert_eq!(query_keys(&url), vec!["totime", "fromtime"]);
    }

    #[test]
    fn test_within_takes_priority_over_area() {
        let mut filter = make_filter();
        filter.within = "sentrum".to_string();
        filter.area = "should not appear".to_string();
        let url = build_data_url(BASE, &filter).unwrap();
        assert_eq!(query_keys(&url), vec!["totime", "fromtime", "within"]);
        assert!(!url.as_str().contains("area"));
    }

    #[test]
    fn test_area_is_percent_encoded() {
        let mut filter = make_filter();
        filter.area = "Tromsø sentrum".to_string();
        let url = build_data_url(BASE, &filter).unwrap();
        assert!(url.as_str().contains("area=Troms%C3%B8+sentrum"));
    }

    #[test]
    fn test_plotmap_takes_priority_over_plotchart() {
        let mut filter = make_filter();
        filter.plot_map = "1".to_string();
        filter.plot_chart = "1".to_string();
        let url = build_data_url(BASE, &filter).unwrap();
        assert!(url.as_str().contains("plotmap=1"));
        assert!(!url.as_str().contains("plotchart"));
    }

    #[test]
    fn test_plotchart_forwarded_when_plotmap_empty() {
        let mut filter = make_filter();
        filter.plot_chart = "1".to_string();
        let url = build_data_url(BASE, &filter).unwrap();
        assert!(url.as_str().contains("plotchart=1"));
    }

    #[test]
    fn test_decode_upstream_shape() {
        let body = r#"{
            "data": [{
                "id": "42",
                "type": "measurement",
                "attributes": {
                    "Latitude": 69.6489,
                    "Longitude": 18.9551,
                    "PmTen": 12.5,
                    "PmTwoFive": 4.1,
                    "Humidity": 81.0,
                    "Temperature": -3.2,
                    "Timestamp": "2020-01-01 12:00:00 +0100"
                }
            }]
        }"#;
        let result: StudentResult = serde_json::from_str(body).unwrap();
        assert_eq!(result.data.len(), 1);
        let m = &result.data[0].attributes;
        assert_eq!(result.data[0].id, "42");
        assert_eq!(result.data[0].record_type, "measurement");
        assert_eq!(m.latitude, 69.6489);
        assert_eq!(m.pm_two_five, 4.1);
        assert_eq!(m.date, "2020-01-01 12:00:00 +0100");
    }

    /// Serve one canned HTTP/1.1 response on a scratch port.
    async fn spawn_one_shot_upstream(body: &'static str) -> std::net::SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 2048];
            let _ = stream.read(&mut buf).await.unwrap();
            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            stream.write_all(response.as_bytes()).await.unwrap();
            stream.shutdown().await.unwrap();
        });
        addr
    }

    #[tokio::test]
    async fn test_fetch_decodes_configured_upstream() {
        let addr = spawn_one_shot_upstream(r#"{"data":[]}"#).await;
        let client: HttpClient = Client::builder(TokioExecutor::new()).build_http();
        let result = fetch_student_data(&client, &format!("http://{addr}"), &make_filter())
            .await
            .unwrap();
        assert!(result.data.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_surfaces_decode_errors() {
        let addr = spawn_one_shot_upstream("not json at all").await;
        let client: HttpClient = Client::builder(TokioExecutor::new()).build_http();
        let err = fetch_student_data(&client, &format!("http://{addr}"), &make_filter())
            .await
            .unwrap_err();
        assert!(matches!(err, UpstreamError::Decode(_)));
    }

    #[tokio::test]
    async fn test_fetch_wraps_network_failure() {
        // Nothing listens on this address.
        let client: HttpClient = Client::builder(TokioExecutor::new()).build_http();
        let err = fetch_student_data(&client, "http://127.0.0.1:9", &make_filter())
            .await
            .unwrap_err();
        assert!(matches!(err, UpstreamError::Request(_)));
        assert!(err.to_string().contains("could not download"));
    }
}
