use axum::{
    extract::{Form, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use rt_core::{normalize, CrewOutput, ResultTable};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

use crate::render::{self, PageView};
use crate::{AppState, CSV_FILENAME};

pub const BLANK_TOPIC: &str = "Please enter a topic to track.";

#[derive(Debug, Deserialize)]
pub struct TrackForm {
    #[serde(default)]
    pub topic: String,
}

#[derive(Debug, Deserialize)]
pub struct DownloadForm {
    #[serde(default)]
    pub csv: String,
}

#[derive(Debug, Serialize)]
pub struct TrackResponse {
    pub topic: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub warning: Option<String>,
    pub output: CrewOutput,
}

pub async fn index() -> Html<String> {
    Html(render::page(&PageView::default()))
}

pub async fn health() -> &'static str {
    "ok"
}

pub async fn track(State(state): State<Arc<AppState>>, Form(form): Form<TrackForm>) -> Html<String> {
    let topic = form.topic.trim().to_string();
    if topic.is_empty() {
        return Html(render::page(&PageView {
            notice: Some(BLANK_TOPIC.to_string()),
            ..PageView::default()
        }));
    }

    info!("📥 Track request for {}", topic);
    let output = match state.tracker.track(&topic).await {
        Ok(output) => output,
        Err(e) => {
            warn!("❌ Pipeline failed for {}: {}", topic, e);
            return Html(render::page(&PageView {
                topic,
                notice: Some(format!("The pipeline failed: {}", e)),
                ..PageView::default()
            }));
        }
    };

    let outcome = normalize(&output.raw_output());
    let csv = if outcome.table.is_empty() {
        None
    } else {
        match outcome.table.to_csv() {
            Ok(csv) => Some(csv),
            Err(e) => {
                warn!("❌ CSV export failed: {}", e);
                None
            }
        }
    };

    Html(render::page(&PageView {
        topic,
        notice: outcome.warning,
        table: outcome.table,
        csv,
        output: Some(output),
    }))
}

/// Re-serves a posted CSV as the file attachment, for clients outside the page.
pub async fn download(Form(form): Form<DownloadForm>) -> Response {
    let csv = match ResultTable::from_csv(&form.csv).and_then(|table| {
        if table.columns().is_empty() {
            return Ok(None);
        }
        table.to_csv().map(Some)
    }) {
        Ok(Some(csv)) => csv,
        Ok(None) => return (StatusCode::BAD_REQUEST, "Nothing to download").into_response(),
        Err(e) => {
            warn!("❌ Rejected download: {}", e);
            return (StatusCode::BAD_REQUEST, format!("Invalid CSV: {}", e)).into_response();
        }
    };

    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", CSV_FILENAME),
            ),
        ],
        csv,
    )
        .into_response()
}

pub async fn api_track(
    State(state): State<Arc<AppState>>,
    Json(request): Json<TrackForm>,
) -> Result<Json<TrackResponse>, (StatusCode, Json<serde_json::Value>)> {
    let topic = request.topic.trim().to_string();
    if topic.is_empty() {
        return Err((StatusCode::BAD_REQUEST, Json(json!({ "error": BLANK_TOPIC }))));
    }

    let output = state.tracker.track(&topic).await.map_err(|e| {
        warn!("❌ Pipeline failed for {}: {}", topic, e);
        (StatusCode::BAD_GATEWAY, Json(json!({ "error": e.to_string() })))
    })?;

    let outcome = normalize(&output.raw_output());
    Ok(Json(TrackResponse {
        topic,
        columns: outcome.table.columns().to_vec(),
        rows: outcome.table.rows().to_vec(),
        warning: outcome.warning,
        output,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::create_app;
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use rt_core::{Error, NewsTracker, Result, TaskOutput, UsageMetrics};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower::ServiceExt;

    const CBI_ITEM: &str = r#"{"Publisher_Name": "CBI", "News_Title": "Enforcement action against Swilly Mulroy Credit Union", "News_Summary": "AML breaches & a fine", "News_Date": "2025-03-12", "News_Link": "https://www.centralbank.ie/news/article/swilly-mulroy"}"#;

    struct StubTracker {
        answer: Option<String>,
        calls: AtomicUsize,
    }

    impl StubTracker {
        fn answering(answer: &str) -> Arc<Self> {
            Arc::new(Self {
                answer: Some(answer.to_string()),
                calls: AtomicUsize::new(0),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                answer: None,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl NewsTracker for StubTracker {
        async fn track(&self, topic: &str) -> Result<CrewOutput> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let raw = self
                .answer
                .clone()
                .ok_or_else(|| Error::Inference("OpenAI API error 401 Unauthorized: bad key".to_string()))?;
            Ok(CrewOutput {
                raw: raw.clone(),
                json_dict: None,
                tasks_output: vec![TaskOutput {
                    description: format!("Analyze {} news", topic),
                    agent: "Content Analyzer".to_string(),
                    raw,
                    json_dict: None,
                    delegations: vec![],
                }],
                token_usage: UsageMetrics {
                    prompt_tokens: 10,
                    completion_tokens: 5,
                    total_tokens: 15,
                    successful_requests: 1,
                },
            })
        }
    }

    async fn send(tracker: Arc<StubTracker>, request: Request<Body>) -> (StatusCode, Vec<(String, String)>, String) {
        let app = create_app(AppState::new(tracker)).await;
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response
            .headers()
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or_default().to_string()))
            .collect();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, headers, String::from_utf8(body.to_vec()).unwrap())
    }

    fn form(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn json_request(body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/track")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_index_and_health() {
        let get = |uri: &str| Request::builder().uri(uri).body(Body::empty()).unwrap();

        let (status, _, body) = send(StubTracker::failing(), get("/")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Regulatory News Tracker"));

        let (status, _, body) = send(StubTracker::failing(), get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "ok");
    }

    #[tokio::test]
    async fn test_track_renders_table_and_download() {
        let tracker = StubTracker::answering(&format!("Final answer:\n{}", CBI_ITEM));
        let (status, _, body) = send(tracker, form("/track", "topic=Anti-Money+Laundering")).await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("<th>Publisher_Name</th><th>News_Title</th><th>News_Summary</th><th>News_Date</th><th>News_Link</th>"));
        assert!(body.contains("<td>AML breaches &amp; a fine</td>"));
        assert!(body.contains("<a download=\"regulatory_news.csv\""));
        assert!(body.contains("Pipeline details"));
        assert!(body.contains("Total tokens: 15"));
        assert!(body.contains("value=\"Anti-Money Laundering\""));
    }

    #[tokio::test]
    async fn test_track_without_data_shows_notice() {
        let tracker = StubTracker::answering("No relevant results found.");
        let (status, _, body) = send(tracker, form("/track", "topic=AML")).await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.contains(rt_core::NO_TABULAR_DATA));
        assert!(!body.contains("<table>"));
        assert!(!body.contains(render::CSV_DATA_URL_PREFIX));
    }

    #[tokio::test]
    async fn test_blank_topic_skips_pipeline() {
        let tracker = StubTracker::answering(CBI_ITEM);
        let (status, _, body) = send(tracker.clone(), form("/track", "topic=+++")).await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.contains(BLANK_TOPIC));
        assert_eq!(tracker.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_pipeline_failure_is_a_warning() {
        let (status, _, body) = send(StubTracker::failing(), form("/track", "topic=AML")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("The pipeline failed"));
        assert!(body.contains("401 Unauthorized"));
    }

    /// Decodes the CSV carried by the page's download link.
    fn embedded_csv(page: &str) -> String {
        let start = page
            .find(render::CSV_DATA_URL_PREFIX)
            .map(|i| i + render::CSV_DATA_URL_PREFIX.len())
            .unwrap();
        let end = start + page[start..].find('"').unwrap();
        percent_encoding::percent_decode_str(&page[start..end])
            .decode_utf8()
            .unwrap()
            .into_owned()
    }

    #[tokio::test]
    async fn test_downloaded_table_matches_displayed_table() {
        let raw = r#"{"News_Title": "A, \"quoted\"", "News_Summary": "line one\nline two\r\nline three", "News_Date": null}"#;
        let (status, _, body) = send(StubTracker::answering(raw), form("/track", "topic=AML")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("<td>line one\nline two\r\nline three</td>"));

        let displayed = normalize(&rt_core::RawOutput::Text(raw.to_string())).table;
        let downloaded = ResultTable::from_csv(&embedded_csv(&body)).unwrap();
        assert_eq!(downloaded, displayed);
        assert_eq!(
            downloaded.column("News_Summary"),
            Some(vec!["line one\nline two\r\nline three"])
        );
    }

    #[tokio::test]
    async fn test_download_headers() {
        let body = "csv=News_Title%2CNews_Link%0AAML+fine%2Chttps%3A%2F%2Fwww.centralbank.ie%2Fnews%2Farticle%2Faml-fine%0A";
        let (status, headers, csv) = send(StubTracker::failing(), form("/download", body)).await;

        assert_eq!(status, StatusCode::OK);
        let header = |name: &str| {
            headers
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.clone())
                .unwrap_or_default()
        };
        assert!(header("content-type").starts_with("text/csv"));
        assert_eq!(
            header("content-disposition"),
            "attachment; filename=\"regulatory_news.csv\""
        );
        let table = ResultTable::from_csv(&csv).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.column("News_Title"), Some(vec!["AML fine"]));
    }

    #[tokio::test]
    async fn test_download_without_csv_is_rejected() {
        let (status, _, _) = send(StubTracker::failing(), form("/download", "csv=")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_api_track() {
        let tracker = StubTracker::answering(CBI_ITEM);
        let (status, _, body) = send(tracker, json_request(json!({"topic": "AML"}))).await;
        assert_eq!(status, StatusCode::OK);
        let value: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(value["rows"].as_array().map(Vec::len), Some(1));
        assert_eq!(value["columns"][0], "Publisher_Name");
        assert!(value["warning"].is_null());
        assert_eq!(value["output"]["token_usage"]["total_tokens"], 15);

        let (status, _, body) = send(StubTracker::failing(), json_request(json!({"topic": "AML"}))).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(body.contains("401 Unauthorized"));

        let (status, _, _) = send(StubTracker::failing(), json_request(json!({"topic": ""}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
