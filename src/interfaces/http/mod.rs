pub mod presenter;

use crate::application::SalesAnalysisUseCase;
use crate::domain::error::{AppError, Result};
use crate::domain::sales::{InsightKind, SalesAnalysis};
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::session_store::{SessionGuard, SessionStore};
use actix_cors::Cors;
use actix_web::cookie::{Cookie, SameSite};
use actix_web::{
    dev::Server, get, post, web, App, HttpRequest, HttpResponse, HttpResponseBuilder, HttpServer,
    Responder,
};
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{error, info, warn};
use validator::Validate;

pub const SESSION_COOKIE: &str = "sales_session";

const MAX_LOG_ENTRIES: usize = 100;
const MAX_PAGE_ROWS: usize = 500;

const INDEX_HTML: &str = include_str!("static/index.html");

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LogEntry {
    pub time: String,
    pub level: String,
    pub source: String,
    pub message: String,
}

pub struct HttpState {
    pub config: AppConfig,
    pub store: Arc<SessionStore>,
    pub analysis: Arc<SalesAnalysisUseCase>,
    pub logs: Arc<Mutex<Vec<LogEntry>>>,
}

impl HttpState {
    pub fn new(config: AppConfig, store: Arc<SessionStore>, logs: Arc<Mutex<Vec<LogEntry>>>) -> Self {
        let analysis = Arc::new(SalesAnalysisUseCase::new(
            config.classifier.clone(),
            config.top_n,
        ));
        Self {
            config,
            store,
            analysis,
            logs,
        }
    }

    /// Session id from the request cookie, if the session is still alive
    fn session_id(&self, req: &HttpRequest) -> Option<String> {
        req.cookie(SESSION_COOKIE)
            .map(|cookie| cookie.value().to_string())
            .filter(|id| self.store.contains(id))
    }

    fn loaded(&self, req: &HttpRequest) -> Result<(String, Arc<SalesAnalysis>)> {
        let id = self.session_id(req).ok_or_else(AppError::no_data)?;
        let analysis = self.store.loaded(&id)?;
        Ok((id, analysis))
    }

    fn log_error(&self, source: &str, err: &AppError) {
        let level = match err {
            AppError::Internal(_) | AppError::IoError(_) | AppError::Config(_) => "ERROR",
            _ => "WARN",
        };
        add_log(&self.logs, level, source, &err.to_string());
    }
}

#[derive(Deserialize, Validate)]
struct UploadQuery {
    #[validate(length(min = 1, max = 255))]
    filename: String,
}

#[derive(Deserialize, Validate)]
struct DataQuery {
    #[serde(default)]
    offset: usize,
    #[validate(range(min = 1, max = 500))]
    limit: Option<usize>,
}

fn session_cookie(id: &str) -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE, id.to_string())
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .finish()
}

fn with_session_cookie(mut builder: HttpResponseBuilder, id: &str, created: bool) -> HttpResponseBuilder {
    if created {
        builder.cookie(session_cookie(id));
    }
    builder
}

/// Parse on the blocking pool, then swap the result into the session
async fn load_into_session(
    data: &HttpState,
    guard: &SessionGuard,
    job: impl FnOnce(&SalesAnalysisUseCase) -> Result<SalesAnalysis> + Send + 'static,
) -> Result<u64> {
    let use_case = data.analysis.clone();
    let analysis = web::block(move || job(&use_case))
        .await
        .map_err(|e| AppError::Internal(format!("Analysis task failed: {}", e)))??;
    data.store.load(guard, analysis)
}

fn session_response(data: &HttpState, id: &str, created: bool) -> Result<HttpResponse> {
    let analysis = data.store.loaded(id).ok();
    let view = presenter::session_view(data.store.snapshot(id), analysis.as_deref());
    Ok(with_session_cookie(HttpResponse::Ok(), id, created).json(view))
}

#[get("/")]
async fn index() -> impl Responder {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(INDEX_HTML)
}

#[get("/health")]
async fn health() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

#[post("/upload")]
async fn upload(
    req: HttpRequest,
    data: web::Data<HttpState>,
    query: web::Query<UploadQuery>,
    payload: web::Payload,
) -> Result<HttpResponse> {
    query
        .validate()
        .map_err(|e| AppError::ValidationError(e.to_string()))?;

    let limit = data.config.max_upload_bytes;
    let body = match payload.to_bytes_limited(limit).await {
        Ok(Ok(body)) => body,
        Ok(Err(e)) => {
            return Err(AppError::ValidationError(format!("Failed to read upload: {}", e)));
        }
        Err(_) => {
            let err = AppError::PayloadTooLarge(format!("Upload exceeds {} bytes", limit));
            data.log_error("Upload", &err);
            return Err(err);
        }
    };

    let filename = query.into_inner().filename;
    add_log(
        &data.logs,
        "INFO",
        "Upload",
        &format!("Received '{}' ({} bytes)", filename, body.len()),
    );

    let (id, created) = data.store.resolve(data.session_id(&req).as_deref());
    let guard = data.store.acquire(&id)?;

    let name = filename.clone();
    let result = load_into_session(&data, &guard, move |use_case| use_case.execute(&name, &body)).await;
    drop(guard);

    match result {
        Ok(generation) => {
            add_log(
                &data.logs,
                "INFO",
                "Upload",
                &format!("Analyzed '{}' (generation {})", filename, generation),
            );
            session_response(&data, &id, created)
        }
        Err(err) => {
            data.log_error("Upload", &err);
            if created {
                data.store.remove(&id);
            }
            Err(err)
        }
    }
}

#[post("/sample")]
async fn load_sample(req: HttpRequest, data: web::Data<HttpState>) -> Result<HttpResponse> {
    let (id, created) = data.store.resolve(data.session_id(&req).as_deref());
    let guard = data.store.acquire(&id)?;

    let result = load_into_session(&data, &guard, |use_case| use_case.execute_sample()).await;
    drop(guard);

    match result {
        Ok(generation) => {
            add_log(
                &data.logs,
                "INFO",
                "Upload",
                &format!("Loaded sample dataset (generation {})", generation),
            );
            session_response(&data, &id, created)
        }
        Err(err) => {
            data.log_error("Upload", &err);
            Err(err)
        }
    }
}

#[get("/session")]
async fn get_session(req: HttpRequest, data: web::Data<HttpState>) -> Result<HttpResponse> {
    match data.session_id(&req) {
        Some(id) => session_response(&data, &id, false),
        None => Ok(HttpResponse::Ok().json(presenter::session_view(None, None))),
    }
}

#[get("/dashboard")]
async fn get_dashboard(req: HttpRequest, data: web::Data<HttpState>) -> Result<HttpResponse> {
    let (id, analysis) = data.loaded(&req)?;
    let generation = data
        .store
        .snapshot(&id)
        .map(|snapshot| snapshot.generation)
        .unwrap_or_default();
    Ok(HttpResponse::Ok().json(presenter::dashboard(&analysis, generation)))
}

#[get("/insights/{name}")]
async fn get_insight(
    req: HttpRequest,
    data: web::Data<HttpState>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let kind: InsightKind = path.into_inner().parse()?;
    let (_, analysis) = data.loaded(&req)?;
    Ok(HttpResponse::Ok().json(presenter::chart_entry(kind, &analysis)))
}

#[get("/data")]
async fn get_data(
    req: HttpRequest,
    data: web::Data<HttpState>,
    query: web::Query<DataQuery>,
) -> Result<HttpResponse> {
    query
        .validate()
        .map_err(|e| AppError::ValidationError(e.to_string()))?;

    let (_, analysis) = data.loaded(&req)?;
    let limit = query
        .limit
        .unwrap_or(data.config.preview_rows)
        .min(MAX_PAGE_ROWS);
    Ok(HttpResponse::Ok().json(presenter::data_page(&analysis, query.offset, limit)))
}

#[post("/reset")]
async fn reset(req: HttpRequest, data: web::Data<HttpState>) -> Result<HttpResponse> {
    let Some(id) = data.session_id(&req) else {
        return Ok(HttpResponse::Ok().json(presenter::session_view(None, None)));
    };

    let guard = data.store.acquire(&id)?;
    data.store.clear(&guard)?;
    drop(guard);

    add_log(&data.logs, "INFO", "Session", "Session reset");
    session_response(&data, &id, false)
}

#[get("/logs")]
async fn get_logs(data: web::Data<HttpState>) -> impl Responder {
    let logs = data.logs.lock().unwrap_or_else(PoisonError::into_inner);
    HttpResponse::Ok().json(&*logs)
}

pub fn add_log_entry(
    logs: &Mutex<Vec<LogEntry>>,
    level: &str,
    source: &str,
    message: &str,
) -> LogEntry {
    match level {
        "ERROR" => error!(source, "{}", message),
        "WARN" => warn!(source, "{}", message),
        _ => info!(source, "{}", message),
    }

    let entry = LogEntry {
        time: Local::now().format("%H:%M:%S").to_string(),
        level: level.to_string(),
        source: source.to_string(),
        message: message.to_string(),
    };
    let mut logs = logs.lock().unwrap_or_else(PoisonError::into_inner);
    logs.push(entry.clone());
    if logs.len() > MAX_LOG_ENTRIES {
        logs.remove(0);
    }
    entry
}

pub fn add_log(logs: &Mutex<Vec<LogEntry>>, level: &str, source: &str, message: &str) {
    add_log_entry(logs, level, source, message);
}

/// Routes and extractor settings shared by the server and tests
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::QueryConfig::default()
            .error_handler(|err, _req| AppError::ValidationError(err.to_string()).into()),
    )
    .service(index)
    .service(
        web::scope("/api")
            .service(health)
            .service(upload)
            .service(load_sample)
            .service(get_session)
            .service(get_dashboard)
            .service(get_insight)
            .service(get_data)
            .service(reset)
            .service(get_logs),
    );
}

pub fn start_server(state: web::Data<HttpState>) -> std::io::Result<Server> {
    let bind = state.config.bind_address();

    let server = HttpServer::new(move || {
        let cors = Cors::permissive(); // Local single-user tool

        App::new()
            .wrap(cors)
            .app_data(state.clone())
            .configure(configure)
    })
    .bind(bind)?
    .run();

    Ok(server)
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::test as atest;
    use serde_json::Value;
    use std::time::Duration;

    fn state() -> web::Data<HttpState> {
        let config = AppConfig::default();
        let store = Arc::new(SessionStore::new(config.session_ttl()));
        web::Data::new(HttpState::new(config, store, Arc::new(Mutex::new(Vec::new()))))
    }

    macro_rules! app {
        ($state:expr) => {
            atest::init_service(
                App::new()
                    .app_data($state.clone())
                    .configure(configure),
            )
            .await
        };
    }

    fn upload_request(filename: &str, body: &'static str) -> atest::TestRequest {
        atest::TestRequest::post()
            .uri(&format!("/api/upload?filename={}", filename))
            .set_payload(body)
    }

    #[actix_web::test]
    async fn test_upload_sets_cookie_and_returns_summary() {
        let state = state();
        let app = app!(state);

        let resp = atest::call_service(
            &app,
            upload_request("sales.csv", "date,product,region,units,revenue\n2024-01-01,Laptop,North,1,1200\n2024-01-02,Mouse,South,3,75\n2024-01-03,Laptop,North,2,2400\n")
                .to_request(),
        )
        .await;

        assert_eq!(resp.status(), StatusCode::OK);
        let cookie = resp
            .response()
            .cookies()
            .find(|c| c.name() == SESSION_COOKIE)
            .expect("session cookie");
        assert!(cookie.http_only().unwrap_or(false));

        let body: Value = atest::read_body_json(resp).await;
        assert_eq!(body["state"], "loaded");
        assert_eq!(body["generation"], 1);
        assert_eq!(body["row_count"], 3);
        assert_eq!(body["columns"][4]["role"], "sales");
    }

    #[actix_web::test]
    async fn test_dashboard_and_single_insight() {
        let state = state();
        let app = app!(state);

        let resp = atest::call_service(&app, atest::TestRequest::post().uri("/api/sample").to_request()).await;
        let cookie = resp
            .response()
            .cookies()
            .find(|c| c.name() == SESSION_COOKIE)
            .map(|c| c.into_owned())
            .expect("session cookie");

        let req = atest::TestRequest::get()
            .uri("/api/dashboard")
            .cookie(cookie.clone())
            .to_request();
        let body: Value = atest::call_and_read_body_json(&app, req).await;
        assert_eq!(body["charts"].as_array().map(|c| c.len()), Some(InsightKind::ALL.len()));
        assert_eq!(body["metrics"][0]["value"], "5");

        let req = atest::TestRequest::get()
            .uri("/api/insights/top_products")
            .cookie(cookie.clone())
            .to_request();
        let body: Value = atest::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"], "ready");
        assert_eq!(body["labels"][0], "Laptop");

        let req = atest::TestRequest::get()
            .uri("/api/insights/top_customers")
            .cookie(cookie.clone())
            .to_request();
        let body: Value = atest::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"], "insufficient_data");

        let req = atest::TestRequest::get()
            .uri("/api/insights/pie_of_everything")
            .cookie(cookie)
            .to_request();
        let resp = atest::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_second_upload_replaces_first() {
        let state = state();
        let app = app!(state);

        let resp = atest::call_service(
            &app,
            upload_request("a.csv", "product,sales\nLaptop,100\n").to_request(),
        )
        .await;
        let cookie = resp
            .response()
            .cookies()
            .find(|c| c.name() == SESSION_COOKIE)
            .map(|c| c.into_owned())
            .expect("session cookie");

        let resp = atest::call_service(
            &app,
            upload_request("b.csv", "product,sales\nMouse,5\nKeyboard,8\n")
                .cookie(cookie.clone())
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        // Existing session keeps its cookie
        assert!(resp.response().cookies().next().is_none());

        let req = atest::TestRequest::get()
            .uri("/api/insights/top_products")
            .cookie(cookie)
            .to_request();
        let body: Value = atest::call_and_read_body_json(&app, req).await;
        assert_eq!(body["labels"], serde_json::json!(["Keyboard", "Mouse"]));
        assert_eq!(state.store.len(), 1);
    }

    #[actix_web::test]
    async fn test_bad_upload_keeps_existing_data() {
        let state = state();
        let app = app!(state);

        let resp = atest::call_service(&app, atest::TestRequest::post().uri("/api/sample").to_request()).await;
        let cookie = resp
            .response()
            .cookies()
            .find(|c| c.name() == SESSION_COOKIE)
            .map(|c| c.into_owned())
            .expect("session cookie");

        let resp = atest::call_service(
            &app,
            upload_request("report.pdf", "%PDF-1.4").cookie(cookie.clone()).to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body: Value = atest::read_body_json(resp).await;
        assert_eq!(body["error"], "file_format");

        let req = atest::TestRequest::get()
            .uri("/api/session")
            .cookie(cookie)
            .to_request();
        let body: Value = atest::call_and_read_body_json(&app, req).await;
        assert_eq!(body["state"], "loaded");
        assert_eq!(body["source_name"], "sample.csv");
    }

    #[actix_web::test]
    async fn test_failed_first_upload_leaves_no_session() {
        let state = state();
        let app = app!(state);

        let resp = atest::call_service(&app, upload_request("empty.csv", "").to_request()).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(state.store.is_empty());
    }

    #[actix_web::test]
    async fn test_queries_without_data() {
        let state = state();
        let app = app!(state);

        let resp = atest::call_service(&app, atest::TestRequest::get().uri("/api/dashboard").to_request()).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: Value = atest::read_body_json(resp).await;
        assert_eq!(body["error"], "no_data");

        let body: Value = atest::call_and_read_body_json(
            &app,
            atest::TestRequest::get().uri("/api/session").to_request(),
        )
        .await;
        assert_eq!(body["state"], "empty");
    }

    #[actix_web::test]
    async fn test_reset_clears_session() {
        let state = state();
        let app = app!(state);

        let resp = atest::call_service(&app, atest::TestRequest::post().uri("/api/sample").to_request()).await;
        let cookie = resp
            .response()
            .cookies()
            .find(|c| c.name() == SESSION_COOKIE)
            .map(|c| c.into_owned())
            .expect("session cookie");

        let req = atest::TestRequest::post()
            .uri("/api/reset")
            .cookie(cookie.clone())
            .to_request();
        let body: Value = atest::call_and_read_body_json(&app, req).await;
        assert_eq!(body["state"], "empty");

        let req = atest::TestRequest::get()
            .uri("/api/dashboard")
            .cookie(cookie)
            .to_request();
        let resp = atest::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_busy_session_rejects_upload() {
        let state = state();
        let app = app!(state);

        let id = state.store.create();
        let _guard = state.store.acquire(&id).unwrap();

        let resp = atest::call_service(
            &app,
            upload_request("a.csv", "sales\n1\n")
                .cookie(session_cookie(&id))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);
    }

    #[actix_web::test]
    async fn test_data_paging_and_validation() {
        let state = state();
        let app = app!(state);

        let resp = atest::call_service(&app, atest::TestRequest::post().uri("/api/sample").to_request()).await;
        let cookie = resp
            .response()
            .cookies()
            .find(|c| c.name() == SESSION_COOKIE)
            .map(|c| c.into_owned())
            .expect("session cookie");

        let req = atest::TestRequest::get()
            .uri("/api/data?offset=1&limit=2")
            .cookie(cookie.clone())
            .to_request();
        let body: Value = atest::call_and_read_body_json(&app, req).await;
        assert_eq!(body["total_rows"], 5);
        assert_eq!(body["rows"].as_array().map(|r| r.len()), Some(2));
        assert_eq!(body["rows"][0][1], "Mouse");

        let req = atest::TestRequest::get()
            .uri("/api/data?limit=0")
            .cookie(cookie)
            .to_request();
        let resp = atest::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = atest::read_body_json(resp).await;
        assert_eq!(body["error"], "validation");
    }

    #[actix_web::test]
    async fn test_upload_requires_filename() {
        let state = state();
        let app = app!(state);

        let req = atest::TestRequest::post()
            .uri("/api/upload")
            .set_payload("sales\n1\n")
            .to_request();
        let resp = atest::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_index_health_and_logs() {
        let state = state();
        let app = app!(state);

        let resp = atest::call_service(&app, atest::TestRequest::get().uri("/").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: Value = atest::call_and_read_body_json(
            &app,
            atest::TestRequest::get().uri("/api/health").to_request(),
        )
        .await;
        assert_eq!(body["status"], "ok");

        atest::call_service(&app, atest::TestRequest::post().uri("/api/sample").to_request()).await;
        let body: Value = atest::call_and_read_body_json(
            &app,
            atest::TestRequest::get().uri("/api/logs").to_request(),
        )
        .await;
        assert!(body.as_array().map(|logs| !logs.is_empty()).unwrap_or(false));
    }

    #[actix_web::test]
    async fn test_oversized_upload_is_rejected_as_json() {
        let mut config = AppConfig::default();
        config.max_upload_bytes = 16;
        let store = Arc::new(SessionStore::new(config.session_ttl()));
        let state = web::Data::new(HttpState::new(config, store, Arc::new(Mutex::new(Vec::new()))));
        let app = app!(state);

        let resp = atest::call_service(
            &app,
            upload_request("a.csv", "product,sales\nLaptop,1200\nMouse,25\n").to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
        let body: Value = atest::read_body_json(resp).await;
        assert_eq!(body["error"], "payload_too_large");
        assert!(state.store.is_empty());

        let resp = atest::call_service(&app, upload_request("b.csv", "sales\n1\n").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[test]
    fn test_dashboard_page_renders_file_text_as_text() {
        // Column names and cell values come from uploads
        assert!(!INDEX_HTML.contains("innerHTML"));
        assert!(INDEX_HTML.contains("textContent"));
    }

    #[test]
    fn test_log_buffer_is_bounded() {
        let logs = Mutex::new(Vec::new());
        for i in 0..(MAX_LOG_ENTRIES + 5) {
            add_log(&logs, "INFO", "Test", &format!("entry {}", i));
        }
        let logs = logs.lock().unwrap();
        assert_eq!(logs.len(), MAX_LOG_ENTRIES);
        assert_eq!(logs[0].message, "entry 5");
    }

    #[test]
    fn test_ttl_comes_from_config() {
        let state = state();
        assert_eq!(state.store.ttl(), Duration::from_secs(3600));
    }
}
