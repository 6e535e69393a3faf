use std::sync::Arc;

use actix_web::{HttpRequest, HttpResponse, Responder, get, post, web};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::app::processor::{EventProcessor, ProcessError, SystemClock, TransitionResult};
use crate::app::services::{
    SessionStore, SlotStore, SqliteParkingStore, StoreError, ZoneDirectory,
};
use crate::domain::fee::{FeeBreakdown, FeeError, Role, calculate_fee};
use crate::domain::models::{SessionRecord, SlotRecord, ZoneRecord};
use crate::domain::monitor::zone_availability;
use crate::domain::sensor_report::SensorReport;
use crate::domain::slot_status::{TimestampMs, parse_timestamp_ms, timestamp_to_rfc3339};

const SENSOR_API_KEY_HEADER: &str = "x-api-key";

#[derive(Clone)]
pub struct ApiState {
    pub store: SqliteParkingStore,
    pub processor: Arc<EventProcessor<SqliteParkingStore, SystemClock>>,
    pub sensor_api_key: String,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SlotResponse {
    pub id: String,
    pub label: String,
    pub sensor_id: String,
    pub zone_id: String,
    pub status: String,
    pub last_updated: String,
}

impl From<SlotRecord> for SlotResponse {
    fn from(slot: SlotRecord) -> Self {
        Self {
            id: slot.id,
            label: slot.label,
            sensor_id: slot.sensor_id,
            zone_id: slot.zone_id,
            status: slot.status.as_str().to_string(),
            last_updated: slot.last_updated,
        }
    }
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ZoneAvailabilityResponse {
    pub total: usize,
    pub free: usize,
    pub occupied: usize,
    pub unknown: usize,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ZoneResponse {
    pub id: String,
    pub name: String,
    pub hourly_rate: i64,
    pub availability: ZoneAvailabilityResponse,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub id: String,
    pub slot_id: String,
    pub user_id: Option<String>,
    pub entry_time: String,
    pub exit_time: Option<String>,
    pub amount_due: Option<i64>,
    pub is_active: bool,
}

impl From<SessionRecord> for SessionResponse {
    fn from(session: SessionRecord) -> Self {
        Self {
            id: session.id,
            slot_id: session.slot_id,
            user_id: session.user_id,
            entry_time: session.entry_time,
            exit_time: session.exit_time,
            amount_due: session.amount_due,
            is_active: session.is_active,
        }
    }
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FeeResponse {
    pub duration_hours: i64,
    pub base_fee: i64,
    pub discount: i64,
    pub total_fee: i64,
}

impl From<FeeBreakdown> for FeeResponse {
    fn from(fee: FeeBreakdown) -> Self {
        Self {
            duration_hours: fee.duration_hours,
            base_fee: fee.base_fee,
            discount: fee.discount,
            total_fee: fee.total_fee,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionResponse {
    pub slot_id: String,
    pub sensor_id: String,
    pub previous_status: String,
    pub new_status: String,
    pub transition: String,
    pub session: Option<SessionResponse>,
    pub fee: Option<FeeResponse>,
}

impl From<TransitionResult> for TransitionResponse {
    fn from(result: TransitionResult) -> Self {
        Self {
            slot_id: result.slot_id,
            sensor_id: result.sensor_id,
            previous_status: result.previous_status.as_str().to_string(),
            new_status: result.new_status.as_str().to_string(),
            transition: result.transition.as_str().to_string(),
            session: result.session.map(SessionResponse::from),
            fee: result.fee.map(FeeResponse::from),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloseSessionRequest {
    pub role: Option<String>,
    pub exit_time: Option<String>,
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(health)
        .service(update_sensor_endpoint)
        .service(list_slots_endpoint)
        .service(list_zones_endpoint)
        .service(list_sessions_endpoint)
        .service(list_active_sessions_endpoint)
        .service(close_session_endpoint);
}

#[get("/health")]
async fn health() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

#[post("/sensors/update")]
async fn update_sensor_endpoint(
    state: web::Data<ApiState>,
    request: HttpRequest,
    body: web::Json<Value>,
) -> impl Responder {
    if !sensor_key_matches(&request, &state.sensor_api_key) {
        return HttpResponse::Unauthorized().json(serde_json::json!({
            "error": "missing or invalid sensor api key"
        }));
    }

    let report = match SensorReport::from_value(&body) {
        Ok(report) => report,
        Err(error) => {
            return HttpResponse::BadRequest().json(serde_json::json!({
                "error": error.to_string()
            }));
        }
    };

    match state.processor.process_report(&report) {
        Ok(result) => HttpResponse::Ok().json(TransitionResponse::from(result)),
        Err(error) => process_error_response(error),
    }
}

#[get("/slots")]
async fn list_slots_endpoint(state: web::Data<ApiState>) -> impl Responder {
    match state.store.list_slots() {
        Ok(slots) => {
            let mapped: Vec<SlotResponse> = slots.into_iter().map(SlotResponse::from).collect();
            HttpResponse::Ok().json(mapped)
        }
        Err(error) => store_error_response(error),
    }
}

#[get("/zones")]
async fn list_zones_endpoint(state: web::Data<ApiState>) -> impl Responder {
    let zones = match state.store.list_zones() {
        Ok(zones) => zones,
        Err(error) => return store_error_response(error),
    };
    let slots = match state.store.list_slots() {
        Ok(slots) => slots,
        Err(error) => return store_error_response(error),
    };

    let mapped: Vec<ZoneResponse> = zones.into_iter().map(|zone| zone_response(zone, &slots)).collect();
    HttpResponse::Ok().json(mapped)
}

fn zone_response(zone: ZoneRecord, slots: &[SlotRecord]) -> ZoneResponse {
    let availability = zone_availability(slots, &zone.id);
    ZoneResponse {
        id: zone.id,
        name: zone.name,
        hourly_rate: zone.hourly_rate,
        availability: ZoneAvailabilityResponse {
            total: availability.total,
            free: availability.free,
            occupied: availability.occupied,
            unknown: availability.unknown,
        },
    }
}

#[get("/sessions")]
async fn list_sessions_endpoint(
    state: web::Data<ApiState>,
    query: web::Query<ListQuery>,
) -> impl Responder {
    let limit = query.limit.unwrap_or(50).clamp(1, 500);
    let offset = query.offset.unwrap_or(0);

    match state.store.list_sessions(limit, offset) {
        Ok(sessions) => {
            let mapped: Vec<SessionResponse> =
                sessions.into_iter().map(SessionResponse::from).collect();
            HttpResponse::Ok().json(mapped)
        }
        Err(error) => store_error_response(error),
    }
}

#[get("/sessions/active")]
async fn list_active_sessions_endpoint(state: web::Data<ApiState>) -> impl Responder {
    match state.store.list_active_sessions() {
        Ok(sessions) => {
            let mapped: Vec<SessionResponse> =
                sessions.into_iter().map(SessionResponse::from).collect();
            HttpResponse::Ok().json(mapped)
        }
        Err(error) => store_error_response(error),
    }
}

/// Out-of-band close for attendants: bills with the caller-supplied role
/// instead of the anonymous visitor rate the sensor path uses. The slot's
/// status is left to the sensors; the eventual occupied→free report lands as
/// a tolerated dangling exit.
#[post("/sessions/{id}/close")]
async fn close_session_endpoint(
    state: web::Data<ApiState>,
    path: web::Path<String>,
    body: web::Json<CloseSessionRequest>,
) -> impl Responder {
    let session_id = path.into_inner();

    let session = match state.store.get_session(&session_id) {
        Ok(Some(session)) => session,
        Ok(None) => {
            return HttpResponse::NotFound().json(serde_json::json!({
                "error": format!("session {session_id} not found")
            }));
        }
        Err(error) => return store_error_response(error),
    };

    if !session.is_active {
        return HttpResponse::Conflict().json(serde_json::json!({
            "error": "session is already closed"
        }));
    }

    let Some(entry_time) = parse_timestamp_ms(&session.entry_time) else {
        return HttpResponse::InternalServerError().json(serde_json::json!({
            "error": "stored entry time is not a valid timestamp"
        }));
    };

    let exit_time = match &body.exit_time {
        Some(raw) => match parse_timestamp_ms(raw) {
            Some(parsed) => parsed,
            None => {
                return HttpResponse::BadRequest().json(serde_json::json!({
                    "error": format!("invalid timestamp: {raw}")
                }));
            }
        },
        None => TimestampMs(Utc::now().timestamp_millis()),
    };

    let hourly_rate = match state.store.hourly_rate_for_slot(&session.slot_id) {
        Ok(Some(rate)) => rate,
        Ok(None) => {
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "hourly rate unavailable for slot"
            }));
        }
        Err(error) => return store_error_response(error),
    };

    let role = body.role.as_deref().and_then(Role::parse);

    let fee = match calculate_fee(entry_time, exit_time, hourly_rate, role) {
        Ok(fee) => fee,
        Err(FeeError::InvalidInterval) => {
            return HttpResponse::BadRequest().json(serde_json::json!({
                "error": "exit time cannot be before entry time"
            }));
        }
    };

    match state.store.close_session(
        &session.id,
        &timestamp_to_rfc3339(exit_time),
        fee.total_fee,
    ) {
        Ok(closed) => HttpResponse::Ok().json(serde_json::json!({
            "session": SessionResponse::from(closed),
            "fee": FeeResponse::from(fee),
        })),
        Err(error) => store_error_response(error),
    }
}

fn sensor_key_matches(request: &HttpRequest, expected: &str) -> bool {
    request
        .headers()
        .get(SENSOR_API_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(|value| value == expected)
        .unwrap_or(false)
}

fn process_error_response(error: ProcessError) -> HttpResponse {
    if error.is_transient() {
        return HttpResponse::ServiceUnavailable().json(serde_json::json!({
            "error": error.to_string()
        }));
    }

    match &error {
        ProcessError::UnknownSensor(_) => HttpResponse::NotFound().json(serde_json::json!({
            "error": error.to_string()
        })),
        _ if error.is_caller_error() => HttpResponse::BadRequest().json(serde_json::json!({
            "error": error.to_string()
        })),
        _ => HttpResponse::InternalServerError().json(serde_json::json!({
            "error": error.to_string()
        })),
    }
}

fn store_error_response(error: StoreError) -> HttpResponse {
    match &error {
        StoreError::NotFound(_) => HttpResponse::NotFound().json(serde_json::json!({
            "error": error.to_string()
        })),
        StoreError::Conflict(_) => HttpResponse::Conflict().json(serde_json::json!({
            "error": error.to_string()
        })),
        StoreError::LockPoisoned | StoreError::Database(_) => HttpResponse::ServiceUnavailable()
            .json(serde_json::json!({
                "error": error.to_string()
            })),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use actix_web::{App, body::to_bytes, http::StatusCode, test, web};

    use crate::app::processor::{EventProcessor, SystemClock};
    use crate::app::services::SqliteParkingStore;
    use crate::test_support::open_test_connection;

    use super::{ApiState, configure_routes};

    const TEST_SENSOR_KEY: &str = "secret-sensor-key";

    fn build_state(name: &str) -> ApiState {
        let connection = open_test_connection(name);
        let shared_connection = Arc::new(Mutex::new(connection));
        let store = SqliteParkingStore::new(Arc::clone(&shared_connection));
        let processor = Arc::new(EventProcessor::new(
            Arc::new(store.clone()),
            SystemClock,
            5000,
        ));

        ApiState {
            store,
            processor,
            sensor_api_key: TEST_SENSOR_KEY.to_string(),
        }
    }

    async fn json_body(resp: actix_web::dev::ServiceResponse) -> serde_json::Value {
        let body = to_bytes(resp.into_body())
            .await
            .expect("body should be readable");
        serde_json::from_slice(&body).expect("body should be json")
    }

    fn sensor_update(sensor_id: &str, status: &str) -> test::TestRequest {
        test::TestRequest::post()
            .uri("/sensors/update")
            .insert_header(("x-api-key", TEST_SENSOR_KEY))
            .set_json(serde_json::json!({ "sensor_id": sensor_id, "status": status }))
    }

    #[actix_web::test]
    async fn health_endpoint_returns_ok() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(build_state("health.sqlite")))
                .configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::get().uri("/health").to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn sensor_update_requires_api_key() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(build_state("auth-missing.sqlite")))
                .configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/sensors/update")
            .set_json(serde_json::json!({ "sensor_id": "S-A1", "status": "occupied" }))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn sensor_update_rejects_wrong_api_key() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(build_state("auth-wrong.sqlite")))
                .configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/sensors/update")
            .insert_header(("x-api-key", "not-the-key"))
            .set_json(serde_json::json!({ "sensor_id": "S-A1", "status": "occupied" }))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn sensor_update_rejects_missing_fields() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(build_state("missing-fields.sqlite")))
                .configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/sensors/update")
            .insert_header(("x-api-key", TEST_SENSOR_KEY))
            .set_json(serde_json::json!({ "status": "occupied" }))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let json = json_body(resp).await;
        assert_eq!(json["error"], "missing required field: sensor_id");
    }

    #[actix_web::test]
    async fn sensor_update_rejects_unknown_status() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(build_state("bad-status.sqlite")))
                .configure(configure_routes),
        )
        .await;

        let resp =
            test::call_service(&app, sensor_update("S-A1", "reserved").to_request()).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn sensor_update_rejects_unmapped_sensor() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(build_state("unknown-sensor.sqlite")))
                .configure(configure_routes),
        )
        .await;

        let resp =
            test::call_service(&app, sensor_update("S-ZZZ", "OCCUPIED").to_request()).await;

        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn entry_then_exit_closes_session_with_fee() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(build_state("entry-exit.sqlite")))
                .configure(configure_routes),
        )
        .await;

        // Seeded slots start unknown; bring S-A1 to free first.
        let resp = test::call_service(&app, sensor_update("S-A1", "free").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = test::call_service(&app, sensor_update("S-A1", "occupied").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let json = json_body(resp).await;
        assert_eq!(json["transition"], "entry");
        assert_eq!(json["previousStatus"], "free");
        assert_eq!(json["newStatus"], "occupied");
        assert_eq!(json["session"]["isActive"], true);
        assert_eq!(json["session"]["userId"], serde_json::Value::Null);

        let resp = test::call_service(&app, sensor_update("S-A1", "free").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let json = json_body(resp).await;
        assert_eq!(json["transition"], "exit");
        assert_eq!(json["session"]["isActive"], false);
        // Sub-hour stay in Zone A (rate 5000), billed as visitor.
        assert_eq!(json["fee"]["durationHours"], 1);
        assert_eq!(json["fee"]["baseFee"], 5000);
        assert_eq!(json["fee"]["totalFee"], 6000);
        assert_eq!(json["fee"]["discount"], -1000);
        assert_eq!(json["session"]["amountDue"], 6000);
    }

    #[actix_web::test]
    async fn duplicate_report_is_no_change() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(build_state("duplicate.sqlite")))
                .configure(configure_routes),
        )
        .await;

        test::call_service(&app, sensor_update("S-A1", "free").to_request()).await;
        let resp = test::call_service(&app, sensor_update("S-A1", "free").to_request()).await;

        assert_eq!(resp.status(), StatusCode::OK);
        let json = json_body(resp).await;
        assert_eq!(json["transition"], "no_change");
        assert_eq!(json["session"], serde_json::Value::Null);
    }

    #[actix_web::test]
    async fn slots_endpoint_reflects_status_changes() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(build_state("slots.sqlite")))
                .configure(configure_routes),
        )
        .await;

        test::call_service(&app, sensor_update("S-B3", "occupied").to_request()).await;

        let req = test::TestRequest::get().uri("/slots").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let json = json_body(resp).await;
        let slots = json.as_array().expect("response should be an array");
        assert_eq!(slots.len(), 15);

        let b3 = slots
            .iter()
            .find(|slot| slot["sensorId"] == "S-B3")
            .expect("slot S-B3 should exist");
        assert_eq!(b3["status"], "occupied");
    }

    #[actix_web::test]
    async fn zones_endpoint_reports_availability() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(build_state("zones.sqlite")))
                .configure(configure_routes),
        )
        .await;

        test::call_service(&app, sensor_update("S-A1", "free").to_request()).await;
        test::call_service(&app, sensor_update("S-A2", "occupied").to_request()).await;

        let req = test::TestRequest::get().uri("/zones").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let json = json_body(resp).await;
        let zones = json.as_array().expect("response should be an array");
        assert_eq!(zones.len(), 3);

        let zone_a = zones
            .iter()
            .find(|zone| zone["name"] == "Zone A - Main Gate")
            .expect("zone A should exist");
        assert_eq!(zone_a["hourlyRate"], 5000);
        assert_eq!(zone_a["availability"]["total"], 5);
        assert_eq!(zone_a["availability"]["free"], 1);
        assert_eq!(zone_a["availability"]["occupied"], 1);
        assert_eq!(zone_a["availability"]["unknown"], 3);
    }

    #[actix_web::test]
    async fn sessions_endpoints_list_open_and_closed() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(build_state("sessions.sqlite")))
                .configure(configure_routes),
        )
        .await;

        test::call_service(&app, sensor_update("S-A1", "free").to_request()).await;
        test::call_service(&app, sensor_update("S-A1", "occupied").to_request()).await;

        let req = test::TestRequest::get().uri("/sessions/active").to_request();
        let resp = test::call_service(&app, req).await;
        let json = json_body(resp).await;
        let active = json.as_array().expect("response should be an array");
        assert_eq!(active.len(), 1);
        assert_eq!(active[0]["isActive"], true);

        test::call_service(&app, sensor_update("S-A1", "free").to_request()).await;

        let req = test::TestRequest::get().uri("/sessions/active").to_request();
        let resp = test::call_service(&app, req).await;
        let json = json_body(resp).await;
        assert_eq!(json.as_array().expect("array").len(), 0);

        let req = test::TestRequest::get()
            .uri("/sessions?limit=10&offset=0")
            .to_request();
        let resp = test::call_service(&app, req).await;
        let json = json_body(resp).await;
        let sessions = json.as_array().expect("response should be an array");
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0]["isActive"], false);
    }

    #[actix_web::test]
    async fn manual_close_bills_with_caller_role() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(build_state("manual-close.sqlite")))
                .configure(configure_routes),
        )
        .await;

        test::call_service(&app, sensor_update("S-A1", "free").to_request()).await;
        let resp = test::call_service(&app, sensor_update("S-A1", "occupied").to_request()).await;
        let json = json_body(resp).await;
        let session_id = json["session"]["id"]
            .as_str()
            .expect("session id should be a string")
            .to_string();

        let req = test::TestRequest::post()
            .uri(&format!("/sessions/{session_id}/close"))
            .set_json(serde_json::json!({ "role": "faculty" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let json = json_body(resp).await;
        assert_eq!(json["fee"]["durationHours"], 1);
        assert_eq!(json["fee"]["baseFee"], 5000);
        assert_eq!(json["fee"]["totalFee"], 2500);
        assert_eq!(json["fee"]["discount"], 2500);
        assert_eq!(json["session"]["isActive"], false);

        // The sensor has not noticed yet; its eventual free report is a
        // tolerated dangling exit.
        let resp = test::call_service(&app, sensor_update("S-A1", "free").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let json = json_body(resp).await;
        assert_eq!(json["transition"], "no_change");
    }

    #[actix_web::test]
    async fn manual_close_of_closed_session_conflicts() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(build_state("manual-close-twice.sqlite")))
                .configure(configure_routes),
        )
        .await;

        test::call_service(&app, sensor_update("S-A1", "free").to_request()).await;
        let resp = test::call_service(&app, sensor_update("S-A1", "occupied").to_request()).await;
        let json = json_body(resp).await;
        let session_id = json["session"]["id"]
            .as_str()
            .expect("session id should be a string")
            .to_string();

        let req = test::TestRequest::post()
            .uri(&format!("/sessions/{session_id}/close"))
            .set_json(serde_json::json!({ "role": "student" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let req = test::TestRequest::post()
            .uri(&format!("/sessions/{session_id}/close"))
            .set_json(serde_json::json!({ "role": "student" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);
    }

    #[actix_web::test]
    async fn manual_close_of_unknown_session_is_not_found() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(build_state("manual-close-missing.sqlite")))
                .configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/sessions/no-such-session/close")
            .set_json(serde_json::json!({}))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
