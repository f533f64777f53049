//! HTTP handler functions for the Varun API.

use std::fmt::Display;

use actix_web::{HttpResponse, web};
use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;
use varun_database::{
    Collection, Document, Filter, Sort, find_record, find_records, insert_record,
};
use varun_feasibility::{compute_feasibility, recharge};
use varun_server_models::{
    ApiHealth, ApiRoot, Assessment, AssessmentInput, Booking, BookingCreate, BookingStatus,
    BookingStatusUpdate, CombinedWeather, CoordinateParams, Coordinates, FeasibilityRequest, FeasibilityResult,
    IotHistoryParams, IotReading, IotReadingSubmit, LeaderboardEntry, LoginResponse,
    MessageResponse, Notification, NotificationSend, RechargeQueryParams, RegisterResponse, User,
    UserLogin, UserRegister,
};
use varun_telemetry::{DEFAULT_HISTORY_DAYS, DEFAULT_LITERS_SAVED};

use crate::AppState;
use crate::achievements::{self, COMMUNITY_HERO_RANK, Progress};
use crate::experts;

/// Most assessments or bookings returned per user.
const LIST_LIMIT: u32 = 100;

/// Leaderboard length.
const LEADERBOARD_LIMIT: u32 = 50;

/// Most notifications returned per user.
const NOTIFICATION_LIMIT: u32 = 50;

const SERVICE_NAME: &str = "Varun API - Intelligent Rainwater Harvesting & Recharge Planner";

fn bad_request(message: impl Display) -> HttpResponse {
    HttpResponse::BadRequest().json(serde_json::json!({ "error": message.to_string() }))
}

fn not_found(message: &str) -> HttpResponse {
    HttpResponse::NotFound().json(serde_json::json!({ "error": message }))
}

fn internal_error(context: &str, e: impl Display) -> HttpResponse {
    log::error!("{context}: {e}");
    HttpResponse::InternalServerError().json(serde_json::json!({ "error": context }))
}

fn str_field(doc: &Document, key: &str) -> String {
    doc.get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn coordinates(params: &CoordinateParams) -> Result<Coordinates, HttpResponse> {
    if params.is_valid() {
        Ok(Coordinates {
            latitude: params.latitude,
            longitude: params.longitude,
        })
    } else {
        Err(bad_request(
            "latitude must be within [-90, 90] and longitude within [-180, 180]",
        ))
    }
}

/// `GET /api/`
pub async fn root() -> HttpResponse {
    HttpResponse::Ok().json(ApiRoot {
        message: SERVICE_NAME.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        status: "running".to_string(),
    })
}

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ==================== Users ====================

/// `POST /api/auth/register`
///
/// Creates a user. Emails are unique; the password is not stored.
pub async fn register(state: web::Data<AppState>, body: web::Json<UserRegister>) -> HttpResponse {
    let request = body.into_inner();

    if request.name.trim().is_empty() {
        return bad_request("Name is required");
    }
    if !is_plausible_email(&request.email) {
        return bad_request("A valid email is required");
    }

    match state
        .store
        .count(Collection::Users, &Filter::eq("email", request.email.as_str()))
        .await
    {
        Ok(0) => {}
        Ok(_) => return bad_request("Email already registered"),
        Err(e) => return internal_error("Failed to register user", e),
    }

    let user = User::register(Uuid::new_v4().to_string(), request, Utc::now());

    match insert_record(state.store.as_ref(), Collection::Users, &user).await {
        Ok(()) => {
            log::info!("Registered user {}", user.id);
            HttpResponse::Ok().json(RegisterResponse {
                message: "User registered successfully".to_string(),
                user_id: user.id,
                email: user.email,
            })
        }
        Err(e) => internal_error("Failed to register user", e),
    }
}

fn is_plausible_email(email: &str) -> bool {
    email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'))
}

/// `POST /api/auth/login`
///
/// Looks the user up by email. Passwords are not verified.
pub async fn login(state: web::Data<AppState>, body: web::Json<UserLogin>) -> HttpResponse {
    match state
        .store
        .find_one(Collection::Users, &Filter::eq("email", body.email.as_str()))
        .await
    {
        Ok(Some(user)) => HttpResponse::Ok().json(LoginResponse {
            message: "Login successful".to_string(),
            user_id: str_field(&user, "id"),
            name: str_field(&user, "name"),
            email: str_field(&user, "email"),
        }),
        Ok(None) => not_found("User not found"),
        Err(e) => internal_error("Failed to log in", e),
    }
}

/// `GET /api/user/{id}`
pub async fn get_user(state: web::Data<AppState>, path: web::Path<String>) -> HttpResponse {
    let id = path.into_inner();
    match state
        .store
        .find_one(Collection::Users, &Filter::eq("id", id))
        .await
    {
        Ok(Some(user)) => HttpResponse::Ok().json(user),
        Ok(None) => not_found("User not found"),
        Err(e) => internal_error("Failed to fetch user", e),
    }
}

/// `PUT /api/user/{id}`
///
/// Shallow-merges the body's top-level keys into the user. An `id` key
/// in the body is ignored. A new email must be valid and not belong to
/// another user.
pub async fn update_user(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<Document>,
) -> HttpResponse {
    let id = path.into_inner();

    if let Some(email) = body.get("email") {
        let Some(email) = email.as_str().filter(|e| is_plausible_email(e)) else {
            return bad_request("A valid email is required");
        };
        match state
            .store
            .find_one(Collection::Users, &Filter::eq("email", email))
            .await
        {
            Ok(Some(owner)) if str_field(&owner, "id") != id => {
                return bad_request("Email already registered");
            }
            Ok(_) => {}
            Err(e) => return internal_error("Failed to update user", e),
        }
    }

    match state
        .store
        .update_one(Collection::Users, &Filter::eq("id", id.as_str()), body.into_inner())
        .await
    {
        Ok(true) => {
            log::debug!("Updated user {id}");
            HttpResponse::Ok().json(MessageResponse::new("User updated successfully"))
        }
        Ok(false) => not_found("User not found"),
        Err(e) => internal_error("Failed to update user", e),
    }
}

// ==================== Assessments ====================

/// `POST /api/assessment/submit`
///
/// Stores the assessment and its feasibility result and returns the
/// result. Invalid measurements are rejected before anything is stored.
pub async fn submit_assessment(
    state: web::Data<AppState>,
    body: web::Json<AssessmentInput>,
) -> HttpResponse {
    let input = body.into_inner();

    let report = match compute_feasibility(input.roof_area, input.annual_rainfall, &input.soil_type)
    {
        Ok(report) => report,
        Err(e) => return bad_request(e),
    };
    if let Some(depth) = input
        .groundwater_depth
        .filter(|d| !(d.is_finite() && *d >= 0.0))
    {
        return bad_request(format!(
            "groundwater_depth must be a non-negative number (got {depth})"
        ));
    }

    let now = Utc::now();
    let assessment = Assessment {
        id: Uuid::new_v4().to_string(),
        input,
        created_at: now,
    };
    if let Err(e) = insert_record(state.store.as_ref(), Collection::Assessments, &assessment).await
    {
        return internal_error("Failed to save assessment", e);
    }

    let result = FeasibilityResult {
        id: Uuid::new_v4().to_string(),
        assessment_id: assessment.id,
        report,
        created_at: now,
    };
    match insert_record(state.store.as_ref(), Collection::FeasibilityResults, &result).await {
        Ok(()) => {
            log::info!(
                "Assessment {} for user {}: score {}",
                result.assessment_id,
                assessment.input.user_id,
                result.report.feasibility_score
            );
            HttpResponse::Ok().json(result)
        }
        Err(e) => internal_error("Failed to save feasibility result", e),
    }
}

/// `GET /api/assessment/{id}`
pub async fn get_assessment(state: web::Data<AppState>, path: web::Path<String>) -> HttpResponse {
    let id = path.into_inner();
    match state
        .store
        .find_one(Collection::Assessments, &Filter::eq("id", id))
        .await
    {
        Ok(Some(assessment)) => HttpResponse::Ok().json(assessment),
        Ok(None) => not_found("Assessment not found"),
        Err(e) => internal_error("Failed to fetch assessment", e),
    }
}

/// `GET /api/assessment/user/{user_id}`
pub async fn user_assessments(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> HttpResponse {
    let user_id = path.into_inner();
    match state
        .store
        .find(
            Collection::Assessments,
            &Filter::eq("user_id", user_id),
            None,
            LIST_LIMIT,
        )
        .await
    {
        Ok(assessments) => HttpResponse::Ok().json(assessments),
        Err(e) => internal_error("Failed to fetch assessments", e),
    }
}

/// `POST /api/feasibility/calculate`
///
/// Stateless feasibility report; nothing is stored.
pub async fn calculate_feasibility(body: web::Json<FeasibilityRequest>) -> HttpResponse {
    match compute_feasibility(body.roof_area, body.annual_rainfall, &body.soil_type) {
        Ok(report) => HttpResponse::Ok().json(report),
        Err(e) => bad_request(e),
    }
}

/// `GET /api/recharge/classify`
pub async fn classify_recharge(params: web::Query<RechargeQueryParams>) -> HttpResponse {
    match recharge::classify_recharge(params.groundwater_depth, &params.aquifer) {
        Ok(assessment) => HttpResponse::Ok().json(assessment),
        Err(e) => bad_request(e),
    }
}

// ==================== Dashboard ====================

/// `GET /api/dashboard/{user_id}`
pub async fn dashboard(state: web::Data<AppState>, path: web::Path<String>) -> HttpResponse {
    let user_id = path.into_inner();
    let user = match state
        .store
        .find_one(Collection::Users, &Filter::eq("id", user_id))
        .await
    {
        Ok(Some(user)) => user,
        Ok(None) => return not_found("User not found"),
        Err(e) => return internal_error("Failed to fetch dashboard", e),
    };

    let total = user
        .get("total_liters_saved")
        .and_then(Value::as_f64)
        .unwrap_or(DEFAULT_LITERS_SAVED);

    HttpResponse::Ok().json(state.with_rng(|rng| varun_telemetry::dashboard(rng, total)))
}

// ==================== Weather ====================

/// `GET /api/weather/current`
pub async fn weather_current(
    state: web::Data<AppState>,
    params: web::Query<CoordinateParams>,
) -> HttpResponse {
    let location = match coordinates(&params) {
        Ok(location) => location,
        Err(response) => return response,
    };
    HttpResponse::Ok().json(
        state
            .weather
            .current_weather(location.latitude, location.longitude)
            .await,
    )
}

/// `GET /api/weather/aqi`
pub async fn weather_aqi(
    state: web::Data<AppState>,
    params: web::Query<CoordinateParams>,
) -> HttpResponse {
    let location = match coordinates(&params) {
        Ok(location) => location,
        Err(response) => return response,
    };
    HttpResponse::Ok().json(
        state
            .weather
            .air_quality(location.latitude, location.longitude)
            .await,
    )
}

/// `GET /api/weather/combined`
///
/// Fetches weather and air quality concurrently.
pub async fn weather_combined(
    state: web::Data<AppState>,
    params: web::Query<CoordinateParams>,
) -> HttpResponse {
    let location = match coordinates(&params) {
        Ok(location) => location,
        Err(response) => return response,
    };
    let (weather, aqi) = tokio::join!(
        state
            .weather
            .current_weather(location.latitude, location.longitude),
        state.weather.air_quality(location.latitude, location.longitude),
    );
    HttpResponse::Ok().json(CombinedWeather {
        weather,
        aqi,
        location,
    })
}

// ==================== Regional data ====================

/// `GET /api/data/rainfall/{location}`
pub async fn rainfall_data(state: web::Data<AppState>, path: web::Path<String>) -> HttpResponse {
    let now = Utc::now();
    HttpResponse::Ok().json(state.with_rng(|rng| varun_telemetry::rainfall(rng, &path, now)))
}

/// `GET /api/data/groundwater/{location}`
pub async fn groundwater_data(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> HttpResponse {
    let now = Utc::now();
    HttpResponse::Ok().json(state.with_rng(|rng| varun_telemetry::groundwater(rng, &path, now)))
}

/// `GET /api/data/soil/{location}`
pub async fn soil_data(state: web::Data<AppState>, path: web::Path<String>) -> HttpResponse {
    let now = Utc::now();
    HttpResponse::Ok().json(state.with_rng(|rng| varun_telemetry::soil(rng, &path, now)))
}

// ==================== Experts & bookings ====================

/// `GET /api/experts`
pub async fn experts() -> HttpResponse {
    HttpResponse::Ok().json(experts::all_experts())
}

/// `POST /api/booking/create`
pub async fn create_booking(
    state: web::Data<AppState>,
    body: web::Json<BookingCreate>,
) -> HttpResponse {
    let request = body.into_inner();
    let Some(expert) = experts::find_expert(&request.expert_id) else {
        return not_found("Expert not found");
    };

    let booking = Booking {
        id: Uuid::new_v4().to_string(),
        user_id: request.user_id,
        expert_id: expert.id,
        expert_name: expert.name,
        scheduled_date: request.preferred_date,
        status: BookingStatus::Pending,
        notes: request.notes,
        created_at: Utc::now(),
    };

    match insert_record(state.store.as_ref(), Collection::Bookings, &booking).await {
        Ok(()) => {
            log::info!(
                "Booked {} for user {} on {}",
                booking.expert_name,
                booking.user_id,
                booking.scheduled_date
            );
            HttpResponse::Ok().json(booking)
        }
        Err(e) => internal_error("Failed to create booking", e),
    }
}

/// `GET /api/booking/user/{user_id}`
pub async fn user_bookings(state: web::Data<AppState>, path: web::Path<String>) -> HttpResponse {
    let user_id = path.into_inner();
    match find_records::<Booking>(
        state.store.as_ref(),
        Collection::Bookings,
        &Filter::eq("user_id", user_id),
        None,
        LIST_LIMIT,
    )
    .await
    {
        Ok(bookings) => HttpResponse::Ok().json(bookings),
        Err(e) => internal_error("Failed to fetch bookings", e),
    }
}

/// `GET /api/booking/{id}`
pub async fn get_booking(state: web::Data<AppState>, path: web::Path<String>) -> HttpResponse {
    let id = path.into_inner();
    match find_record::<Booking>(
        state.store.as_ref(),
        Collection::Bookings,
        &Filter::eq("id", id),
    )
    .await
    {
        Ok(Some(booking)) => HttpResponse::Ok().json(booking),
        Ok(None) => not_found("Booking not found"),
        Err(e) => internal_error("Failed to fetch booking", e),
    }
}

/// `PUT /api/booking/{id}/status`
pub async fn update_booking_status(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<BookingStatusUpdate>,
) -> HttpResponse {
    transition_booking(&state, &path.into_inner(), body.status).await
}

/// `PUT /api/booking/{id}/cancel`
pub async fn cancel_booking(state: web::Data<AppState>, path: web::Path<String>) -> HttpResponse {
    transition_booking(&state, &path.into_inner(), BookingStatus::Cancelled).await
}

/// Moves a booking to `next` and returns the updated booking.
///
/// The update only applies while the stored status is still the one that
/// was checked; a concurrent change yields 409.
async fn transition_booking(state: &AppState, id: &str, next: BookingStatus) -> HttpResponse {
    let booking = match find_record::<Booking>(
        state.store.as_ref(),
        Collection::Bookings,
        &Filter::eq("id", id),
    )
    .await
    {
        Ok(Some(booking)) => booking,
        Ok(None) => return not_found("Booking not found"),
        Err(e) => return internal_error("Failed to fetch booking", e),
    };

    if !booking.status.can_become(next) {
        return bad_request(format!(
            "Booking is {} and cannot become {next}",
            booking.status
        ));
    }

    let mut set = Document::new();
    set.insert("status".to_string(), Value::String(next.to_string()));
    let filter = Filter::eq("id", id).and("status", booking.status.to_string());

    match state
        .store
        .update_one(Collection::Bookings, &filter, set)
        .await
    {
        Ok(true) => {
            log::info!("Booking {id}: {} -> {next}", booking.status);
            HttpResponse::Ok().json(Booking {
                status: next,
                ..booking
            })
        }
        Ok(false) => HttpResponse::Conflict()
            .json(serde_json::json!({ "error": "Booking was modified concurrently" })),
        Err(e) => internal_error("Failed to update booking", e),
    }
}

// ==================== IoT ====================

/// `POST /api/iot/data`
///
/// Stores a sensor reading. Rates must be non-negative and the tank
/// level within 0-100 %.
pub async fn submit_iot_data(
    state: web::Data<AppState>,
    body: web::Json<IotReadingSubmit>,
) -> HttpResponse {
    let submit = body.into_inner();

    for (field, value) in [
        ("rain_intensity", submit.rain_intensity),
        ("infiltration_rate", submit.infiltration_rate),
        ("tank_level", submit.tank_level),
    ] {
        if !(value.is_finite() && value >= 0.0) {
            return bad_request(format!("{field} must be a non-negative number (got {value})"));
        }
    }
    if submit.tank_level > 100.0 {
        return bad_request(format!(
            "tank_level must be at most 100 (got {})",
            submit.tank_level
        ));
    }

    let reading = IotReading {
        id: Uuid::new_v4().to_string(),
        user_id: submit.user_id,
        rain_intensity: submit.rain_intensity,
        tank_level: submit.tank_level,
        infiltration_rate: submit.infiltration_rate,
        timestamp: submit.timestamp.unwrap_or_else(Utc::now),
    };

    match insert_record(state.store.as_ref(), Collection::IotReadings, &reading).await {
        Ok(()) => {
            log::debug!("Stored IoT reading {} for user {}", reading.id, reading.user_id);
            HttpResponse::Ok().json(reading)
        }
        Err(e) => internal_error("Failed to store IoT reading", e),
    }
}

/// `GET /api/iot/data/{user_id}`
///
/// Latest stored reading for the user, or a simulated one if the user
/// has no sensor data yet.
pub async fn iot_data(state: web::Data<AppState>, path: web::Path<String>) -> HttpResponse {
    let user_id = path.into_inner();
    let latest = find_records::<IotReading>(
        state.store.as_ref(),
        Collection::IotReadings,
        &Filter::eq("user_id", user_id.as_str()),
        Some(&Sort::desc("timestamp")),
        1,
    )
    .await;

    match latest {
        Ok(readings) => {
            let reading = readings.into_iter().next().unwrap_or_else(|| {
                log::debug!("No stored IoT readings for {user_id}, simulating");
                state.with_rng(|rng| varun_telemetry::iot_reading(rng, &user_id, Utc::now()))
            });
            HttpResponse::Ok().json(reading)
        }
        Err(e) => internal_error("Failed to fetch IoT data", e),
    }
}

/// `GET /api/iot/history/{user_id}?days=N`
pub async fn iot_history(
    state: web::Data<AppState>,
    path: web::Path<String>,
    params: web::Query<IotHistoryParams>,
) -> HttpResponse {
    let days = params.days.unwrap_or(DEFAULT_HISTORY_DAYS);
    log::debug!("Simulating {days} days of IoT history for {}", path.as_str());
    let now = Utc::now();
    HttpResponse::Ok().json(state.with_rng(|rng| varun_telemetry::iot_history(rng, days, now)))
}

// ==================== Community ====================

fn leaderboard_entry(rank: u32, user: &Document) -> LeaderboardEntry {
    LeaderboardEntry {
        rank,
        user_id: str_field(user, "id"),
        name: str_field(user, "name"),
        liters_saved: user
            .get("total_liters_saved")
            .and_then(Value::as_f64)
            .unwrap_or(0.0),
        badges: user
            .get("badges_earned")
            .and_then(Value::as_u64)
            .map_or(0, |b| u32::try_from(b).unwrap_or(u32::MAX)),
    }
}

/// `GET /api/community/leaderboard`
pub async fn leaderboard(state: web::Data<AppState>) -> HttpResponse {
    match state
        .store
        .find(
            Collection::Users,
            &Filter::all(),
            Some(&Sort::desc("total_liters_saved")),
            LEADERBOARD_LIMIT,
        )
        .await
    {
        Ok(users) => {
            let entries: Vec<LeaderboardEntry> = (1..)
                .zip(users.iter())
                .map(|(rank, user)| leaderboard_entry(rank, user))
                .collect();
            HttpResponse::Ok().json(entries)
        }
        Err(e) => internal_error("Failed to fetch leaderboard", e),
    }
}

/// `GET /api/community/stats`
pub async fn community_stats(state: web::Data<AppState>) -> HttpResponse {
    match state.store.count(Collection::Users, &Filter::all()).await {
        Ok(total_users) => HttpResponse::Ok()
            .json(state.with_rng(|rng| varun_telemetry::community_stats(rng, total_users))),
        Err(e) => internal_error("Failed to fetch community stats", e),
    }
}

/// `GET /api/achievements/{user_id}`
pub async fn achievements(state: web::Data<AppState>, path: web::Path<String>) -> HttpResponse {
    let user_id = path.into_inner();
    let user = match state
        .store
        .find_one(Collection::Users, &Filter::eq("id", user_id.as_str()))
        .await
    {
        Ok(Some(user)) => user,
        Ok(None) => return not_found("User not found"),
        Err(e) => return internal_error("Failed to fetch achievements", e),
    };

    let top = match state
        .store
        .find(
            Collection::Users,
            &Filter::all(),
            Some(&Sort::desc("total_liters_saved")),
            COMMUNITY_HERO_RANK,
        )
        .await
    {
        Ok(top) => top,
        Err(e) => return internal_error("Failed to fetch achievements", e),
    };

    let progress = Progress {
        liters_saved: user
            .get("total_liters_saved")
            .and_then(Value::as_f64)
            .unwrap_or(0.0),
        streak_days: user
            .get("streak_days")
            .and_then(Value::as_u64)
            .map_or(0, |d| u32::try_from(d).unwrap_or(u32::MAX)),
        top_ranked: top.iter().any(|u| str_field(u, "id") == user_id),
    };

    HttpResponse::Ok().json(achievements::badges(progress))
}

// ==================== Notifications ====================

/// `GET /api/notifications/{user_id}`
///
/// Newest first.
pub async fn notifications(state: web::Data<AppState>, path: web::Path<String>) -> HttpResponse {
    let user_id = path.into_inner();
    match find_records::<Notification>(
        state.store.as_ref(),
        Collection::Notifications,
        &Filter::eq("user_id", user_id),
        Some(&Sort::desc("created_at")),
        NOTIFICATION_LIMIT,
    )
    .await
    {
        Ok(notifications) => HttpResponse::Ok().json(notifications),
        Err(e) => internal_error("Failed to fetch notifications", e),
    }
}

/// `POST /api/notifications/send`
pub async fn send_notification(
    state: web::Data<AppState>,
    body: web::Json<NotificationSend>,
) -> HttpResponse {
    let send = body.into_inner();
    let notification = Notification {
        id: Uuid::new_v4().to_string(),
        user_id: send.user_id,
        title: send.title,
        message: send.message,
        kind: send.kind,
        read: false,
        created_at: Utc::now(),
    };

    match insert_record(state.store.as_ref(), Collection::Notifications, &notification).await {
        Ok(()) => {
            log::debug!(
                "Sent notification {} to user {}",
                notification.id,
                notification.user_id
            );
            HttpResponse::Ok().json(MessageResponse::new("Notification sent successfully"))
        }
        Err(e) => internal_error("Failed to send notification", e),
    }
}

/// `PUT /api/notifications/{id}/read`
pub async fn mark_notification_read(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> HttpResponse {
    let id = path.into_inner();
    let mut set = Document::new();
    set.insert("read".to_string(), Value::Bool(true));

    match state
        .store
        .update_one(Collection::Notifications, &Filter::eq("id", id), set)
        .await
    {
        Ok(true) => HttpResponse::Ok().json(MessageResponse::new("Notification marked as read")),
        Ok(false) => not_found("Notification not found"),
        Err(e) => internal_error("Failed to update notification", e),
    }
}
