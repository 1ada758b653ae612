use std::sync::Arc;

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::api::{APIResponse, LocationParams};
use crate::error::ApiError;
use crate::proximity::rank_by_distance;
use crate::repository::{SchoolRepository, StoreError};
use crate::validate::{
    SchoolInput, ValidationError, parse_school_id, validate_school, validate_user_location,
};

#[derive(Clone)]
pub struct AppState {
    pub schools: Arc<dyn SchoolRepository>,
    /// Include raw storage errors in 500 bodies. Off in production.
    pub expose_errors: bool,
}

impl AppState {
    pub fn new(schools: Arc<dyn SchoolRepository>, expose_errors: bool) -> Self {
        Self {
            schools,
            expose_errors,
        }
    }

    fn storage_error(&self, message: &'static str) -> impl FnOnce(StoreError) -> ApiError {
        let expose = self.expose_errors;
        move |source| ApiError::Storage {
            message,
            source,
            expose,
        }
    }
}

fn read_id(path: Result<Path<String>, PathRejection>) -> Result<i64, ApiError> {
    let Path(raw) = path.map_err(|_| ValidationError::InvalidId)?;
    Ok(parse_school_id(&raw)?)
}

fn read_body(body: Result<Json<SchoolInput>, JsonRejection>) -> Result<SchoolInput, ApiError> {
    body.map(|Json(input)| input)
        .map_err(|rejection| ApiError::MalformedBody(rejection.body_text()))
}

pub async fn healthcheck(State(state): State<AppState>) -> Response {
    tracing::info!("got healthcheck request");
    let timestamp = chrono::Utc::now().to_rfc3339();

    match state.schools.ping().await {
        Ok(()) => {
            let mut body = APIResponse::new_from_msg("School Management API is running");
            body.timestamp = Some(timestamp);
            body.database = Some("connected");
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "healthcheck failed to reach database");
            let mut body = APIResponse::failure("Database connection failed");
            body.timestamp = Some(timestamp);
            body.database = Some("disconnected");
            if state.expose_errors {
                body.error = Some(e.to_string());
            }
            (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
        }
    }
}

pub async fn add_school(
    State(state): State<AppState>,
    body: Result<Json<SchoolInput>, JsonRejection>,
) -> Result<Response, ApiError> {
    let school = validate_school(&read_body(body)?)?;

    let created = state
        .schools
        .insert(&school)
        .await
        .map_err(state.storage_error("Failed to add school to database"))?;

    tracing::info!(id = created.id, "school added");
    let response = APIResponse::new_with_data("School added successfully", created);
    Ok((StatusCode::CREATED, Json(response)).into_response())
}

pub async fn list_schools(
    State(state): State<AppState>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(pairs) = query.map_err(|rejection| ApiError::MalformedQuery(rejection.body_text()))?;
    let params = LocationParams::from_pairs(pairs);
    let user = validate_user_location(params.latitude.as_deref(), params.longitude.as_deref())?;

    let schools = state
        .schools
        .get_all()
        .await
        .map_err(state.storage_error("Failed to fetch schools from database"))?;

    let ranked = rank_by_distance(user, schools);
    let count = ranked.len();
    tracing::info!(count, "listed schools by proximity");

    let mut response = APIResponse::new_with_data("Schools retrieved and sorted by proximity", ranked);
    response.count = Some(count);
    response.user_location = Some(user);
    Ok((StatusCode::OK, Json(response)).into_response())
}

pub async fn get_school(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Response, ApiError> {
    let id = read_id(path)?;

    let school = state
        .schools
        .get_by_id(id)
        .await
        .map_err(state.storage_error("Failed to fetch school from database"))?
        .ok_or(ApiError::NotFound)?;

    let response = APIResponse::new_with_data("School retrieved successfully", school);
    Ok((StatusCode::OK, Json(response)).into_response())
}

pub async fn update_school(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
    body: Result<Json<SchoolInput>, JsonRejection>,
) -> Result<Response, ApiError> {
    let id = read_id(path)?;
    let school = validate_school(&read_body(body)?)?;

    let updated = state
        .schools
        .update(id, &school)
        .await
        .map_err(state.storage_error("Failed to update school in database"))?
        .ok_or(ApiError::NotFound)?;

    tracing::info!(id, "school updated");
    let response = APIResponse::new_with_data("School updated successfully", updated);
    Ok((StatusCode::OK, Json(response)).into_response())
}

pub async fn delete_school(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Response, ApiError> {
    let id = read_id(path)?;

    let deleted = state
        .schools
        .delete(id)
        .await
        .map_err(state.storage_error("Failed to delete school from database"))?
        .ok_or(ApiError::NotFound)?;

    tracing::info!(id, "school deleted");
    let response = APIResponse::new_with_data("School deleted successfully", deleted);
    Ok((StatusCode::OK, Json(response)).into_response())
}
