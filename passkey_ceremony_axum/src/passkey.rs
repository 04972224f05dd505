use std::sync::Arc;

use axum::{
    Router,
    extract::{Json, Path, State},
    routing::{get, post},
};
use serde_json::{Value, json};

use passkey_ceremony::{
    AuthenticationOptions, AuthenticatorResponse, Coordinator, RegisterCredential,
    RegistrationOptions,
};

use crate::error::{ErrorResponse, IntoResponseError};

pub(crate) fn router_register() -> Router<Arc<Coordinator>> {
    Router::new()
        .route("/start/{username}", get(handle_start_registration))
        .route("/finish/{username}", post(handle_finish_registration))
}

pub(crate) fn router_login() -> Router<Arc<Coordinator>> {
    Router::new()
        .route("/start/{username}", get(handle_start_authentication))
        .route("/finish/{username}", post(handle_finish_authentication))
}

pub(crate) async fn handle_start_registration(
    State(coordinator): State<Arc<Coordinator>>,
    Path(username): Path<String>,
) -> Result<Json<RegistrationOptions>, ErrorResponse> {
    let options = coordinator
        .begin_registration(&username)
        .await
        .into_response_error()?;

    Ok(Json(options))
}

pub(crate) async fn handle_finish_registration(
    State(coordinator): State<Arc<Coordinator>>,
    Path(username): Path<String>,
    Json(reg_data): Json<RegisterCredential>,
) -> Result<Json<Value>, ErrorResponse> {
    let outcome = coordinator
        .finish_registration(&username, reg_data)
        .await
        .into_response_error()?;

    Ok(Json(json!({
        "status": "Registration Success",
        "credential_id": outcome.credential_id,
        "credential_count": outcome.credential_count,
    })))
}

pub(crate) async fn handle_start_authentication(
    State(coordinator): State<Arc<Coordinator>>,
    Path(username): Path<String>,
) -> Result<Json<AuthenticationOptions>, ErrorResponse> {
    let options = coordinator
        .begin_login(&username)
        .await
        .into_response_error()?;

    Ok(Json(options))
}

pub(crate) async fn handle_finish_authentication(
    State(coordinator): State<Arc<Coordinator>>,
    Path(username): Path<String>,
    Json(auth_response): Json<AuthenticatorResponse>,
) -> Result<Json<Value>, ErrorResponse> {
    let outcome = coordinator
        .finish_login(&username, auth_response)
        .await
        .into_response_error()?;

    Ok(Json(json!({
        "status": "Login Success",
        "credential_id": outcome.credential_id,
        "sign_count": outcome.sign_count,
    })))
}

pub(crate) async fn ping() -> &'static str {
    "pong"
}
