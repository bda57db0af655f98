/// Authentication endpoints
///
/// Accounts move from *pending confirmation* to *confirmed* by submitting the
/// 6-digit code emailed at registration. Codes are single-use and expire
/// after 10 minutes; the same mechanism backs password reset.
///
/// # Endpoints
///
/// - `POST /api/auth/create-account` - Register and email a confirmation code
/// - `POST /api/auth/confirm-account` - Confirm with a code
/// - `POST /api/auth/login` - Check credentials
/// - `POST /api/auth/request-code` - Email a new confirmation code
/// - `POST /api/auth/forgot-password` - Email a password reset code
/// - `POST /api/auth/new-password` - Check a reset code without using it
/// - `POST /api/auth/update-password/:token` - Set a new password with a reset code
///
/// Emails are queued after the user and token are stored; delivery happens
/// in the background and never affects the response.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, OrInternal},
    middleware::validation::{not_blank, Form, ValidJson},
    routes::MessageResponse,
};
use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use uptask_shared::{
    auth::{password, token::issue_unique},
    mail::templates,
    models::{
        token::Token,
        user::{normalize_email, NewUser, User},
    },
    repo::RepoError,
};
use validator::Validate;

/// Registration request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateAccountForm {
    #[serde(default)]
    #[validate(custom(function = "not_blank", message = "El nombre es requerido"))]
    pub name: String,

    #[serde(default)]
    #[validate(email(message = "El email no es válido"))]
    pub email: String,

    #[serde(default)]
    #[validate(length(min = 5, message = "La contraseña debe tener al menos 5 caracteres"))]
    pub password: String,

    #[serde(default)]
    #[validate(must_match(other = "password", message = "Las contraseñas no coinciden"))]
    pub password_confirmation: String,
}

impl Form for CreateAccountForm {}

/// Account confirmation request
#[derive(Debug, Deserialize, Validate)]
pub struct ConfirmAccountForm {
    #[serde(default)]
    #[validate(length(min = 1, message = "El token es requerido"))]
    pub token: String,
}

impl Form for ConfirmAccountForm {}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginForm {
    #[serde(default)]
    #[validate(email(message = "El email no es válido"))]
    pub email: String,

    #[serde(default)]
    #[validate(length(min = 1, message = "La contraseña es requerida"))]
    pub password: String,
}

impl Form for LoginForm {}

/// Request carrying only an email
#[derive(Debug, Deserialize, Validate)]
pub struct EmailForm {
    #[serde(default)]
    #[validate(email(message = "El email no es válido"))]
    pub email: String,
}

impl Form for EmailForm {}

/// Reset code check request
#[derive(Debug, Deserialize, Validate)]
pub struct ResetTokenForm {
    #[serde(default)]
    #[validate(length(min = 1, message = "El token no puede estar vacío"))]
    pub token: String,
}

impl Form for ResetTokenForm {}

/// New password request
#[derive(Debug, Deserialize, Validate)]
pub struct NewPasswordForm {
    #[serde(default)]
    #[validate(length(min = 5, message = "La contraseña debe tener al menos 5 caracteres"))]
    pub password: String,

    #[serde(default)]
    #[validate(must_match(other = "password", message = "Las contraseñas no coinciden"))]
    pub password_confirmation: String,
}

impl Form for NewPasswordForm {}

fn invalid_token() -> ApiError {
    ApiError::NotFound("Token no válido".to_string())
}

fn unregistered() -> ApiError {
    ApiError::NotFound("El usuario no está registrado".to_string())
}

/// Stores a fresh code for `user`, returning the plaintext code
async fn issue_token(state: &AppState, user: &User, failure: &str) -> ApiResult<String> {
    let (_, code) = issue_unique(state.repos.tokens.as_ref(), user.id)
        .await
        .or_internal(failure)?;
    Ok(code)
}

fn send_confirmation(state: &AppState, user: &User, code: &str) {
    state.mail.dispatch(templates::confirmation_email(
        state.frontend_url(),
        &user.email,
        &user.name,
        code,
    ));
}

/// Finds the user owning a live code
async fn redeem(state: &AppState, code: &str, failure: &str) -> ApiResult<(Token, User)> {
    let token = state
        .repos
        .tokens
        .find_by_code(code)
        .await
        .or_internal(failure)?
        .ok_or_else(invalid_token)?;

    let user = state
        .repos
        .users
        .find_by_id(token.user_id)
        .await
        .or_internal(failure)?
        .ok_or_else(invalid_token)?;

    Ok((token, user))
}

async fn find_user(state: &AppState, email: &str, failure: &str) -> ApiResult<Option<User>> {
    state
        .repos
        .users
        .find_by_email(&normalize_email(email))
        .await
        .or_internal(failure)
}

/// Registers an unconfirmed user and emails a confirmation code
///
/// # Errors
///
/// - `400 Bad Request`: validation failed
/// - `409 Conflict`: email already registered
/// - `500 Internal Server Error`: storage or hashing failure
pub async fn create_account(
    State(state): State<AppState>,
    ValidJson(form): ValidJson<CreateAccountForm>,
) -> ApiResult<Json<MessageResponse>> {
    const FAILURE: &str = "Error al crear la cuenta";

    if find_user(&state, &form.email, FAILURE).await?.is_some() {
        return Err(ApiError::Conflict("El usuario ya existe".to_string()));
    }

    let password_hash = password::hash_password_async(form.password)
        .await
        .or_internal(FAILURE)?;

    let user = User::new(NewUser {
        email: form.email,
        password_hash,
        name: form.name,
    });

    match state.repos.users.save(&user).await {
        Ok(()) => {}
        Err(RepoError::Duplicate(_)) => {
            return Err(ApiError::Conflict("El usuario ya existe".to_string()))
        }
        Err(e) => return Err(ApiError::internal(FAILURE, e)),
    }

    let code = issue_token(&state, &user, FAILURE).await?;
    send_confirmation(&state, &user, &code);

    tracing::info!(user_id = %user.id, "Account created");
    Ok(Json(MessageResponse::new(
        "Cuenta creada correctamente, revisa tu email para confirmar tu cuenta",
    )))
}

/// Confirms the account owning the code and consumes the code
pub async fn confirm_account(
    State(state): State<AppState>,
    ValidJson(form): ValidJson<ConfirmAccountForm>,
) -> ApiResult<Json<MessageResponse>> {
    const FAILURE: &str = "Error al confirmar la cuenta";

    let (token, mut user) = redeem(&state, &form.token, FAILURE).await?;
    user.confirmed = true;

    let (saved, deleted) = tokio::join!(
        state.repos.users.save(&user),
        state.repos.tokens.delete(token.id),
    );
    saved.or_internal(FAILURE)?;
    deleted.or_internal(FAILURE)?;

    tracing::info!(user_id = %user.id, "Account confirmed");
    Ok(Json(MessageResponse::new("Cuenta confirmada correctamente")))
}

/// Checks credentials
///
/// An unconfirmed account gets a new confirmation code emailed and the login
/// is refused.
///
/// # Errors
///
/// - `404 Not Found`: no account for the email
/// - `401 Unauthorized`: account unconfirmed, or wrong password
pub async fn login(
    State(state): State<AppState>,
    ValidJson(form): ValidJson<LoginForm>,
) -> ApiResult<Json<MessageResponse>> {
    const FAILURE: &str = "Error al iniciar sesión";

    let user = find_user(&state, &form.email, FAILURE)
        .await?
        .ok_or_else(|| ApiError::NotFound("Usuario no encontrado".to_string()))?;

    if !user.confirmed {
        let code = issue_token(&state, &user, FAILURE).await?;
        send_confirmation(&state, &user, &code);
        return Err(ApiError::Unauthorized(
            "Cuenta no confirmada, hemos enviado un nuevo email de confirmación".to_string(),
        ));
    }

    let valid = password::verify_password_async(form.password, user.password_hash.clone())
        .await
        .or_internal(FAILURE)?;
    if !valid {
        tracing::debug!(user_id = %user.id, "Login with wrong password");
        return Err(ApiError::Unauthorized("La contraseña es incorrecta".to_string()));
    }

    Ok(Json(MessageResponse::new("Inicio de sesión correcto")))
}

/// Emails a new confirmation code to an unconfirmed account
pub async fn request_code(
    State(state): State<AppState>,
    ValidJson(form): ValidJson<EmailForm>,
) -> ApiResult<Json<MessageResponse>> {
    const FAILURE: &str = "Error al enviar el código";

    let user = find_user(&state, &form.email, FAILURE)
        .await?
        .ok_or_else(unregistered)?;

    if user.confirmed {
        return Err(ApiError::Forbidden("El usuario ya está confirmado".to_string()));
    }

    let code = issue_token(&state, &user, FAILURE).await?;
    send_confirmation(&state, &user, &code);

    Ok(Json(MessageResponse::new(
        "Se envió un nuevo token de confirmación, revisa tu email",
    )))
}

/// Emails a password reset code
pub async fn forgot_password(
    State(state): State<AppState>,
    ValidJson(form): ValidJson<EmailForm>,
) -> ApiResult<Json<MessageResponse>> {
    const FAILURE: &str = "Error al restablecer la contraseña";

    let user = find_user(&state, &form.email, FAILURE)
        .await?
        .ok_or_else(unregistered)?;

    let code = issue_token(&state, &user, FAILURE).await?;
    state.mail.dispatch(templates::password_reset_email(
        state.frontend_url(),
        &user.email,
        &user.name,
        &code,
    ));

    Ok(Json(MessageResponse::new(
        "Revisa tu email para las instrucciones de restablecimiento de contraseña",
    )))
}

/// Checks a reset code; the code stays usable
pub async fn validate_token(
    State(state): State<AppState>,
    ValidJson(form): ValidJson<ResetTokenForm>,
) -> ApiResult<Json<MessageResponse>> {
    state
        .repos
        .tokens
        .find_by_code(&form.token)
        .await
        .or_internal("Error al validar el token")?
        .ok_or_else(invalid_token)?;

    Ok(Json(MessageResponse::new(
        "Token válido, define tu nueva contraseña",
    )))
}

/// Replaces the password of the account owning the code and consumes it
pub async fn update_password(
    State(state): State<AppState>,
    Path(code): Path<String>,
    ValidJson(form): ValidJson<NewPasswordForm>,
) -> ApiResult<Json<MessageResponse>> {
    const FAILURE: &str = "Error al actualizar la contraseña";

    let (token, mut user) = redeem(&state, &code, FAILURE).await?;
    user.password_hash = password::hash_password_async(form.password)
        .await
        .or_internal(FAILURE)?;

    let (saved, deleted) = tokio::join!(
        state.repos.users.save(&user),
        state.repos.tokens.delete(token.id),
    );
    saved.or_internal(FAILURE)?;
    deleted.or_internal(FAILURE)?;

    tracing::info!(user_id = %user.id, "Password updated");
    Ok(Json(MessageResponse::new(
        "La contraseña se modificó correctamente",
    )))
}
