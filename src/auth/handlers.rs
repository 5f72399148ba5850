use axum::{
    extract::{FromRef, Query, State},
    http::{header::SET_COOKIE, HeaderMap},
    response::{AppendHeaders, IntoResponse, Redirect, Response},
    routing::get,
    Router,
};
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        cookies::{self, Flash, FLASH_COOKIE, OAUTH_STATE_COOKIE, SESSION_COOKIE},
        dto::CallbackQuery,
        services::{oauth_state_token, SessionKeys, SessionUser},
    },
    state::AppState,
    views,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home))
        .route("/login", get(login))
        .route("/login/google", get(login_google))
        .route("/auth/callback", get(auth_callback))
        .route("/logout", get(logout))
}

pub async fn home(user: Option<SessionUser>) -> Redirect {
    match user {
        Some(_) => Redirect::to("/scan"),
        None => Redirect::to("/login"),
    }
}

pub async fn login(user: Option<SessionUser>, headers: HeaderMap) -> Response {
    if user.is_some() {
        return Redirect::to("/scan").into_response();
    }
    let flash = Flash::from_headers(&headers);
    with_flash_cleared(flash, views::login_page(flash))
}

#[instrument(skip(state))]
pub async fn login_google(State(state): State<AppState>) -> Response {
    let csrf = oauth_state_token();
    match state.identity.authorize_url(&csrf) {
        Ok(url) => (
            AppendHeaders([(SET_COOKIE, cookies::set(OAUTH_STATE_COOKIE, &csrf, 600))]),
            Redirect::to(&url),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "could not build authorize url");
            login_failed()
        }
    }
}

#[instrument(skip(state, query, headers))]
pub async fn auth_callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
    headers: HeaderMap,
) -> Response {
    if let Some(err) = &query.error {
        warn!(error = %err, "provider returned an error");
        return login_failed();
    }

    let expected = cookies::get(&headers, OAUTH_STATE_COOKIE);
    let state_ok = matches!(
        (expected, query.state.as_deref()),
        (Some(a), Some(b)) if !a.is_empty() && a == b
    );
    if !state_ok {
        warn!("oauth state mismatch");
        return login_failed();
    }

    let Some(code) = query.code.as_deref().filter(|c| !c.is_empty()) else {
        warn!("callback without code");
        return login_failed();
    };

    let profile = match state.identity.exchange(code).await {
        Ok(p) => p,
        Err(e) => {
            error!(error = %e, "oauth exchange failed");
            return login_failed();
        }
    };

    let keys = SessionKeys::from_ref(&state);
    let token = match keys.sign(&profile) {
        Ok(t) => t,
        Err(e) => {
            error!(error = %e, "session sign failed");
            return login_failed();
        }
    };

    info!(user_id = %profile.sub, email = ?profile.email, "user logged in");
    (
        AppendHeaders([
            (
                SET_COOKIE,
                cookies::set(SESSION_COOKIE, &token, keys.cookie_max_age()),
            ),
            (SET_COOKIE, cookies::clear(OAUTH_STATE_COOKIE)),
        ]),
        Redirect::to("/scan"),
    )
        .into_response()
}

pub async fn logout() -> Response {
    (
        AppendHeaders([(SET_COOKIE, cookies::clear(SESSION_COOKIE))]),
        Redirect::to("/scan"),
    )
        .into_response()
}

fn login_failed() -> Response {
    (
        AppendHeaders([
            (SET_COOKIE, Flash::LoginFailed.cookie()),
            (SET_COOKIE, cookies::clear(OAUTH_STATE_COOKIE)),
        ]),
        Redirect::to("/login"),
    )
        .into_response()
}

/// Renders `page`, expiring the flash cookie if one was shown.
pub fn with_flash_cleared(flash: Option<Flash>, page: impl IntoResponse) -> Response {
    match flash {
        Some(_) => (
            AppendHeaders([(SET_COOKIE, cookies::clear(FLASH_COOKIE))]),
            page,
        )
            .into_response(),
        None => page.into_response(),
    }
}
