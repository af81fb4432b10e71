use axum::{
    extract::Query,
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
    Extension, Form,
};
use serde::Deserialize;
use std::{collections::HashMap, sync::Arc};
use tracing::{info, warn};

use crate::api::{
    handlers,
    sessions::{self, HostSessions},
    GateState,
};
use crate::gate::{
    cookie as mfa_cookie,
    machine::{AuthOutcome, ACTION_ENABLE, MARKER_ACTION},
};

#[derive(Deserialize)]
pub struct LoginForm {
    username: String,
    password: String,
    #[serde(default)]
    redirect_to: Option<String>,
}

/// Landing page; shows whether a login session is standing.
pub async fn home(Extension(state): Extension<Arc<GateState>>, headers: HeaderMap) -> Response {
    let sessions = HostSessions::new(state.gate().store());
    let standing = match handlers::cookie_value(&headers, sessions::LOGIN_COOKIE_NAME) {
        Some(token) => match sessions.lookup(&token) {
            Ok(user) => user,
            Err(err) => return handlers::internal_error(&err),
        },
        None => None,
    };

    let body = match standing {
        Some(user_id) => format!(
            "<p>Signed in as user #{user_id}.</p>\n\
             <form method=\"post\" action=\"/logout\"><button>Sign out</button></form>"
        ),
        None => "<p><a href=\"/login\">Sign in</a></p>".to_string(),
    };
    Html(handlers::page_html("Home", &body)).into_response()
}

pub async fn login_page(Query(query): Query<HashMap<String, String>>) -> Response {
    Html(login_html(&query, None)).into_response()
}

/// Primary login. On success the MFA gate decides whether the session is
/// established now or deferred behind a setup or verify step.
pub async fn login(
    Extension(state): Extension<Arc<GateState>>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
    Form(form): Form<LoginForm>,
) -> Response {
    let secure = state.secure_cookies() || handlers::forwarded_https(&headers);

    let Some(user_id) = state.users().verify_credentials(&form.username, &form.password) else {
        warn!("rejected login for unknown or mismatched credentials");
        return (
            StatusCode::UNAUTHORIZED,
            Html(login_html(&query, Some("Invalid username or password."))),
        )
            .into_response();
    };

    let enable_requested = query.get(MARKER_ACTION).map(String::as_str) == Some(ACTION_ENABLE);
    let outcome = match state.gate().authenticate(user_id, enable_requested) {
        Ok(outcome) => outcome,
        Err(err) => return handlers::internal_error(&err),
    };

    let mut redirect_pairs: Vec<(&str, &str)> = Vec::new();
    if let Some(target) = form.redirect_to.as_deref() {
        redirect_pairs.push(("redirect_to", target));
    }

    match outcome {
        AuthOutcome::Blocked => {
            warn!(user_id, "refused login for a locked account");
            (
                StatusCode::FORBIDDEN,
                Html(handlers::page_html(
                    "Account locked",
                    "<p class=\"error\">This account is locked. Contact an administrator.</p>",
                )),
            )
                .into_response()
        }
        AuthOutcome::SetupRequired { cookie } => {
            let mut response_headers = HeaderMap::new();
            handlers::append_set_cookie(&mut response_headers, &mfa_cookie::set_cookie(&cookie, secure));
            let location = handlers::with_query(state.gate().config().setup_page(), &redirect_pairs);
            handlers::see_other(&location, response_headers)
        }
        AuthOutcome::VerifyRequired { cookie } => {
            let mut response_headers = HeaderMap::new();
            handlers::append_set_cookie(&mut response_headers, &mfa_cookie::set_cookie(&cookie, secure));
            let location = handlers::with_query(state.gate().config().verify_page(), &redirect_pairs);
            handlers::see_other(&location, response_headers)
        }
        AuthOutcome::Allowed => {
            let sessions_store = HostSessions::new(state.gate().store());
            let token = match sessions_store.create(user_id) {
                Ok(token) => token,
                Err(err) => return handlers::internal_error(&err),
            };
            info!(user_id, "login completed without an MFA step");
            let mut response_headers = HeaderMap::new();
            handlers::append_set_cookie(
                &mut response_headers,
                &sessions::set_cookie(&token, secure),
            );
            let location = handlers::sanitize_redirect(form.redirect_to.as_deref());
            handlers::see_other(&location, response_headers)
        }
    }
}

/// End the login session and drop both cookies.
pub async fn logout(Extension(state): Extension<Arc<GateState>>, headers: HeaderMap) -> Response {
    let secure = state.secure_cookies() || handlers::forwarded_https(&headers);
    let sessions_store = HostSessions::new(state.gate().store());

    if let Some(token) = handlers::cookie_value(&headers, sessions::LOGIN_COOKIE_NAME) {
        if let Err(err) = sessions_store.delete(&token) {
            return handlers::internal_error(&err);
        }
    }

    let mut response_headers = HeaderMap::new();
    handlers::append_set_cookie(&mut response_headers, &sessions::clear_cookie(secure));
    for cookie in mfa_cookie::expirations(state.gate().config().site_path(), secure) {
        handlers::append_set_cookie(&mut response_headers, &cookie);
    }
    handlers::see_other("/", response_headers)
}

fn login_html(query: &HashMap<String, String>, error: Option<&str>) -> String {
    let mut action_pairs: Vec<(&str, &str)> = Vec::new();
    if let Some(action) = query.get(MARKER_ACTION) {
        action_pairs.push((MARKER_ACTION, action));
    }
    let action = handlers::with_query("/login", &action_pairs);

    let mut body = String::new();
    if let Some(message) = error {
        body.push_str(&format!(
            "<p class=\"error\">{}</p>\n",
            handlers::escape_html(message)
        ));
    }
    let redirect_to = query
        .get("redirect_to")
        .map(|target| handlers::escape_html(target))
        .unwrap_or_default();
    body.push_str(&format!(
        "<form method=\"post\" action=\"{action}\">\n\
         <label>Username <input name=\"username\" autocomplete=\"username\"></label>\n\
         <label>Password <input name=\"password\" type=\"password\" autocomplete=\"current-password\"></label>\n\
         <input type=\"hidden\" name=\"redirect_to\" value=\"{redirect_to}\">\n\
         <button>Sign in</button>\n\
         </form>"
    ));
    handlers::page_html("Sign in", &body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_form_carries_the_redirect_target() {
        let mut query = HashMap::new();
        query.insert("redirect_to".to_string(), "/account".to_string());
        let html = login_html(&query, None);
        assert!(html.contains("value=\"/account\""));
        assert!(!html.contains("class=\"error\""));
    }

    #[test]
    fn login_form_escapes_the_redirect_target() {
        let mut query = HashMap::new();
        query.insert(
            "redirect_to".to_string(),
            "\"><script>x</script>".to_string(),
        );
        let html = login_html(&query, None);
        assert!(!html.contains("<script>"));
    }
}
