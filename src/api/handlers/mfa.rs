use axum::{
    extract::Query,
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
    Extension, Form,
};
use std::{collections::HashMap, sync::Arc};
use tracing::error;

use crate::api::{
    handlers,
    sessions::{self, HostSessions},
    GateState,
};
use crate::gate::{
    cookie as mfa_cookie,
    machine::{
        CookieDirective, Destination, HttpMethod, Page, RequestContext, SessionDirective,
        ACTION_DISABLE, FIELD_CANCEL, FIELD_IDENTITY_SUBMIT, FIELD_NONCE, FIELD_SKIP_SETUP,
        FIELD_VERIFY_SUBMIT, MARKER_ACTION, MARKER_FIRST_TIME_VERIFY,
    },
};

pub async fn setup_page(
    state: Extension<Arc<GateState>>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    run(&state, Page::Setup, HttpMethod::Get, &headers, query, HashMap::new()).await
}

pub async fn setup_submit(
    state: Extension<Arc<GateState>>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
    Form(post): Form<HashMap<String, String>>,
) -> Response {
    run(&state, Page::Setup, HttpMethod::Post, &headers, query, post).await
}

pub async fn verify_page(
    state: Extension<Arc<GateState>>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    run(&state, Page::Verify, HttpMethod::Get, &headers, query, HashMap::new()).await
}

pub async fn verify_submit(
    state: Extension<Arc<GateState>>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
    Form(post): Form<HashMap<String, String>>,
) -> Response {
    run(&state, Page::Verify, HttpMethod::Post, &headers, query, post).await
}

/// Shared pipeline: build the request context, run the gate, apply the
/// verdict's cookie and session directives, then redirect or render.
async fn run(
    state: &GateState,
    page: Page,
    method: HttpMethod,
    headers: &HeaderMap,
    query: HashMap<String, String>,
    post: HashMap<String, String>,
) -> Response {
    let secure = state.secure_cookies() || handlers::forwarded_https(headers);
    let sessions_store = HostSessions::new(state.gate().store());

    let login_token = handlers::cookie_value(headers, sessions::LOGIN_COOKIE_NAME);
    let standing = match login_token.as_deref() {
        Some(token) => match sessions_store.lookup(token) {
            Ok(user) => user,
            Err(err) => return handlers::internal_error(&err),
        },
        None => None,
    };
    let is_admin = standing.is_some_and(|user_id| state.users().is_admin(user_id));

    let ctx = RequestContext::new(method, page)
        .with_secure(secure)
        .with_post(post)
        .with_query(query.clone())
        .with_cookie(handlers::cookie_value(headers, mfa_cookie::COOKIE_NAME))
        .with_standing_login(standing)
        .with_admin(is_admin);

    let verdict = match state.gate().verify(&ctx).await {
        Ok(verdict) => verdict,
        Err(err) => return handlers::internal_error(&err),
    };

    let mut response_headers = HeaderMap::new();

    match &verdict.session {
        SessionDirective::Keep => {}
        SessionDirective::EstablishLogin(user_id) => match sessions_store.create(*user_id) {
            Ok(token) => handlers::append_set_cookie(
                &mut response_headers,
                &sessions::set_cookie(&token, secure),
            ),
            Err(err) => return handlers::internal_error(&err),
        },
        SessionDirective::Logout => {
            if let Some(token) = login_token.as_deref() {
                if let Err(err) = sessions_store.delete(token) {
                    error!("failed to drop the login session: {err}");
                }
            }
            handlers::append_set_cookie(&mut response_headers, &sessions::clear_cookie(secure));
        }
    }

    match &verdict.cookie {
        CookieDirective::Keep => {}
        CookieDirective::Issue(value) => handlers::append_set_cookie(
            &mut response_headers,
            &mfa_cookie::set_cookie(value, secure),
        ),
        CookieDirective::Clear => {
            for cookie in mfa_cookie::expirations(state.gate().config().site_path(), secure) {
                handlers::append_set_cookie(&mut response_headers, &cookie);
            }
        }
    }

    if let Some(destination) = verdict.redirect {
        let location = resolve_destination(state, &destination, &query);
        return handlers::see_other(&location, response_headers);
    }

    let Some(user_id) = verdict.user else {
        // Administrator reached the verify page without an MFA window.
        return (
            StatusCode::OK,
            response_headers,
            Html(handlers::page_html(
                "Verification",
                "<p class=\"notice\">No verification is pending for this session.</p>",
            )),
        )
            .into_response();
    };

    render(state, page, user_id, &query, response_headers).await
}

fn resolve_destination(
    state: &GateState,
    destination: &Destination,
    query: &HashMap<String, String>,
) -> String {
    let config = state.gate().config();
    let mut pairs: Vec<(&str, &str)> = Vec::new();
    if let Some(target) = query.get("redirect_to") {
        pairs.push(("redirect_to", target));
    }

    match destination {
        Destination::Home => "/".to_string(),
        Destination::Login => "/login".to_string(),
        Destination::Setup => handlers::with_query(config.setup_page(), &pairs),
        Destination::Verify { first_time } => {
            if *first_time {
                pairs.insert(0, (MARKER_FIRST_TIME_VERIFY, "1"));
            }
            handlers::with_query(config.verify_page(), &pairs)
        }
        Destination::Intended => {
            handlers::sanitize_redirect(query.get("redirect_to").map(String::as_str))
        }
    }
}

async fn render(
    state: &GateState,
    page: Page,
    user_id: u64,
    query: &HashMap<String, String>,
    response_headers: HeaderMap,
) -> Response {
    let flashes = match state.gate().flashes().take(user_id) {
        Ok(flashes) => flashes,
        Err(err) => {
            error!("failed to drain notices: {err}");
            Vec::new()
        }
    };
    let nonce = state.gate().nonce_for(user_id);

    let (title, body) = if matches!(page, Page::Verify) {
        let challenge = match state.gate().challenge_code(user_id).await {
            Ok(code) => code,
            Err(err) => {
                error!("failed to obtain a verification code: {err}");
                return (
                    StatusCode::SERVICE_UNAVAILABLE,
                    Html(handlers::page_html(
                        "Verification unavailable",
                        "<p class=\"error\">Verification is temporarily unavailable. \
                         Try again shortly.</p>",
                    )),
                )
                    .into_response();
            }
        };
        ("Verify your HydroID", verify_html(&nonce, &flashes, challenge, query))
    } else {
        ("Link your HydroID", setup_html(&nonce, &flashes, query))
    };

    (
        StatusCode::OK,
        response_headers,
        Html(handlers::page_html(title, &body)),
    )
        .into_response()
}

/// Form action posting back to the same page with the markers preserved.
fn form_action(path: &str, query: &HashMap<String, String>) -> String {
    let mut pairs: Vec<(&str, &str)> = Vec::new();
    for key in [MARKER_FIRST_TIME_VERIFY, MARKER_ACTION, "redirect_to"] {
        if let Some(value) = query.get(key) {
            pairs.push((key, value));
        }
    }
    handlers::with_query(path, &pairs)
}

fn setup_html(
    nonce: &str,
    flashes: &[crate::gate::flash::Flash],
    query: &HashMap<String, String>,
) -> String {
    let action = form_action("", query);
    let nonce = handlers::escape_html(nonce);
    format!(
        "{flashes}\
         <p>Enter your HydroID to link this account to the Hydro app.</p>\n\
         <form method=\"post\" action=\"{action}\">\n\
         <input type=\"hidden\" name=\"{FIELD_NONCE}\" value=\"{nonce}\">\n\
         <label>HydroID <input name=\"{FIELD_IDENTITY_SUBMIT}\" autocomplete=\"off\"></label>\n\
         <button>Link HydroID</button>\n\
         <button name=\"{FIELD_SKIP_SETUP}\" value=\"1\">Skip for now</button>\n\
         <button name=\"{FIELD_CANCEL}\" value=\"1\">Cancel</button>\n\
         </form>",
        flashes = handlers::flash_html(flashes),
    )
}

fn verify_html(
    nonce: &str,
    flashes: &[crate::gate::flash::Flash],
    challenge: i64,
    query: &HashMap<String, String>,
) -> String {
    let action = form_action("", query);
    let nonce = handlers::escape_html(nonce);
    let disabling = query.get(MARKER_ACTION).map(String::as_str) == Some(ACTION_DISABLE);
    let lede = if disabling {
        "Confirm this code in the Hydro app to disable multi-factor authentication."
    } else {
        "Enter this code in the Hydro app, then confirm below."
    };
    format!(
        "{flashes}\
         <p>{lede}</p>\n\
         <p class=\"challenge\"><strong>{challenge}</strong></p>\n\
         <form method=\"post\" action=\"{action}\">\n\
         <input type=\"hidden\" name=\"{FIELD_NONCE}\" value=\"{nonce}\">\n\
         <button name=\"{FIELD_VERIFY_SUBMIT}\" value=\"1\">I entered the code</button>\n\
         <button name=\"{FIELD_CANCEL}\" value=\"1\">Cancel</button>\n\
         </form>",
        flashes = handlers::flash_html(flashes),
    )
}
