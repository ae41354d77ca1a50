use super::{
    pages::{render, IndexPage, LandingPage, PageData, RegisterPage},
    session::{clear_session_cookie, session_cookie, Session},
    SharedStore,
};
use crate::store::{password::decoy_hash, StoreError};
use axum::{
    extract::{Extension, Form},
    http::{header::SET_COOKIE, StatusCode},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::{debug, error, info, instrument};

pub const LANDING_PATH: &str = "/";
pub const INDEX_PATH: &str = "/index.html";

pub const MSG_FIELDS_REQUIRED: &str = "Email and password are required";
pub const MSG_EMAIL_TAKEN: &str = "Email already registered. Please use a different email or login.";
pub const MSG_INVALID_CREDENTIALS: &str = "Invalid email or password";
pub const MSG_CREATE_FAILED: &str = "Failed to create user";

/// Form body shared by login and registration. Missing fields decode as empty.
#[derive(Deserialize, Default)]
pub struct Credentials {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

impl Credentials {
    fn from_form(form: Option<Form<Self>>) -> Self {
        form.map(|Form(credentials)| credentials).unwrap_or_default()
    }
}

// axum handler for /
pub async fn landing(session: Session) -> Response {
    if session.is_authenticated() {
        return Redirect::to(INDEX_PATH).into_response();
    }

    render(&LandingPage {
        data: &PageData::default(),
    })
}

// axum handler for GET /register
pub async fn show_register() -> Response {
    render(&RegisterPage {
        data: &PageData::default(),
    })
}

// axum handler for POST /register
#[instrument(skip_all)]
pub async fn register(store: Extension<SharedStore>, form: Option<Form<Credentials>>) -> Response {
    let Credentials { email, password } = Credentials::from_form(form);

    if email.is_empty() || password.is_empty() {
        return (StatusCode::BAD_REQUEST, MSG_FIELDS_REQUIRED).into_response();
    }

    match store.get_user_by_email(&email).await {
        Ok(_) => {
            debug!("Registration rejected, email already exists");
            return email_taken(email);
        }
        Err(StoreError::NotFound) => (),
        Err(e) => {
            error!("Error checking if user exists: {}", e);
            return (StatusCode::INTERNAL_SERVER_ERROR, MSG_CREATE_FAILED).into_response();
        }
    }

    match store.create_user(&email, &password).await {
        Ok(user) => {
            info!(user_id = %user.id, "User registered");
            Redirect::to(LANDING_PATH).into_response()
        }
        // Lost a race with a concurrent registration for the same email.
        Err(StoreError::Conflict) => email_taken(email),
        Err(e) => {
            error!("Error creating user: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, MSG_CREATE_FAILED).into_response()
        }
    }
}

// axum handler for POST /login
#[instrument(skip_all)]
pub async fn login(
    session: Session,
    store: Extension<SharedStore>,
    form: Option<Form<Credentials>>,
) -> Response {
    let Credentials { email, password } = Credentials::from_form(form);

    let verified = match store.get_user_by_email(&email).await {
        Ok(user) => verify(&store, Some(user.password_hash().to_string()), password).await,
        Err(StoreError::NotFound) => {
            // Same cost and same answer as a wrong password.
            let _ = verify(&store, None, password).await;
            Err(StoreError::NotFound)
        }
        Err(e) => {
            error!("Error looking up user: {}", e);
            return landing(session).await;
        }
    };

    match verified {
        Ok(()) => {
            info!("User logged in");
            (
                [(SET_COOKIE, session_cookie())],
                Redirect::to(INDEX_PATH),
            )
                .into_response()
        }
        Err(e) => {
            debug!("Login failed: {}", e);
            render(&LandingPage {
                data: &PageData::with_error(MSG_INVALID_CREDENTIALS, email),
            })
        }
    }
}

// axum handler for /index.html, also guarded by `require_session`
pub async fn index(session: Session) -> Response {
    if !session.is_authenticated() {
        return Redirect::to(LANDING_PATH).into_response();
    }

    render(&IndexPage)
}

// axum handler for /logout
pub async fn logout() -> Response {
    (
        [(SET_COOKIE, clear_session_cookie())],
        Redirect::to(LANDING_PATH),
    )
        .into_response()
}

pub async fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "404 page not found").into_response()
}

pub async fn method_not_allowed() -> Response {
    (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed").into_response()
}

fn email_taken(email: String) -> Response {
    render(&RegisterPage {
        data: &PageData::with_error(MSG_EMAIL_TAKEN, email),
    })
}

// Argon2 is CPU bound, run it on the blocking pool. `None` verifies against
// the decoy hash.
async fn verify(
    store: &SharedStore,
    hash: Option<String>,
    candidate: String,
) -> Result<(), StoreError> {
    let store = store.clone();
    tokio::task::spawn_blocking(move || {
        let hash = hash.as_deref().unwrap_or_else(|| decoy_hash());
        store.verify_password(hash, &candidate)
    })
        .await
        .map_err(|e| StoreError::Hash(e.to_string()))?
}
