use axum::response::{IntoResponse, Redirect, Response};
use axum::Form;
use serde::Serialize;
use tracing::info;

use crate::error::AppError;
use crate::session::{Credentials, Session};
use crate::templating::render;

#[derive(Serialize, Default)]
struct LoginPage {
    email_value: String,
    error: Option<String>,
}

pub async fn login_page(session: Session) -> Result<Response, AppError> {
    if session.is_authenticated() {
        return Ok(Redirect::to("/admin").into_response());
    }
    Ok(render(&session, "login", LoginPage::default())?.into_response())
}

pub async fn login(session: Session, Form(credentials): Form<Credentials>) -> Result<Response, AppError> {
    match session.clone().sign_in(&credentials) {
        Ok(session) => Ok((session, Redirect::to("/admin")).into_response()),
        Err(error) => {
            info!(email = %credentials.email, "rejected sign in");
            // the session is not returned so no cookie is set
            Ok(render(
                &session,
                "login",
                LoginPage {
                    email_value: credentials.email,
                    error: Some(error.to_string()),
                },
            )?
            .into_response())
        }
    }
}

pub async fn logout(session: Session) -> impl IntoResponse {
    (session.sign_out(), Redirect::to("/login"))
}
