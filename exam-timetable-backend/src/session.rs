use core::convert::Infallible;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::response::{IntoResponseParts, ResponseParts};
use axum_extra::extract::cookie::{Cookie, SameSite};
use axum_extra::extract::CookieJar;
use http::request::Parts;
use rand::{thread_rng, Rng as _};
use serde::Deserialize;
use tracing::{debug, info};

pub const COOKIE_NAME_IS_AUTHENTICATED: &str = "isAuthenticated";
pub const COOKIE_NAME_USER_EMAIL: &str = "userEmail";
pub const COOKIE_NAME_WIZARD_SESSION: &str = "wizardSession";

// demo credentials, there is no user store behind this
pub const DEMO_EMAIL: &str = "admin@venue.com";
pub const DEMO_PASSWORD: &str = "adminvenue";

#[derive(Deserialize, Debug)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
#[error("Invalid email or password")]
pub struct InvalidCredentials;

impl Credentials {
    pub fn check(&self) -> Result<(), InvalidCredentials> {
        if self.email == DEMO_EMAIL && self.password == DEMO_PASSWORD {
            Ok(())
        } else {
            Err(InvalidCredentials)
        }
    }
}

/// The client side session state. Nothing here is signed, the gate only keeps
/// honest visitors out of the admin pages.
#[derive(Clone, Debug)]
#[must_use]
pub struct Session {
    cookies: CookieJar,
}

fn cookie(name: &'static str, value: String) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .same_site(SameSite::Lax)
        .build()
}

fn removal(name: &'static str) -> Cookie<'static> {
    Cookie::build(name).path("/").build()
}

impl Session {
    pub const fn new(cookies: CookieJar) -> Self {
        Self { cookies }
    }

    /// The signed in email, if both session cookies are present.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        let authenticated = self
            .cookies
            .get(COOKIE_NAME_IS_AUTHENTICATED)
            .is_some_and(|cookie| cookie.value() == "true");
        if !authenticated {
            return None;
        }
        self.cookies
            .get(COOKIE_NAME_USER_EMAIL)
            .map(Cookie::value)
            .filter(|email| !email.is_empty())
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.email().is_some()
    }

    /// Marks the session as signed in. Failed attempts never get here, so they
    /// leave the cookies untouched.
    pub fn sign_in(self, credentials: &Credentials) -> Result<Self, InvalidCredentials> {
        credentials.check()?;
        info!(email = %credentials.email, "signed in");
        Ok(Self {
            cookies: self
                .cookies
                .add(cookie(COOKIE_NAME_IS_AUTHENTICATED, "true".to_owned()))
                .add(cookie(COOKIE_NAME_USER_EMAIL, credentials.email.clone())),
        })
    }

    pub fn sign_out(self) -> Self {
        debug!("signed out");
        Self {
            cookies: self
                .cookies
                .remove(removal(COOKIE_NAME_IS_AUTHENTICATED))
                .remove(removal(COOKIE_NAME_USER_EMAIL)),
        }
    }

    #[must_use]
    pub fn existing_wizard_id(&self) -> Option<String> {
        self.cookies
            .get(COOKIE_NAME_WIZARD_SESSION)
            .map(|cookie| cookie.value().to_owned())
            .filter(|id| !id.is_empty())
    }

    /// The key of this visitor's timetable form, created on first use.
    pub fn wizard_id(self) -> (Self, String) {
        if let Some(id) = self.existing_wizard_id() {
            return (self, id);
        }
        let id: String = thread_rng()
            .sample_iter(&rand::distributions::Alphanumeric)
            .take(30)
            .map(char::from)
            .collect();
        debug!("started a new timetable form");
        let cookies = self
            .cookies
            .add(cookie(COOKIE_NAME_WIZARD_SESSION, id.clone()));
        (Self { cookies }, id)
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Session {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::new(CookieJar::from_headers(&parts.headers)))
    }
}

impl IntoResponseParts for Session {
    type Error = Infallible;

    fn into_response_parts(self, res: ResponseParts) -> Result<ResponseParts, Self::Error> {
        self.cookies.into_response_parts(res)
    }
}

#[cfg(test)]
mod tests {
    use http::header::COOKIE;
    use http::{HeaderMap, HeaderValue};

    use super::*;

    fn session(cookies: &str) -> Session {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_str(cookies).unwrap());
        Session::new(CookieJar::from_headers(&headers))
    }

    fn credentials(email: &str, password: &str) -> Credentials {
        Credentials {
            email: email.to_owned(),
            password: password.to_owned(),
        }
    }

    #[test]
    fn both_cookies_are_needed() {
        assert_eq!(
            session("isAuthenticated=true; userEmail=admin@venue.com").email(),
            Some("admin@venue.com")
        );
        assert_eq!(session("isAuthenticated=true").email(), None);
        assert_eq!(
            session("isAuthenticated=false; userEmail=admin@venue.com").email(),
            None
        );
        assert!(!Session::new(CookieJar::new()).is_authenticated());
    }

    #[test]
    fn only_demo_credentials_sign_in() {
        let signed_in = Session::new(CookieJar::new())
            .sign_in(&credentials(DEMO_EMAIL, DEMO_PASSWORD))
            .unwrap();
        assert_eq!(signed_in.email(), Some(DEMO_EMAIL));

        assert_eq!(
            Session::new(CookieJar::new())
                .sign_in(&credentials(DEMO_EMAIL, "wrong"))
                .unwrap_err(),
            InvalidCredentials
        );
        assert_eq!(
            credentials("someone@venue.com", DEMO_PASSWORD).check(),
            Err(InvalidCredentials)
        );
        assert_eq!(
            credentials("ADMIN@venue.com", DEMO_PASSWORD).check(),
            Err(InvalidCredentials)
        );
        assert_eq!(
            credentials(DEMO_EMAIL, "AdminVenue").check(),
            Err(InvalidCredentials)
        );
    }

    #[test]
    fn sign_out_forgets_the_email() {
        let signed_out = session("isAuthenticated=true; userEmail=admin@venue.com").sign_out();
        assert_eq!(signed_out.email(), None);
    }

    #[test]
    fn wizard_id_is_stable() {
        let (session, id) = Session::new(CookieJar::new()).wizard_id();
        assert_eq!(id.len(), 30);
        let (_, again) = session.wizard_id();
        assert_eq!(id, again);
    }
}
