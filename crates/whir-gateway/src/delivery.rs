//! Token delivery.
//!
//! Issued tokens leave the gateway either as two `HttpOnly` cookies or as two
//! response headers. The client picks per request with `Cookie-Consent: true`.

use axum::http::{HeaderMap, HeaderName};
use axum::response::{IntoResponse, Response};
use axum::Json;
use axum_extra::extract::cookie::{Cookie, SameSite};
use axum_extra::extract::CookieJar;
use serde::Serialize;

use whir_store::TokenPair;

/// Cookie holding the access token.
pub const ACCESS_TOKEN_COOKIE: &str = "access_token";

/// Cookie holding the refresh token.
pub const REFRESH_TOKEN_COOKIE: &str = "refresh_token";

/// Access token cookie lifetime, in seconds.
pub const ACCESS_COOKIE_MAX_AGE: i64 = 3600;

/// Refresh token cookie lifetime, in seconds.
pub const REFRESH_COOKIE_MAX_AGE: i64 = 86_400;

/// Request header opting in to cookie delivery.
pub const COOKIE_CONSENT: HeaderName = HeaderName::from_static("cookie-consent");

/// Response header carrying the access token.
pub const X_AUTH_TOKEN: HeaderName = HeaderName::from_static("x-auth-token");

/// Response header carrying the refresh token.
pub const X_REFRESH_TOKEN: HeaderName = HeaderName::from_static("x-refresh-token");

/// Request header carrying the refresh token on refresh calls.
pub const REFRESH_TOKEN_HEADER: HeaderName = HeaderName::from_static("refresh_token");

/// How a token pair is handed back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryChannel {
    /// `Set-Cookie` for both tokens.
    Cookies,
    /// `X-Auth-Token` and `X-Refresh-Token` headers.
    Headers,
}

impl DeliveryChannel {
    /// Pick the channel for a request.
    #[must_use]
    pub fn for_request(headers: &HeaderMap) -> Self {
        let consented = headers
            .get(COOKIE_CONSENT)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.trim() == "true");

        if consented {
            Self::Cookies
        } else {
            Self::Headers
        }
    }
}

/// Success body envelope.
#[derive(Debug, Serialize)]
pub struct Data<T> {
    /// Payload.
    pub data: T,
}

impl<T: Serialize> IntoResponse for Data<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// Add both token cookies to a jar.
#[must_use]
pub fn token_cookies(jar: CookieJar, pair: &TokenPair, secure: bool) -> CookieJar {
    jar.add(token_cookie(
        ACCESS_TOKEN_COOKIE,
        pair.token.clone(),
        ACCESS_COOKIE_MAX_AGE,
        secure,
    ))
    .add(token_cookie(
        REFRESH_TOKEN_COOKIE,
        pair.refresh_token.clone(),
        REFRESH_COOKIE_MAX_AGE,
        secure,
    ))
}

fn token_cookie(name: &'static str, value: String, max_age: i64, secure: bool) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(time::Duration::seconds(max_age))
        .build()
}

/// A success response carrying a freshly issued token pair.
#[derive(Debug)]
pub struct TokenDelivery<T> {
    channel: DeliveryChannel,
    secure: bool,
    pair: TokenPair,
    body: T,
}

impl<T> TokenDelivery<T> {
    /// Deliver `pair` over `channel` alongside `body`.
    #[must_use]
    pub const fn new(channel: DeliveryChannel, secure: bool, pair: TokenPair, body: T) -> Self {
        Self {
            channel,
            secure,
            pair,
            body,
        }
    }
}

impl<T: Serialize> IntoResponse for TokenDelivery<T> {
    fn into_response(self) -> Response {
        let body = Data { data: self.body };
        tracing::debug!(channel = ?self.channel, "Delivering token pair");

        match self.channel {
            DeliveryChannel::Cookies => {
                let jar = token_cookies(CookieJar::new(), &self.pair, self.secure);
                (jar, body).into_response()
            }
            DeliveryChannel::Headers => (
                [
                    (X_AUTH_TOKEN, self.pair.token),
                    (X_REFRESH_TOKEN, self.pair.refresh_token),
                ],
                body,
            )
                .into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::SET_COOKIE;
    use axum::http::HeaderValue;

    fn pair() -> TokenPair {
        TokenPair {
            token: "access.jwt.value".to_string(),
            refresh_token: "refresh.jwt.value".to_string(),
        }
    }

    #[test]
    fn channel_needs_exact_consent() {
        let mut headers = HeaderMap::new();
        assert_eq!(DeliveryChannel::for_request(&headers), DeliveryChannel::Headers);

        headers.insert(COOKIE_CONSENT, HeaderValue::from_static("false"));
        assert_eq!(DeliveryChannel::for_request(&headers), DeliveryChannel::Headers);

        headers.insert(COOKIE_CONSENT, HeaderValue::from_static("true"));
        assert_eq!(DeliveryChannel::for_request(&headers), DeliveryChannel::Cookies);
    }

    #[test]
    fn header_delivery() {
        let response =
            TokenDelivery::new(DeliveryChannel::Headers, false, pair(), "ok").into_response();
        assert_eq!(response.headers()[X_AUTH_TOKEN], "access.jwt.value");
        assert_eq!(response.headers()[X_REFRESH_TOKEN], "refresh.jwt.value");
        assert!(response.headers().get(SET_COOKIE).is_none());
    }

    #[test]
    fn cookie_delivery() {
        let response =
            TokenDelivery::new(DeliveryChannel::Cookies, true, pair(), "ok").into_response();
        assert!(response.headers().get(X_AUTH_TOKEN).is_none());

        let cookies: Vec<&str> = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .map(|v| v.to_str().unwrap())
            .collect();
        assert_eq!(cookies.len(), 2);

        let access = cookies.iter().find(|c| c.starts_with("access_token=")).unwrap();
        assert!(access.contains("access.jwt.value"));
        assert!(access.contains("HttpOnly"));
        assert!(access.contains("Path=/"));
        assert!(access.contains("Max-Age=3600"));
        assert!(access.contains("SameSite=Lax"));
        assert!(access.contains("Secure"));

        let refresh = cookies.iter().find(|c| c.starts_with("refresh_token=")).unwrap();
        assert!(refresh.contains("Max-Age=86400"));
    }
}
