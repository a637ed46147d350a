use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::error::ParkingError;

/// Redirect carrying a one-shot user message.
///
/// Rendered as `303 See Other` with a `Location` header and a small JSON body,
/// so browsers follow the redirect and API clients can read the message.
#[derive(Debug, Clone)]
pub struct Flash {
    to: String,
    message: Option<String>,
    cookies: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct FlashBody {
    pub flash: Option<String>,
    pub redirect: String,
}

impl Flash {
    pub fn to(path: impl Into<String>) -> Self {
        Self {
            to: path.into(),
            message: None,
            cookies: Vec::new(),
        }
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Logs a rejected request and sends its message back to `to`.
    pub fn rejection(to: impl Into<String>, err: &ParkingError) -> Self {
        err.log();
        Self::to(to).message(err.to_string())
    }

    pub fn with_cookie(mut self, cookie: impl Into<String>) -> Self {
        self.cookies.push(cookie.into());
        self
    }
}

impl IntoResponse for Flash {
    fn into_response(self) -> Response {
        let body = FlashBody {
            flash: self.message,
            redirect: self.to.clone(),
        };
        let mut res = (StatusCode::SEE_OTHER, Json(body)).into_response();
        let headers = res.headers_mut();
        if let Ok(location) = HeaderValue::from_str(&self.to) {
            headers.insert(header::LOCATION, location);
        }
        for cookie in self.cookies {
            if let Ok(value) = HeaderValue::from_str(&cookie) {
                headers.append(header::SET_COOKIE, value);
            }
        }
        res
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_see_other_with_location() {
        let res = Flash::to("/dashboard")
            .message("Spot reserved successfully.")
            .into_response();
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(res.headers()[header::LOCATION], "/dashboard");
    }

    #[test]
    fn appends_every_cookie() {
        let res = Flash::to("/")
            .with_cookie("a=1; Path=/")
            .with_cookie("b=2; Path=/")
            .into_response();
        assert_eq!(res.headers().get_all(header::SET_COOKIE).iter().count(), 2);
    }
}
