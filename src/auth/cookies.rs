use axum::http::{header, HeaderMap};

pub const SESSION_COOKIE: &str = "nutribob_session";
pub const FLASH_COOKIE: &str = "nutribob_flash";
pub const OAUTH_STATE_COOKIE: &str = "nutribob_oauth_state";

/// Reads a cookie value from every `Cookie` header on the request.
pub fn get<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .find_map(|c| {
            let (k, v) = c.trim().split_once('=')?;
            (k == name).then_some(v)
        })
}

pub fn set(name: &str, value: &str, max_age_secs: i64) -> String {
    format!(
        "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
        name, value, max_age_secs
    )
}

pub fn clear(name: &str) -> String {
    format!("{}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0", name)
}

/// One-shot message shown on the next page load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flash {
    MissingImage,
    EmptyImage,
    ImageTooLarge,
    LoginFailed,
}

impl Flash {
    const ALL: [Flash; 4] = [
        Flash::MissingImage,
        Flash::EmptyImage,
        Flash::ImageTooLarge,
        Flash::LoginFailed,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Flash::MissingImage => "missing-image",
            Flash::EmptyImage => "empty-image",
            Flash::ImageTooLarge => "image-too-large",
            Flash::LoginFailed => "login-failed",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.code() == code)
    }

    pub fn message(self) -> &'static str {
        match self {
            Flash::MissingImage => "Please select or scan a milk tea image first.",
            Flash::EmptyImage => "Uploaded image is empty. Please try again.",
            Flash::ImageTooLarge => "Image too large. Please upload an image under 16MB.",
            Flash::LoginFailed => "Login failed. Please try again.",
        }
    }

    pub fn cookie(self) -> String {
        set(FLASH_COOKIE, self.code(), 60)
    }

    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        get(headers, FLASH_COOKIE).and_then(Self::from_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn finds_cookie_among_several() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("a=1; nutribob_session=tok.en; b=2"),
        );
        assert_eq!(get(&headers, SESSION_COOKIE), Some("tok.en"));
        assert_eq!(get(&headers, "b"), Some("2"));
        assert_eq!(get(&headers, "missing"), None);
    }

    #[test]
    fn reads_across_multiple_cookie_headers() {
        let mut headers = HeaderMap::new();
        headers.append(header::COOKIE, HeaderValue::from_static("a=1"));
        headers.append(
            header::COOKIE,
            HeaderValue::from_static("nutribob_flash=login-failed"),
        );
        assert_eq!(Flash::from_headers(&headers), Some(Flash::LoginFailed));
    }

    #[test]
    fn flash_codes_round_trip() {
        for f in Flash::ALL {
            assert_eq!(Flash::from_code(f.code()), Some(f));
        }
        assert_eq!(Flash::from_code("<script>"), None);
    }

    #[test]
    fn clear_expires_immediately() {
        assert!(clear(SESSION_COOKIE).contains("Max-Age=0"));
        assert!(set(SESSION_COOKIE, "x", 60).starts_with("nutribob_session=x;"));
    }
}
