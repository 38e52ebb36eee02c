use crate::config::parse_bool_env;
use axum::{
    extract::Request,
    http::{header, HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::{env, sync::OnceLock};

/// Pages are server-rendered and images live under the media prefix, so
/// nothing outside the origin is needed.
const DEFAULT_CSP: &str = "default-src 'self'; base-uri 'self'; frame-ancestors 'none'; object-src 'none'; style-src 'self' 'unsafe-inline'; img-src 'self' data:; form-action 'self'";
const HSTS: &str = "max-age=31536000; includeSubDomains";

const FIXED_HEADERS: [(header::HeaderName, &str); 3] = [
    (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
    (header::X_FRAME_OPTIONS, "DENY"),
    (header::REFERRER_POLICY, "same-origin"),
];

#[derive(Debug, Clone)]
struct SecurityHeaders {
    csp: HeaderValue,
    hsts: bool,
}

impl SecurityHeaders {
    fn from_env() -> Self {
        let csp = match env::var("CSP_POLICY") {
            Ok(raw) => HeaderValue::from_str(raw.trim()).unwrap_or_else(|err| {
                tracing::warn!("Ignoring invalid CSP_POLICY ({}), using default", err);
                HeaderValue::from_static(DEFAULT_CSP)
            }),
            Err(_) => HeaderValue::from_static(DEFAULT_CSP),
        };

        // HSTS only makes sense behind TLS, which local runs rarely have.
        let production = env::var("APP_ENV")
            .map(|v| v.eq_ignore_ascii_case("production"))
            .unwrap_or(false);

        Self {
            csp,
            hsts: parse_bool_env("ENABLE_HSTS", production),
        }
    }

    fn apply(&self, headers: &mut HeaderMap) {
        headers.insert(header::CONTENT_SECURITY_POLICY, self.csp.clone());
        for (name, value) in FIXED_HEADERS {
            headers.insert(name, HeaderValue::from_static(value));
        }
        if self.hsts {
            headers.insert(header::STRICT_TRANSPORT_SECURITY, HeaderValue::from_static(HSTS));
        }
    }
}

fn security_headers() -> &'static SecurityHeaders {
    static HEADERS: OnceLock<SecurityHeaders> = OnceLock::new();
    HEADERS.get_or_init(SecurityHeaders::from_env)
}

pub async fn security_headers_middleware(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    security_headers().apply(response.headers_mut());
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn applies_fixed_headers_without_hsts() {
        let config = SecurityHeaders {
            csp: HeaderValue::from_static(DEFAULT_CSP),
            hsts: false,
        };
        let mut headers = HeaderMap::new();
        config.apply(&mut headers);

        assert_eq!(headers[header::X_FRAME_OPTIONS], "DENY");
        assert_eq!(headers[header::REFERRER_POLICY], "same-origin");
        assert_eq!(headers[header::CONTENT_SECURITY_POLICY], DEFAULT_CSP);
        assert!(!headers.contains_key(header::STRICT_TRANSPORT_SECURITY));
    }

    #[test]
    fn hsts_when_enabled() {
        let config = SecurityHeaders {
            csp: HeaderValue::from_static(DEFAULT_CSP),
            hsts: true,
        };
        let mut headers = HeaderMap::new();
        config.apply(&mut headers);
        assert_eq!(headers[header::STRICT_TRANSPORT_SECURITY], HSTS);
    }
}
