//! Conversions from external infrastructure errors into domain errors.

use gantry_domain::GantryError;
use reqwest::Error as HttpError;

/// Error newtype that keeps conversions on the infrastructure side and can
/// be converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub GantryError);

impl From<InfraError> for GantryError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<GantryError> for InfraError {
    fn from(value: GantryError) -> Self {
        InfraError(value)
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → GantryError */
/* -------------------------------------------------------------------------- */

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        if value.is_timeout() {
            return InfraError(GantryError::Network("HTTP request timed out".into()));
        }

        if value.is_connect() {
            return InfraError(GantryError::Network("HTTP connection failure".into()));
        }

        if let Some(status) = value.status() {
            let code = status.as_u16();
            let message =
                format!("HTTP {} {}", code, status.canonical_reason().unwrap_or("unknown status"));

            let mapped = match code {
                401 | 403 => GantryError::Auth(message),
                404 => GantryError::NotFound(message),
                429 => GantryError::Network(message),
                400..=499 => GantryError::InvalidInput(message),
                _ => GantryError::Network(message),
            };
            return InfraError(mapped);
        }

        InfraError(GantryError::Network(value.to_string()))
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */

#[cfg(test)]
mod tests {
    use reqwest::{Client, StatusCode};
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    async fn status_error(status: StatusCode) -> HttpError {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(status))
            .mount(&server)
            .await;

        let client = Client::builder().no_proxy().build().expect("client");
        client
            .get(server.uri())
            .send()
            .await
            .expect("response")
            .error_for_status()
            .expect_err("status error")
    }

    #[tokio::test]
    async fn http_status_401_maps_to_auth_error() {
        let mapped: GantryError = InfraError::from(status_error(StatusCode::UNAUTHORIZED).await).into();
        match mapped {
            GantryError::Auth(msg) => assert!(msg.contains("401")),
            other => panic!("expected auth error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn http_status_404_maps_to_not_found() {
        let mapped: GantryError = InfraError::from(status_error(StatusCode::NOT_FOUND).await).into();
        match mapped {
            GantryError::NotFound(msg) => assert!(msg.contains("404")),
            other => panic!("expected not found, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn http_status_500_maps_to_network_error() {
        let mapped: GantryError =
            InfraError::from(status_error(StatusCode::INTERNAL_SERVER_ERROR).await).into();
        match mapped {
            GantryError::Network(msg) => assert!(msg.contains("500")),
            other => panic!("expected network error, got {:?}", other),
        }
    }
}
