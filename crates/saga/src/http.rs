//! HTTP adapters for the collaborator services.
//!
//! Each adapter wraps a [`ServiceClient`] pointed at one service. Every
//! request carries the internal service credential in `x-service-key`.

use async_trait::async_trait;
use common::{RestaurantId, UserId};
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::GatewayError;
use crate::services::{
    CartService, Notification, NotificationService, RestaurantService, RestaurantSummary,
    SmsRequest, SmsService, TableRelease, TableReservation, TableService, UserProfile,
    UserService, cart, notification, restaurant, sms, table, user,
};

/// Header carrying the internal service credential.
pub const SERVICE_KEY_HEADER: &str = "x-service-key";

/// Error body returned by the collaborator services.
#[derive(serde::Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// How a 400 answer should be classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BadRequest {
    Rejected,
    Conflict,
}

/// HTTP client bound to one collaborator service.
#[derive(Debug, Clone)]
pub struct ServiceClient {
    client: Client,
    base_url: String,
    service_key: Option<String>,
    service: &'static str,
}

impl ServiceClient {
    pub fn new(
        client: Client,
        service: &'static str,
        base_url: &str,
        service_key: Option<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            service_key,
            service,
        }
    }

    /// Returns the base URL requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Builds a request URL from path segments.
    ///
    /// Each segment is percent-encoded, so an id containing `/`, `?` or `#`
    /// stays inside its own segment. Ids that would vanish from the path
    /// (`""`, `"."`, `".."`) are reported as not found without a request.
    fn url(&self, segments: &[&str], resource: &str) -> Result<Url, GatewayError> {
        if segments.iter().any(|s| matches!(*s, "" | "." | "..")) {
            return Err(GatewayError::NotFound {
                service: self.service,
                resource: resource.to_string(),
            });
        }

        let invalid = |reason: String| GatewayError::Unavailable {
            service: self.service,
            reason,
        };
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| invalid(format!("invalid base URL {}: {e}", self.base_url)))?;
        url.path_segments_mut()
            .map_err(|()| invalid(format!("base URL {} cannot carry a path", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, GatewayError> {
        let request = match &self.service_key {
            Some(key) => request.header(SERVICE_KEY_HEADER, key),
            None => request,
        };
        request.send().await.map_err(|e| GatewayError::Unavailable {
            service: self.service,
            reason: e.to_string(),
        })
    }

    async fn handle_response(
        &self,
        response: Response,
        resource: &str,
        bad_request: BadRequest,
    ) -> Result<Response, GatewayError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let reason = serde_json::from_str::<ErrorBody>(&text)
            .ok()
            .and_then(|body| body.message.or(body.error))
            .unwrap_or(text);

        let service = self.service;
        Err(match status {
            StatusCode::NOT_FOUND => GatewayError::NotFound {
                service,
                resource: resource.to_string(),
            },
            StatusCode::CONFLICT => GatewayError::Conflict { service, reason },
            StatusCode::BAD_REQUEST if bad_request == BadRequest::Conflict => {
                GatewayError::Conflict { service, reason }
            }
            s if s.is_client_error() => GatewayError::Rejected {
                service,
                status: s.as_u16(),
                reason,
            },
            s => GatewayError::Unavailable {
                service,
                reason: format!("{s}: {reason}"),
            },
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &[&str],
        resource: &str,
    ) -> Result<T, GatewayError> {
        let url = self.url(path, resource)?;
        let response = self.send(self.client.get(url)).await?;
        let response = self
            .handle_response(response, resource, BadRequest::Rejected)
            .await?;
        response.json().await.map_err(|e| GatewayError::Unavailable {
            service: self.service,
            reason: format!("invalid response body: {e}"),
        })
    }

    async fn post_json<B: Serialize + Sync>(
        &self,
        path: &[&str],
        body: &B,
        resource: &str,
        bad_request: BadRequest,
    ) -> Result<(), GatewayError> {
        let url = self.url(path, resource)?;
        let response = self.send(self.client.post(url).json(body)).await?;
        self.handle_response(response, resource, bad_request)
            .await?;
        Ok(())
    }

    async fn delete(&self, path: &[&str], resource: &str) -> Result<(), GatewayError> {
        let url = self.url(path, resource)?;
        let response = self.send(self.client.delete(url)).await?;
        self.handle_response(response, resource, BadRequest::Rejected)
            .await?;
        Ok(())
    }
}

/// User service over HTTP.
#[derive(Debug, Clone)]
pub struct HttpUserService {
    client: ServiceClient,
}

impl HttpUserService {
    pub fn new(http: Client, base_url: &str, service_key: Option<String>) -> Self {
        Self {
            client: ServiceClient::new(http, user::SERVICE, base_url, service_key),
        }
    }
}

#[async_trait]
impl UserService for HttpUserService {
    async fn get_user(&self, user_id: &UserId) -> Result<UserProfile, GatewayError> {
        self.client
            .get_json(
                &["internal", "users", user_id.as_str()],
                &format!("user {user_id}"),
            )
            .await
    }

    async fn restaurant_owners(
        &self,
        restaurant_id: &RestaurantId,
    ) -> Result<Vec<UserProfile>, GatewayError> {
        let result = self
            .client
            .get_json(
                &["internal", "users", "by-restaurant", restaurant_id.as_str()],
                &format!("owners of restaurant {restaurant_id}"),
            )
            .await;
        match result {
            // no owner registered yet
            Err(GatewayError::NotFound { .. }) => Ok(Vec::new()),
            other => other,
        }
    }
}

/// Restaurant service over HTTP.
#[derive(Debug, Clone)]
pub struct HttpRestaurantService {
    client: ServiceClient,
}

impl HttpRestaurantService {
    pub fn new(http: Client, base_url: &str, service_key: Option<String>) -> Self {
        Self {
            client: ServiceClient::new(http, restaurant::SERVICE, base_url, service_key),
        }
    }
}

#[async_trait]
impl RestaurantService for HttpRestaurantService {
    async fn get_restaurant(
        &self,
        restaurant_id: &RestaurantId,
    ) -> Result<RestaurantSummary, GatewayError> {
        self.client
            .get_json(
                &["internal", "restaurants", restaurant_id.as_str()],
                &format!("restaurant {restaurant_id}"),
            )
            .await
    }
}

/// Table service over HTTP.
#[derive(Debug, Clone)]
pub struct HttpTableService {
    client: ServiceClient,
}

impl HttpTableService {
    pub fn new(http: Client, base_url: &str, service_key: Option<String>) -> Self {
        Self {
            client: ServiceClient::new(http, table::SERVICE, base_url, service_key),
        }
    }
}

#[async_trait]
impl TableService for HttpTableService {
    async fn reserve(&self, reservation: &TableReservation) -> Result<(), GatewayError> {
        self.client
            .post_json(
                &["internal", "tables", "reserve"],
                reservation,
                &format!("table {}", reservation.table_number),
                BadRequest::Conflict,
            )
            .await
    }

    async fn release(&self, release: &TableRelease) -> Result<(), GatewayError> {
        self.client
            .post_json(
                &["internal", "tables", "release"],
                release,
                &format!("table {}", release.table_number),
                BadRequest::Rejected,
            )
            .await
    }
}

/// Cart service over HTTP.
#[derive(Debug, Clone)]
pub struct HttpCartService {
    client: ServiceClient,
}

impl HttpCartService {
    pub fn new(http: Client, base_url: &str, service_key: Option<String>) -> Self {
        Self {
            client: ServiceClient::new(http, cart::SERVICE, base_url, service_key),
        }
    }
}

#[async_trait]
impl CartService for HttpCartService {
    async fn clear(&self, user_id: &UserId) -> Result<(), GatewayError> {
        self.client
            .delete(
                &["internal", "clear", user_id.as_str()],
                &format!("cart of user {user_id}"),
            )
            .await
    }
}

/// Notification service over HTTP.
#[derive(Debug, Clone)]
pub struct HttpNotificationService {
    client: ServiceClient,
}

impl HttpNotificationService {
    pub fn new(http: Client, base_url: &str, service_key: Option<String>) -> Self {
        Self {
            client: ServiceClient::new(http, notification::SERVICE, base_url, service_key),
        }
    }
}

#[async_trait]
impl NotificationService for HttpNotificationService {
    async fn send(&self, notification: &Notification) -> Result<(), GatewayError> {
        self.client
            .post_json(
                &["internal", "notifications"],
                notification,
                &format!("user {}", notification.user_id),
                BadRequest::Rejected,
            )
            .await
    }
}

/// SMS service over HTTP.
#[derive(Debug, Clone)]
pub struct HttpSmsService {
    client: ServiceClient,
}

impl HttpSmsService {
    pub fn new(http: Client, base_url: &str, service_key: Option<String>) -> Self {
        Self {
            client: ServiceClient::new(http, sms::SERVICE, base_url, service_key),
        }
    }
}

#[async_trait]
impl SmsService for HttpSmsService {
    async fn send_template(&self, request: &SmsRequest) -> Result<(), GatewayError> {
        self.client
            .post_json(
                &["internal", "send"],
                request,
                &format!("user {}", request.user_id),
                BadRequest::Rejected,
            )
            .await
    }
}
