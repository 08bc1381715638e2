//! HTTP client for the SubTracker backend.

use async_trait::async_trait;
use reqwest::Response;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::validation::SignInForm;

/// Identity snapshot returned by `GET /users/getMe`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(alias = "_id")]
    pub id: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,
}

/// `{ "data": ... }` wrapper used by most backend responses.
#[derive(Debug, Deserialize)]
pub(crate) struct DataEnvelope<T> {
    pub data: T,
}

#[derive(Debug, Deserialize)]
struct MessageBody {
    message: Option<String>,
}

/// Session operations the store depends on.
///
/// `ApiClient` is the production implementation; tests substitute an
/// in-memory fake.
#[async_trait]
pub trait SessionBackend: Send + Sync {
    /// Identity check. `Ok(None)` means the backend answered but there is no
    /// session.
    async fn get_me(&self) -> ClientResult<Option<User>>;

    async fn sign_in(&self, form: &SignInForm) -> ClientResult<()>;

    async fn sign_out(&self) -> ClientResult<()>;
}

/// Cookie-carrying HTTP client bound to one backend.
///
/// The cookie jar holds whatever session cookie the backend sets on sign-in
/// and sends it back on every later call. Its value is never inspected.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.backend_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub(crate) async fn get(&self, path: &str) -> ClientResult<Response> {
        let res = self.http.get(self.url(path)).send().await?;
        Ok(res)
    }

    pub(crate) async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> ClientResult<Response> {
        let res = self.http.post(self.url(path)).json(body).send().await?;
        Ok(res)
    }

    /// Decode a 2xx body, or fail with `failure` as the user-facing message.
    pub(crate) async fn expect_json<T: DeserializeOwned>(&self, res: Response, failure: &str) -> ClientResult<T> {
        let status = res.status();
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), url = %res.url(), "{}", failure);
            return Err(ClientError::Api {
                status: status.as_u16(),
                message: failure.to_string(),
            });
        }
        res.json::<T>()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))
    }

    /// Turn a non-2xx response into an `Api` error carrying the backend's
    /// `{message}` when it sent one.
    async fn check_status(res: Response, fallback: &str) -> ClientResult<Response> {
        let status = res.status();
        if status.is_success() {
            return Ok(res);
        }
        let body = res.text().await.unwrap_or_default();
        let message = serde_json::from_str::<MessageBody>(&body)
            .ok()
            .and_then(|b| b.message)
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| fallback.to_string());
        Err(ClientError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl SessionBackend for ApiClient {
    async fn get_me(&self) -> ClientResult<Option<User>> {
        let res = self.get("/users/getMe").await?;
        if !res.status().is_success() {
            tracing::debug!(status = res.status().as_u16(), "Identity check returned no session");
            return Ok(None);
        }
        let body: DataEnvelope<Option<User>> = res
            .json()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))?;
        Ok(body.data)
    }

    async fn sign_in(&self, form: &SignInForm) -> ClientResult<()> {
        let res = self.post("/auth/sign-in", form).await?;
        Self::check_status(res, "Sign in failed").await?;
        Ok(())
    }

    async fn sign_out(&self) -> ClientResult<()> {
        let res = self.http.post(self.url("/auth/sign-out")).send().await?;
        Self::check_status(res, "Sign out failed").await?;
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::NewSubscription;

    async fn client() -> ApiClient {
        let base = fake_backend::spawn().await;
        ApiClient::new(&ClientConfig::new(base)).unwrap()
    }

    #[test]
    fn test_user_accepts_mongo_id() {
        let user: User = serde_json::from_value(serde_json::json!({
            "_id": "64f1c2a9e13b",
            "email": "jane@example.com",
            "profileImage": "https://cdn.example.com/jane.png"
        }))
        .unwrap();
        assert_eq!(user.id, "64f1c2a9e13b");
        assert_eq!(user.name, None);
        assert_eq!(user.profile_image.as_deref(), Some("https://cdn.example.com/jane.png"));
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = ApiClient::new(&ClientConfig::new("http://localhost:5000/api/v1/")).unwrap();
        assert_eq!(client.base_url(), "http://localhost:5000/api/v1");
    }

    #[tokio::test]
    async fn test_get_me_without_session() {
        let client = client().await;
        assert_eq!(client.get_me().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_sign_in_sets_cookie_for_later_calls() {
        let client = client().await;
        client
            .sign_in(&SignInForm::new("jane@example.com", "correct-horse"))
            .await
            .unwrap();

        let user = client.get_me().await.unwrap().unwrap();
        assert_eq!(user.id, "64f1c2a9e13b");
        assert_eq!(user.name.as_deref(), Some("Jane"));

        tokio_test::assert_ok!(client.sign_out().await);
        assert_eq!(client.get_me().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_sign_in_rejection_carries_backend_message() {
        let client = client().await;
        let err = client
            .sign_in(&SignInForm::new("jane@example.com", "wrong-password"))
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(401));
        assert_eq!(err.to_string(), "Invalid email or password");
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_network_error() {
        let client = ApiClient::new(&ClientConfig::new("http://127.0.0.1:9")).unwrap();
        assert!(matches!(client.get_me().await, Err(ClientError::Network(_))));
    }

    #[tokio::test]
    async fn test_list_subscriptions() {
        let client = client().await;
        let err = client.list_subscriptions().await.unwrap_err();
        assert_eq!(err.to_string(), "Error While Getting User Subscriptions");

        client
            .sign_in(&SignInForm::new("jane@example.com", "correct-horse"))
            .await
            .unwrap();
        let subs = client.list_subscriptions().await.unwrap();
        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0].name, "Netflix");
    }

    #[tokio::test]
    async fn test_spending_analytics_failure_message() {
        let client = client().await;
        let err = client.spending_analytics().await.unwrap_err();
        assert_eq!(err.status(), Some(500));
        assert_eq!(err.to_string(), "Failed To Fetch Your Subscriptions Details");
    }

    #[tokio::test]
    async fn test_create_subscription() {
        let client = client().await;
        let created = client
            .create_subscription(NewSubscription {
                name: "Coursera".to_string(),
                category: "education".to_string(),
                price: 49.0,
                currency: "USD".to_string(),
                frequency: "monthly".to_string(),
                payment_method: Some(" ".to_string()),
                ..Default::default()
            })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(created.id, "665f1c0e8b");
        assert_eq!(created.payment_method, None);
    }

    #[tokio::test]
    async fn test_create_subscription_validates_first() {
        // Nothing listens on this port, so any request would fail as Network.
        let client = ApiClient::new(&ClientConfig::new("http://127.0.0.1:9")).unwrap();
        let err = client
            .create_subscription(NewSubscription::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));
    }
}
