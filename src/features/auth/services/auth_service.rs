use std::sync::Arc;

use serde_json::json;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::features::auth::dtos::{
    ChangePasswordRequestDto, LoginRequestDto, MessageResponseDto, RegisterRequestDto,
};
use crate::features::auth::models::{User, UserStats};
use crate::modules::http::{ApiRequest, RequestClient};
use crate::modules::notify::{Notifier, Severity};
use crate::shared::constants::{
    AUTH_LOGIN_PATH, AUTH_LOGOUT_PATH, AUTH_ME_PATH, AUTH_PASSWORD_PATH, AUTH_REGISTER_PATH,
    AUTH_STATS_PATH, UNKNOWN_ERROR_MESSAGE,
};

/// Fallback when a failed registration carries no error text
const REGISTER_FAILED_MESSAGE: &str = "Registration failed";

/// Service for session operations (login, logout, account info)
pub struct AuthService {
    client: Arc<dyn RequestClient>,
    notifier: Arc<dyn Notifier>,
}

impl AuthService {
    pub fn new(client: Arc<dyn RequestClient>, notifier: Arc<dyn Notifier>) -> Self {
        Self { client, notifier }
    }

    /// Create an account; the caller still has to log in afterwards
    pub async fn register(&self, dto: RegisterRequestDto) -> Result<User> {
        if let Err(errors) = dto.validate() {
            let e = AppError::from(errors);
            self.notifier.notify(&e.user_message(), Severity::Error);
            return Err(e);
        }

        let mut body = json!({
            "username": dto.username,
            "password": dto.password,
        });
        if let Some(code) = dto.invite_code.filter(|code| !code.is_empty()) {
            body["invite_code"] = json!(code);
        }

        let result = match self
            .client
            .send(ApiRequest::post(AUTH_REGISTER_PATH).json(body), None)
            .await
        {
            Ok(response) => response.into_result::<User>(REGISTER_FAILED_MESSAGE),
            Err(e) => Err(AppError::from(e)),
        };

        match result {
            Ok(user) => {
                tracing::info!("Registered account {}", user.username);
                self.notifier
                    .notify("Registered, please log in", Severity::Success);
                Ok(user)
            }
            Err(e) => {
                tracing::warn!("Registration failed for {}: {}", dto.username, e);
                self.notifier.notify(&e.user_message(), Severity::Error);
                Err(e)
            }
        }
    }

    /// Login with username and password; the session lives in the client's cookies
    pub async fn login(&self, dto: LoginRequestDto) -> Result<User> {
        dto.validate()?;

        let request = ApiRequest::post(AUTH_LOGIN_PATH).json(json!({
            "username": dto.username,
            "password": dto.password,
        }));

        match self.send::<User>(request).await {
            Ok(user) => {
                tracing::info!("Logged in as {} ({:?})", user.username, user.role);
                Ok(user)
            }
            Err(e) => {
                tracing::warn!("Login failed for {}: {}", dto.username, e);
                self.notifier.notify(&e.user_message(), Severity::Error);
                Err(e)
            }
        }
    }

    pub async fn logout(&self) -> Result<()> {
        self.send::<MessageResponseDto>(ApiRequest::post(AUTH_LOGOUT_PATH))
            .await?;
        tracing::info!("Logged out");
        Ok(())
    }

    /// The logged-in user, or None for an anonymous session
    pub async fn current_user(&self) -> Result<Option<User>> {
        match self.send::<User>(ApiRequest::get(AUTH_ME_PATH)).await {
            Ok(user) => Ok(Some(user)),
            Err(AppError::Unauthorized(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn stats(&self) -> Result<UserStats> {
        self.send(ApiRequest::get(AUTH_STATS_PATH)).await
    }

    pub async fn change_password(&self, dto: ChangePasswordRequestDto) -> Result<()> {
        if let Err(errors) = dto.validate() {
            let e = AppError::from(errors);
            self.notifier.notify(&e.user_message(), Severity::Error);
            return Err(e);
        }

        let request = ApiRequest::put(AUTH_PASSWORD_PATH).json(json!({
            "old_password": dto.old_password,
            "new_password": dto.new_password,
        }));

        match self.send::<MessageResponseDto>(request).await {
            Ok(response) => {
                let message = if response.message.is_empty() {
                    "Password updated".to_string()
                } else {
                    response.message
                };
                self.notifier.notify(&message, Severity::Success);
                Ok(())
            }
            Err(e) => {
                self.notifier.notify(&e.user_message(), Severity::Error);
                Err(e)
            }
        }
    }

    async fn send<T: serde::de::DeserializeOwned>(&self, request: ApiRequest) -> Result<T> {
        let response = self.client.send(request, None).await?;
        response.into_result(UNKNOWN_ERROR_MESSAGE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::auth::models::UserRole;
    use crate::modules::http::{Method, RequestBody};
    use crate::shared::test_helpers::{FakeRequestClient, RecordingNotifier};
    use tokio_test::{assert_err, assert_ok};

    fn setup() -> (Arc<AuthService>, Arc<FakeRequestClient>, Arc<RecordingNotifier>) {
        let client = FakeRequestClient::new();
        let notifier = RecordingNotifier::new();
        let service = Arc::new(AuthService::new(client.clone(), notifier.clone()));
        (service, client, notifier)
    }

    fn login_dto(username: &str, password: &str) -> LoginRequestDto {
        LoginRequestDto {
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn test_login_sends_credentials() {
        let (service, client, _) = setup();

        let task = {
            let service = Arc::clone(&service);
            tokio::spawn(async move { service.login(login_dto("alice", "secret")).await })
        };

        let call = client.next_call().await;
        assert_eq!(call.request.method, Method::Post);
        assert_eq!(call.request.path, AUTH_LOGIN_PATH);
        match call.request.body.as_ref() {
            Some(RequestBody::Json(body)) => {
                assert_eq!(body["username"], "alice");
                assert_eq!(body["password"], "secret");
            }
            other => panic!("expected JSON body, got {:?}", other),
        }
        call.respond(
            200,
            json!({"id": 1, "username": "alice", "role": "admin", "is_active": true}),
        );

        let user = assert_ok!(task.await.unwrap());
        assert_eq!(user.role, UserRole::Admin);
    }

    #[tokio::test]
    async fn test_login_rejects_empty_fields_without_request() {
        let (service, client, _) = setup();

        let err = assert_err!(service.login(login_dto("", "secret")).await);
        assert!(matches!(err, AppError::Validation(ref msg) if msg == "Username is required"));
        assert!(client.try_next_call().await.is_none());
    }

    #[tokio::test]
    async fn test_login_failure_notifies_server_message() {
        let (service, client, notifier) = setup();

        let task = {
            let service = Arc::clone(&service);
            tokio::spawn(async move { service.login(login_dto("alice", "wrong")).await })
        };
        client
            .next_call()
            .await
            .respond(401, json!({"error": "Invalid credentials"}));

        let err = assert_err!(task.await.unwrap());
        assert!(matches!(err, AppError::Unauthorized(_)));
        assert_eq!(
            notifier.messages(),
            vec![("Invalid credentials".to_string(), Severity::Error)]
        );
    }

    fn register_dto(invite_code: Option<&str>) -> RegisterRequestDto {
        RegisterRequestDto {
            username: "carol".to_string(),
            password: "hunter2".to_string(),
            invite_code: invite_code.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_register_with_invite_code() {
        let (service, client, notifier) = setup();

        let task = {
            let service = Arc::clone(&service);
            tokio::spawn(async move { service.register(register_dto(Some("WELCOME"))).await })
        };

        let call = client.next_call().await;
        assert_eq!(call.request.method, Method::Post);
        assert_eq!(call.request.path, AUTH_REGISTER_PATH);
        match call.request.body.as_ref() {
            Some(RequestBody::Json(body)) => {
                assert_eq!(body["username"], "carol");
                assert_eq!(body["password"], "hunter2");
                assert_eq!(body["invite_code"], "WELCOME");
            }
            other => panic!("expected JSON body, got {:?}", other),
        }
        call.respond(201, json!({"id": 5, "username": "carol", "role": "user"}));

        let user = assert_ok!(task.await.unwrap());
        assert_eq!(user.id, 5);
        assert!(!user.is_admin());
        assert_eq!(
            notifier.messages(),
            vec![("Registered, please log in".to_string(), Severity::Success)]
        );
    }

    #[tokio::test]
    async fn test_register_reports_server_error() {
        let (service, client, notifier) = setup();

        let task = {
            let service = Arc::clone(&service);
            tokio::spawn(async move { service.register(register_dto(None)).await })
        };

        let call = client.next_call().await;
        match call.request.body.as_ref() {
            Some(RequestBody::Json(body)) => assert!(body.get("invite_code").is_none()),
            other => panic!("expected JSON body, got {:?}", other),
        }
        call.respond(400, json!({"error": "Invite code required"}));

        let err = assert_err!(task.await.unwrap());
        assert!(matches!(err, AppError::Api { status: 400, .. }));
        assert_eq!(
            notifier.messages(),
            vec![("Invite code required".to_string(), Severity::Error)]
        );
    }

    #[tokio::test]
    async fn test_register_without_error_text_uses_fallback() {
        let (service, client, notifier) = setup();

        let task = {
            let service = Arc::clone(&service);
            tokio::spawn(async move { service.register(register_dto(None)).await })
        };
        client.next_call().await.respond(500, json!(null));

        assert_err!(task.await.unwrap());
        assert_eq!(
            notifier.messages(),
            vec![("Registration failed".to_string(), Severity::Error)]
        );
    }

    #[tokio::test]
    async fn test_current_user_anonymous() {
        let (service, client, _) = setup();

        let task = {
            let service = Arc::clone(&service);
            tokio::spawn(async move { service.current_user().await })
        };
        let call = client.next_call().await;
        assert_eq!(call.request.path, AUTH_ME_PATH);
        call.respond(401, json!({"error": "Unauthorized"}));

        assert_eq!(assert_ok!(task.await.unwrap()), None);
    }

    #[tokio::test]
    async fn test_stats() {
        let (service, client, _) = setup();

        let task = {
            let service = Arc::clone(&service);
            tokio::spawn(async move { service.stats().await })
        };
        client.next_call().await.respond(
            200,
            json!({"used_bytes": 2048, "image_count": 2, "quota_bytes": 524288000}),
        );

        let stats = assert_ok!(task.await.unwrap());
        assert_eq!(stats.image_count, 2);
        assert_eq!(stats.quota_bytes, 500 * 1024 * 1024);
    }

    #[tokio::test]
    async fn test_change_password() {
        let (service, client, notifier) = setup();

        let task = {
            let service = Arc::clone(&service);
            tokio::spawn(async move {
                service
                    .change_password(ChangePasswordRequestDto {
                        old_password: "old".to_string(),
                        new_password: "new".to_string(),
                    })
                    .await
            })
        };
        let call = client.next_call().await;
        assert_eq!(call.request.method, Method::Put);
        assert_eq!(call.request.path, AUTH_PASSWORD_PATH);
        call.respond(400, json!({"error": "Incorrect old password"}));

        assert_err!(task.await.unwrap());
        assert_eq!(
            notifier.messages(),
            vec![("Incorrect old password".to_string(), Severity::Error)]
        );
    }

    #[tokio::test]
    async fn test_logout_network_failure() {
        let (service, client, _) = setup();

        let task = {
            let service = Arc::clone(&service);
            tokio::spawn(async move { service.logout().await })
        };
        client.next_call().await.fail("connection refused");

        let err = assert_err!(task.await.unwrap());
        assert!(matches!(err, AppError::Transport(_)));
    }
}
