// Sign-in: password step, OTP verification, OTP resend, sign-out.

use log::info;

use super::client::{ApiClient, Fetched, RequestContext};
use super::error::ApiError;
use crate::models::requests::{LoginRequest, ResendOtpRequest, VerifyOtpRequest};
use crate::models::responses::{AuthTokenResponse, LoginResponse, OtpResendResponse};
use crate::models::state::Session;
use crate::utils::logging::mask_sensitive;

/// Default code lifetime when the server does not say.
pub const DEFAULT_OTP_SECONDS: u32 = 300;

#[derive(Debug, Clone, PartialEq)]
pub enum LoginOutcome {
    /// A code was sent; the caller continues with [`verify_otp`].
    OtpRequired { email: String, expires_in: u32 },
    SignedIn(Session),
}

pub async fn login(
    client: &ApiClient,
    ctx: &RequestContext,
    email: &str,
    password: &str,
) -> Result<LoginOutcome, ApiError> {
    let email = email.trim().to_lowercase();
    info!(
        "[PHASE: auth] [STEP: login] sign-in requested for {} (correlation_id={})",
        mask_sensitive(&email),
        ctx.correlation_id()
    );
    let body = LoginRequest {
        email: email.clone(),
        password: password.to_string(),
    };
    let fetched: Fetched<LoginResponse> = client.post(ctx, &["auth", "login"], &body).await?;
    login_outcome(email, fetched.data)
}

/// Interprets the password-step response.
pub fn login_outcome(email: String, response: LoginResponse) -> Result<LoginOutcome, ApiError> {
    if response.otp_required {
        return Ok(LoginOutcome::OtpRequired {
            email,
            expires_in: response.otp_expires_in.unwrap_or(DEFAULT_OTP_SECONDS),
        });
    }
    match (response.token, response.user) {
        (Some(token), Some(user)) if !token.trim().is_empty() => Ok(LoginOutcome::SignedIn(Session::new(token, user))),
        _ => Err(ApiError::MalformedResponse(
            "login response carried neither an OTP challenge nor a token".to_string(),
        )),
    }
}

pub async fn verify_otp(
    client: &ApiClient,
    ctx: &RequestContext,
    email: &str,
    code: &str,
) -> Result<Session, ApiError> {
    let body = VerifyOtpRequest {
        email: email.to_string(),
        otp: code.to_string(),
    };
    let fetched: Fetched<AuthTokenResponse> = client.post(ctx, &["auth", "verify-otp"], &body).await?;
    info!(
        "[PHASE: auth] [STEP: verify_otp] signed in as {} (correlation_id={})",
        mask_sensitive(&fetched.data.user.email),
        ctx.correlation_id()
    );
    Ok(Session::new(fetched.data.token, fetched.data.user))
}

/// Returns the new code lifetime in seconds.
pub async fn resend_otp(client: &ApiClient, ctx: &RequestContext, email: &str) -> Result<u32, ApiError> {
    let body = ResendOtpRequest {
        email: email.to_string(),
    };
    let fetched: Fetched<Option<OtpResendResponse>> = client.post(ctx, &["auth", "resend-otp"], &body).await?;
    Ok(fetched
        .data
        .map(|r| r.otp_expires_in)
        .filter(|secs| *secs > 0)
        .unwrap_or(DEFAULT_OTP_SECONDS))
}

pub async fn logout(client: &ApiClient, ctx: &RequestContext) -> Result<(), ApiError> {
    let _: Fetched<Option<serde_json::Value>> = client.post(ctx, &["auth", "logout"], &serde_json::json!({})).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::{body_of, settings_for, Canned, CannedServer};

    #[tokio::test]
    async fn login_with_otp_challenge() {
        let server = CannedServer::start(vec![Canned::json(
            200,
            r#"{"success":true,"data":{"otpRequired":true,"otpExpiresIn":120}}"#,
        )])
        .await;
        let client = ApiClient::new(&settings_for(&server.base_url())).unwrap();

        let outcome = login(&client, &RequestContext::anonymous(), " Ops@Freight.test ", "pw")
            .await
            .unwrap();
        assert_eq!(
            outcome,
            LoginOutcome::OtpRequired {
                email: "ops@freight.test".to_string(),
                expires_in: 120
            }
        );

        let raw = &server.requests()[0];
        assert!(raw.starts_with("POST /api/auth/login "));
        let body: serde_json::Value = serde_json::from_str(body_of(raw)).unwrap();
        assert_eq!(body["email"], "ops@freight.test");
    }

    #[tokio::test]
    async fn verify_otp_returns_a_session() {
        let server = CannedServer::start(vec![Canned::json(
            200,
            r#"{"success":true,"data":{"token":"jwt","user":{"id":"u1","fullName":"Ops","email":"ops@freight.test","role":"admin"}}}"#,
        )])
        .await;
        let client = ApiClient::new(&settings_for(&server.base_url())).unwrap();
        let session = verify_otp(&client, &RequestContext::anonymous(), "ops@freight.test", "123456")
            .await
            .unwrap();
        assert_eq!(session.token, "jwt");
        assert!(session.is_admin());
        assert!(body_of(&server.requests()[0]).contains(r#""otp":"123456""#));
    }

    #[tokio::test]
    async fn wrong_code_is_rejected() {
        let server = CannedServer::start(vec![Canned::json(
            200,
            r#"{"success":false,"error":"Invalid or expired code"}"#,
        )])
        .await;
        let client = ApiClient::new(&settings_for(&server.base_url())).unwrap();
        let err = verify_otp(&client, &RequestContext::anonymous(), "a@b.co", "000000")
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), "Invalid or expired code");
    }

    #[tokio::test]
    async fn resend_falls_back_to_default_lifetime() {
        let server = CannedServer::start(vec![Canned::json(200, r#"{"success":true,"message":"sent"}"#)]).await;
        let client = ApiClient::new(&settings_for(&server.base_url())).unwrap();
        let secs = resend_otp(&client, &RequestContext::anonymous(), "a@b.co").await.unwrap();
        assert_eq!(secs, DEFAULT_OTP_SECONDS);
    }

    #[test]
    fn login_without_token_or_challenge_is_malformed() {
        let err = login_outcome("a@b.co".to_string(), LoginResponse::default()).unwrap_err();
        assert!(matches!(err, ApiError::MalformedResponse(_)));
    }
}
