use super::*;
use jsonwebtoken::{EncodingKey, Header, encode};
use std::env;

const TEST_SECRET: &str = "supersecretjwtsecretforunittesting123";

fn set_env_vars() {
    unsafe {
        env::set_var("SERVER_PORT", "8080");
        env::set_var("SERVER_BODY_LIMIT", "10");
        env::set_var("SERVER_TIMEOUT", "30");
        env::set_var("DATABASE_URL", "postgres://localhost:5432/db");
        env::set_var("PAYGATE_API_BASE_URL", "https://api.paygate.test/v1/");
        env::set_var("PAYGATE_PUBLIC_KEY", "pk_test_123");
        env::set_var("PAYGATE_SHARED_SECRET", "whsec_test");
        env::set_var("PAYGATE_REDIRECT_URL", "https://app.test/billing/return");
        env::set_var("AUTH_JWT_SECRET", TEST_SECRET);
    }
}

fn encode_with_secret(claims: &AccessClaims, secret: &str) -> String {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

#[test]
fn test_validate_access_jwt_success() {
    set_env_vars();
    let my_claims = AccessClaims {
        sub: "123e4567-e89b-12d3-a456-426614174000".to_string(),
        role: "owner".to_string(),
        email: Some("test@example.com".to_string()),
        exp: 9999999999, // far future
    };

    let token = encode_with_secret(&my_claims, TEST_SECRET);

    let claims = validate_access_jwt(&token).expect("Valid token should pass");
    assert_eq!(claims.sub, my_claims.sub);
    assert_eq!(claims.email, my_claims.email);
    assert_eq!(claims.role, "owner");
}

#[test]
fn test_validate_access_jwt_expired() {
    set_env_vars();
    let my_claims = AccessClaims {
        sub: "123e4567-e89b-12d3-a456-426614174000".to_string(),
        role: "owner".to_string(),
        email: Some("test@example.com".to_string()),
        exp: 1, // past
    };

    let token = encode_with_secret(&my_claims, TEST_SECRET);

    let result = validate_access_jwt(&token);
    assert!(result.is_err());
}

#[test]
fn test_validate_access_jwt_invalid_signature() {
    set_env_vars();
    let my_claims = AccessClaims {
        sub: "123e4567-e89b-12d3-a456-426614174000".to_string(),
        role: "owner".to_string(),
        email: Some("test@example.com".to_string()),
        exp: 9999999999,
    };

    let token = encode_with_secret(&my_claims, "wrongsecret");

    let result = validate_access_jwt(&token);
    assert!(result.is_err());
}

#[test]
fn test_admin_role_detection() {
    let admin = AuthUser {
        user_id: Uuid::nil(),
        email: None,
        role: "admin".to_string(),
    };
    let owner = AuthUser {
        user_id: Uuid::nil(),
        email: None,
        role: "owner".to_string(),
    };

    assert!(admin.is_admin());
    assert!(!owner.is_admin());
}
