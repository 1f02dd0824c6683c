use bizdoc_worker::auth::{
    clear_session_cookie, has_session, read_cookie, session_cookie, session_value, verify_token,
};
use bizdoc_worker::error::ApiError;

#[test]
fn verify_token_distinguishes_config_and_mismatch() {
    assert!(matches!(
        verify_token(None, "anything"),
        Err(ApiError::Config(_))
    ));
    match verify_token(Some("s3cret"), "guess") {
        Err(error @ ApiError::Unauthorized(_)) => {
            assert_eq!(error.message(), "Invalid access token");
            assert_eq!(error.status_code(), 401);
        }
        other => panic!("expected unauthorized, got {other:?}"),
    }
    assert!(verify_token(Some("s3cret"), "s3cret").is_ok());
}

#[test]
fn config_errors_hide_their_detail() {
    let error = ApiError::Config("ADMIN_ACCESS_TOKEN missing".to_string());
    assert_eq!(error.message(), "Server configuration error");
    assert_eq!(error.status_code(), 500);
    assert!(error.to_string().contains("ADMIN_ACCESS_TOKEN"));
}

#[test]
fn session_cookie_attributes() {
    let cookie = session_cookie("admin_session", "s3cret", false);
    assert_eq!(
        cookie,
        format!(
            "admin_session={}; HttpOnly; Path=/; Max-Age=604800; SameSite=Lax",
            session_value("s3cret")
        )
    );
    assert!(!cookie.contains("s3cret"));
    assert!(session_cookie("admin_session", "s3cret", true).ends_with("; Secure"));
    assert_eq!(
        clear_session_cookie("admin_session", false),
        "admin_session=; HttpOnly; Path=/; Max-Age=0; SameSite=Lax"
    );
}

#[test]
fn session_value_is_a_sha256_hex_digest() {
    let value = session_value("s3cret");
    assert_eq!(value.len(), 64);
    assert!(value.chars().all(|ch| ch.is_ascii_hexdigit()));
    assert_ne!(value, session_value("other"));
}

#[test]
fn session_gate_reads_the_named_cookie() {
    let header = format!("theme=dark; admin_session={}; lang=en", session_value("s3cret"));

    assert_eq!(read_cookie("a=1; b=two%20words", "b").as_deref(), Some("two words"));
    assert!(has_session(Some(&header), "admin_session", Some("s3cret")));
    assert!(!has_session(Some(&header), "admin_session", Some("rotated")));
    assert!(!has_session(Some(&header), "other_cookie", Some("s3cret")));
    assert!(!has_session(None, "admin_session", Some("s3cret")));
    assert!(!has_session(Some(&header), "admin_session", None));
}
