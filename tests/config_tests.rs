//! Endpoint authentication selection from config files and callbacks.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use pretty_assertions::assert_eq;
use tempfile::NamedTempFile;

use authbridge::auth::{authenticator_fn, AuthErrorKind, AuthenticationService, Authenticator};
use authbridge::config::{AuthMode, EndpointAuthConfig};
use authbridge::error::BridgeError;

fn config_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("tempfile");
    file.write_all(contents.as_bytes()).expect("write config");
    file
}

fn callback() -> Arc<dyn Authenticator> {
    Arc::new(authenticator_fn(|token| {
        if token == "secret_token" {
            "thisIsSupposedToBeSomeRandomToken".to_string()
        } else {
            String::new()
        }
    }))
}

#[tokio::test]
async fn static_token_from_file_wins_over_callback() {
    authbridge::runtime::init();
    let file = config_file("[auth]\ntoken = \"staticToken\"\n");
    let config = EndpointAuthConfig::load_from_path(file.path()).unwrap();
    assert_eq!(config.mode(true), AuthMode::StaticToken);

    let service = config.build_service(Some(callback())).unwrap().unwrap();
    let err = service
        .authenticate_async("secret_token".into(), None)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), AuthErrorKind::InvalidArgument);
    assert_eq!(err.message(), "Incorrect token");

    let session = service
        .authenticate_async("staticToken".into(), None)
        .await
        .unwrap();
    assert_eq!(session.as_str(), Some("{}"));
}

#[tokio::test]
async fn callback_used_without_static_token() {
    authbridge::runtime::init();
    let config = EndpointAuthConfig::from_toml("[auth]\n").unwrap();
    assert_eq!(config.mode(true), AuthMode::Callback);

    let service = config.build_service(Some(callback())).unwrap().unwrap();
    let session = service
        .authenticate_async("secret_token".into(), None)
        .await
        .unwrap();
    assert_eq!(session.as_str(), Some("thisIsSupposedToBeSomeRandomToken"));

    let err = service
        .authenticate_async("wrong".into(), None)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), AuthErrorKind::Internal);
    assert_eq!(err.message(), "Internal error");
}

#[test]
fn explicit_override_replaces_file_token() {
    let file = config_file("[auth]\ntoken = \"from-file\"\n");
    let config = EndpointAuthConfig::load_from_path(file.path())
        .unwrap()
        .overlay(EndpointAuthConfig::builder().token("from-flag".to_string()).build());
    assert_eq!(config.static_token(), Some("from-flag"));
}

#[test]
fn missing_file_is_io_error() {
    let err = EndpointAuthConfig::load_from_path("/nonexistent/authbridge/config.toml").unwrap_err();
    assert!(matches!(err, BridgeError::Io(_)));
}

#[test]
fn explicit_missing_config_path_is_usage_error() {
    let err = EndpointAuthConfig::load(Some(Path::new("/nonexistent/authbridge/config.toml")))
        .unwrap_err();
    assert!(matches!(err, BridgeError::Configuration(_)));
    assert!(err.is_usage_error());
    assert!(err.to_string().contains("/nonexistent/authbridge/config.toml"));
}
