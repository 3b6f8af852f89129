//! Unit tests for CLI commands

use std::io::Write;

use clap::Parser;

use crate::cli::{execute, parse_header, Cli, Commands, TokenCommand};

const SECRET_FILE: &str = "token:\n  secret: cli-test-secret-cli-test-secret-0123\n";

fn config_file() -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(SECRET_FILE.as_bytes()).unwrap();
    file
}

#[test]
fn test_dispatch_command_with_headers() {
    let cli = Cli::try_parse_from([
        "tollgate",
        "dispatch",
        "post",
        "/api/users/1/like",
        "-H",
        "Authorization: Bearer abc",
        "-H",
        "Origin: http://localhost:5173",
    ])
    .unwrap();

    match cli.command {
        Commands::Dispatch {
            method,
            uri,
            headers,
            body,
        } => {
            assert_eq!(method, "post");
            assert_eq!(uri, "/api/users/1/like");
            assert_eq!(headers.len(), 2);
            assert!(body.is_none());
        }
        _ => panic!("Expected Dispatch command"),
    }
}

#[test]
fn test_token_issue_defaults_role() {
    let cli = Cli::try_parse_from(["tollgate", "token", "issue", "--user-id", "7"]).unwrap();
    match cli.command {
        Commands::Token {
            action: TokenCommand::Issue { user_id, role, .. },
        } => {
            assert_eq!(user_id, "7");
            assert_eq!(role, "user");
        }
        _ => panic!("Expected token issue command"),
    }
}

#[test]
fn test_parse_header() {
    assert_eq!(
        parse_header("Authorization:  Bearer x ").unwrap(),
        ("Authorization".to_string(), "Bearer x".to_string())
    );
    assert!(parse_header("no-colon").is_err());
    assert!(parse_header(": value").is_err());
}

#[test]
fn test_issue_then_verify_round_trip() {
    let file = config_file();
    let path = file.path().to_str().unwrap();

    let issue = Cli::try_parse_from([
        "tollgate", "--config", path, "token", "issue", "--user-id", "2", "--claim", "tier=3",
    ])
    .unwrap();
    let token = execute(&issue).unwrap();
    assert_eq!(token.split('.').count(), 3);

    let verify = Cli::try_parse_from(["tollgate", "--config", path, "token", "verify", &token])
        .unwrap();
    let claims: serde_json::Value = serde_json::from_str(&execute(&verify).unwrap()).unwrap();
    assert_eq!(claims["user_id"], "2");
    assert_eq!(claims["tier"], 3);
}

#[test]
fn test_routes_lists_demo_table() {
    let file = config_file();
    let cli = Cli::try_parse_from([
        "tollgate",
        "routes",
        "--config",
        file.path().to_str().unwrap(),
    ])
    .unwrap();
    let table = execute(&cli).unwrap();
    assert!(table.contains("GET /api/admin/stats -> Admin.stats [cors, role:admin]"));
    assert!(table.contains("POST /api/users/{id}/like -> User.like [cors, auth]"));
}

#[test]
fn test_routes_needs_no_token_secret() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"token:\n  ttl_secs: 60\n").unwrap();
    let cli = Cli::try_parse_from(["tollgate", "--config", file.path().to_str().unwrap(), "routes"])
        .unwrap();

    let table = execute(&cli).unwrap();
    assert!(table.contains("POST /api/auth/login -> Auth.login [cors]"));
    assert!(table.contains("GET /api/me -> User.me [cors, auth]"));
}

#[test]
fn test_demo_route_listing_without_secret() {
    let config = crate::config::AppConfig::default();
    assert!(crate::demo::DemoApp::build(&config).is_err());

    let lines = crate::demo::DemoApp::route_listing(&config).unwrap();
    assert!(lines
        .iter()
        .any(|l| l == "GET /api/admin/stats -> Admin.stats [cors, role:admin]"));
}
