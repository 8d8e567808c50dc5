//! Integration tests for configuration loading

#[path = "support.rs"]
mod support;

use anyhow::Result;
use casebridge_infra::config::{load_from_env, load_from_file};
use std::io::Write;

#[test]
fn file_loading_supports_toml_and_json() -> Result<()> {
    support::init_tracing();
    let dir = tempfile::tempdir()?;

    let toml_path = dir.path().join("config.toml");
    let mut toml_file = std::fs::File::create(&toml_path)?;
    write!(
        toml_file,
        r#"
        [crm]
        base_url = "https://crm.test/api/v4"
        page_size = 50

        [oauth]
        token_url = "https://crm.test/oauth/token"
        client_id = "file-client"
        "#
    )?;

    let config = load_from_file(Some(toml_path))?;
    assert_eq!(config.crm.base_url, "https://crm.test/api/v4");
    assert_eq!(config.crm.page_size, 50);
    assert_eq!(config.oauth.client_id, "file-client");

    let json_path = dir.path().join("config.json");
    std::fs::write(
        &json_path,
        r#"{"crm": {"base_url": "https://json.test"}, "oauth": {"client_id": "json-client"}}"#,
    )?;

    let config = load_from_file(Some(json_path))?;
    assert_eq!(config.crm.base_url, "https://json.test");
    assert_eq!(config.oauth.client_id, "json-client");

    Ok(())
}

#[test]
fn missing_file_is_a_config_error() {
    let result = load_from_file(Some(std::path::PathBuf::from("/nonexistent/config.toml")));
    assert!(result.is_err());
}

// Environment manipulation lives in a single test: the process environment
// is shared across the harness's threads.
#[test]
fn environment_loading_round_trip() {
    support::init_tracing();

    let vars = [
        ("CASEBRIDGE_CRM_BASE_URL", "https://env.test/api/v4"),
        ("CASEBRIDGE_OAUTH_TOKEN_URL", "https://env.test/oauth/token"),
        ("CASEBRIDGE_OAUTH_CLIENT_ID", "env-client"),
        ("CASEBRIDGE_CRM_PAGE_SIZE", "25"),
        ("CASEBRIDGE_SYNC_INTERVAL", "120"),
        ("CASEBRIDGE_SYNC_ENABLED", "false"),
    ];
    for (name, value) in vars {
        std::env::set_var(name, value);
    }

    let config = load_from_env().expect("config from environment");
    assert_eq!(config.crm.base_url, "https://env.test/api/v4");
    assert_eq!(config.crm.page_size, 25);
    assert_eq!(config.oauth.client_id, "env-client");
    assert_eq!(config.schedule.interval_secs, 120);
    assert!(!config.schedule.enabled);

    std::env::set_var("CASEBRIDGE_CRM_PAGE_SIZE", "not-a-number");
    assert!(load_from_env().is_err());

    for (name, _) in vars {
        std::env::remove_var(name);
    }

    // With the required variables gone, env loading reports what is missing.
    assert!(load_from_env().is_err());
}
