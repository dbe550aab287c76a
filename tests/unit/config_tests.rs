//! Unit tests for configuration parsing and validation.

use std::path::PathBuf;

use game_warden::config::{GlobalConfig, ServerConfig};
use game_warden::AppError;

fn sample_toml() -> &'static str {
    r#"
command_prefix = "!"
channel_capacity = 8
read_buffer_bytes = 1024

[servers.survival]
exec_path = "/srv/minecraft/survival/server.jar"
exec_options = "-Xmx2G -Xms1G"

[servers.lobby]
exec_path = "/srv/minecraft/lobby/server.jar"
keep_alive = true
"#
}

#[test]
fn parses_valid_config() {
    let config = GlobalConfig::from_toml_str(sample_toml()).expect("config parses");

    assert_eq!(config.command_prefix, '!');
    assert_eq!(config.channel_capacity, 8);
    assert_eq!(config.read_buffer_bytes, 1024);
    assert_eq!(config.servers.len(), 2);

    let survival = &config.servers["survival"];
    assert_eq!(survival.exec_options, "-Xmx2G -Xms1G");
    assert_eq!(survival.launcher, "java", "launcher defaults to java");
    assert!(!survival.keep_alive, "keep_alive defaults to false");

    assert!(config.servers["lobby"].keep_alive);
}

#[test]
fn defaults_apply_when_fields_omitted() {
    let config = GlobalConfig::from_toml_str(
        r#"
[servers.main]
exec_path = "/srv/server.jar"
"#,
    )
    .expect("config parses");

    assert_eq!(config.command_prefix, '!');
    assert_eq!(config.channel_capacity, 8);
    assert_eq!(config.read_buffer_bytes, 1024);
}

#[test]
fn rejects_empty_server_table() {
    let result = GlobalConfig::from_toml_str("[servers]\n");

    match result {
        Err(AppError::Config(msg)) => {
            assert!(msg.contains("at least one"), "unexpected message: {msg}");
        }
        other => panic!("expected Err(AppError::Config), got: {other:?}"),
    }
}

#[test]
fn rejects_zero_channel_capacity() {
    let result = GlobalConfig::from_toml_str(
        r#"
channel_capacity = 0

[servers.main]
exec_path = "/srv/server.jar"
"#,
    );

    assert!(
        matches!(result, Err(AppError::Config(ref msg)) if msg.contains("channel_capacity")),
        "zero capacity must be rejected"
    );
}

#[test]
fn rejects_multi_character_prefix() {
    let result = GlobalConfig::from_toml_str(
        r#"
command_prefix = "!!"

[servers.main]
exec_path = "/srv/server.jar"
"#,
    );

    assert!(
        matches!(result, Err(AppError::Config(_))),
        "the prefix is a single character"
    );
}

#[test]
fn launch_args_follow_the_invocation_shape() {
    let server = ServerConfig {
        exec_path: PathBuf::from("/srv/minecraft/server.jar"),
        exec_options: "-Xmx2G -Xms1G".to_owned(),
        launcher: "java".to_owned(),
        keep_alive: false,
    };

    assert_eq!(
        server.launch_args(),
        vec![
            "-Xmx2G".to_owned(),
            "-Xms1G".to_owned(),
            "-jar".to_owned(),
            "/srv/minecraft/server.jar".to_owned(),
            "--nogui".to_owned(),
        ]
    );
}

#[test]
fn empty_exec_options_add_no_arguments() {
    let server = ServerConfig {
        exec_path: PathBuf::from("/srv/server.jar"),
        exec_options: String::new(),
        launcher: "java".to_owned(),
        keep_alive: false,
    };

    assert_eq!(
        server.launch_args(),
        vec![
            "-jar".to_owned(),
            "/srv/server.jar".to_owned(),
            "--nogui".to_owned(),
        ]
    );
}

#[test]
fn working_dir_is_the_executable_parent() {
    let server = ServerConfig {
        exec_path: PathBuf::from("/srv/minecraft/server.jar"),
        exec_options: String::new(),
        launcher: "java".to_owned(),
        keep_alive: false,
    };

    assert_eq!(server.working_dir(), PathBuf::from("/srv/minecraft"));
}

#[test]
fn bare_filename_falls_back_to_current_dir() {
    let server = ServerConfig {
        exec_path: PathBuf::from("server.jar"),
        exec_options: String::new(),
        launcher: "java".to_owned(),
        keep_alive: false,
    };

    assert_eq!(server.working_dir(), PathBuf::from("."));
}

#[test]
fn loads_config_from_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("config.toml");
    std::fs::write(&path, sample_toml()).expect("write config");

    let config = GlobalConfig::load_from_path(&path).expect("config loads");
    assert_eq!(config.servers.len(), 2);
}

#[test]
fn missing_file_is_a_config_error() {
    let result = GlobalConfig::load_from_path("/nonexistent/config.toml");

    assert!(
        matches!(result, Err(AppError::Config(ref msg)) if msg.contains("failed to read")),
        "a missing file must surface as AppError::Config"
    );
}
