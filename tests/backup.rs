mod common;

use common::*;

fn backup_path(suffix: &str) -> String {
    v1(&format!("server/{}/backup{}", SERVER_ID, suffix))
}

#[test]
fn enable_success() {
    let mut api = create_mock_api();
    let enable = api
        .mock("POST", backup_path("").as_str())
        .match_body(mockito::Matcher::Regex(r#"servicePlan="Advanced""#.to_string()))
        .with_status(200)
        .with_body(BACKUP_SUCCESS)
        .create();

    let out = run(didata(&api).args([
        "backup",
        "enable",
        "--serverId",
        SERVER_ID,
        "--servicePlan",
        "Advanced",
    ]));
    assert_eq!(out.code, 0, "{}", out.stderr);
    assert_eq!(
        out.stdout,
        format!("Backups enabled for {}.  Service plan: Advanced\n", SERVER_ID)
    );
    enable.assert();
}

#[test]
fn enable_api_error() {
    let mut api = create_mock_api();
    add_mock(&mut api, "POST", &backup_path(""), BACKUP_ERROR, 400);

    let out = run(didata(&api).args([
        "backup",
        "enable",
        "--serverId",
        SERVER_ID,
        "--servicePlan",
        "Enterprise",
    ]));
    assert_eq!(out.code, 1);
    assert!(out.stderr.contains("REASON_550"));
}

#[test]
fn enable_without_service_plan() {
    let api = mockito::Server::new();

    let out = run(didata(&api).args(["backup", "enable", "--serverId", SERVER_ID]));
    assert_eq!(out.code, 1);
    assert!(out.stderr.contains("--servicePlan"));
}

#[test]
fn disable_success() {
    let mut api = create_mock_api();
    add_mock(&mut api, "POST", &backup_path("?disable"), BACKUP_SUCCESS, 200);

    let out = run(didata(&api).args(["backup", "disable", "--serverId", SERVER_ID]));
    assert_eq!(out.code, 0, "{}", out.stderr);
    assert_eq!(out.stdout, format!("Backups disabled for {}\n", SERVER_ID));
}

#[test]
fn disable_not_accepted() {
    let mut api = create_mock_api();
    add_mock(&mut api, "POST", &backup_path("?disable"), BACKUP_NOT_DISABLED, 200);

    let out = run(didata(&api).args(["backup", "disable", "--serverId", SERVER_ID]));
    assert_eq!(out.code, 1);
    assert!(out
        .stderr
        .contains(&format!("Backups not disabled for {}", SERVER_ID)));
}

#[test]
fn info_shows_clients_and_running_job() {
    let mut api = create_mock_api();
    add_mock(&mut api, "GET", &backup_path(""), BACKUP_DETAILS, 200);

    let out = run(didata(&api).args(["backup", "info", "--serverId", SERVER_ID]));
    assert_eq!(out.code, 0, "{}", out.stderr);
    assert!(out
        .stdout
        .starts_with(&format!("Backup Details for {}\n", SERVER_ID)));
    assert!(out.stdout.contains("Service Plan: Enterprise\n"));
    assert!(out.stdout.contains("Type: FA.Linux\n"));
    assert!(out.stdout.contains("Percentage Complete: 50\n"));
}

#[test]
fn info_as_yaml() {
    let mut api = create_mock_api();
    add_mock(&mut api, "GET", &backup_path(""), BACKUP_DETAILS, 200);

    let out = run(didata(&api).args([
        "backup",
        "info",
        "--serverId",
        SERVER_ID,
        "--outputType",
        "yaml",
    ]));
    assert_eq!(out.code, 0, "{}", out.stderr);
    let parsed: serde_yaml::Value = serde_yaml::from_str(&out.stdout).unwrap();
    assert_eq!(parsed["Service Plan"].as_str(), Some("Enterprise"));
}

#[test]
fn add_client_with_alerting() {
    let mut api = create_mock_api();
    let add = api
        .mock("POST", backup_path("/client").as_str())
        .match_body(mockito::Matcher::AllOf(vec![
            mockito::Matcher::Regex(r#"trigger="ON_FAILURE""#.to_string()),
            mockito::Matcher::Regex("ops@example.com".to_string()),
        ]))
        .with_status(200)
        .with_body(BACKUP_SUCCESS)
        .create();

    let out = run(didata(&api).args([
        "backup",
        "add_client",
        "--serverId",
        SERVER_ID,
        "--clientType",
        "FA.Linux",
        "--storagePolicy",
        "14 Day Storage Policy",
        "--schedulePolicy",
        "12AM - 6AM",
        "--triggerOn",
        "ON_FAILURE",
        "--notifyEmail",
        "ops@example.com",
    ]));
    assert_eq!(out.code, 0, "{}", out.stderr);
    assert_eq!(
        out.stdout,
        format!("Enabled FA.Linux client on {}\n", SERVER_ID)
    );
    add.assert();
}

#[test]
fn remove_client_not_accepted() {
    let mut api = create_mock_api();
    add_mock(
        &mut api,
        "POST",
        &backup_path("/client/30b1ff76?disable"),
        BACKUP_NOT_DISABLED,
        200,
    );

    let out = run(didata(&api).args([
        "backup",
        "remove_client",
        "--serverId",
        SERVER_ID,
        "--clientId",
        "30b1ff76",
    ]));
    assert_eq!(out.code, 1);
    assert!(out.stderr.contains(&format!(
        "Something went wrong attempting to remove client from {}",
        SERVER_ID
    )));
}

#[test]
fn download_url() {
    let mut api = create_mock_api();
    add_mock(&mut api, "GET", &backup_path(""), BACKUP_DETAILS, 200);

    let out = run(didata(&api).args(["backup", "download_url", "--serverId", SERVER_ID]));
    assert_eq!(out.code, 0, "{}", out.stderr);
    assert_eq!(
        out.stdout,
        "https://backups-na.cloud-vpn.net/PCS/BackupClientInstallerDownload/cbb8a8c607ca4144e8828814edfc1634c8dd8782\n"
    );
}

#[test]
fn download_url_without_clients() {
    let mut api = create_mock_api();
    add_mock(&mut api, "GET", &backup_path(""), BACKUP_DETAILS_NO_CLIENTS, 200);

    let out = run(didata(&api).args(["backup", "download_url", "--serverId", SERVER_ID]));
    assert_eq!(out.code, 1);
    assert!(out
        .stderr
        .contains("No clients configured so there is no backup url"));
}

#[test]
fn list_client_types() {
    let mut api = create_mock_api();
    add_mock(&mut api, "GET", &backup_path("/client/type"), CLIENT_TYPES, 200);

    let out = run(didata(&api).args(["backup", "list_client_types", "--serverId", SERVER_ID]));
    assert_eq!(out.code, 0, "{}", out.stderr);
    assert!(out.stdout.contains("FA.Linux"));
    assert!(out.stdout.contains("MySQL Database"));
}

#[test]
fn list_storage_policies_as_json() {
    let mut api = create_mock_api();
    add_mock(
        &mut api,
        "GET",
        &backup_path("/client/storagePolicy"),
        STORAGE_POLICIES,
        200,
    );

    let out = run(didata(&api).args([
        "backup",
        "list_storage_policies",
        "--serverId",
        SERVER_ID,
        "--outputType",
        "json",
    ]));
    assert_eq!(out.code, 0, "{}", out.stderr);
    let parsed: serde_json::Value = serde_json::from_str(&out.stdout).unwrap();
    assert_eq!(parsed.as_array().map(Vec::len), Some(2));
}

#[test]
fn list_schedule_policies() {
    let mut api = create_mock_api();
    add_mock(
        &mut api,
        "GET",
        &backup_path("/client/schedulePolicy"),
        SCHEDULE_POLICIES,
        200,
    );

    let out = run(didata(&api).args([
        "backup",
        "list-schedule-policies",
        "--serverId",
        SERVER_ID,
    ]));
    assert_eq!(out.code, 0, "{}", out.stderr);
    assert!(out.stdout.contains("12AM - 6AM"));
}

#[test]
fn list_schedule_policies_empty() {
    let mut api = create_mock_api();
    add_mock(
        &mut api,
        "GET",
        &backup_path("/client/schedulePolicy"),
        SCHEDULE_POLICIES_EMPTY,
        200,
    );

    let out = run(didata(&api).args([
        "backup",
        "list_schedule_policies",
        "--serverId",
        SERVER_ID,
    ]));
    assert_eq!(out.code, 0, "{}", out.stderr);
    assert_eq!(out.stdout, "No schedule policies found\n");
}

#[test]
fn list_schedule_policies_empty_as_json() {
    let mut api = create_mock_api();
    add_mock(
        &mut api,
        "GET",
        &backup_path("/client/schedulePolicy"),
        SCHEDULE_POLICIES_EMPTY,
        200,
    );

    let out = run(didata(&api).args([
        "backup",
        "list_schedule_policies",
        "--serverId",
        SERVER_ID,
        "--outputType",
        "json",
    ]));
    assert_eq!(out.code, 0, "{}", out.stderr);
    let parsed: serde_json::Value = serde_json::from_str(&out.stdout).unwrap();
    assert_eq!(parsed, serde_json::json!([]));
}
