#![allow(dead_code)]

use assert_cmd::Command;
use mockito::{Matcher, Mock, ServerGuard};

pub const ORG_ID: &str = "8a8f6abc-2745-4d8a-9cbc-8dabe5a7d0e4";
pub const SERVER_ID: &str = "8aeff10c-c918-4021-b2ce-93e4a209418b";

pub const ACCOUNT: &str = include_str!("../fixtures/account.xml");
pub const SERVERS: &str = include_str!("../fixtures/servers.xml");
pub const SERVERS_SINGLE: &str = include_str!("../fixtures/servers_single.xml");
pub const SERVERS_PAGE1: &str = include_str!("../fixtures/servers_page1.xml");
pub const SERVERS_PAGE2: &str = include_str!("../fixtures/servers_page2.xml");
pub const SERVERS_EMPTY: &str = include_str!("../fixtures/servers_empty.xml");
pub const SERVER: &str = include_str!("../fixtures/server.xml");
pub const IN_PROGRESS: &str = include_str!("../fixtures/in_progress.xml");
pub const NOT_ACCEPTED: &str = include_str!("../fixtures/not_accepted.xml");
pub const RESOURCE_BUSY: &str = include_str!("../fixtures/resource_busy.xml");
pub const RESOURCE_NOT_FOUND: &str = include_str!("../fixtures/resource_not_found.xml");
pub const DEPLOY_SERVER: &str = include_str!("../fixtures/deploy_server.xml");
pub const BACKUP_SUCCESS: &str = include_str!("../fixtures/backup_success.xml");
pub const BACKUP_ERROR: &str = include_str!("../fixtures/backup_error.xml");
pub const BACKUP_NOT_DISABLED: &str = include_str!("../fixtures/backup_not_disabled.xml");
pub const BACKUP_DETAILS: &str = include_str!("../fixtures/backup_details.xml");
pub const BACKUP_DETAILS_NO_CLIENTS: &str =
    include_str!("../fixtures/backup_details_no_clients.xml");
pub const CLIENT_TYPES: &str = include_str!("../fixtures/client_types.xml");
pub const STORAGE_POLICIES: &str = include_str!("../fixtures/storage_policies.xml");
pub const SCHEDULE_POLICIES: &str = include_str!("../fixtures/schedule_policies.xml");
pub const SCHEDULE_POLICIES_EMPTY: &str = include_str!("../fixtures/schedule_policies_empty.xml");

/// Start a mock API that already answers the account lookup.
pub fn create_mock_api() -> ServerGuard {
    let mut server = mockito::Server::new();
    add_mock(&mut server, "GET", "/oec/0.9/myaccount", ACCOUNT, 200);
    server
}

/// Path under the 2.4 organization root.
pub fn v2(path: &str) -> String {
    format!("/caas/2.4/{}/{}", ORG_ID, path)
}

/// Path under the 0.9 organization root.
pub fn v1(path: &str) -> String {
    format!("/oec/0.9/{}/{}", ORG_ID, path)
}

/// Paths with a query string must match it exactly, others accept any query.
pub fn add_mock(
    server: &mut ServerGuard,
    method: &str,
    path: &str,
    response_body: &str,
    status_code: usize,
) -> Mock {
    let mut mock = server.mock(method, path);
    if !path.contains('?') {
        mock = mock.match_query(Matcher::Any);
    }

    mock.with_status(status_code)
        .with_header("content-type", "application/xml")
        .with_body(response_body)
        .create()
}

/// The binary pointed at the mock API, isolated from the caller's environment.
pub fn didata(server: &ServerGuard) -> Command {
    let mut cmd = Command::cargo_bin("didata").expect("bin");
    cmd.env("DIDATA_USER", "fakeuser")
        .env("DIDATA_PASSWORD", "fakepassword")
        .env("DIDATA_ENDPOINT", server.url())
        .env("HOME", "/nonexistent")
        .env_remove("DIDATA_CONFIG")
        .env_remove("DIDATA_OUTPUTTYPE")
        .env_remove("DIDATA_REGION")
        .env_remove("MCP_USER")
        .env_remove("MCP_PASSWORD")
        .env_remove("MCP_REGION")
        .env_remove("RUST_LOG");
    cmd
}

pub struct Run {
    pub code: i32,
    pub stdout: String,
    pub stderr: String,
}

pub fn run(cmd: &mut Command) -> Run {
    let output = cmd.output().expect("run didata");
    Run {
        code: output.status.code().unwrap_or(-1),
        stdout: String::from_utf8(output.stdout).expect("utf8"),
        stderr: String::from_utf8(output.stderr).expect("utf8"),
    }
}
