// ABOUTME: Integration tests for app push and route discovery.
// ABOUTME: Push failure and route-discovery failure must be distinct outcomes.

mod support;

use std::path::Path;

use stratus::deploy::{AppDeployer, DeployError};
use stratus::runner::CommandOutput;
use stratus::types::AppName;
use support::FakeCli;

const APP_STATUS_WITH_ROUTE: &str = "\
requested state: started
instances: 1/1
urls: foo.example.com
last uploaded: just now
";

const APP_STATUS_WITHOUT_ROUTE: &str = "\
requested state: started
instances: 1/1
last uploaded: just now
";

fn app() -> AppName {
    AppName::from_repo("guestbook")
}

#[tokio::test]
async fn push_passes_manifest_and_bundle() {
    let cli = FakeCli::always_ok("");
    let home = tempfile::tempdir().unwrap();
    let deployer = AppDeployer::new(&cli, home.path());

    deployer
        .push(
            &app(),
            Path::new("/work/app/bundle/manifest.yml"),
            Path::new("/work/app/bundle"),
        )
        .await
        .unwrap();

    let commands = cli.commands();
    assert_eq!(
        commands[0],
        vec![
            "push",
            "guestbook",
            "-f",
            "/work/app/bundle/manifest.yml",
            "-p",
            "/work/app/bundle",
        ]
    );

    // every invocation ran against the isolated session home
    assert!(cli.calls().iter().all(|call| call.home == home.path()));
}

#[tokio::test]
async fn push_failure_reports_exit_status() {
    let cli = FakeCli::new(|_| Ok(CommandOutput::failed(1)));
    let home = tempfile::tempdir().unwrap();
    let deployer = AppDeployer::new(&cli, home.path());

    let err = deployer
        .push(&app(), Path::new("m.yml"), Path::new("bundle"))
        .await
        .unwrap_err();

    assert!(matches!(err, DeployError::PushFailed { .. }));
    assert!(err.to_string().contains("status 1"));
}

#[tokio::test]
async fn route_is_the_line_remainder() {
    let cli = FakeCli::always_ok(APP_STATUS_WITH_ROUTE);
    let home = tempfile::tempdir().unwrap();
    let deployer = AppDeployer::new(&cli, home.path());

    let route = deployer.discover_route(&app()).await.unwrap();
    assert_eq!(route, "foo.example.com");

    assert_eq!(cli.commands()[0], vec!["app", "guestbook"]);
}

#[tokio::test]
async fn missing_route_line_is_route_not_found() {
    let cli = FakeCli::always_ok(APP_STATUS_WITHOUT_ROUTE);
    let home = tempfile::tempdir().unwrap();
    let deployer = AppDeployer::new(&cli, home.path());

    let err = deployer.discover_route(&app()).await.unwrap_err();
    assert!(matches!(err, DeployError::RouteNotFound { .. }));
}

#[tokio::test]
async fn failed_status_query_is_not_route_not_found() {
    let cli = FakeCli::new(|_| Ok(CommandOutput::failed(1)));
    let home = tempfile::tempdir().unwrap();
    let deployer = AppDeployer::new(&cli, home.path());

    let err = deployer.discover_route(&app()).await.unwrap_err();
    assert!(matches!(err, DeployError::StatusQueryFailed { .. }));
}

#[tokio::test]
async fn route_marker_must_prefix_the_line() {
    // A line merely containing the marker is not a route line.
    let cli = FakeCli::always_ok("note: urls: are assigned later\n");
    let home = tempfile::tempdir().unwrap();
    let deployer = AppDeployer::new(&cli, home.path());

    let err = deployer.discover_route(&app()).await.unwrap_err();
    assert!(matches!(err, DeployError::RouteNotFound { .. }));
}
