// ABOUTME: Integration tests for the service provisioner.
// ABOUTME: Covers the poll loop bound, fail-fast ordering, and transient query handling.

mod support;

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use stratus::diagnostics::Diagnostics;
use stratus::manifest::ServiceSpec;
use stratus::provision::{
    LineMatchProbe, ProvisionFailure, Provisioner, READY_STATUS_LINE,
};
use stratus::types::InstanceLabel;
use support::FakeCli;
use tokio_util::sync::CancellationToken;

fn spec(label: &str) -> ServiceSpec {
    ServiceSpec {
        offering: "postgres".to_string(),
        plan: "shared".to_string(),
        label: InstanceLabel::new(label).unwrap(),
        tags: Vec::new(),
        config: BTreeMap::new(),
    }
}

fn ready_output() -> String {
    format!("name: whatever\n{READY_STATUS_LINE}\nlast operation: create\n")
}

fn pending_output() -> String {
    "name: whatever\nStatus: create in progress\n".to_string()
}

mod poll_loop {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn ready_on_first_observation() {
        let cli = FakeCli::new(|args| {
            Ok(match args[0].as_str() {
                "create-service" => stratus::runner::CommandOutput::ok(""),
                "service" => stratus::runner::CommandOutput::ok(ready_output()),
                other => panic!("unexpected command {other}"),
            })
        });
        let probe = LineMatchProbe::new(&cli);
        let home = tempfile::tempdir().unwrap();
        let provisioner = Provisioner::new(&cli, &probe, home.path(), Duration::from_secs(30));

        let mut diag = Diagnostics::default();
        provisioner
            .provision_all(&[spec("app-db")], &mut diag)
            .await
            .unwrap();

        let commands = cli.commands();
        assert_eq!(commands.len(), 2);
        assert_eq!(commands[0][0], "create-service");
        assert_eq!(commands[1], vec!["service", "app-db"]);
        assert!(!diag.has_warnings());
    }

    #[tokio::test(start_paused = true)]
    async fn times_out_when_never_ready() {
        let cli = FakeCli::new(|args| {
            Ok(match args[0].as_str() {
                "create-service" => stratus::runner::CommandOutput::ok(""),
                _ => stratus::runner::CommandOutput::ok(pending_output()),
            })
        });
        let probe = LineMatchProbe::new(&cli);
        let home = tempfile::tempdir().unwrap();
        let provisioner = Provisioner::new(&cli, &probe, home.path(), Duration::from_secs(30));

        let mut diag = Diagnostics::default();
        let err = provisioner
            .provision_all(&[spec("slow-db")], &mut diag)
            .await
            .unwrap_err();

        assert_eq!(err.label.as_str(), "slow-db");
        assert!(matches!(
            err.failure,
            ProvisionFailure::TimedOut(d) if d == Duration::from_secs(30)
        ));

        // Elapsed advances 5s per observation; the bound trips strictly
        // after it exceeds the limit: observations at 5,10,...,35.
        let queries = cli
            .commands()
            .into_iter()
            .filter(|args| args[0] == "service")
            .count();
        assert_eq!(queries, 7);
    }

    #[tokio::test(start_paused = true)]
    async fn transient_query_failures_keep_polling() {
        let attempts = AtomicUsize::new(0);
        let cli = FakeCli::new(move |args| match args[0].as_str() {
            "create-service" => Ok(stratus::runner::CommandOutput::ok("")),
            _ => {
                if attempts.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(support::spawn_error("cf"))
                } else {
                    Ok(stratus::runner::CommandOutput::ok(ready_output()))
                }
            }
        });
        let probe = LineMatchProbe::new(&cli);
        let home = tempfile::tempdir().unwrap();
        let provisioner = Provisioner::new(&cli, &probe, home.path(), Duration::from_secs(60));

        let mut diag = Diagnostics::default();
        provisioner
            .provision_all(&[spec("flaky-db")], &mut diag)
            .await
            .unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn status_line_must_match_exactly() {
        let cli = FakeCli::new(|args| {
            Ok(match args[0].as_str() {
                "create-service" => stratus::runner::CommandOutput::ok(""),
                _ => stratus::runner::CommandOutput::ok(format!(
                    "{READY_STATUS_LINE} (almost)\n"
                )),
            })
        });
        let probe = LineMatchProbe::new(&cli);
        let home = tempfile::tempdir().unwrap();
        let provisioner = Provisioner::new(&cli, &probe, home.path(), Duration::from_secs(10));

        let mut diag = Diagnostics::default();
        let err = provisioner
            .provision_all(&[spec("app-db")], &mut diag)
            .await
            .unwrap_err();

        assert!(matches!(err.failure, ProvisionFailure::TimedOut(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_ends_the_wait() {
        let cli = FakeCli::new(|args| {
            Ok(match args[0].as_str() {
                "create-service" => stratus::runner::CommandOutput::ok(""),
                _ => stratus::runner::CommandOutput::ok(pending_output()),
            })
        });
        let probe = LineMatchProbe::new(&cli);
        let home = tempfile::tempdir().unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let provisioner = Provisioner::new(&cli, &probe, home.path(), Duration::from_secs(600))
            .with_cancellation(cancel);

        let mut diag = Diagnostics::default();
        let err = provisioner
            .provision_all(&[spec("app-db")], &mut diag)
            .await
            .unwrap_err();

        assert!(matches!(err.failure, ProvisionFailure::Cancelled));
    }
}

mod ordering {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn issuance_failure_stops_later_services() {
        let cli = FakeCli::new(|args| match args[0].as_str() {
            "create-service" if args[3] == "svc-a" => {
                Ok(stratus::runner::CommandOutput::failed(1))
            }
            other => panic!("unexpected command after failed issuance: {other} {args:?}"),
        });
        let probe = LineMatchProbe::new(&cli);
        let home = tempfile::tempdir().unwrap();
        let provisioner = Provisioner::new(&cli, &probe, home.path(), Duration::from_secs(30));

        let mut diag = Diagnostics::default();
        let err = provisioner
            .provision_all(&[spec("svc-a"), spec("svc-b")], &mut diag)
            .await
            .unwrap_err();

        assert_eq!(err.label.as_str(), "svc-a");
        assert!(matches!(err.failure, ProvisionFailure::RequestFailed(_)));

        // svc-b must never have been issued
        assert!(
            cli.commands()
                .iter()
                .all(|args| !args.contains(&"svc-b".to_string()))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn services_created_in_declaration_order() {
        let cli = FakeCli::new(|args| {
            Ok(match args[0].as_str() {
                "create-service" => stratus::runner::CommandOutput::ok(""),
                _ => stratus::runner::CommandOutput::ok(ready_output()),
            })
        });
        let probe = LineMatchProbe::new(&cli);
        let home = tempfile::tempdir().unwrap();
        let provisioner = Provisioner::new(&cli, &probe, home.path(), Duration::from_secs(30));

        let mut diag = Diagnostics::default();
        provisioner
            .provision_all(&[spec("svc-a"), spec("svc-b")], &mut diag)
            .await
            .unwrap();

        let creations: Vec<String> = cli
            .commands()
            .into_iter()
            .filter(|args| args[0] == "create-service")
            .map(|args| args[3].clone())
            .collect();
        assert_eq!(creations, vec!["svc-a", "svc-b"]);
    }

    #[tokio::test(start_paused = true)]
    async fn leftover_instances_are_reported() {
        let cli = FakeCli::new(|args| match args[0].as_str() {
            "create-service" if args[3] == "svc-b" => {
                Ok(stratus::runner::CommandOutput::failed(1))
            }
            "create-service" => Ok(stratus::runner::CommandOutput::ok("")),
            _ => Ok(stratus::runner::CommandOutput::ok(ready_output())),
        });
        let probe = LineMatchProbe::new(&cli);
        let home = tempfile::tempdir().unwrap();
        let provisioner = Provisioner::new(&cli, &probe, home.path(), Duration::from_secs(30));

        let mut diag = Diagnostics::default();
        let err = provisioner
            .provision_all(&[spec("svc-a"), spec("svc-b")], &mut diag)
            .await
            .unwrap_err();

        assert_eq!(err.label.as_str(), "svc-b");
        assert!(diag.has_warnings());
        assert!(diag.warnings()[0].message.contains("svc-a"));
    }
}
