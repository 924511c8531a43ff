use assert_cmd::Command;
use predicates::prelude::*;
use std::fs::write;
use tempfile::{tempdir, NamedTempFile};

const DC_NS: &str = "http://purl.org/dc/elements/1.1/";

/// Writes a minimal feed with the given local identifiers.
fn feed_file(identifiers: &[&str]) -> NamedTempFile {
    let file = NamedTempFile::new().expect("Creating temp feed file failed");
    let entries: String = identifiers
        .iter()
        .map(|id| format!("  <entry><id>{id}</id><dc:identifier>{id}</dc:identifier></entry>\n"))
        .collect();
    let xml = format!(
        "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<feed xmlns=\"http://www.w3.org/2005/Atom\" xmlns:dc=\"{DC_NS}\">\n{entries}</feed>\n"
    );
    write(file.path(), xml).expect("Writing temp feed failed");
    file
}

#[test]
fn check_duplicates_exits_3_and_lists_repeated_ids() {
    let feed = feed_file(&["X", "Y", "X"]);
    let mut cmd = Command::cargo_bin("merritt-feed").expect("Binary exists");

    cmd.arg("check-duplicates").arg(feed.path());

    cmd.assert()
        .code(3)
        .stdout(predicate::str::contains("Duplicate identifiers").and(predicate::str::contains("X")))
        .stdout(predicate::str::contains("  Y").not());
}

#[test]
fn check_duplicates_succeeds_on_clean_feed() {
    let feed = feed_file(&["A", "B", "C"]);
    let mut cmd = Command::cargo_bin("merritt-feed").expect("Binary exists");

    cmd.arg("check-duplicates").arg(feed.path());

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("No duplicate identifiers"));
}

#[test]
fn check_duplicates_fails_on_missing_file() {
    let dir = tempdir().unwrap();
    let mut cmd = Command::cargo_bin("merritt-feed").expect("Binary exists");

    cmd.arg("check-duplicates").arg(dir.path().join("absent.atom"));

    cmd.assert()
        .code(1)
        .stderr(predicate::str::contains("Failed to read feed file"));
}

#[test]
fn create_fails_cleanly_without_settings_file() {
    let dir = tempdir().unwrap();
    let mut cmd = Command::cargo_bin("merritt-feed").expect("Binary exists");

    cmd.arg("create")
        .arg("26098")
        .arg("--credentials")
        .arg(dir.path().join("missing.yaml"))
        .arg("--nostash");

    cmd.assert()
        .code(1)
        .stderr(predicate::str::contains("Failed to read config file"));
}

#[test]
fn help_lists_every_subcommand() {
    let mut cmd = Command::cargo_bin("merritt-feed").expect("Binary exists");
    cmd.arg("--help");
    cmd.assert().success().stdout(
        predicate::str::contains("create")
            .and(predicate::str::contains("refresh-all"))
            .and(predicate::str::contains("check-duplicates"))
            .and(predicate::str::contains("download")),
    );
}

use std::sync::{Arc, Mutex};
use tracing_subscriber::prelude::*; // needed for .with()
use tracing_subscriber::{layer::Context, Layer, Registry};

/// Custom Layer to collect emitted event messages.
struct EventCollector {
    events: Arc<Mutex<Vec<String>>>,
}

impl<S> Layer<S> for EventCollector
where
    S: tracing::Subscriber,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        self.events.lock().unwrap().push(format!("{:?}", event));
    }
}

#[tokio::test]
async fn emits_trace_initialised_event() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let collector = EventCollector {
        events: events.clone(),
    };
    let subscriber = Registry::default().with(collector);
    let _guard = tracing::subscriber::set_default(subscriber);

    use merritt_feed::cli::{run, Cli, Commands};

    let cli = Cli {
        command: Commands::CheckDuplicates {
            path: std::path::PathBuf::from("dummy.atom"),
        },
    };

    let _ = run(cli).await;

    let event_msgs = events.lock().unwrap();
    assert!(
        event_msgs.iter().any(|msg| msg.contains("trace_initialised")),
        "Expected a 'trace_initialised' trace event, got: {:?}",
        event_msgs
    );
}

#[tokio::test]
async fn run_reports_duplicates_as_outcome_not_error() {
    use merritt_feed::cli::{run, Cli, CliOutcome, Commands};

    let feed = feed_file(&["A", "A"]);
    let outcome = run(Cli {
        command: Commands::CheckDuplicates {
            path: feed.path().to_path_buf(),
        },
    })
    .await
    .expect("check succeeds");
    assert_eq!(outcome, CliOutcome::DuplicatesFound);
}
