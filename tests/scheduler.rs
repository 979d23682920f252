use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use db_backup_lib::backup::{Dump, DumpError, Pipeline, RunError, Uploader};
use db_backup_lib::config::{Config, DatabaseConfig, DatabaseName, StorageConfig};
use db_backup_lib::scheduler::{Interval, Scheduler};
use object_store::memory::InMemory;
use object_store::ObjectStore;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

struct WritingDump;

impl Dump for WritingDump {
    fn dump(
        &self,
        source: &DatabaseConfig,
        database: &DatabaseName,
        destination: &Path,
    ) -> Result<(), DumpError> {
        fs::write(destination, format!("-- {database} on {}\n", source.host)).unwrap();
        Ok(())
    }
}

fn scheduler(interval: &str, create_temp_dir: bool) -> (Scheduler, Arc<InMemory>, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let config = Config {
        cron_interval: interval.into(),
        heartbeat_uri: None,
        s3_config: StorageConfig {
            bucket: "sql-backups".into(),
            ..Default::default()
        },
        databases: vec![DatabaseConfig {
            host: "h1".into(),
            port: 3306,
            username: "backup".into(),
            password: "pw".into(),
            name: Some("db1".into()),
            names: Vec::new(),
        }],
        backup_dir: dir.path().join("backups"),
        temp_dir: dir.path().join("temp"),
        remove_archive_after_upload: false,
    };
    fs::create_dir_all(&config.backup_dir).unwrap();
    if create_temp_dir {
        fs::create_dir_all(&config.temp_dir).unwrap();
    }

    let store = Arc::new(InMemory::new());
    let interval = config.interval().unwrap();
    let pipeline = Pipeline::new(
        Arc::new(config),
        Arc::new(WritingDump),
        Uploader::new(store.clone(), "sql-backups"),
    );

    (Scheduler::new(interval, pipeline), store, dir)
}

async fn object_count(store: &InMemory) -> usize {
    store.list_with_delimiter(None).await.unwrap().objects.len()
}

#[tokio::test]
async fn cancelled_before_first_trigger() {
    let (scheduler, store, _dir) = scheduler("0 0 3 1 1 *", true);
    let cancel = CancellationToken::new();
    cancel.cancel();

    tokio::time::timeout(Duration::from_secs(5), scheduler.run_forever(cancel))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(object_count(&store).await, 0);
}

#[tokio::test]
async fn runs_until_cancelled() {
    let (scheduler, store, _dir) = scheduler("@every 1s", true);
    let cancel = CancellationToken::new();

    let task = tokio::spawn({
        let cancel = cancel.clone();
        async move { scheduler.run_forever(cancel).await }
    });

    let uploaded = async {
        while object_count(&store).await == 0 {
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    };
    tokio::time::timeout(Duration::from_secs(10), uploaded)
        .await
        .expect("a backup should be uploaded");

    cancel.cancel();
    tokio::time::timeout(Duration::from_secs(10), task)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn fatal_error_ends_the_loop() {
    let (scheduler, store, _dir) = scheduler("@every 1s", false);

    let err = tokio::time::timeout(
        Duration::from_secs(10),
        scheduler.run_forever(CancellationToken::new()),
    )
    .await
    .unwrap()
    .unwrap_err();

    assert!(matches!(err, RunError::CreateArchive { .. }), "{err}");
    assert_eq!(object_count(&store).await, 0);
}

#[test]
fn interval_from_config() {
    assert!(matches!(
        Interval::parse("@every 6h").unwrap(),
        Interval::Every(d) if d == Duration::from_secs(6 * 60 * 60)
    ));
}
