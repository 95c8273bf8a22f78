use evr_collector::{
    ingest::{IngestError, IngestPool, ingest_file, requeue_pending},
    registry::{
        SampleRegistry,
        sqlite::{SqliteSampleError, SqliteSampleRegistry},
    },
    scratch::ScratchStore,
};
use tokio_util::sync::CancellationToken;

const UPLOAD: &str = "\
1700000000.123456,0.01,-0.02,0.99,13.7563,100.5018
1700000000.2,6.5,0.0,1.0,,

\"1700000001.000000001\",\"bad\",0,1,13.7563,
";

#[tokio::test]
async fn sqlite_ingest_keeps_nanoseconds() -> Result<(), SqliteSampleError> {
    let dir = tempfile::tempdir().unwrap();
    let scratch = ScratchStore::create(dir.path()).unwrap();
    let registry = SqliteSampleRegistry::new_in_memory().await?;

    let path = scratch.write(UPLOAD.as_bytes()).unwrap();
    let inserted = ingest_file(&registry, &path).await.unwrap();
    assert_eq!(inserted, 3);
    assert!(!path.exists());

    let samples = registry.latest(10).await?;
    assert_eq!(samples.len(), 3);

    // ".2" is left-padded to microseconds, so it sorts before ".123456"
    assert_eq!(samples[0].timestamp.as_second(), 1_700_000_000);
    assert_eq!(samples[0].timestamp.subsec_nanosecond(), 2_000);
    assert_eq!(samples[0].accel_x, 6.5);
    assert_eq!(samples[0].latitude, None);

    assert_eq!(samples[1].timestamp.subsec_nanosecond(), 123_456_000);
    assert_eq!(samples[1].longitude, Some(100.5018));

    assert_eq!(samples[2].timestamp.as_second(), 1_700_000_001);
    assert_eq!(samples[2].timestamp.subsec_nanosecond(), 1);
    assert_eq!(samples[2].accel_x, 0.0);
    assert_eq!(samples[2].latitude, Some(13.7563));
    assert_eq!(samples[2].longitude, None);

    assert!(samples.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
    // ids follow file order
    assert!(samples[1].id < samples[0].id);
    assert!(samples[0].id < samples[2].id);

    Ok(())
}

#[tokio::test]
async fn sqlite_bad_batch_is_not_committed() -> Result<(), SqliteSampleError> {
    let dir = tempfile::tempdir().unwrap();
    let scratch = ScratchStore::create(dir.path()).unwrap();
    let registry = SqliteSampleRegistry::new_in_memory().await?;

    let path = scratch
        .write(b"1700000000.1,0,0,0,,\n1700000000.2.3,0,0,0,,\n")
        .unwrap();
    let result = ingest_file(&registry, &path).await;

    assert!(matches!(result, Err(IngestError::Record { line: 2, .. })));
    assert_eq!(registry.count().await?, 0);
    assert!(!path.exists());

    Ok(())
}

#[tokio::test]
async fn sqlite_pool_ingests_concurrent_uploads() -> Result<(), SqliteSampleError> {
    let dir = tempfile::tempdir().unwrap();
    let scratch = ScratchStore::create(dir.path()).unwrap();
    let registry = SqliteSampleRegistry::new_in_memory().await?;
    let cancel = CancellationToken::new();
    let (handle, pool) = IngestPool::spawn(registry.clone(), 3, 4, cancel.clone());

    for upload in 0..6 {
        let body: String = (0..50)
            .map(|i| format!("{}.5,0.1,0.2,0.3,,\n", 1_700_000_000 + upload * 100 + i))
            .collect();
        let path = scratch.write(body.as_bytes()).unwrap();
        handle.submit(path).await.unwrap();
    }

    cancel.cancel();
    pool.join().await;

    assert_eq!(registry.count().await?, 300);
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);

    let latest = registry.latest(3).await?;
    let seconds: Vec<i64> = latest.iter().map(|s| s.timestamp.as_second()).collect();
    assert_eq!(seconds, vec![1_700_000_547, 1_700_000_548, 1_700_000_549]);

    Ok(())
}

#[tokio::test]
async fn sqlite_leftover_uploads_are_ingested_on_restart() -> Result<(), SqliteSampleError> {
    let dir = tempfile::tempdir().unwrap();
    let registry = SqliteSampleRegistry::new_in_memory().await?;

    // accepted by an earlier run that stopped before ingesting
    let scratch = ScratchStore::create(dir.path()).unwrap();
    scratch.write(b"1700000000.1,0,0,0,,\n1700000000.2,0,0,0,,\n").unwrap();
    scratch.write(b"1700000000.3,0,0,0,,\n").unwrap();
    drop(scratch);

    let scratch = ScratchStore::create(dir.path()).unwrap();
    let cancel = CancellationToken::new();
    let (handle, pool) = IngestPool::spawn(registry.clone(), 2, 1, cancel.clone());

    assert_eq!(requeue_pending(&handle, &scratch).await.unwrap(), 2);

    cancel.cancel();
    pool.join().await;

    assert_eq!(registry.count().await?, 3);
    assert!(scratch.pending().unwrap().is_empty());

    Ok(())
}
