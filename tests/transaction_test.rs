// Integration tests: buffered transactions and timeouts

use inmemsql::driver::{IsolationLevel, TxOptions};
use inmemsql::{Driver, Error};
use std::time::Duration;

#[tokio::test]
async fn test_commit_applies_batch() {
    let driver = Driver::default();
    let session = driver.open("tx_commit").unwrap();
    session.exec("CREATE TABLE t (id SERIAL, v INT)").await.unwrap();

    let mut tx = session.begin();
    tx.exec("INSERT INTO t (v) VALUES (1), (2)").unwrap();
    tx.exec("UPDATE t SET v = 10 WHERE v = 2").unwrap();
    assert_eq!(tx.pending(), 2);

    // Not visible before commit.
    assert!(tx.query("SELECT * FROM t").await.unwrap().is_empty());

    let result = tx.commit().await.unwrap();
    assert_eq!(result.last_insert_id, 2);
    assert_eq!(result.rows_affected, 3);

    let rows = session.query("SELECT v FROM t ORDER BY v").await.unwrap();
    assert_eq!(rows.rows, vec![vec![Some("1".to_string())], vec![Some("10".to_string())]]);
}

#[tokio::test]
async fn test_failed_commit_leaves_storage_untouched() {
    let driver = Driver::default();
    let session = driver.open("tx_fail").unwrap();
    session.exec("CREATE TABLE t (id INT PRIMARY KEY)").await.unwrap();
    session.exec("INSERT INTO t VALUES (1)").await.unwrap();

    let mut tx = session.begin();
    tx.exec("INSERT INTO t VALUES (2)").unwrap();
    tx.exec("CREATE TABLE side (a INT)").unwrap();
    tx.exec("INSERT INTO t VALUES (1)").unwrap();

    assert!(matches!(tx.commit().await, Err(Error::Remote(_))));
    assert_eq!(session.query("SELECT * FROM t").await.unwrap().len(), 1);
    assert!(matches!(session.query("SELECT * FROM side").await, Err(Error::NotFound(_))));
}

#[tokio::test]
async fn test_rollback_discards_buffer() {
    let driver = Driver::default();
    let session = driver.open("tx_rollback").unwrap();
    session.exec("CREATE TABLE t (a INT)").await.unwrap();

    let mut tx = session.begin();
    tx.exec("INSERT INTO t VALUES (1)").unwrap();
    tx.rollback().unwrap();

    assert!(session.query("SELECT * FROM t").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_buffer_rejects_bad_statements_early() {
    let driver = Driver::default();
    let session = driver.open("tx_parse").unwrap();
    let mut tx = session.begin();

    assert!(matches!(tx.exec("INSERT INTO"), Err(Error::Parse(_))));
    assert!(matches!(tx.exec("SELECT * FROM t"), Err(Error::Unsupported(_))));
    assert!(matches!(tx.exec("COMMIT"), Err(Error::Unsupported(_))));
    assert_eq!(tx.pending(), 0);
    assert_eq!(tx.commit().await.unwrap().rows_affected, 0);
}

#[tokio::test]
async fn test_begin_tx_options() {
    let driver = Driver::default();
    let session = driver.open("tx_options").unwrap();

    assert!(session.begin_tx(TxOptions::default()).is_ok());
    assert!(matches!(
        session.begin_tx(TxOptions { isolation: IsolationLevel::Serializable, read_only: false }),
        Err(Error::Unsupported(_))
    ));
    assert!(matches!(
        session.begin_tx(TxOptions { isolation: IsolationLevel::Default, read_only: true }),
        Err(Error::Unsupported(_))
    ));
}

#[tokio::test]
async fn test_transaction_statements_sent_directly_are_unimplemented() {
    let driver = Driver::default();
    let session = driver.open("tx_direct").unwrap();
    let err = session.exec("BEGIN").await.unwrap_err();
    assert_eq!(err.to_string(), "BEGIN statement is not implemented");
}

#[tokio::test]
async fn test_stopped_engine_answers_before_timeout() {
    let driver = Driver::default();
    let session = driver.open("mem:x,timeout=1s*slow/u/p").unwrap();
    let server = session.server().clone();
    assert_eq!(server.config().timeout, Some(Duration::from_secs(1)));

    // A stopped engine answers immediately rather than timing out.
    server.stop();
    assert!(matches!(session.exec("CREATE TABLE t (a INT)").await, Err(Error::EngineStopped)));
}
