use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use sql_statement::prelude::*;
use tracing::Level;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::MakeWriter;

#[derive(Clone, Default)]
struct CapturedLogs {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl CapturedLogs {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buf.lock().unwrap()).into_owned()
    }
}

impl Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buf.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("sql_statement=debug"))
        .with_test_writer()
        .try_init();
}

#[test]
fn config_from_json_drives_statements() -> Result<(), QueryError> {
    init_tracing();
    let config = QueryConfig::from_json(
        r#"{
            "dialect": "mssql",
            "db_prefix": "tenant1_",
            "swap_pre": "pfx_",
            "escape_by_default": true
        }"#,
    )?;
    let query = Query::prepare(
        config,
        "UPDATE pfx_files SET data = ?, hidden = ? WHERE owner = ?",
        vec![
            BindValue::Blob(vec![0xab, 0xcd]),
            BindValue::Bool(true),
            BindValue::Text("ann".into()),
        ],
    )?;
    assert_eq!(
        query.get_query(),
        "UPDATE tenant1_files SET data = 0xabcd, hidden = 1 WHERE owner = 'ann'"
    );
    Ok(())
}

#[test]
fn unknown_dialect_is_a_json_error() {
    let err = QueryConfig::from_json(r#"{"dialect":"oracle"}"#).unwrap_err();
    assert!(matches!(err, QueryError::Json(_)));
}

#[test]
fn mysql_literals_keep_markers_hidden() -> Result<(), QueryError> {
    let query = Query::prepare(
        QueryConfig::new(DatabaseType::Mysql),
        r"SELECT * FROM `weird?` WHERE a = 'it\'s ?' AND b = ?",
        BindValue::Text(r"c:\tmp".into()),
    )?;
    assert_eq!(
        query.get_query(),
        r"SELECT * FROM `weird?` WHERE a = 'it\'s ?' AND b = 'c:\\tmp'"
    );
    Ok(())
}

#[test]
fn finish_logs_and_fills_timing() {
    init_tracing();
    let mut query = Query::new();
    query
        .set_query("DELETE FROM t WHERE id = ?", BindValue::Int(1), true)
        .unwrap();
    query.mark_start();
    query.finish();
    assert!(query.start_time().is_some());
    assert!(query.end_time() >= query.start_time());
    assert!(!query.get_start_time(4).is_empty());
}

#[test]
fn error_warning_omits_bound_values() -> Result<(), QueryError> {
    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(Level::WARN)
        .with_ansi(false)
        .with_writer(logs.clone())
        .finish();

    let mut query = Query::prepare(
        QueryConfig::default(),
        "UPDATE users SET password = ? WHERE id = ?",
        vec![BindValue::Text("hunter2".into()), BindValue::Int(1)],
    )?;
    tracing::subscriber::with_default(subscriber, || {
        query.set_error(19, "constraint failed");
    });

    let out = logs.contents();
    assert!(out.contains("statement error recorded"), "{out}");
    assert!(out.contains("UPDATE users SET password = ? WHERE id = ?"), "{out}");
    assert!(!out.contains("hunter2"), "{out}");
    Ok(())
}
