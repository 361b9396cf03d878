use nexus_query::config::Config;
use std::io::Write;

#[test]
fn test_init_with_file_config() {
    let dir = tempfile::tempdir().unwrap();
    let logs = dir.path().join("logs");
    let path = dir.path().join("nexus_query.toml");
    let mut f = std::fs::File::create(&path).unwrap();
    writeln!(f, "[logging]\ndir = {:?}\nlevel = \"debug\"\n\n[query]\nslow_query_ms = 250", logs.display().to_string()).unwrap();
    let cfg = nexus_query::init(Some(&path)).unwrap();
    assert_eq!(cfg.query.slow_query_ms, 250);
    assert_eq!(cfg.logging.level, "debug");
}

#[test]
fn test_malformed_config_is_an_error() {
    assert!(Config::from_toml_str("[query]\nslow_query_ms = \"soon\"").is_err());
}
