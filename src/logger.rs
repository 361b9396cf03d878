//! log4rs wiring. Library code only talks to the `log` facade; applications
//! call one of these once at startup.

use crate::config::LoggingConfig;
use log::LevelFilter;
use log4rs::append::rolling_file::RollingFileAppender;
use log4rs::append::rolling_file::policy::compound::{
    CompoundPolicy, roll::fixed_window::FixedWindowRoller, trigger::size::SizeTrigger,
};
use log4rs::config::{Appender, Config, Logger, Root};
use log4rs::encode::pattern::PatternEncoder;
use std::path::{Path, PathBuf};

const ENCODER_PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S%.3f)} [{l}] {t} - {m}{n}";
const ROLL_SIZE: u64 = 10 * 1024 * 1024;

/// Target used for mutation audit lines.
pub const AUDIT_TARGET: &str = "nexus_query::audit";
/// Target used by the `dev6!` macro.
pub const DEV6_TARGET: &str = "nexus_query::dev6";

fn parse_level(level: &str) -> LevelFilter {
    match level.to_ascii_lowercase().as_str() {
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        "off" => LevelFilter::Off,
        _ => LevelFilter::Info,
    }
}

fn rolling(base: &Path, stem: &str, keep: u32) -> Result<RollingFileAppender, Box<dyn std::error::Error>> {
    let roller = FixedWindowRoller::builder()
        .build(&format!("{}", base.join(format!("{stem}.{{}}.log")).display()), keep)?;
    let policy = CompoundPolicy::new(Box::new(SizeTrigger::new(ROLL_SIZE)), Box::new(roller));
    let appender = RollingFileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(ENCODER_PATTERN)))
        .build(base.join(format!("{stem}.log")), Box::new(policy))?;
    Ok(appender)
}

/// Builds the log4rs configuration: `app.log` for everything, `audit.log` for
/// mutation audit lines and, when `enable_dev6` is set, `dev6.log` for developer bench lines.
///
/// # Errors
/// Returns an error if the log directory cannot be created or an appender fails to build.
pub fn build_config(
    dir: &Path,
    level: &str,
    retention: usize,
    enable_dev6: bool,
) -> Result<Config, Box<dyn std::error::Error>> {
    std::fs::create_dir_all(dir)?;
    let lvl = parse_level(level);
    let keep = u32::try_from(retention).unwrap_or(u32::MAX);
    let mut builder = Config::builder()
        .appender(Appender::builder().build("app", Box::new(rolling(dir, "app", keep)?)))
        .appender(Appender::builder().build("audit", Box::new(rolling(dir, "audit", keep)?)))
        .logger(Logger::builder().appender("audit").additive(false).build(AUDIT_TARGET, lvl));
    if enable_dev6 {
        builder = builder
            .appender(Appender::builder().build("dev6", Box::new(rolling(dir, "dev6", keep)?)))
            .logger(
                Logger::builder().appender("dev6").additive(false).build(DEV6_TARGET, LevelFilter::Trace),
            );
    } else {
        builder = builder.logger(Logger::builder().additive(false).build(DEV6_TARGET, LevelFilter::Off));
    }
    Ok(builder.build(Root::builder().appender("app").build(lvl))?)
}

/// Configures process-wide logging. A second initialization is ignored.
///
/// # Errors
/// Returns an error if the configuration cannot be built.
pub fn configure_logging(
    dir: Option<&Path>,
    level: Option<&str>,
    retention: Option<usize>,
    enable_dev6: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let base = dir
        .map(PathBuf::from)
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
    let config = build_config(&base, level.unwrap_or("info"), retention.unwrap_or(7), enable_dev6)?;
    if log4rs::init_config(config).is_err() {
        log::debug!("logger already initialized; keeping existing configuration");
    }
    Ok(())
}

/// Configures logging from a `[logging]` config section.
///
/// # Errors
/// Returns an error if the configuration cannot be built.
pub fn init_from_config(cfg: &LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
    configure_logging(cfg.dir.as_deref(), Some(&cfg.level), Some(cfg.retention), cfg.dev6)
}

/// Configures logging from `NEXUS_QUERY_LOG_DIR`, `NEXUS_QUERY_LOG_LEVEL`,
/// `NEXUS_QUERY_LOG_RETENTION` and `NEXUS_QUERY_DEV6`.
///
/// # Errors
/// Returns an error if the configuration cannot be built.
pub fn configure_from_env() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = crate::config::Config::default().with_env_overrides();
    init_from_config(&cfg.logging)
}
