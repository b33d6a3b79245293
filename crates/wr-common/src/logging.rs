use std::panic;
use std::path::PathBuf;
use std::sync::OnceLock;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

fn env_flag(raw: Option<&str>) -> bool {
    matches!(
        raw.map(str::trim).map(str::to_ascii_lowercase).as_deref(),
        Some("1") | Some("true") | Some("yes") | Some("on")
    )
}

fn flag_set(key: &str) -> bool {
    let raw = std::env::var(key).ok();
    env_flag(raw.as_deref())
}

/// Install a global panic hook that logs panics through `tracing` with
/// file/line context, so a panicking enrichment walk ends up in the same
/// place as its stage logs. Safe to call multiple times; installed once per
/// process. `WR_LOG_BACKTRACE=1` additionally chains the default hook for a
/// full backtrace on stderr.
pub fn install_tracing_panic_hook(app_name: &'static str) {
    static INSTALLED: OnceLock<()> = OnceLock::new();

    INSTALLED.get_or_init(|| {
        let chain_default = flag_set("WR_LOG_BACKTRACE");
        let default_hook = panic::take_hook();

        panic::set_hook(Box::new(move |info| {
            let location = info
                .location()
                .map(|loc| format!("{}:{}:{}", loc.file(), loc.line(), loc.column()));
            let message = info
                .payload()
                .downcast_ref::<&str>()
                .map(|s| (*s).to_string())
                .or_else(|| info.payload().downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "panic payload not string".into());

            tracing::error!(
                application = app_name,
                location = location.as_deref().unwrap_or("unknown"),
                panic_message = %message,
                "panic captured"
            );

            if chain_default {
                default_hook(info);
            }
        }));
    });
}

fn rotating_file_writer(app_name: &'static str) -> Option<BoxMakeWriter> {
    let dir = PathBuf::from(std::env::var_os("WR_LOG_DIR")?);
    if let Err(err) = std::fs::create_dir_all(&dir) {
        eprintln!("failed to create WR_LOG_DIR ({err}); falling back to stdout");
        return None;
    }

    let appender = tracing_appender::rolling::daily(dir, format!("{app_name}.log"));
    let (non_blocking, guard) = tracing_appender::non_blocking(appender);
    let _ = LOG_GUARD.set(guard);
    Some(BoxMakeWriter::new(non_blocking))
}

/// Initialize the tracing subscriber with optional daily log rotation.
///
/// When `WR_LOG_DIR` is set, logs are written to `<WR_LOG_DIR>/<app>.log`
/// with daily rotation; otherwise logs go to stdout. `RUST_LOG` controls
/// filtering when present.
pub fn init_tracing_subscriber(app_name: &'static str) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(env_filter);

    if let Some(writer) = rotating_file_writer(app_name) {
        let _ = builder.with_writer(writer).try_init();
    } else {
        let _ = builder.try_init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthy_flag_spellings_are_accepted() {
        for raw in ["1", "true", "TRUE", "yes", "On", " true "] {
            assert!(env_flag(Some(raw)), "raw = {raw:?}");
        }
    }

    #[test]
    fn unset_and_falsy_values_stay_off() {
        for raw in [None, Some("0"), Some("false"), Some("off"), Some("")] {
            assert!(!env_flag(raw), "raw = {raw:?}");
        }
    }
}
