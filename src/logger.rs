use chrono::Local;
use log::LevelFilter;
use std::io::Write;

fn timestamp() -> String {
    format!("{}", Local::now().format("[ %d:%m:%Y | %H:%M:%S ]"))
}

/// Install the diagnostic logger writing to stderr.
///
/// `RUST_LOG` overrides the level selected by `verbose`.
pub fn init(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    let _ = env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .target(env_logger::Target::Stderr)
        .format(|buf, record| {
            writeln!(
                buf,
                "{} {:<5} {}",
                timestamp(),
                record.level(),
                record.args()
            )
        })
        .try_init();
}
