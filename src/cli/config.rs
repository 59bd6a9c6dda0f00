use log::{info, LevelFilter};
use std::env::consts;
use std::fmt::{self, Display};

/// Everything about the current run which is not a path argument, resolved once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub name: &'static str,
    pub version: &'static str,
    pub os: &'static str,
    pub arch: &'static str,
    pub log_level: LevelFilter,
}

fn level_for(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    }
}

impl Config {
    pub fn new(name: &'static str, verbosity: u8) -> Self {
        Config {
            name,
            version: env!("CARGO_PKG_VERSION"),
            os: consts::OS,
            arch: consts::ARCH,
            log_level: level_for(verbosity),
        }
    }

    /// Install the global logger. `RUST_LOG`, when set, wins over the `-v` count.
    pub fn init_logging(&self) {
        let env = env_logger::Env::default().default_filter_or(self.log_level.to_string());

        // Only fails if a logger is already installed, in which case that one stays.
        let _ = env_logger::Builder::from_env(env).try_init();

        info!("{}", self);
    }
}

impl Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - Version {} ({} {})",
            self.name, self.version, self.os, self.arch
        )
    }
}
