// Copyright (c) 2025 ADBC Drivers Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Logging setup for the IRIS driver.
//!
//! Installs a `tracing-subscriber` writing to stderr or to a file.
//!
//! ## Configuration priority
//!
//! 1. `iris.log_level` / `iris.log_file` database options (highest)
//! 2. `RUST_LOG` environment variable
//! 3. Default: `warn`
//!
//! ```bash
//! RUST_LOG=iris_sqltools=debug ./host-app
//! ```
//!
//! ```ignore
//! database.set_option("iris.log_level", "debug")?;
//! database.set_option("iris.log_file", "/tmp/iris-sqltools.log")?;
//! ```

use std::sync::OnceLock;
use tracing_subscriber::{
    fmt::{self, time::SystemTime},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

static LOGGING_INITIALIZED: OnceLock<()> = OnceLock::new();

const LOG_TARGET: &str = "iris_sqltools";

/// Logging configuration taken from database options.
#[derive(Debug, Clone, Default)]
pub struct LogConfig {
    /// Log level: "OFF", "ERROR", "WARN", "INFO", "DEBUG", "TRACE".
    pub level: Option<String>,
    /// Log file path. If unset, logs go to stderr.
    pub file: Option<String>,
}

#[derive(Debug, PartialEq, Eq)]
enum Directive {
    Off,
    Explicit(String),
    FromEnv,
}

fn filter_directive(config: &LogConfig) -> Directive {
    match config.level.as_deref().map(str::trim) {
        Some(level) if level.eq_ignore_ascii_case("off") => Directive::Off,
        Some(level) if !level.is_empty() => {
            Directive::Explicit(format!("{}={}", LOG_TARGET, level.to_lowercase()))
        }
        _ => Directive::FromEnv,
    }
}

/// Initialize the tracing subscriber.
///
/// Runs at most once per process: the first `Database::connect()` wins and
/// later calls are no-ops.
pub(crate) fn init_logging(config: &LogConfig) {
    LOGGING_INITIALIZED.get_or_init(|| {
        let filter = match filter_directive(config) {
            Directive::Off => return,
            Directive::Explicit(directive) => EnvFilter::new(directive),
            Directive::FromEnv => EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(format!("{}=warn", LOG_TARGET))),
        };

        if let Some(ref path) = config.file {
            let file = match std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
            {
                Ok(f) => f,
                Err(e) => {
                    eprintln!("iris-sqltools: cannot open log file {}: {}", path, e);
                    return;
                }
            };

            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .with_writer(file)
                        .with_target(false)
                        .with_ansi(false)
                        .with_timer(SystemTime),
                )
                .try_init()
                .ok();
        } else {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_target(false)
                        .with_timer(SystemTime),
                )
                .try_init()
                .ok();
        }
    });
}
