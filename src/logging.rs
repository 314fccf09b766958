/*!

Logging setup for the command line wrapper. The library itself only talks to the `log` facade;
the binary calls [`init_logging`] once to route records to stderr and, optionally, a log file.

*/

use crate::error::CampusError;
use log4rs::{
    append::{console::{ConsoleAppender, Target}, file::FileAppender},
    config::{Appender, Config, Root},
    encode::pattern::PatternEncoder,
};
use std::path::Path;

pub use log::LevelFilter;

const CONSOLE_PATTERN: &str = "{h({l:<5})} {m}{n}";
const FILE_PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S)} {l:<5} [{M}] {m}{n}";

/// Builds the log4rs configuration without installing it.
pub fn build_config(level: LevelFilter, log_file: Option<&Path>) -> Result<Config, CampusError> {
    let console = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new(CONSOLE_PATTERN)))
        .build();

    let mut builder = Config::builder().appender(Appender::builder().build("console", Box::new(console)));
    let mut root = Root::builder().appender("console");

    if let Some(path) = log_file {
        let file = FileAppender::builder()
            .append(false)
            .encoder(Box::new(PatternEncoder::new(FILE_PATTERN)))
            .build(path)?;
        builder = builder.appender(Appender::builder().build("file", Box::new(file)));
        root = root.appender("file");
    }

    builder
        .build(root.build(level))
        .map_err(|e| CampusError::Logging(e.to_string()))
}

/// Installs the global logger. Fails if a logger was already installed.
pub fn init_logging(level: LevelFilter, log_file: Option<&Path>) -> Result<(), CampusError> {
    let config = build_config(level, log_file)?;
    log4rs::init_config(config).map_err(|e| CampusError::Logging(e.to_string()))?;
    Ok(())
}
