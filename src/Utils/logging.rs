use crate::Kinetics::rxn_errors::RxnError;
use log::LevelFilter;
use simplelog::{ColorChoice, CombinedLogger, Config, SharedLogger, TermLogger, TerminalMode, WriteLogger};
use std::fs::File;

/// Installs the global logger: mixed stdout/stderr terminal output and, if `log_file` is
/// given, a copy of every record in that file.
/// Fails if a logger is already installed or the file cannot be created.
pub fn init_logger(level: LevelFilter, log_file: Option<&str>) -> Result<(), RxnError> {
    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )];
    if let Some(path) = log_file {
        loggers.push(WriteLogger::new(level, Config::default(), File::create(path)?));
    }
    CombinedLogger::init(loggers)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::info;
    use tempfile::NamedTempFile;

    #[test]
    fn test_second_init_fails() {
        let file = NamedTempFile::new().unwrap();
        let path = file.path().to_str().unwrap().to_string();
        // another test may have installed a logger already; either way the next call fails
        let _ = init_logger(LevelFilter::Info, Some(&path));
        info!("logger test record");
        assert!(matches!(
            init_logger(LevelFilter::Info, None),
            Err(RxnError::Logger(_))
        ));
    }
}
