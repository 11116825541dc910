//! Config handling

use tracing::log::LevelFilter;

/// Crates on the relay's transport path that log every connection and frame
/// at debug level, with the ceiling applied outside debug mode.
const TRANSPORT_MODULE_LEVELS: &[(&str, LevelFilter)] = &[
    ("tracing", LevelFilter::Warn),
    ("hyper", LevelFilter::Info),
    ("hyper_util", LevelFilter::Info),
    ("h2", LevelFilter::Info),
    ("rustls", LevelFilter::Info),
    ("reqwest", LevelFilter::Info),
    ("tower_http", LevelFilter::Info),
];

fn module_levels(debug: bool) -> &'static [(&'static str, LevelFilter)] {
    if debug { &[] } else { TRANSPORT_MODULE_LEVELS }
}

/// Sets up logging based on the debug flag. Fails if a logger is already
/// installed.
pub fn setup_logging(debug: bool) -> Result<(), Box<std::io::Error>> {
    let level = if debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let logger = module_levels(debug)
        .iter()
        .fold(simple_logger::SimpleLogger::new().with_level(level), |logger, (module, cap)| {
            logger.with_module_level(module, *cap)
        });
    logger.init().map_err(|err| {
        eprintln!("Failed to initialize logger: {}", err);
        Box::new(std::io::Error::other(err))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_crates_are_capped_outside_debug() {
        assert!(module_levels(true).is_empty());

        let levels = module_levels(false);
        for module in ["reqwest", "hyper", "hyper_util", "h2", "tower_http"] {
            assert!(
                levels.iter().any(|(name, cap)| *name == module && *cap == LevelFilter::Info),
                "{module} should be capped at info"
            );
        }
    }

    #[test]
    fn second_logger_install_is_an_error() {
        let _ = setup_logging(true);
        assert!(setup_logging(false).is_err());
    }
}
