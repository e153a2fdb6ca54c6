use pmoconfig::Config;
use tracing::Level;
use tracing_subscriber::{
    Registry, filter::LevelFilter, layer::SubscriberExt, util::SubscriberInitExt,
};

/// Convertit un nom de niveau (insensible à la casse) en `Level`
pub fn string_to_level(level: &str) -> Option<Level> {
    match level.trim().to_ascii_uppercase().as_str() {
        "ERROR" => Some(Level::ERROR),
        "WARN" | "WARNING" => Some(Level::WARN),
        "INFO" => Some(Level::INFO),
        "DEBUG" => Some(Level::DEBUG),
        "TRACE" => Some(Level::TRACE),
        _ => None,
    }
}

/// Initialise le système de logging à partir de `host.logger`
///
/// À appeler une seule fois, au démarrage du binaire.
pub fn init_logging(config: &Config) {
    let min_level = config.get_log_min_level();
    let filter = match string_to_level(&min_level) {
        Some(level) => LevelFilter::from_level(level),
        None => {
            eprintln!("⚠️ Unknown log level '{min_level}', falling back to INFO");
            LevelFilter::INFO
        }
    };

    let subscriber = Registry::default().with(filter);

    if config.get_log_enable_console() {
        subscriber
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_level(true)
                    .with_ansi(true),
            )
            .init();
    } else {
        subscriber.init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_to_level() {
        assert_eq!(string_to_level("info"), Some(Level::INFO));
        assert_eq!(string_to_level(" Debug "), Some(Level::DEBUG));
        assert_eq!(string_to_level("warning"), Some(Level::WARN));
        assert_eq!(string_to_level("TRACE"), Some(Level::TRACE));
        assert_eq!(string_to_level("loud"), None);
    }
}
