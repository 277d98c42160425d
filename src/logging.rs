// Tracing setup — one subscriber per process, verbosity chosen at startup.

use std::sync::Once;

use tracing::info;
use tracing_subscriber::EnvFilter;

static INIT_TRACING: Once = Once::new();

/// Default filter directive when `RUST_LOG` is not set.
pub fn default_directive(production: bool) -> &'static str {
    if production {
        "warn"
    } else {
        "info,hyper=warn,reqwest=warn"
    }
}

/// Install the global tracing subscriber. Later calls are no-ops.
pub fn init_tracing(production: bool) {
    INIT_TRACING.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_directive(production)));

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .try_init();

        info!("tracing initialized production={}", production);
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_production_is_quiet() {
        assert_eq!(default_directive(true), "warn");
        assert!(default_directive(false).starts_with("info"));
    }
}
