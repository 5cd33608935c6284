//! Tracing subscriber setup. Logs go to stderr so stdout carries only the
//! command result.

use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Map `-v` occurrences to a default level; `RUST_LOG` still wins.
pub fn level_for(verbosity: u8) -> Level
{
    match verbosity
    {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    }
}

pub fn init(
    verbosity: u8,
    no_color: bool,
)
{
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::default().add_directive(level_for(verbosity).into()));

    // A second init (e.g. from tests) is not an error worth surfacing.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(!no_color)
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_verbosity_levels()
    {
        assert_eq!(level_for(0), Level::WARN);
        assert_eq!(level_for(1), Level::INFO);
        assert_eq!(level_for(2), Level::DEBUG);
        assert_eq!(level_for(9), Level::DEBUG);
    }
}
