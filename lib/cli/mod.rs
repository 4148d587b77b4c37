use crate::build_info;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    about = "Swimlane API for prioritized client records",
    version = build_info::VERSION_WITH_COMMIT,
    long_version = build_info::VERSION_WITH_COMMIT
)]
pub struct Cli {
    #[arg(long)]
    /// HTTP port for the JSON API (overrides PORT)
    pub port: Option<u16>,

    #[arg(long = "database-url")]
    /// SQLite database path (overrides DATABASE_URL)
    pub database_url: Option<String>,
}

pub fn parse_args() -> Cli {
    Cli::parse()
}

#[cfg(test)]
mod tests {
    use super::Cli;
    use crate::build_info;
    use clap::{error::ErrorKind, Parser};

    #[test]
    fn version_short_circuits_other_flags() {
        let err = Cli::try_parse_from(["shiptivity", "--version", "--this-flag-does-not-exist"])
            .expect_err("expected clap to stop parsing after --version");

        assert_eq!(err.kind(), ErrorKind::DisplayVersion);
        assert!(err.to_string().contains(build_info::VERSION_WITH_COMMIT));
    }

    #[test]
    fn rejects_non_numeric_port() {
        let err = Cli::try_parse_from(["shiptivity", "--port", "http"])
            .expect_err("port must be numeric");
        assert_eq!(err.kind(), ErrorKind::ValueValidation);
    }
}
