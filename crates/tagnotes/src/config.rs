use clap::{Parser, ValueEnum};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "tagnotes", about = "HTTP service for free-text notes with tags", version)]
pub struct Config {
    /// Address to bind
    #[arg(long, env = "TAGNOTES_HOST", default_value = "0.0.0.0")]
    pub host: IpAddr,

    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 5000)]
    pub port: u16,

    /// SQLite database file (created if missing)
    #[arg(long, env = "TAGNOTES_DATABASE", default_value = "notes.db")]
    pub database: PathBuf,

    /// Log output format
    #[arg(long, env = "TAGNOTES_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl Config {
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_flags() {
        let config = Config::try_parse_from([
            "tagnotes",
            "--host",
            "127.0.0.1",
            "--port",
            "8080",
            "--database",
            "/tmp/x.db",
            "--log-format",
            "json",
        ])
        .unwrap();

        assert_eq!(config.bind_addr().to_string(), "127.0.0.1:8080");
        assert_eq!(config.database, PathBuf::from("/tmp/x.db"));
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_rejects_bad_port() {
        assert!(Config::try_parse_from(["tagnotes", "--port", "notaport"]).is_err());
    }

    #[test]
    fn test_command_is_well_formed() {
        use clap::CommandFactory;
        Config::command().debug_assert();
    }
}
