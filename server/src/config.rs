use std::net::SocketAddr;
use std::path::PathBuf;

use error_stack::{Report, ResultExt};
use kernel::prelude::entity::LoanDuration;
use kernel::KernelError;

const SERVER_BIND: &str = "SERVER_BIND";
const LOAN_DEFAULT_DAYS: &str = "LOAN_DEFAULT_DAYS";
const LOG_DIR: &str = "LOG_DIR";

const DEFAULT_BIND: &str = "0.0.0.0:8080";
const DEFAULT_LOG_DIR: &str = "./logs/";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind: SocketAddr,
    pub default_loan_duration: LoanDuration,
    pub log_dir: PathBuf,
}

impl AppConfig {
    /// Reads the process environment, including any `.env` file.
    pub fn from_env() -> error_stack::Result<Self, KernelError> {
        Self::from_lookup(|key| dotenvy::var(key).ok())
    }

    fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> error_stack::Result<Self, KernelError> {
        let bind = lookup(SERVER_BIND)
            .unwrap_or_else(|| DEFAULT_BIND.to_string())
            .parse::<SocketAddr>()
            .change_context_lazy(|| KernelError::Internal)
            .attach_printable_lazy(|| format!("{SERVER_BIND} is not a socket address"))?;

        let default_loan_duration = match lookup(LOAN_DEFAULT_DAYS) {
            None => LoanDuration::default(),
            Some(days) => {
                let days = days.parse::<i64>().map_err(|_| {
                    Report::new(KernelError::Internal)
                        .attach_printable(format!("{LOAN_DEFAULT_DAYS} is not a number: {days}"))
                })?;
                LoanDuration::new(days).change_context(KernelError::Internal)?
            }
        };

        let log_dir = PathBuf::from(lookup(LOG_DIR).unwrap_or_else(|| DEFAULT_LOG_DIR.to_string()));

        Ok(Self {
            bind,
            default_loan_duration,
            log_dir,
        })
    }
}
