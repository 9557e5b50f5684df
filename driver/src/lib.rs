use error_stack::ResultExt;
use kernel::KernelError;

pub mod database;
pub mod error;

pub(crate) fn env(key: &str) -> error_stack::Result<String, KernelError> {
    dotenvy::var(key)
        .change_context_lazy(|| KernelError::Internal)
        .attach_printable_lazy(|| format!("Env {} not specified", key))
}

pub(crate) fn env_or<T: std::str::FromStr>(
    key: &str,
    default: T,
) -> error_stack::Result<T, KernelError> {
    match dotenvy::var(key) {
        Ok(value) => value.parse().map_err(|_| {
            error_stack::Report::new(KernelError::Internal)
                .attach_printable(format!("Env {} has an unparsable value: {}", key, value))
        }),
        Err(_) => Ok(default),
    }
}
