use thiserror::Error;

/// An environment variable required by the application is not set.
#[derive(Debug, Error)]
#[error("Missing environment variable: {0}")]
pub struct MissingEnvVarError(pub String);

/// Reads an environment variable, returning a structured error if it's missing.
///
/// A variable that is set but empty (or only whitespace) counts as missing:
/// provider credentials and connection strings are useless when blank.
///
/// # Arguments
/// * `name` - The name of the environment variable to read.
pub fn get_env_var(name: &str) -> Result<String, MissingEnvVarError> {
    match std::env::var(name) {
        Ok(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(MissingEnvVarError(name.to_string())),
    }
}

/// Like [`get_env_var`] but for optional settings (e.g. `DATABASE_URL` overrides).
pub fn get_env_var_opt(name: &str) -> Option<String> {
    get_env_var(name).ok()
}
