use std::{fs, io, path::Path};

use thiserror::Error;

const TOKEN_KEY: &str = "TOKEN=";

#[derive(Debug, Error)]
pub enum CredentialsError {
    #[error("Could not read the token file {path}: {source}")]
    Unreadable { path: String, source: io::Error },
    #[error("The first `TOKEN=<value>` line of {0} is missing or empty")]
    MissingToken(String),
}

/// Reads the Discord token from a file containing a `TOKEN=<value>` line.
pub fn load_token(path: impl AsRef<Path>) -> Result<String, CredentialsError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| CredentialsError::Unreadable {
        path: path.display().to_string(),
        source,
    })?;
    parse_token(&contents).ok_or_else(|| CredentialsError::MissingToken(path.display().to_string()))
}

/// The value of the first `TOKEN=` line, which must not be empty.
fn parse_token(contents: &str) -> Option<String> {
    contents
        .lines()
        .find_map(|line| line.trim().strip_prefix(TOKEN_KEY))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}
