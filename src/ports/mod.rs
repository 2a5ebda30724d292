// src/ports/mod.rs
// Expands textual port specifications into a concrete port list.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PortSpecError {
    #[error("invalid port: {0}")]
    InvalidPort(String),

    #[error("invalid port range: {0}")]
    InvalidRange(String),
}

/// Expand a port specification into the ordered list of ports it names.
///
/// A specification is a comma-separated list of tokens; each token is either
/// a single port (`"8080"`) or an inclusive range (`"8000-8003"`). Tokens are
/// trimmed of surrounding whitespace. Encounter order is preserved and
/// duplicates are kept as-is; whether a port is actually bindable is decided
/// later, per listener, so one bad port never takes the rest down.
///
/// On error no partial list escapes.
pub fn resolve(spec: &str) -> Result<Vec<u16>, PortSpecError> {
    let mut ports = Vec::new();

    for token in spec.split(',') {
        let token = token.trim();

        if let Some((start, end)) = token.split_once('-') {
            let start: u16 = start
                .parse()
                .map_err(|_| PortSpecError::InvalidRange(token.to_string()))?;
            let end: u16 = end
                .parse()
                .map_err(|_| PortSpecError::InvalidRange(token.to_string()))?;

            if start > end {
                return Err(PortSpecError::InvalidRange(token.to_string()));
            }

            ports.extend(start..=end);
        } else {
            let port: u16 = token
                .parse()
                .map_err(|_| PortSpecError::InvalidPort(token.to_string()))?;
            ports.push(port);
        }
    }

    Ok(ports)
}
