/// Flat filename encoding for captured photos
///
/// An encoded filename looks like `<sequence>__<nonce>__<component>__...__<file>`.
/// The capture device stores the photo under this name, which lets the
/// reconstructor recover the row without any side channel.

use std::path::{Component, Path, PathBuf};

use super::nonce::{NonceSource, MAX_NONCE};
use crate::{Error, Result};

/// Token joining the fields of an encoded filename
pub const SEPARATOR: &str = "__";

/// Identity recovered from an encoded filename
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedName {
    /// Absolute row index in the source manifest
    pub sequence: u64,
    /// Original relative path of the row
    pub path: PathBuf,
}

/// Encode a row identity with an explicit nonce
///
/// Every component of `original_path` must be a plain UTF-8 name without the
/// separator, and no directory may end with `_`, otherwise decoding could not
/// recover it.
pub fn encode(sequence: u64, nonce: u32, original_path: &Path) -> Result<String> {
    if nonce > MAX_NONCE {
        return Err(Error::InvalidConfig(format!(
            "nonce {} exceeds {}",
            nonce, MAX_NONCE
        )));
    }

    let parts = original_path
        .components()
        .filter(|c| *c != Component::CurDir)
        .map(|c| component_token(original_path, c))
        .collect::<Result<Vec<&str>>>()?;

    if parts.is_empty() {
        return Err(Error::UnencodablePath {
            path: original_path.to_path_buf(),
            reason: "path is empty".to_string(),
        });
    }

    // `a_` + `__` + `b` would split as `a` and `_b`
    if let Some(part) = parts[..parts.len() - 1].iter().find(|p| p.ends_with('_')) {
        return Err(Error::UnencodablePath {
            path: original_path.to_path_buf(),
            reason: format!("directory `{}` ends with `_`", part),
        });
    }

    let mut tokens = vec![sequence.to_string(), nonce.to_string()];
    tokens.extend(parts.iter().map(|p| p.to_string()));

    Ok(tokens.join(SEPARATOR))
}

/// Encode a row identity, drawing the nonce from `source`
pub fn encode_with<N: NonceSource + ?Sized>(
    sequence: u64,
    original_path: &Path,
    source: &mut N,
) -> Result<String> {
    encode(sequence, source.next_nonce(), original_path)
}

/// Decode an encoded filename back into its sequence and path
pub fn decode(name: &str) -> Result<DecodedName> {
    let malformed = |reason: &str| Error::MalformedFilename {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    let tokens: Vec<&str> = name.split(SEPARATOR).collect();
    if tokens.len() < 3 {
        return Err(malformed("expected at least 3 fields"));
    }

    let sequence = tokens[0]
        .parse::<u64>()
        .map_err(|_| malformed("sequence is not an unsigned integer"))?;

    // tokens[1] is the nonce
    if tokens[2..].iter().any(|t| t.is_empty()) {
        return Err(malformed("empty path component"));
    }
    if tokens[2..].iter().any(|t| *t == "." || *t == "..") {
        return Err(malformed("relative path component"));
    }
    let path: PathBuf = tokens[2..].iter().collect();

    Ok(DecodedName { sequence, path })
}

fn component_token<'a>(path: &Path, component: Component<'a>) -> Result<&'a str> {
    let unencodable = |reason: String| Error::UnencodablePath {
        path: path.to_path_buf(),
        reason,
    };

    match component {
        Component::Normal(part) => {
            let part = part
                .to_str()
                .ok_or_else(|| unencodable("component is not valid UTF-8".to_string()))?;
            if part.contains(SEPARATOR) {
                return Err(unencodable(format!(
                    "component `{}` contains the separator `{}`",
                    part, SEPARATOR
                )));
            }
            Ok(part)
        }
        other => Err(unencodable(format!(
            "only relative paths can be encoded (found {:?})",
            other
        ))),
    }
}
