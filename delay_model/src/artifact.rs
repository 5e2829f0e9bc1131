//! Binary persistence for fitted model parts.

use serde::{de::DeserializeOwned, Serialize};
use std::{fs, path::Path};

use crate::error::{Error, Result};

pub(crate) fn save<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    let bytes = bincode::serialize(value).map_err(|source| Error::Artifact {
        path: path.display().to_string(),
        source,
    })?;
    fs::write(path, bytes).map_err(|source| Error::Io {
        path: path.display().to_string(),
        source,
    })
}

pub(crate) fn load<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let bytes = fs::read(path).map_err(|source| Error::Io {
        path: path.display().to_string(),
        source,
    })?;
    bincode::deserialize(&bytes).map_err(|source| Error::Artifact {
        path: path.display().to_string(),
        source,
    })
}

pub(crate) fn invalid(path: &Path, msg: String) -> Error {
    Error::Artifact {
        path: path.display().to_string(),
        source: Box::new(bincode::ErrorKind::Custom(msg)),
    }
}
