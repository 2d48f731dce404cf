//! JSON and YAML encoding of resource files

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt;
use std::io::{Read, Write};
use std::path::Path;
use std::str::FromStr;

use crate::error::{Error, Result};

/// On-disk encoding of a resource file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Format {
    #[default]
    Json,
    Yaml,
}

impl Format {
    /// File extension written for this format
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Yaml => "yaml",
        }
    }

    /// Detect the format of a file from its extension (`json`, `yaml`, `yml`)
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "json" => Some(Self::Json),
            "yaml" | "yml" => Some(Self::Yaml),
            _ => None,
        }
    }

    /// Encode `value` to `writer`, ending with a newline
    pub fn encode<W: Write, T: Serialize + ?Sized>(&self, mut writer: W, value: &T) -> Result<()> {
        let encoded = match self {
            Self::Json => serde_json::to_string_pretty(value)
                .map_err(|e| Error::Config(format!("cannot encode JSON: {e}")))?,
            Self::Yaml => serde_yaml::to_string(value)
                .map_err(|e| Error::Config(format!("cannot encode YAML: {e}")))?,
        };

        writer
            .write_all(encoded.as_bytes())
            .and_then(|()| {
                if encoded.ends_with('\n') {
                    Ok(())
                } else {
                    writer.write_all(b"\n")
                }
            })
            .map_err(|e| Error::io(Path::new("<writer>"), e))
    }

    /// Decode a value from `reader`; the message is wrapped by callers with the path
    pub fn decode<R: Read, T: DeserializeOwned>(&self, reader: R) -> std::result::Result<T, String> {
        match self {
            Self::Json => serde_json::from_reader(reader).map_err(|e| e.to_string()),
            Self::Yaml => serde_yaml::from_reader(reader).map_err(|e| e.to_string()),
        }
    }

    /// Decode the file at `path`, choosing the format by extension
    pub fn decode_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
        let format = Self::from_path(path)
            .ok_or_else(|| Error::parse(path, "unsupported file extension"))?;
        let file = std::fs::File::open(path).map_err(|e| Error::io(path, e))?;
        format
            .decode(std::io::BufReader::new(file))
            .map_err(|message| Error::parse(path, message))
    }

    /// Encode `value` into a new file at `path`
    pub fn encode_file<T: Serialize + ?Sized>(&self, path: &Path, value: &T) -> Result<()> {
        let file = std::fs::File::create(path).map_err(|e| Error::io(path, e))?;
        let mut writer = std::io::BufWriter::new(file);
        self.encode(&mut writer, value).map_err(|e| match e {
            Error::Io { source, .. } => Error::io(path, source),
            other => other,
        })?;
        writer.flush().map_err(|e| Error::io(path, e))
    }
}

/// Output format flag: exactly `json` or `yaml`
impl FromStr for Format {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "json" => Ok(Self::Json),
            "yaml" => Ok(Self::Yaml),
            _ => Err(Error::UnsupportedFormat {
                operation: "pull",
                format: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}
