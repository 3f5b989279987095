use crate::core::types::OutputFormat;
use anyhow::{Context, Result};
use serde::{de::DeserializeOwned, Serialize};
use std::fs;
use std::io::Write;
use std::path::Path;

pub trait Serializer {
    fn serialize<T: serde::Serialize>(&self, data: &T) -> Result<Vec<u8>>;
    fn deserialize<T: serde::de::DeserializeOwned>(&self, data: &[u8]) -> Result<T>;
}

/// Pretty-printed JSON with a trailing newline.
pub struct JsonSerializer;

impl Serializer for JsonSerializer {
    fn serialize<T: serde::Serialize>(&self, data: &T) -> Result<Vec<u8>> {
        let mut out = serde_json::to_vec_pretty(data)?;
        out.push(b'\n');
        Ok(out)
    }

    fn deserialize<T: serde::de::DeserializeOwned>(&self, data: &[u8]) -> Result<T> {
        serde_json::from_slice(data).map_err(Into::into)
    }
}

pub struct YamlSerializer;

impl Serializer for YamlSerializer {
    fn serialize<T: serde::Serialize>(&self, data: &T) -> Result<Vec<u8>> {
        Ok(serde_yaml::to_string(data)?.into_bytes())
    }

    fn deserialize<T: serde::de::DeserializeOwned>(&self, data: &[u8]) -> Result<T> {
        serde_yaml::from_slice(data).map_err(Into::into)
    }
}

/// Encode `data` with the serializer matching `format`.
pub fn encode<T: Serialize>(format: OutputFormat, data: &T) -> Result<Vec<u8>> {
    match format {
        OutputFormat::Json => JsonSerializer.serialize(data),
        OutputFormat::Yaml => YamlSerializer.serialize(data),
    }
}

/// Decode `data` with the serializer matching `format`.
pub fn decode<T: DeserializeOwned>(format: OutputFormat, data: &[u8]) -> Result<T> {
    match format {
        OutputFormat::Json => JsonSerializer.deserialize(data),
        OutputFormat::Yaml => YamlSerializer.deserialize(data),
    }
}

pub trait FileSerializer {
    fn save_to_file<T, S: Serializer>(&self, path: &Path, data: &T, serializer: &S) -> Result<()>
    where
        T: Serialize;
    fn write_bytes(&self, path: &Path, content: &[u8]) -> Result<()>;
}

pub struct FileUtils;

impl FileSerializer for FileUtils {
    fn save_to_file<T, S: Serializer>(&self, path: &Path, data: &T, serializer: &S) -> Result<()>
    where
        T: serde::Serialize,
    {
        let content = serializer.serialize(data)?;
        self.write_bytes(path, &content)
    }

    fn write_bytes(&self, path: &Path, content: &[u8]) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }
        let mut file = fs::File::create(path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        file.write_all(content)?;
        Ok(())
    }
}
