use serde::{Deserialize, Deserializer, Serialize, de};

use crate::ModelError;

/// Workload description published through instance metadata attributes.
///
/// Only the keys below are read; every other attribute in the directory is ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Attributes {
    /// Image reference handed to the container runtime.
    ///
    /// Empty means no workload has been requested yet.
    #[serde(default)]
    pub container_id: String,
    /// Shell-style argument string overriding the image's default process args.
    #[serde(default)]
    pub container_args: String,
    /// Power the host off once the workload has finished.
    #[serde(default, deserialize_with = "bool_from_string")]
    pub stop_on_exit: bool,
}

impl Attributes {
    pub fn from_json(body: &str) -> Result<Self, ModelError> {
        Ok(serde_json::from_str(body)?)
    }

    #[inline]
    pub fn has_workload(&self) -> bool {
        !self.container_id.is_empty()
    }

    /// Split `container_args` into an argument vector with POSIX shell word rules.
    ///
    /// Quotes and backslash escapes are honoured; nothing is expanded.
    /// An empty string yields an empty vector, which keeps the image defaults.
    pub fn argv(&self) -> Result<Vec<String>, ModelError> {
        if self.container_args.trim().is_empty() {
            return Ok(Vec::new());
        }
        shlex::split(&self.container_args)
            .ok_or_else(|| ModelError::Args(self.container_args.clone()))
    }
}

fn bool_from_string<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Bool(bool),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Bool(b) => Ok(b),
        Raw::Text(s) => match s.as_str() {
            "true" => Ok(true),
            "false" => Ok(false),
            other => Err(de::Error::invalid_value(
                de::Unexpected::Str(other),
                &r#""true" or "false""#,
            )),
        },
    }
}
