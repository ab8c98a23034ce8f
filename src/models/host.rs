use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

use crate::utils::expand_tilde;

/// Name of the pseudo-host that stands for the machine the dashboard runs on.
pub const LOCAL_HOST_NAME: &str = "local";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum HostConfigError {
    #[error("host '{name}' is the local pseudo-host")]
    LocalHost { name: String },

    #[error("host '{name}' is missing required field '{field}'")]
    MissingField { name: String, field: &'static str },
}

/// A configured execution target as it appears in the config file.
///
/// Every connection field is optional so that partially configured hosts
/// can still be listed; only complete ones take part in remote operations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostDescriptor {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity_file: Option<String>,
}

/// Resolved SSH connection parameters for an eligible host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SshTarget {
    pub host: String,
    pub user: String,
    pub port: u16,
    pub identity_file: PathBuf,
}

impl SshTarget {
    pub fn destination(&self) -> String {
        format!("{}@{}", self.user, self.host)
    }

    /// Stable identity used to key per-host caches.
    pub fn identity(&self) -> String {
        format!("{}@{}:{}", self.user, self.host, self.port)
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl HostDescriptor {
    pub fn local() -> Self {
        Self {
            name: LOCAL_HOST_NAME.to_string(),
            ..Self::default()
        }
    }

    pub fn remote(name: &str, host: &str, user: &str, port: u16, identity_file: &str) -> Self {
        Self {
            name: name.to_string(),
            host: Some(host.to_string()),
            user: Some(user.to_string()),
            port: Some(port),
            identity_file: Some(identity_file.to_string()),
        }
    }

    pub fn is_local(&self) -> bool {
        self.name == LOCAL_HOST_NAME
    }

    /// Checks every field an SSH invocation needs, reporting the first gap.
    pub fn validate(&self) -> Result<SshTarget, HostConfigError> {
        let missing = |field| HostConfigError::MissingField {
            name: self.name.clone(),
            field,
        };

        if self.is_local() {
            return Err(HostConfigError::LocalHost {
                name: self.name.clone(),
            });
        }
        if self.name.trim().is_empty() {
            return Err(missing("name"));
        }
        let host = non_empty(&self.host).ok_or_else(|| missing("host"))?;
        let user = non_empty(&self.user).ok_or_else(|| missing("user"))?;
        let port = self.port.filter(|p| *p > 0).ok_or_else(|| missing("port"))?;
        let identity_file =
            non_empty(&self.identity_file).ok_or_else(|| missing("identity_file"))?;

        Ok(SshTarget {
            host: host.to_string(),
            user: user.to_string(),
            port,
            identity_file: expand_tilde(identity_file),
        })
    }

    pub fn ssh_target(&self) -> Option<SshTarget> {
        match self.validate() {
            Ok(target) => Some(target),
            Err(e) => {
                tracing::debug!("excluding host from remote operations: {}", e);
                None
            }
        }
    }

    pub fn is_ssh_eligible(&self) -> bool {
        self.validate().is_ok()
    }
}
