//! Remote package identity

use crate::error::{KilnError, KilnResult};
use std::fmt;
use std::str::FromStr;

/// A package hosted on a release forge, addressed as `organization/repository`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RemotePackage {
    organization: String,
    repository: String,
}

impl RemotePackage {
    pub fn new(organization: impl Into<String>, repository: impl Into<String>) -> Self {
        Self {
            organization: organization.into(),
            repository: repository.into(),
        }
    }

    /// Parse `org/repo`, rejecting anything that could escape the cache layout
    pub fn parse(input: &str) -> KilnResult<Self> {
        let invalid = |reason: &str| KilnError::InvalidPackage {
            input: input.to_string(),
            reason: reason.to_string(),
        };

        let (organization, repository) = input
            .trim()
            .split_once('/')
            .ok_or_else(|| invalid("expected <organization>/<repository>"))?;

        if repository.contains('/') {
            return Err(invalid("too many '/' separators"));
        }

        for part in [organization, repository] {
            if part.is_empty() {
                return Err(invalid("organization and repository must not be empty"));
            }
            if part == "." || part == ".." || part.contains('\\') || part.contains('\0') {
                return Err(invalid("must not contain path traversal segments"));
            }
        }

        Ok(Self::new(organization, repository))
    }

    pub fn organization(&self) -> &str {
        &self.organization
    }

    pub fn repository(&self) -> &str {
        &self.repository
    }
}

impl fmt::Display for RemotePackage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.organization, self.repository)
    }
}

impl FromStr for RemotePackage {
    type Err = KilnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
