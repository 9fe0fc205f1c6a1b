use crate::Result;
use crate::models::RepoDescriptor;
use ohno::bail;

/// A parsed repository reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoRef {
    owner: String,
    name: String,
}

impl RepoRef {
    /// Parses an `owner/name` string or a GitHub repository URL.
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();

        let path = if trimmed.contains("://") {
            let url = url::Url::parse(trimmed)?;
            if !matches!(url.host_str(), Some("github.com" | "www.github.com")) {
                bail!("repository URL '{input}' is not a github.com URL");
            }
            url.path().trim_matches('/').to_string()
        } else {
            trimmed.to_string()
        };

        let path = path.strip_suffix(".git").unwrap_or(&path);

        let mut segments = path.split('/');
        let (Some(owner), Some(name), None) = (segments.next(), segments.next(), segments.next()) else {
            bail!("repository '{input}' must be in 'owner/name' form");
        };

        let owner = owner.trim();
        let name = name.trim();
        if owner.is_empty() || name.is_empty() {
            bail!("repository '{input}' must be in 'owner/name' form");
        }

        Ok(Self {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }

    #[must_use]
    pub fn owner(&self) -> &str {
        &self.owner
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn descriptor(&self) -> RepoDescriptor {
        RepoDescriptor {
            owner: self.owner.clone(),
            name: self.name.clone(),
            url: format!("https://github.com/{}/{}", self.owner, self.name),
        }
    }
}

impl std::fmt::Display for RepoRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

impl std::str::FromStr for RepoRef {
    type Err = ohno::AppError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
