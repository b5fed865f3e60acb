//! Field locations.

use std::borrow::Cow;
use std::fmt;

/// Where in the certificate a field lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldNamespace {
    /// Subject distinguished-name attribute, keyed by attribute OID.
    Subject,
    /// Directory-name attribute inside the subject alternative name.
    SubjectAltName,
    /// Raw extension, keyed by extension OID, value read as UTF-8.
    Extension,
}

impl FieldNamespace {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Subject => "subject",
            Self::SubjectAltName => "san",
            Self::Extension => "ext",
        }
    }
}

/// One concrete location of a field for one policy revision.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldLocator {
    namespace: FieldNamespace,
    path: Cow<'static, str>,
}

impl FieldLocator {
    /// Creates a locator with an owned path.
    #[must_use]
    pub fn new(namespace: FieldNamespace, path: impl Into<String>) -> Self {
        Self {
            namespace,
            path: Cow::Owned(path.into()),
        }
    }

    /// Creates a locator with a static path, usable in `const` tables.
    #[must_use]
    pub const fn from_static(namespace: FieldNamespace, path: &'static str) -> Self {
        Self {
            namespace,
            path: Cow::Borrowed(path),
        }
    }

    /// Returns the namespace.
    #[must_use]
    pub const fn namespace(&self) -> FieldNamespace {
        self.namespace
    }

    /// Returns the path (an OID) within the namespace.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl fmt::Display for FieldLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace.as_str(), self.path)
    }
}
