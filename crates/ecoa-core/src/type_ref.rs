use std::fmt;

/// Namespace of the built-in basic types.
pub const STANDARD_LIBRARY: &str = "ECOA";

/// Namespace-qualified type reference.
///
/// Library namespaces may be dotted in declarations (`nav.geo`); they are
/// stored with `__` as the path separator so every reference to the same
/// type compares equal.
///
/// # Examples
///
/// ```
/// use ecoa_core::TypeRef;
///
/// let pos = TypeRef::parse("nav.geo:Position").unwrap();
/// assert_eq!(pos.namespace, "nav__geo");
/// assert_eq!(pos.to_string(), "nav__geo:Position");
///
/// assert!(TypeRef::parse("Position").is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeRef {
    /// Library namespace, `__`-separated.
    pub namespace: String,
    /// Simple type name.
    pub name: String,
}

impl TypeRef {
    /// Create a reference, normalizing dotted namespaces.
    pub fn new(namespace: impl AsRef<str>, name: impl Into<String>) -> Self {
        Self {
            namespace: normalize_namespace(namespace.as_ref()),
            name: name.into(),
        }
    }

    /// Reference to a built-in type of the standard library.
    pub fn standard(name: impl Into<String>) -> Self {
        Self {
            namespace: STANDARD_LIBRARY.to_string(),
            name: name.into(),
        }
    }

    /// Parse a `ns:Name` string. Returns `None` for bare names.
    pub fn parse(qualified: &str) -> Option<Self> {
        let (namespace, name) = qualified.trim().split_once(':')?;
        if namespace.is_empty() || name.is_empty() {
            return None;
        }
        Some(Self::new(namespace, name))
    }

    /// Whether this references a built-in type.
    pub fn is_standard(&self) -> bool {
        self.namespace == STANDARD_LIBRARY
    }

    /// Namespace path segments (`nav__geo` -> `["nav", "geo"]`).
    pub fn namespace_path(&self) -> impl Iterator<Item = &str> {
        self.namespace.split("__")
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.name)
    }
}

/// Replace `.` namespace separators with `__`.
pub fn normalize_namespace(namespace: &str) -> String {
    namespace.replace('.', "__")
}

/// Extract the name of a `%ns:Name%` indirect reference.
///
/// Values that are not wrapped in `%` are plain literals and yield `None`.
pub fn literal_reference(value: &str) -> Option<&str> {
    let value = value.trim();
    value
        .strip_prefix('%')
        .and_then(|v| v.strip_suffix('%'))
        .filter(|inner| !inner.is_empty())
}
