use std::fmt;

/// Namespace token clients use to address the mesh's own system services.
pub const RESERVED_NAMESPACE: &str = "polaris";

/// `<service>.<namespace>` pair a query name resolves to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServiceKey {
    pub namespace: String,
    pub service: String,
}

impl ServiceKey {
    pub fn new(namespace: impl Into<String>, service: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            service: service.into(),
        }
    }
}

impl fmt::Display for ServiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.service, self.namespace)
    }
}

/// Strips `suffix` from the end of `name`.
///
/// An empty suffix always matches and trims nothing. A non-empty suffix that
/// `name` does not end with leaves `name` untouched and reports no match.
pub fn match_suffix<'a>(name: &'a str, suffix: &str) -> (&'a str, bool) {
    if suffix.is_empty() {
        return (name, true);
    }
    match name.strip_suffix(suffix) {
        Some(trimmed) => (trimmed, true),
        None => (name, false),
    }
}

/// Turns query names of the form `<service>.<namespace><suffix>` into a
/// [`ServiceKey`].
#[derive(Debug, Clone)]
pub struct QnameParser {
    suffix: String,
    current_namespace: String,
    system_namespace: String,
}

impl QnameParser {
    pub fn new(
        suffix: impl Into<String>,
        current_namespace: impl Into<String>,
        system_namespace: impl Into<String>,
    ) -> Self {
        Self {
            suffix: suffix.into(),
            current_namespace: current_namespace.into(),
            system_namespace: system_namespace.into(),
        }
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    pub fn current_namespace(&self) -> &str {
        &self.current_namespace
    }

    /// Returns `None` when the suffix does not match or nothing is left to
    /// name a service.
    pub fn parse(&self, name: &str) -> Option<ServiceKey> {
        let (trimmed, matched) = match_suffix(name, &self.suffix);
        if !matched {
            return None;
        }
        let trimmed = trimmed.strip_suffix('.').unwrap_or(trimmed);

        let (service, namespace) = match trimmed.rsplit_once('.') {
            Some((service, namespace)) => (service, namespace),
            None => (trimmed, self.current_namespace.as_str()),
        };
        if service.is_empty() || namespace.is_empty() {
            return None;
        }

        let namespace = if namespace.eq_ignore_ascii_case(RESERVED_NAMESPACE) {
            self.system_namespace.as_str()
        } else {
            namespace
        };

        Some(ServiceKey::new(namespace, service))
    }
}
