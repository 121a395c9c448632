//! Release-tagged store names.

/// Computes the current static and dynamic store names from one release tag.
///
/// Changing the tag is the only way to invalidate every previous store: the
/// next activation sees the old names as stale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRegistry {
    tag: String,
    static_store: String,
    dynamic_store: String,
}

impl VersionRegistry {
    pub fn new(tag: impl Into<String>) -> Self {
        let tag = tag.into();
        Self { static_store: format!("static-{tag}"), dynamic_store: format!("dynamic-{tag}"), tag }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn static_store(&self) -> &str {
        &self.static_store
    }

    pub fn dynamic_store(&self) -> &str {
        &self.dynamic_store
    }

    /// Whether `name` is one of this release's stores.
    pub fn is_current(&self, name: &str) -> bool {
        name == self.static_store || name == self.dynamic_store
    }

    /// Names from `names` that belong to no role of this release.
    pub fn stale<'a>(&self, names: &'a [String]) -> Vec<&'a str> {
        names
            .iter()
            .map(String::as_str)
            .filter(|name| !self.is_current(name))
            .collect()
    }
}
