//! Global profile registry for looking up shell profiles by name.

use std::sync::RwLock;

use indexmap::IndexMap;
use once_cell::sync::Lazy;

use super::definition::ShellProfile;
use super::shells;
use crate::error::{ProfileError, Result};

/// Global profile registry.
static REGISTRY: Lazy<RwLock<ProfileRegistry>> = Lazy::new(|| {
    let mut registry = ProfileRegistry::new();
    registry.register_builtin_profiles();
    RwLock::new(registry)
});

/// Registry for shell profiles, kept in registration order.
#[derive(Debug, Default)]
pub struct ProfileRegistry {
    profiles: IndexMap<String, ShellProfile>,
}

impl ProfileRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            profiles: IndexMap::new(),
        }
    }

    /// Get the global registry.
    pub fn global() -> &'static RwLock<ProfileRegistry> {
        &REGISTRY
    }

    /// Clone a profile out of the global registry.
    pub fn lookup(name: &str) -> Result<ShellProfile> {
        let registry = Self::global()
            .read()
            .map_err(|_| ProfileError::InvalidDefinition {
                message: "Failed to acquire registry lock".to_string(),
            })?;
        registry.get(name).cloned().ok_or_else(|| {
            ProfileError::UnknownProfile {
                name: name.to_string(),
            }
            .into()
        })
    }

    fn register_builtin_profiles(&mut self) {
        for profile in [shells::posix::profile(), shells::cmd::profile()] {
            self.profiles.insert(profile.name.clone(), profile);
        }
    }

    /// Register a profile. Names must be unique and the profile valid.
    pub fn register(&mut self, profile: ShellProfile) -> Result<()> {
        profile.validate()?;
        if self.profiles.contains_key(&profile.name) {
            return Err(ProfileError::AlreadyRegistered {
                name: profile.name.clone(),
            }
            .into());
        }
        self.profiles.insert(profile.name.clone(), profile);
        Ok(())
    }

    /// Get a profile by name.
    pub fn get(&self, name: &str) -> Option<&ShellProfile> {
        self.profiles.get(name)
    }

    /// Check if a profile is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.profiles.contains_key(name)
    }

    /// List all registered profile names.
    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.profiles.keys()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_builtins_registered() {
        let registry = ProfileRegistry::global().read().unwrap();
        let names: Vec<&String> = registry.names().collect();
        assert_eq!(names, vec!["posix", "cmd"]);
    }

    #[test]
    fn test_lookup() {
        let profile = ProfileRegistry::lookup("posix").unwrap();
        assert_eq!(profile.program, "/bin/sh");

        let err = ProfileRegistry::lookup("fish").unwrap_err();
        assert!(matches!(
            err,
            Error::Profile(ProfileError::UnknownProfile { ref name }) if name == "fish"
        ));
    }

    #[test]
    fn test_register_rejects_duplicates() {
        let mut registry = ProfileRegistry::new();
        registry.register(ShellProfile::new("bash", "/bin/bash")).unwrap();
        assert!(registry.contains("bash"));

        let err = registry
            .register(ShellProfile::new("bash", "/usr/bin/bash"))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Profile(ProfileError::AlreadyRegistered { .. })
        ));
        assert_eq!(registry.get("bash").unwrap().program, "/bin/bash");
    }

    #[test]
    fn test_register_rejects_invalid() {
        let mut registry = ProfileRegistry::new();
        let err = registry
            .register(ShellProfile::new("bad", "sh").with_prompt(""))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Profile(ProfileError::InvalidDefinition { .. })
        ));
        assert!(!registry.contains("bad"));
    }
}
