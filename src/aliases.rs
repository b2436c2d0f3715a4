//! Device nicknames.
//!
//! Classroom robots advertise names like `WAC-2463`; students use the
//! nickname printed on the robot instead. A [`DeviceNameResolver`] turns
//! whatever the user typed into the advertised name the controller scans for.

use std::collections::HashMap;
use std::hash::BuildHasher;

use crate::error::ConfigError;

/// Maps a user-supplied name to the advertised device name.
pub trait DeviceNameResolver {
    /// Resolve `name`. Names the resolver does not know are returned
    /// unchanged.
    fn resolve(&self, name: &str) -> Result<String, ConfigError>;
}

/// The classroom fleet. Nicknames with an empty name have no robot yet.
pub const WAC_ALIASES: &[(&str, &str)] = &[
    ("beep", "WAC-2463"),
    ("boop", "WAC-7F36"),
    ("buzz", "WAC-98CE"),
    ("bzzt", "WAC-D329"),
    ("chirp", "WAC-1A74"),
    ("click", "WAC-27B7"),
    ("clonk", "WAC-9776"),
    ("clunk", "WAC-7740"),
    ("crash", "WAC-22F2"),
    ("dink", "WAC-6BC7"),
    ("doot", "WAC-47F1"),
    ("fizz", "WAC-121A"),
    ("honk", "WAC-5613"),
    ("hoot", "WAC-9717"),
    ("jolt", "WAC-A466"),
    ("noot", "WAC-EC1C"),
    ("oink", ""),
    ("pew", ""),
    ("ping", ""),
    ("pong", ""),
    ("pop", ""),
    ("pow", ""),
    ("purr", ""),
    ("quark", ""),
    ("ring", ""),
    ("roar", ""),
    ("sigh", ""),
    ("snip", ""),
    ("sput", ""),
    ("swsh", ""),
    ("tape", ""),
    ("thud", ""),
    ("thum", ""),
    ("tik", ""),
    ("tok", ""),
    ("tong", ""),
    ("vroom", ""),
    ("whim", ""),
    ("whir", ""),
    ("whiz", ""),
    ("whoop", ""),
    ("whum", ""),
    ("wizz", ""),
    ("wow", ""),
    ("yip", ""),
    ("zap", ""),
    ("zip", ""),
    ("zot", ""),
];

/// A fixed nickname table with case-insensitive lookup.
///
/// # Example
///
/// ```
/// use wac_robot::aliases::{DeviceNameResolver, StaticAliasTable};
///
/// let table = StaticAliasTable::default();
/// assert_eq!(table.resolve("Beep").unwrap(), "WAC-2463");
/// assert_eq!(table.resolve("WAC-0001").unwrap(), "WAC-0001");
/// assert!(table.resolve("zot").is_err());
/// ```
#[derive(Clone, Copy, Debug)]
pub struct StaticAliasTable {
    entries: &'static [(&'static str, &'static str)],
}

impl StaticAliasTable {
    /// Wrap a `(nickname, advertised name)` table. Nicknames must be lowercase.
    pub const fn new(entries: &'static [(&'static str, &'static str)]) -> Self {
        Self { entries }
    }

    /// The raw entry for `nickname`, if present.
    pub fn lookup(&self, nickname: &str) -> Option<&'static str> {
        let wanted = nickname.trim().to_ascii_lowercase();
        self.entries
            .iter()
            .find(|(nick, _)| *nick == wanted)
            .map(|(_, name)| *name)
    }
}

impl Default for StaticAliasTable {
    fn default() -> Self {
        Self::new(WAC_ALIASES)
    }
}

impl DeviceNameResolver for StaticAliasTable {
    fn resolve(&self, name: &str) -> Result<String, ConfigError> {
        match self.lookup(name) {
            Some("") => Err(ConfigError::UnknownDeviceAlias {
                alias: name.to_string(),
            }),
            Some(canonical) => Ok(canonical.to_string()),
            None => Ok(name.to_string()),
        }
    }
}

impl<S: BuildHasher> DeviceNameResolver for HashMap<String, String, S> {
    fn resolve(&self, name: &str) -> Result<String, ConfigError> {
        match self.get(&name.trim().to_ascii_lowercase()) {
            Some(canonical) if canonical.is_empty() => Err(ConfigError::UnknownDeviceAlias {
                alias: name.to_string(),
            }),
            Some(canonical) => Ok(canonical.clone()),
            None => Ok(name.to_string()),
        }
    }
}
