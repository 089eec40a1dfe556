// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Machine architectures recognized by the synchronizer.

Debian repositories publish one `Packages` index per machine architecture,
plus packages declaring the `all` pseudo-architecture, which are valid for
every machine and are listed in every concrete index.
*/

use {
    crate::error::{Result, SyncError},
    std::str::FromStr,
    strum::IntoEnumIterator,
    strum_macros::{Display, EnumIter, EnumString},
};

/// A machine architecture for which binary packages can be published.
///
/// [Architecture::All] is the wildcard: a package built for `all` is
/// architecture independent and belongs in every concrete index.
#[derive(
    Clone, Copy, Debug, Display, EnumIter, EnumString, Eq, Hash, Ord, PartialEq, PartialOrd,
)]
#[strum(serialize_all = "lowercase")]
pub enum Architecture {
    All,
    Amd64,
    Arm64,
    Armel,
    Armhf,
    I386,
    Mips64el,
    Mipsel,
    Ppc64el,
    S390x,
}

impl Architecture {
    /// Whether this is the `all` wildcard rather than a concrete machine.
    pub fn is_wildcard(&self) -> bool {
        matches!(self, Self::All)
    }

    /// Resolve an architecture token from a control file field.
    pub fn resolve(s: &str) -> Result<Self> {
        Self::from_str(s).map_err(|_| SyncError::UnknownArchitecture(s.to_string()))
    }

    /// Iterate over the concrete architectures, i.e. everything except the wildcard.
    pub fn iter_concrete() -> impl Iterator<Item = Architecture> {
        Self::iter().filter(|arch| !arch.is_wildcard())
    }

    /// The architectures an incoming package's records should be indexed under.
    ///
    /// A concrete architecture maps to itself; the wildcard expands to every
    /// concrete architecture.
    pub fn expand(&self) -> Vec<Architecture> {
        if self.is_wildcard() {
            Self::iter_concrete().collect()
        } else {
            vec![*self]
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parse_and_display() {
        assert_eq!(Architecture::resolve("amd64").unwrap(), Architecture::Amd64);
        assert_eq!(Architecture::resolve("all").unwrap(), Architecture::All);
        assert_eq!(Architecture::Mips64el.to_string(), "mips64el");

        assert!(matches!(
            Architecture::resolve("vax"),
            Err(SyncError::UnknownArchitecture(s)) if s == "vax"
        ));
    }

    #[test]
    fn wildcard_expansion() {
        assert!(Architecture::All.is_wildcard());
        assert!(!Architecture::Amd64.is_wildcard());

        assert_eq!(Architecture::Arm64.expand(), vec![Architecture::Arm64]);

        let expanded = Architecture::All.expand();
        assert!(!expanded.contains(&Architecture::All));
        assert_eq!(expanded.len(), Architecture::iter_concrete().count());
        assert!(expanded.contains(&Architecture::Amd64));
    }
}
