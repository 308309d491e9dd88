// src/version/mod.rs

//! Version handling and constraint satisfaction for package dependencies
//!
//! Versions follow pacman's `[epoch:]pkgver[-pkgrel]` scheme and are ordered
//! with the same segment-wise algorithm `vercmp(8)` uses. Dependency strings
//! are the usual `name`, `name=1.0`, `name>=1.0-2` forms found in PKGBUILDs,
//! sync databases and AUR RPC replies.

use std::cmp::Ordering;
use std::fmt;

/// A parsed pacman version with epoch, pkgver and pkgrel components
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AlpmVersion {
    pub epoch: String,
    pub version: String,
    pub release: Option<String>,
}

impl AlpmVersion {
    /// Parse a version string
    ///
    /// Format: [epoch:]version[-release]
    /// Examples:
    /// - "1.2.3" → epoch="0", version="1.2.3", release=None
    /// - "2:1.2.3" → epoch="2", version="1.2.3", release=None
    /// - "1.2.3-4" → epoch="0", version="1.2.3", release=Some("4")
    ///
    /// Parsing never fails; malformed input simply compares segment-wise.
    pub fn parse(s: &str) -> Self {
        let digits = s.bytes().take_while(u8::is_ascii_digit).count();

        let (epoch, rest) = if s[digits..].starts_with(':') {
            let epoch = if digits == 0 { "0" } else { &s[..digits] };
            (epoch.to_string(), &s[digits + 1..])
        } else {
            ("0".to_string(), s)
        };

        // The release separator is the last dash
        let (version, release) = match rest.rfind('-') {
            Some(pos) => (rest[..pos].to_string(), Some(rest[pos + 1..].to_string())),
            None => (rest.to_string(), None),
        };

        Self {
            epoch,
            version,
            release,
        }
    }

    /// Compare two versions
    ///
    /// Releases only take part when both sides carry one, so `1.0` equals `1.0-3`.
    pub fn compare(&self, other: &AlpmVersion) -> Ordering {
        match segment_cmp(&self.epoch, &other.epoch) {
            Ordering::Equal => {}
            ord => return ord,
        }

        match segment_cmp(&self.version, &other.version) {
            Ordering::Equal => {}
            ord => return ord,
        }

        match (&self.release, &other.release) {
            (Some(a), Some(b)) => segment_cmp(a, b),
            _ => Ordering::Equal,
        }
    }
}

impl fmt::Display for AlpmVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.epoch != "0" {
            write!(f, "{}:", self.epoch)?;
        }
        write!(f, "{}", self.version)?;
        if let Some(ref release) = self.release {
            write!(f, "-{}", release)?;
        }
        Ok(())
    }
}

/// Compare two full version strings the way pacman does
pub fn vercmp(a: &str, b: &str) -> Ordering {
    if a == b {
        return Ordering::Equal;
    }
    AlpmVersion::parse(a).compare(&AlpmVersion::parse(b))
}

/// Segment-wise comparison of a single version component
///
/// Alternating runs of digits and letters are compared in turn; numeric runs
/// beat alphabetic ones, and a trailing alphabetic run marks a pre-release
/// (`1.0a` sorts before `1.0`).
fn segment_cmp(a: &str, b: &str) -> Ordering {
    if a == b {
        return Ordering::Equal;
    }

    let s1 = a.as_bytes();
    let s2 = b.as_bytes();
    let at = |s: &[u8], i: usize| s.get(i).copied().unwrap_or(0);

    // `one`/`two` mark segment starts, `end1`/`end2` the end of the previous segment
    let (mut one, mut two) = (0usize, 0usize);
    let (mut end1, mut end2) = (0usize, 0usize);

    while one < s1.len() && two < s2.len() {
        while one < s1.len() && !s1[one].is_ascii_alphanumeric() {
            one += 1;
        }
        while two < s2.len() && !s2[two].is_ascii_alphanumeric() {
            two += 1;
        }

        if one >= s1.len() || two >= s2.len() {
            break;
        }

        // Different separator lengths decide the comparison
        let (sep1, sep2) = (one - end1, two - end2);
        if sep1 != sep2 {
            return sep1.cmp(&sep2);
        }

        end1 = one;
        end2 = two;

        let is_num = s1[end1].is_ascii_digit();
        if is_num {
            while end1 < s1.len() && s1[end1].is_ascii_digit() {
                end1 += 1;
            }
            while end2 < s2.len() && s2[end2].is_ascii_digit() {
                end2 += 1;
            }
        } else {
            while end1 < s1.len() && s1[end1].is_ascii_alphabetic() {
                end1 += 1;
            }
            while end2 < s2.len() && s2[end2].is_ascii_alphabetic() {
                end2 += 1;
            }
        }

        // Segments of different kinds: numeric is newer
        if two == end2 {
            return if is_num {
                Ordering::Greater
            } else {
                Ordering::Less
            };
        }

        let mut seg1 = &s1[one..end1];
        let mut seg2 = &s2[two..end2];

        if is_num {
            while seg1.first() == Some(&b'0') {
                seg1 = &seg1[1..];
            }
            while seg2.first() == Some(&b'0') {
                seg2 = &seg2[1..];
            }
            if seg1.len() != seg2.len() {
                return seg1.len().cmp(&seg2.len());
            }
        }

        match seg1.cmp(seg2) {
            Ordering::Equal => {}
            ord => return ord,
        }

        one = end1;
        two = end2;
    }

    let done1 = one >= s1.len();
    let done2 = two >= s2.len();
    if done1 && done2 {
        return Ordering::Equal;
    }

    // A remaining alphabetic run never beats an empty one
    if (done1 && !at(s2, two).is_ascii_alphabetic()) || at(s1, one).is_ascii_alphabetic() {
        Ordering::Less
    } else {
        Ordering::Greater
    }
}

/// Comparison operator of a dependency string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DepMod {
    /// No constraint; any version is acceptable
    #[default]
    Any,
    Eq,
    Lt,
    Le,
    Gt,
    Ge,
}

impl DepMod {
    /// Map an operator run to a modifier; `None` for runs such as `=>`
    pub fn from_op(op: &str) -> Option<Self> {
        match op {
            "=" => Some(DepMod::Eq),
            "<" => Some(DepMod::Lt),
            "<=" => Some(DepMod::Le),
            ">" => Some(DepMod::Gt),
            ">=" => Some(DepMod::Ge),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DepMod::Any => "",
            DepMod::Eq => "=",
            DepMod::Lt => "<",
            DepMod::Le => "<=",
            DepMod::Gt => ">",
            DepMod::Ge => ">=",
        }
    }

    /// Check whether `version` compared against `required` agrees with this operator
    pub fn satisfied_by(&self, version: &str, required: &str) -> bool {
        match self {
            DepMod::Any => true,
            DepMod::Eq => vercmp(version, required) == Ordering::Equal,
            DepMod::Lt => vercmp(version, required) == Ordering::Less,
            DepMod::Le => vercmp(version, required) != Ordering::Greater,
            DepMod::Gt => vercmp(version, required) == Ordering::Greater,
            DepMod::Ge => vercmp(version, required) != Ordering::Less,
        }
    }
}

impl fmt::Display for DepMod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn is_op_char(c: char) -> bool {
    matches!(c, '<' | '>' | '=')
}

/// A dependency string split into name, operator and version
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Depend {
    pub name: String,
    pub op: DepMod,
    pub version: String,
}

impl Depend {
    /// Split a dependency string at its first run of `<`, `>` and `=`
    ///
    /// Examples:
    /// - "glibc" → ("glibc", Any, "")
    /// - "glibc>=2.17" → ("glibc", Ge, "2.17")
    /// - "python=3.12" → ("python", Eq, "3.12")
    ///
    /// An unknown operator run keeps the whole string as the name, so the
    /// dependency matches nothing and still prints as written.
    pub fn parse(dep: &str) -> Self {
        Self::try_parse(dep).unwrap_or_else(|| Self::unversioned(dep))
    }

    /// Like [`Depend::parse`], but `None` when the operator run is unknown
    pub fn try_parse(dep: &str) -> Option<Self> {
        let Some(start) = dep.find(is_op_char) else {
            return Some(Self::unversioned(dep));
        };

        let rest = &dep[start..];
        let run = rest.find(|c: char| !is_op_char(c)).unwrap_or(rest.len());

        Some(Self {
            name: dep[..start].to_string(),
            op: DepMod::from_op(&rest[..run])?,
            version: rest[run..].to_string(),
        })
    }

    fn unversioned(dep: &str) -> Self {
        Self {
            name: dep.to_string(),
            op: DepMod::Any,
            version: String::new(),
        }
    }

    pub fn is_versioned(&self) -> bool {
        self.op != DepMod::Any
    }
}

impl fmt::Display for Depend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_versioned() {
            write!(f, "{}{}{}", self.name, self.op, self.version)
        } else {
            write!(f, "{}", self.name)
        }
    }
}

/// Check whether a package called `name` at `version` satisfies `dep`
pub fn satisfies_name(name: &str, version: &str, dep: &str) -> bool {
    let dep = Depend::parse(dep);
    dep.name == name && dep.op.satisfied_by(version, &dep.version)
}

/// Check whether a provide string of a package at `pkg_version` satisfies `dep`
///
/// An unversioned provide stands for the providing package's own version,
/// so `foo-git` at 1.2 providing `foo` satisfies `foo>=1.0`.
pub fn satisfies_provide(provide: &str, dep: &str, pkg_version: &str) -> bool {
    let dep = Depend::parse(dep);
    let provide = Depend::parse(provide);

    if provide.name != dep.name {
        return false;
    }

    let version = if !provide.is_versioned() && dep.is_versioned() {
        pkg_version
    } else {
        provide.version.as_str()
    };

    dep.op.satisfied_by(version, &dep.version)
}
