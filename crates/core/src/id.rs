// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Prefixed random identifiers

/// Returns a string slice truncated to at most `n` bytes.
pub fn short(s: &str, n: usize) -> &str {
    match s.get(..n) {
        Some(head) if s.len() > n => head,
        _ => s,
    }
}

/// Define a newtype ID around `SmolStr` with a type prefix.
///
/// IDs look like `{prefix}{nanoid}`: a short type tag such as `"dep-"`
/// followed by 19 random characters, which keeps the whole value inside
/// `SmolStr`'s inline capacity.
///
/// ```ignore
/// define_id! {
///     /// Stable name of one deployment.
///     pub struct DeploymentId("dep-");
/// }
/// ```
#[macro_export]
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        pub struct $name:ident($prefix:literal);
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub smol_str::SmolStr);

        impl $name {
            pub const PREFIX: &'static str = $prefix;

            /// Generate a fresh random ID carrying the type prefix
            pub fn new() -> Self {
                Self(smol_str::format_smolstr!("{}{}", Self::PREFIX, nanoid::nanoid!(19)))
            }

            /// Wrap an existing string without validation
            pub fn from_string(id: impl Into<smol_str::SmolStr>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// The random part, without the prefix
            pub fn suffix(&self) -> &str {
                self.0.strip_prefix(Self::PREFIX).unwrap_or(&self.0)
            }

            /// The first `n` characters of the suffix
            pub fn short(&self, n: usize) -> &str {
                $crate::id::short(self.suffix(), n)
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self::from_string(s)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self::from_string(s)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl std::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }
    };
}

define_id! {
    /// Stable name of one deployment.
    ///
    /// Unlike the OS process id, it survives restarts, so it names the
    /// deployment's work directory and log file.
    pub struct DeploymentId("dep-");
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
