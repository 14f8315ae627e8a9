//! String-keyed strategy selection.
//!
//! Every pluggable function family (activation, cost, regularization, distance,
//! prototype initialization) is a closed enum. Models are configured by key
//! (`"sigmoid"`, `"cross-entropy"`, `"L2"`, ...) and persist those keys, so each
//! family maps its variants to and from a stable string.

use crate::{Error, Result};

pub trait Strategy: Copy + Sized + 'static {
    /// Family name used in error messages (e.g. `"activation"`).
    const FAMILY: &'static str;

    /// All supported variants, in a fixed order.
    const ALL: &'static [Self];

    /// Stable key for this variant.
    fn key(self) -> &'static str;

    /// Resolve a key into a variant.
    ///
    /// Matching is ASCII case-insensitive and treats `_` like `-`, so
    /// `"cross_entropy"` and `"Cross-Entropy"` both resolve.
    fn from_key(key: &str) -> Result<Self> {
        let wanted = normalize(key);
        Self::ALL
            .iter()
            .copied()
            .find(|s| normalize(s.key()) == wanted)
            .ok_or_else(|| Error::UnsupportedStrategy {
                family: Self::FAMILY,
                key: key.to_owned(),
            })
    }
}

fn normalize(key: &str) -> String {
    key.trim().to_ascii_lowercase().replace('_', "-")
}

/// Implements `FromStr`, `Display` and (with `serde`) string-based
/// serialization for a strategy enum.
macro_rules! strategy_impls {
    ($ty:ty) => {
        impl std::str::FromStr for $ty {
            type Err = $crate::Error;

            fn from_str(s: &str) -> $crate::Result<Self> {
                <$ty as $crate::strategy::Strategy>::from_key(s)
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str($crate::strategy::Strategy::key(*self))
            }
        }

        #[cfg(feature = "serde")]
        impl serde::Serialize for $ty {
            fn serialize<S: serde::Serializer>(
                &self,
                serializer: S,
            ) -> std::result::Result<S::Ok, S::Error> {
                serializer.serialize_str($crate::strategy::Strategy::key(*self))
            }
        }

        #[cfg(feature = "serde")]
        impl<'de> serde::Deserialize<'de> for $ty {
            fn deserialize<D: serde::Deserializer<'de>>(
                deserializer: D,
            ) -> std::result::Result<Self, D::Error> {
                let key = <String as serde::Deserialize>::deserialize(deserializer)?;
                <$ty as $crate::strategy::Strategy>::from_key(&key)
                    .map_err(serde::de::Error::custom)
            }
        }
    };
}

pub(crate) use strategy_impls;
