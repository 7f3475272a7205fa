// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Strongly-typed identifiers.
//!
//! Every id is a distinct newtype so a memory instance id can never be
//! passed where a cell instance id is expected. Instance ids double as
//! positional indices into the catalog tables.

macro_rules! typed_id {
    ($(#[$meta:meta])* $name:ident($repr:ty) => $prefix:literal) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
            serde::Serialize, serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name($repr);

        impl $name {
            /// Wraps a raw identifier value.
            pub const fn new(raw: $repr) -> Self {
                Self(raw)
            }

            /// Returns the raw identifier value.
            pub const fn raw(self) -> $repr {
                self.0
            }

            /// Returns the identifier as a table index.
            pub const fn index(self) -> usize {
                self.0 as usize
            }

            /// Builds an identifier from a table index, if it fits the representation.
            pub fn from_index(index: usize) -> Option<Self> {
                <$repr>::try_from(index).ok().map(Self)
            }
        }

        impl From<$repr> for $name {
            fn from(raw: $repr) -> Self {
                Self(raw)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, concat!($prefix, "#{}"), self.0)
            }
        }
    };
}

typed_id! {
    /// A physical cell slot on the fabric.
    CellInstanceId(u16) => "cell"
}

typed_id! {
    /// A concrete on-chip memory bank.
    MemoryInstanceId(u16) => "mem"
}

typed_id! {
    /// A client pipeline, supplied by the caller.
    PipelineId(u32) => "pipeline"
}

typed_id! {
    /// A stage within a pipeline request.
    StageId(u16) => "stage"
}

typed_id! {
    /// A committed binding, assigned by the allocator.
    BindingId(u64) => "binding"
}

impl BindingId {
    /// Returns the id that follows this one.
    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_prefixes() {
        assert_eq!(CellInstanceId::new(3).to_string(), "cell#3");
        assert_eq!(MemoryInstanceId::new(5).to_string(), "mem#5");
        assert_eq!(PipelineId::new(7).to_string(), "pipeline#7");
        assert_eq!(StageId::new(2).to_string(), "stage#2");
        assert_eq!(BindingId::new(1).to_string(), "binding#1");
    }

    #[test]
    fn test_from_index_bounds() {
        assert_eq!(CellInstanceId::from_index(28), Some(CellInstanceId::new(28)));
        assert_eq!(CellInstanceId::from_index(70_000), None);
        assert_eq!(MemoryInstanceId::new(9).index(), 9);
    }

    #[test]
    fn test_ordering_follows_raw_value() {
        let mut ids = vec![CellInstanceId::new(4), CellInstanceId::new(0), CellInstanceId::new(2)];
        ids.sort();
        assert_eq!(ids.iter().map(|c| c.raw()).collect::<Vec<_>>(), vec![0, 2, 4]);
    }

    #[test]
    fn test_serde_is_transparent() {
        let json = serde_json::to_string(&StageId::new(12)).unwrap();
        assert_eq!(json, "12");
        let back: StageId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, StageId::new(12));
    }
}
