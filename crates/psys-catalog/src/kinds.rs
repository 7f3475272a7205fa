// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Resource kinds shared by every generation of the PSYS fabric.
//!
//! The enumerations are fixed by the firmware interface; what varies per
//! generation is how many instances of each kind exist and how large they
//! are. That variation lives in the [`Catalog`](crate::Catalog).

use crate::CatalogError;
use std::fmt;
use std::str::FromStr;

macro_rules! resource_kind {
    (
        $(#[$meta:meta])*
        $name:ident, $label:literal {
            $($(#[$vmeta:meta])* $variant:ident => $text:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
            serde::Serialize, serde::Deserialize,
        )]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($(#[$vmeta])* $variant,)+
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Number of variants.
            pub const COUNT: usize = Self::ALL.len();

            /// Returns the canonical snake_case label.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = CatalogError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let needle = s.trim().to_lowercase().replace('-', "_");
                Self::ALL
                    .iter()
                    .copied()
                    .find(|k| k.as_str() == needle)
                    .ok_or_else(|| CatalogError::UnknownKind {
                        kind: $label,
                        value: s.to_string(),
                    })
            }
        }
    };
}

resource_kind! {
    /// The kind of compute cell occupying a physical slot.
    CellType, "cell type" {
        /// Scalar control processor running the stage scheduler.
        SpControl => "sp_control",
        /// Programmable vector processor.
        VectorProcessor => "vector_processor",
        /// Fixed-function accelerator in the pixel-signal-analysis chain.
        AccPsa => "acc_psa",
        /// Fixed-function accelerator in the output-scaler chain.
        AccOsa => "acc_osa",
        /// Fixed-function accelerator in the input-system-analysis chain.
        AccIsa => "acc_isa",
        /// Geometric distortion correction block.
        Gdc => "gdc",
        /// Temporal noise reduction block.
        Tnr => "tnr",
    }
}

resource_kind! {
    /// The kind of an on-chip memory bank.
    ///
    /// Declaration order is the column order of the affinity matrix.
    MemoryKind, "memory kind" {
        TransferVmem0 => "transfer_vmem0",
        TransferVmem1 => "transfer_vmem1",
        /// Line buffer.
        LbVmem => "lb_vmem",
        /// Data memory local to a processor.
        Dmem => "dmem",
        /// Vector memory.
        Vmem => "vmem",
        /// Bank memory.
        Bamem => "bamem",
        /// Program memory.
        Pmem => "pmem",
    }
}

resource_kind! {
    /// A class of DMA device channel.
    ChannelKind, "channel kind" {
        DmaExt0 => "dma_ext0",
        DmaExt1Read => "dma_ext1_read",
        DmaExt1Write => "dma_ext1_write",
        DmaInternal => "dma_internal",
        DmaIsa => "dma_isa",
    }
}

resource_kind! {
    /// A class of device-feeder-module queue port.
    PortKind, "port kind" {
        BbFull => "bb_full",
        BbEmpty => "bb_empty",
        IslFull => "isl_full",
        IslEmpty => "isl_empty",
        LbFull => "lb_full",
        LbEmpty => "lb_empty",
    }
}

impl MemoryKind {
    /// Column of this kind in the affinity matrix.
    pub fn column(&self) -> usize {
        *self as usize
    }
}

/// Any allocatable resource kind. Used to tag allocation failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(tag = "class", content = "kind", rename_all = "snake_case")]
pub enum ResourceKind {
    Cell(CellType),
    Memory(MemoryKind),
    Channel(ChannelKind),
    Port(PortKind),
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cell(t) => write!(f, "cell:{t}"),
            Self::Memory(k) => write!(f, "memory:{k}"),
            Self::Channel(k) => write!(f, "channel:{k}"),
            Self::Port(k) => write!(f, "port:{k}"),
        }
    }
}

impl From<CellType> for ResourceKind {
    fn from(t: CellType) -> Self {
        Self::Cell(t)
    }
}

impl From<MemoryKind> for ResourceKind {
    fn from(k: MemoryKind) -> Self {
        Self::Memory(k)
    }
}

impl From<ChannelKind> for ResourceKind {
    fn from(k: ChannelKind) -> Self {
        Self::Channel(k)
    }
}

impl From<PortKind> for ResourceKind {
    fn from(k: PortKind) -> Self {
        Self::Port(k)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_columns_follow_declaration_order() {
        assert_eq!(MemoryKind::TransferVmem0.column(), 0);
        assert_eq!(MemoryKind::Dmem.column(), 3);
        assert_eq!(MemoryKind::Pmem.column(), MemoryKind::COUNT - 1);
    }

    #[test]
    fn test_parse_is_lenient_about_case_and_dashes() {
        assert_eq!("ACC-PSA".parse::<CellType>().unwrap(), CellType::AccPsa);
        assert_eq!(" lb_vmem ".parse::<MemoryKind>().unwrap(), MemoryKind::LbVmem);
        assert_eq!("dma-ext1-write".parse::<ChannelKind>().unwrap(), ChannelKind::DmaExt1Write);
        assert_eq!("isl_empty".parse::<PortKind>().unwrap(), PortKind::IslEmpty);
    }

    #[test]
    fn test_parse_unknown() {
        let err = "warp_drive".parse::<CellType>().unwrap_err();
        assert!(matches!(err, CatalogError::UnknownKind { kind: "cell type", .. }));
        assert!(err.to_string().contains("warp_drive"));
    }

    #[test]
    fn test_serde_uses_snake_case_labels() {
        let json = serde_json::to_string(&CellType::VectorProcessor).unwrap();
        assert_eq!(json, "\"vector_processor\"");
        let back: PortKind = serde_json::from_str("\"lb_full\"").unwrap();
        assert_eq!(back, PortKind::LbFull);
    }

    #[test]
    fn test_resource_kind_display() {
        assert_eq!(ResourceKind::from(CellType::Gdc).to_string(), "cell:gdc");
        assert_eq!(ResourceKind::from(MemoryKind::Vmem).to_string(), "memory:vmem");
        assert_eq!(ResourceKind::from(ChannelKind::DmaIsa).to_string(), "channel:dma_isa");
        assert_eq!(ResourceKind::from(PortKind::BbFull).to_string(), "port:bb_full");
    }
}
