// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! IPU6EP processing-system inventory.
//!
//! 29 cell slots, 10 memory banks, 5 DMA channel kinds and 6 DFM port kinds.
//!
//! Cell types follow the per-slot labels of the firmware memory table, not
//! the firmware cell-type array, which is shifted by one slot against them.

use super::{AffinityRow, GenerationTable};
use crate::{CellType, ChannelKind, MemoryKind, PortKind};

// Memory bank indices, in table order.
const VMEM0: usize = 0;
const TRANSFER_VMEM0: usize = 1;
const TRANSFER_VMEM1: usize = 2;
const LB_VMEM: usize = 3;
const BAMEM0: usize = 4;
const DMEM0: usize = 5;
const DMEM1: usize = 6;
const DMEM3: usize = 8;
const PMEM0: usize = 9;

// Affinity rows. Columns: transfer_vmem0, transfer_vmem1, lb_vmem, dmem,
// vmem, bamem, pmem.
const SP0: AffinityRow = [None, None, None, Some(DMEM0), None, None, None];
const SP1: AffinityRow = [None, None, None, Some(DMEM1), None, None, None];
const VP0: AffinityRow = [
    Some(TRANSFER_VMEM0),
    Some(TRANSFER_VMEM1),
    Some(LB_VMEM),
    Some(DMEM3),
    Some(VMEM0),
    Some(BAMEM0),
    Some(PMEM0),
];
const LINE_BUFFERED: AffinityRow = [
    Some(TRANSFER_VMEM0),
    Some(TRANSFER_VMEM1),
    Some(LB_VMEM),
    None,
    None,
    None,
    None,
];
const TRANSFER_ONLY: AffinityRow = [
    Some(TRANSFER_VMEM0),
    Some(TRANSFER_VMEM1),
    None,
    None,
    None,
    None,
    None,
];

pub(super) const TABLE: GenerationTable = GenerationTable {
    cells: &[
        ("sp0", CellType::SpControl, SP0),
        ("sp1", CellType::SpControl, SP1),
        ("vp0", CellType::VectorProcessor, VP0),
        ("acc1_bnlm", CellType::AccPsa, LINE_BUFFERED),
        ("acc2_dm", CellType::AccPsa, LINE_BUFFERED),
        ("acc3_acm", CellType::AccPsa, LINE_BUFFERED),
        ("acc4_gtc_yuv1", CellType::AccPsa, LINE_BUFFERED),
        ("acc5_ofs_main", CellType::AccOsa, TRANSFER_ONLY),
        ("acc6_ofs_display", CellType::AccOsa, TRANSFER_ONLY),
        ("acc7_ofs_pp", CellType::AccOsa, TRANSFER_ONLY),
        ("acc8_gammastar", CellType::AccPsa, LINE_BUFFERED),
        ("acc9_gltm", CellType::AccPsa, LINE_BUFFERED),
        ("acc10_xnr", CellType::AccPsa, LINE_BUFFERED),
        ("isa_ica", CellType::AccIsa, LINE_BUFFERED),
        ("isa_lsc", CellType::AccIsa, LINE_BUFFERED),
        ("isa_dpc", CellType::AccIsa, LINE_BUFFERED),
        ("isa_sis_a", CellType::AccIsa, LINE_BUFFERED),
        ("isa_sis_b", CellType::AccIsa, LINE_BUFFERED),
        ("isa_b2b", CellType::AccIsa, LINE_BUFFERED),
        ("isa_b2r_r2i_sie", CellType::AccIsa, LINE_BUFFERED),
        ("isa_r2i_ds_a", CellType::AccIsa, LINE_BUFFERED),
        ("isa_awb", CellType::AccIsa, LINE_BUFFERED),
        ("isa_ae", CellType::AccIsa, LINE_BUFFERED),
        ("isa_af", CellType::AccIsa, LINE_BUFFERED),
        ("isa_x2b_md", CellType::AccIsa, LINE_BUFFERED),
        ("isa_x2b_sve_rgbir", CellType::AccIsa, LINE_BUFFERED),
        ("isa_paf", CellType::AccIsa, LINE_BUFFERED),
        ("bb_acc_gdc0", CellType::Gdc, TRANSFER_ONLY),
        ("bb_acc_tnr", CellType::Tnr, TRANSFER_ONLY),
    ],
    memories: &[
        ("vmem0", MemoryKind::Vmem, 0x0800),
        ("transfer_vmem0", MemoryKind::TransferVmem0, 0x0800),
        ("transfer_vmem1", MemoryKind::TransferVmem1, 0x0800),
        ("lb_vmem", MemoryKind::LbVmem, 0x0400),
        ("bamem0", MemoryKind::Bamem, 0x0800),
        ("dmem0", MemoryKind::Dmem, 0x4000),
        ("dmem1", MemoryKind::Dmem, 0x1000),
        ("dmem2", MemoryKind::Dmem, 0x1000),
        ("dmem3", MemoryKind::Dmem, 0x1000),
        ("pmem0", MemoryKind::Pmem, 0x0500),
    ],
    channels: &[
        (ChannelKind::DmaExt0, 30),
        (ChannelKind::DmaExt1Read, 30),
        (ChannelKind::DmaExt1Write, 43),
        (ChannelKind::DmaInternal, 8),
        (ChannelKind::DmaIsa, 2),
    ],
    ports: &[
        (PortKind::BbFull, 32),
        (PortKind::BbEmpty, 32),
        (PortKind::IslFull, 32),
        (PortKind::IslEmpty, 32),
        (PortKind::LbFull, 32),
        (PortKind::LbEmpty, 32),
    ],
};

#[cfg(test)]
mod tests {
    use crate::{Catalog, CellInstanceId, CellType, ChannelKind, MemoryKind, PortKind};

    fn catalog() -> Catalog {
        Catalog::load("ipu6ep").unwrap()
    }

    #[test]
    fn test_inventory_counts() {
        let c = catalog();
        assert_eq!(c.num_cells(), 29);
        assert_eq!(c.num_memories(), 10);
        assert_eq!(c.count_cells(CellType::SpControl), 2);
        assert_eq!(c.count_cells(CellType::VectorProcessor), 1);
        assert_eq!(c.count_cells(CellType::AccPsa), 7);
        assert_eq!(c.count_cells(CellType::AccOsa), 3);
        assert_eq!(c.count_cells(CellType::AccIsa), 14);
        assert_eq!(c.count_cells(CellType::Gdc), 1);
        assert_eq!(c.count_cells(CellType::Tnr), 1);
        assert_eq!(c.memories_of_kind(MemoryKind::Dmem).count(), 4);
    }

    #[test]
    fn test_vector_processor_reaches_every_kind() {
        let c = catalog();
        let vp0 = c.cell_by_name("vp0").unwrap();
        for &kind in MemoryKind::ALL {
            assert!(c.affinity(vp0, kind).is_some(), "vp0 cannot reach {kind}");
        }
        let dmem = c.affinity(vp0, MemoryKind::Dmem).unwrap();
        assert_eq!(c.memory(dmem).unwrap().name, "dmem3");
    }

    #[test]
    fn test_control_processors_have_private_dmem() {
        let c = catalog();
        let sp0 = c.affinity(CellInstanceId::new(0), MemoryKind::Dmem).unwrap();
        let sp1 = c.affinity(CellInstanceId::new(1), MemoryKind::Dmem).unwrap();
        assert_ne!(sp0, sp1);
        assert_eq!(c.memory_capacity(sp0), Some(0x4000));
        assert_eq!(c.affinity(CellInstanceId::new(0), MemoryKind::TransferVmem0), None);
    }

    #[test]
    fn test_output_scalers_have_no_line_buffer() {
        let c = catalog();
        for cell in c.cells_of_type(CellType::AccOsa) {
            assert!(c.affinity(cell, MemoryKind::TransferVmem1).is_some());
            assert_eq!(c.affinity(cell, MemoryKind::LbVmem), None);
        }
    }

    #[test]
    fn test_channels_and_ports() {
        let c = catalog();
        assert_eq!(c.channel_capacity(ChannelKind::DmaExt1Write), Some(43));
        assert_eq!(c.channel_capacity(ChannelKind::DmaIsa), Some(2));
        assert_eq!(c.ports().count(), PortKind::COUNT);
        assert!(c.ports().all(|(_, cap)| cap == 32));
    }
}
