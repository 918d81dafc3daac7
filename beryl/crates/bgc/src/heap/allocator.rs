//! Per-size-class allocator.
//!
//! Each size class owns a list of heap blocks and tracks its free-cell
//! count. Allocation takes the first free cell of the first block with
//! room and grows by a block when every block is full.

use crate::heap::block::HeapBlock;
use crate::heap::block::HEAP_BLOCK_SIZE;
use std::mem;

pub struct Allocator {
    cell_size: usize,
    free_cells: usize,
    blocks: Vec<*mut HeapBlock>,
}

impl Allocator {
    pub fn new(cell_size: usize) -> Self {
        Self {
            cell_size,
            free_cells: 0,
            blocks: Vec::new(),
        }
    }

    pub fn cell_size(&self) -> usize {
        self.cell_size
    }

    pub fn cell_count_per_block(&self) -> usize {
        (HEAP_BLOCK_SIZE - mem::size_of::<HeapBlock>()) / self.cell_size
    }

    pub fn total_cells(&self) -> usize {
        self.blocks
            .iter()
            .map(|block| unsafe { (**block).total_count() })
            .sum()
    }

    pub fn free_cells(&self) -> usize {
        self.free_cells
    }

    /// Percentage of cells currently free; 0 when no blocks exist yet
    pub fn free_cells_percentage(&self) -> usize {
        if self.blocks.is_empty() {
            return 0;
        }
        self.free_cells * 100 / self.total_cells()
    }

    /// Hand out one cell, growing by a block when full
    pub fn allocate(&mut self) -> *mut u8 {
        for block in &self.blocks {
            // Safety: blocks stay valid for the allocator's lifetime.
            let block = unsafe { &mut **block };
            if block.has_free() {
                self.free_cells -= 1;
                return block.next_free();
            }
        }
        let block = self.add_heap_block();
        self.free_cells -= 1;
        unsafe { (*block).next_free() }
    }

    fn add_heap_block(&mut self) -> *mut HeapBlock {
        let block = HeapBlock::create(self.cell_size);
        self.blocks.push(block);
        self.free_cells += unsafe { (*block).total_count() };
        block
    }

    /// Explicitly grow by one block (post-sweep growth policy)
    pub fn grow(&mut self) {
        self.add_heap_block();
    }

    pub fn owns_block(&self, candidate: *mut HeapBlock) -> bool {
        self.blocks.iter().any(|block| *block == candidate)
    }

    pub fn blocks(&self) -> &[*mut HeapBlock] {
        &self.blocks
    }

    /// Account a cell freed during sweep
    pub fn note_freed_cell(&mut self) {
        self.free_cells += 1;
    }
}
