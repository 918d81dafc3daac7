//! The process heap: size-class segregated allocation plus mark-sweep
//! collection.
//!
//! The heap is a process-wide singleton behind a mutex; the mutator
//! contract is exclusive single-threaded access, so the lock serializes
//! accidents rather than enabling parallel mutators. Collection may run at
//! any allocation: when a size class's occupancy passes the configured
//! threshold, a collection happens before the allocation is served, and if
//! the class is still tight after the sweep it grows by one block.

mod allocator;
mod block;

pub use allocator::Allocator;
pub use block::{HeapBlock, HEAP_BLOCK_MASK, HEAP_BLOCK_SIZE, HEAP_CELL_COUNT_MAX};

use std::mem;
use std::ptr;

use beryl_util::FxHashSet;
use lazy_static::lazy_static;
use log::debug;
use parking_lot::Mutex;

use crate::cell::Cell;
use crate::config::GcConfig;
use crate::globals;
use crate::marker::{roots, MarkingVisitor};
use crate::object::{Object, ObjectRef};

/// The size classes, smallest first
pub const CELL_SIZES: [usize; 7] = [16, 32, 64, 128, 256, 512, 1024];

lazy_static! {
    static ref THE_HEAP: Mutex<Heap> = Mutex::new(Heap::new());
}

/// Aggregate numbers for tests and logging
#[derive(Clone, Copy, Debug, Default)]
pub struct HeapStats {
    pub total_cells: usize,
    pub free_cells: usize,
    pub collections: usize,
    pub cells_swept: usize,
}

pub struct Heap {
    allocators: Vec<Allocator>,
    bottom_of_stack: usize,
    config: GcConfig,
    collections: usize,
    cells_swept: usize,
    /// Cells handed out raw; the sweeper must not treat them as objects
    raw_cells: FxHashSet<usize>,
}

// Raw block pointers keep Heap from deriving Send; the singleton is only
// touched under the mutex and the mutator is single-threaded by contract.
unsafe impl Send for Heap {}

impl Heap {
    fn new() -> Self {
        Self {
            allocators: CELL_SIZES.iter().map(|size| Allocator::new(*size)).collect(),
            bottom_of_stack: 0,
            config: GcConfig::default(),
            collections: 0,
            cells_swept: 0,
            raw_cells: FxHashSet::default(),
        }
    }

    fn find_allocator(&mut self, size: usize) -> &mut Allocator {
        for allocator in &mut self.allocators {
            if allocator.cell_size() >= size {
                return allocator;
            }
        }
        panic!("allocation of {} bytes exceeds the largest cell size", size);
    }

    fn allocator_index(&self, size: usize) -> usize {
        CELL_SIZES
            .iter()
            .position(|cell_size| *cell_size >= size)
            .unwrap_or_else(|| {
                panic!("allocation of {} bytes exceeds the largest cell size", size)
            })
    }

    /// Serve one cell of at least `size` bytes
    fn allocate_raw(&mut self, size: usize) -> *mut u8 {
        let index = self.allocator_index(size);
        let threshold = 100usize.saturating_sub(self.config.collect_threshold_pct);

        let should_collect = self.config.enabled
            && (self.config.stress || {
                let allocator = &self.allocators[index];
                allocator.total_cells() > 0 && allocator.free_cells_percentage() < threshold
            });
        if should_collect {
            self.collect_now();
            // still tight after the sweep: give the class another block
            let allocator = &mut self.allocators[index];
            if allocator.free_cells_percentage() < threshold {
                allocator.grow();
            }
        }

        self.allocators[index].allocate()
    }

    /// Run one full mark-sweep cycle
    fn collect_now(&mut self) {
        if !self.config.enabled {
            return;
        }
        self.collections += 1;

        let mut visitor = MarkingVisitor::new();
        roots::visit_registered(&mut visitor);
        globals::visit(&mut visitor);
        self.scan_stack(&mut visitor);
        visitor.visit_all();

        let swept = self.sweep();
        self.cells_swept += swept;
        debug!(
            "gc cycle {}: swept {} cells ({} free / {} total)",
            self.collections,
            swept,
            self.allocators.iter().map(Allocator::free_cells).sum::<usize>(),
            self.allocators.iter().map(Allocator::total_cells).sum::<usize>(),
        );
    }

    /// Conservatively scan the stack between bottom-of-stack and here
    ///
    /// Every aligned word in the range is treated as a candidate pointer; a
    /// candidate is retained iff masking it to block alignment yields a
    /// block this heap owns and the word lands in an in-use cell.
    fn scan_stack(&self, visitor: &mut MarkingVisitor) {
        if self.bottom_of_stack == 0 {
            return;
        }
        let anchor: usize = 0;
        let here = &anchor as *const usize as usize;
        let (low, high) = if here < self.bottom_of_stack {
            (here, self.bottom_of_stack)
        } else {
            (self.bottom_of_stack, here)
        };

        let mut addr = low;
        while addr + mem::size_of::<usize>() <= high {
            // Safety: the range lies within this thread's stack; reading
            // arbitrary words from it is the conservative-scanning bargain.
            let word = unsafe { ptr::read_volatile(addr as *const usize) };
            if let Some(object) = self.candidate_cell(word) {
                visitor.visit_object(object);
            }
            addr += mem::size_of::<usize>();
        }
    }

    /// Resolve a word to an in-use cell of this heap, if it is one
    fn candidate_cell(&self, word: usize) -> Option<ObjectRef> {
        // inline-integer tag bit rules the word out immediately
        if word & 1 != 0 {
            return None;
        }
        let block = HeapBlock::from_cell_ptr(word);
        if block.is_null() {
            return None;
        }
        let owned = self
            .allocators
            .iter()
            .any(|allocator| allocator.owns_block(block));
        if !owned {
            return None;
        }
        // Safety: ownership established above; the block header is live.
        let base = unsafe { (*block).base_of_cell_containing(word) }?;
        // raw cells hold no object; they are pinned but never marked
        if self.raw_cells.contains(&(base as usize)) {
            return None;
        }
        unsafe { ObjectRef::from_ptr(base as *mut Object) }
    }

    /// Free every in-use, unmarked cell; clear marks on survivors
    ///
    /// Finalization is unordered: destructors release only their own native
    /// resources and never dereference other cells.
    fn sweep(&mut self) -> usize {
        let mut swept = 0;
        for allocator in &mut self.allocators {
            let blocks: Vec<*mut HeapBlock> = allocator.blocks().to_vec();
            for block in blocks {
                // Safety: blocks live as long as the allocator.
                let block = unsafe { &mut *block };
                for index in 0..block.total_count() {
                    if !block.cell_in_use(index) {
                        continue;
                    }
                    let cell_addr = block.cell_ptr(index) as usize;
                    if self.raw_cells.contains(&cell_addr) {
                        continue;
                    }
                    let object = cell_addr as *mut Object;
                    // Safety: in-use cells always hold initialized objects.
                    unsafe {
                        if (*object).is_visited() {
                            (*object).clear_mark();
                        } else {
                            ptr::drop_in_place(object);
                            block.free_cell(index);
                            allocator.note_freed_cell();
                            swept += 1;
                        }
                    }
                }
            }
        }
        swept
    }

    fn stats(&self) -> HeapStats {
        HeapStats {
            total_cells: self.allocators.iter().map(Allocator::total_cells).sum(),
            free_cells: self.allocators.iter().map(Allocator::free_cells).sum(),
            collections: self.collections,
            cells_swept: self.cells_swept,
        }
    }
}

// ----------------------------------------------------------------------------
// Public surface (the singleton API)
// ----------------------------------------------------------------------------

/// Allocate a raw cell of at least `size` bytes
///
/// The pointer satisfies the requested size rounded up to the nearest size
/// class. Collection may run before the allocation is served. A raw cell
/// is untyped from the collector's point of view: it is never scanned,
/// never finalized, and stays live for the process duration. Object
/// construction goes through [`allocate_object`] instead.
pub fn allocate(size: usize) -> *mut u8 {
    let mut heap = THE_HEAP.lock();
    let cell = heap.allocate_raw(size);
    heap.raw_cells.insert(cell as usize);
    cell
}

/// Allocate a cell and move `object` into it
pub fn allocate_object(object: Object) -> ObjectRef {
    let mut heap = THE_HEAP.lock();
    let ptr = heap.allocate_raw(mem::size_of::<Object>()) as *mut Object;
    // Safety: the cell is fresh, sized for an Object, and 16-aligned.
    unsafe {
        ptr.write(object);
        ObjectRef::from_ptr(ptr).expect("heap cells are non-null")
    }
}

/// Run a collection now
pub fn collect() {
    THE_HEAP.lock().collect_now();
}

/// Install the stack floor for conservative scanning
///
/// Called once at program start with the address of a local in the
/// outermost frame. Until it is set, collection uses only explicit roots.
pub fn set_bottom_of_stack(ptr: *const u8) {
    THE_HEAP.lock().bottom_of_stack = ptr as usize;
}

/// Re-enable collection
pub fn gc_enable() {
    THE_HEAP.lock().config.enabled = true;
}

/// Suppress collection (measurement, critical sections)
pub fn gc_disable() {
    THE_HEAP.lock().config.enabled = false;
}

/// Is collection currently enabled?
pub fn gc_enabled() -> bool {
    THE_HEAP.lock().config.enabled
}

/// Replace the collector configuration
pub fn configure(config: GcConfig) {
    THE_HEAP.lock().config = config;
}

/// Aggregate statistics
pub fn stats() -> HeapStats {
    THE_HEAP.lock().stats()
}

/// Does `addr` point at an in-use heap cell?
pub fn is_live_cell(addr: usize) -> bool {
    THE_HEAP.lock().candidate_cell(addr).is_some()
}

/// The owning block address for a cell pointer (the mask trick)
pub fn owning_block_addr(addr: usize) -> usize {
    HeapBlock::from_cell_ptr(addr) as usize
}
