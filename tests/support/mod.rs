#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{BTreeMap, HashSet};
use std::rc::Rc;

use icon_layout::control::{IconListView, Shell};
use icon_layout::errors::ChannelError;
use icon_layout::locator::ForeignControlHandle;
use icon_layout::memory_channel::ForeignProcess;
use icon_layout::wire::{
    descriptor_size, encode_point, unpack_position, PointerWidth, TextRequest, LVIF_TEXT,
};

pub const LIST_WINDOW: isize = 0x0001_0010;
pub const SHELL_PID: u32 = 4242;

pub fn handle() -> ForeignControlHandle {
    ForeignControlHandle {
        window: LIST_WINDOW,
        process_id: SHELL_PID,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeItem {
    pub name: String,
    /// Label units handed out instead of `name`, for labels that are not
    /// valid UTF-16.
    pub raw_label: Option<Vec<u16>>,
    pub x: i32,
    pub y: i32,
}

pub fn item(name: &str, x: i32, y: i32) -> FakeItem {
    FakeItem {
        name: name.to_string(),
        raw_label: None,
        x,
        y,
    }
}

pub fn raw_item(units: &[u16], x: i32, y: i32) -> FakeItem {
    FakeItem {
        name: String::from_utf16_lossy(units),
        raw_label: Some(units.to_vec()),
        x,
        y,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Request {
    Position(usize),
    Text(usize),
}

#[derive(Default)]
pub struct Faults {
    pub unlocatable: bool,
    pub window_gone: bool,
    pub open_error: Option<ChannelError>,
    /// Allocation attempts (0-based, per shell) that fail.
    pub failing_allocations: HashSet<usize>,
    pub failing_position_reads: HashSet<usize>,
    pub failing_text_reads: HashSet<usize>,
    pub reject_moves: bool,
}

/// Simulated shell process: an address space plus a list view that answers
/// the icon list messages by reading and writing that address space.
pub struct Desktop {
    pub items: Vec<FakeItem>,
    pub faults: Faults,
    pub width: PointerWidth,
    memory: BTreeMap<usize, Vec<u8>>,
    next_address: usize,
    pub allocation_attempts: usize,
    pub allocations: usize,
    pub frees: usize,
    pub opens: usize,
    pub closes: usize,
    pub moves: Vec<(usize, isize)>,
    pub text_requests: usize,
    pub count_queries: usize,
    last_request: Option<Request>,
}

impl Desktop {
    fn region(&mut self, address: usize, len: usize) -> Option<&mut [u8]> {
        let (base, bytes) = self.memory.range_mut(..=address).next_back()?;
        let start = address - *base;
        let end = start.checked_add(len)?;
        if end > bytes.len() {
            return None;
        }
        Some(&mut bytes[start..end])
    }

    pub fn live_allocations(&self) -> usize {
        self.memory.len()
    }
}

#[derive(Clone)]
pub struct FakeShell {
    pub state: Rc<RefCell<Desktop>>,
}

impl FakeShell {
    pub fn new(items: Vec<FakeItem>) -> Self {
        Self::with_width(items, PointerWidth::Bits64)
    }

    pub fn with_width(items: Vec<FakeItem>, width: PointerWidth) -> Self {
        Self {
            state: Rc::new(RefCell::new(Desktop {
                items,
                faults: Faults::default(),
                width,
                memory: BTreeMap::new(),
                next_address: match width {
                    PointerWidth::Bits32 => 0x0040_0000,
                    PointerWidth::Bits64 => 0x7ff0_0000_0000,
                },
                allocation_attempts: 0,
                allocations: 0,
                frees: 0,
                opens: 0,
                closes: 0,
                moves: Vec::new(),
                text_requests: 0,
                count_queries: 0,
                last_request: None,
            })),
        }
    }

    pub fn faults(&self) -> std::cell::RefMut<'_, Faults> {
        std::cell::RefMut::map(self.state.borrow_mut(), |d| &mut d.faults)
    }

    pub fn items(&self) -> Vec<FakeItem> {
        self.state.borrow().items.clone()
    }

    pub fn positions(&self) -> Vec<(String, i32, i32)> {
        self.items()
            .into_iter()
            .map(|i| (i.name, i.x, i.y))
            .collect()
    }
}

pub struct FakeProcess {
    state: Rc<RefCell<Desktop>>,
}

impl ForeignProcess for FakeProcess {
    fn allocate(&mut self, size: usize) -> Result<usize, ChannelError> {
        let mut d = self.state.borrow_mut();
        let attempt = d.allocation_attempts;
        d.allocation_attempts += 1;
        if d.faults.failing_allocations.contains(&attempt) {
            return Err(ChannelError::AllocationFailed { size });
        }
        let address = d.next_address;
        d.next_address += (size + 0xFFF) & !0xFFF;
        d.memory.insert(address, vec![0xCD; size]);
        d.allocations += 1;
        Ok(address)
    }

    fn write(&mut self, address: usize, bytes: &[u8]) -> Result<(), ChannelError> {
        let mut d = self.state.borrow_mut();
        let region = d.region(address, bytes.len()).ok_or(ChannelError::TransferFailed {
            address,
            expected: bytes.len(),
            actual: 0,
        })?;
        region.copy_from_slice(bytes);
        Ok(())
    }

    fn read(&mut self, address: usize, len: usize) -> Result<Vec<u8>, ChannelError> {
        let mut d = self.state.borrow_mut();
        let failing = match d.last_request {
            Some(Request::Position(i)) => d.faults.failing_position_reads.contains(&i),
            Some(Request::Text(i)) => d.faults.failing_text_reads.contains(&i),
            None => false,
        };
        if failing {
            return Err(ChannelError::TransferFailed {
                address,
                expected: len,
                actual: 0,
            });
        }
        let region = d.region(address, len).ok_or(ChannelError::TransferFailed {
            address,
            expected: len,
            actual: 0,
        })?;
        Ok(region.to_vec())
    }

    fn free(&mut self, address: usize) -> Result<(), ChannelError> {
        let mut d = self.state.borrow_mut();
        if d.memory.remove(&address).is_none() {
            return Err(ChannelError::ReleaseFailed { address });
        }
        d.frees += 1;
        Ok(())
    }
}

impl Drop for FakeProcess {
    fn drop(&mut self) {
        self.state.borrow_mut().closes += 1;
    }
}

pub struct FakeView {
    state: Rc<RefCell<Desktop>>,
}

impl IconListView for FakeView {
    fn item_count(&self) -> usize {
        let mut d = self.state.borrow_mut();
        d.count_queries += 1;
        d.items.len()
    }

    fn request_position(&self, index: usize, slot: usize) -> bool {
        let mut d = self.state.borrow_mut();
        d.last_request = Some(Request::Position(index));
        let Some(item) = d.items.get(index).cloned() else {
            return false;
        };
        match d.region(slot, 8) {
            Some(region) => {
                region.copy_from_slice(&encode_point(item.x, item.y));
                true
            }
            None => false,
        }
    }

    fn request_text(&self, index: usize, descriptor: usize) -> usize {
        let mut d = self.state.borrow_mut();
        d.last_request = Some(Request::Text(index));
        d.text_requests += 1;
        let width = d.width;
        let Some(raw) = d.region(descriptor, descriptor_size(width)).map(|r| r.to_vec()) else {
            return 0;
        };
        let Some(request) = TextRequest::decode(&raw, width) else {
            return 0;
        };
        assert_eq!(request.mask & LVIF_TEXT, LVIF_TEXT);
        assert_eq!(request.item as usize, index);
        assert_eq!(request.sub_item, 0);
        let Some(item) = d.items.get(index).cloned() else {
            return 0;
        };
        let capacity = request.text_capacity.max(0) as usize;
        if capacity == 0 {
            return 0;
        }
        let label: Vec<u16> = match &item.raw_label {
            Some(units) => units.clone(),
            None => item.name.encode_utf16().collect(),
        };
        let mut units: Vec<u16> = label.into_iter().take(capacity - 1).collect();
        let copied = units.len();
        units.push(0);
        let bytes: Vec<u8> = units.iter().flat_map(|u| u.to_le_bytes()).collect();
        match d.region(request.text_ptr as usize, bytes.len()) {
            Some(region) => {
                region.copy_from_slice(&bytes);
                copied
            }
            None => 0,
        }
    }

    fn set_position(&self, index: usize, packed: isize) -> bool {
        let mut d = self.state.borrow_mut();
        d.moves.push((index, packed));
        if d.faults.reject_moves {
            return false;
        }
        let (x, y) = unpack_position(packed);
        match d.items.get_mut(index) {
            Some(item) => {
                item.x = x;
                item.y = y;
                true
            }
            None => false,
        }
    }
}

impl Shell for FakeShell {
    type Process = FakeProcess;
    type View = FakeView;

    fn locate(&self) -> Option<ForeignControlHandle> {
        if self.state.borrow().faults.unlocatable {
            None
        } else {
            Some(handle())
        }
    }

    fn attach(&self, handle: &ForeignControlHandle) -> Option<FakeView> {
        if handle.window != LIST_WINDOW || self.state.borrow().faults.window_gone {
            return None;
        }
        Some(FakeView {
            state: self.state.clone(),
        })
    }

    fn open_process(&self, process_id: u32) -> Result<FakeProcess, ChannelError> {
        let mut d = self.state.borrow_mut();
        if let Some(err) = d.faults.open_error.clone() {
            return Err(err);
        }
        if process_id != SHELL_PID {
            return Err(ChannelError::ProcessNotFound { pid: process_id });
        }
        d.opens += 1;
        Ok(FakeProcess {
            state: self.state.clone(),
        })
    }

    fn pointer_width(&self) -> PointerWidth {
        self.state.borrow().width
    }
}
