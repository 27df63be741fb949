use crate::control::{IconListView, Shell};
use crate::errors::{ChannelError, LayoutError};
use crate::layout::{LayoutRecord, LayoutSet};
use crate::locator::ForeignControlHandle;
use crate::memory_channel::{ForeignProcess, MemoryChannel, StagedBuffer};
use crate::wire::{
    decode_point, decode_wide_text, descriptor_size, PointerWidth, TextRequest,
    DEFAULT_TEXT_CAPACITY, MAX_TEXT_CAPACITY, POINT_SIZE,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanOptions {
    /// Capacity of the staged text buffer in UTF-16 units. Clamped to
    /// `1..=MAX_TEXT_CAPACITY` when staged.
    pub text_capacity: usize,
    /// Leave items whose label is empty or undecodable out of the scan.
    pub skip_empty_names: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            text_capacity: DEFAULT_TEXT_CAPACITY,
            skip_empty_names: true,
        }
    }
}

/// Descriptor followed by its text buffer, staged as one allocation.
pub(crate) struct TextStage {
    buffer: StagedBuffer,
    width: PointerWidth,
    text_offset: usize,
    capacity: usize,
}

impl TextStage {
    pub(crate) fn new<P: ForeignProcess>(
        channel: &mut MemoryChannel<P>,
        width: PointerWidth,
        capacity: usize,
    ) -> Result<Self, ChannelError> {
        let capacity = capacity.clamp(1, MAX_TEXT_CAPACITY);
        let text_offset = descriptor_size(width);
        let size = capacity
            .checked_mul(2)
            .and_then(|bytes| bytes.checked_add(text_offset))
            .ok_or(ChannelError::AllocationFailed { size: usize::MAX })?;
        let buffer = channel.allocate(size)?;
        Ok(Self {
            buffer,
            width,
            text_offset,
            capacity,
        })
    }

    /// Fetch the display text of item `index`. Text that is not valid UTF-16
    /// comes back empty.
    pub(crate) fn fetch<P: ForeignProcess, V: IconListView>(
        &self,
        channel: &mut MemoryChannel<P>,
        view: &V,
        index: usize,
    ) -> Result<String, ChannelError> {
        let request = TextRequest::new(
            index as i32,
            self.buffer.offset(self.text_offset) as u64,
            self.capacity as i32,
        );
        channel.write(&self.buffer, 0, &request.encode(self.width))?;
        // Clear the previous item's text in case the control copies nothing.
        channel.write(&self.buffer, self.text_offset, &[0, 0])?;
        view.request_text(index, self.buffer.address);
        let bytes = channel.read(&self.buffer, self.text_offset, self.capacity * 2)?;
        Ok(decode_wide_text(&bytes).unwrap_or_else(|e| {
            tracing::debug!("item {index}: {e}");
            String::new()
        }))
    }

    pub(crate) fn release<P: ForeignProcess>(self, channel: &mut MemoryChannel<P>) {
        channel.free(&self.buffer);
    }
}

#[derive(Debug, Default)]
struct ScanStats {
    captured: usize,
    unnamed: usize,
    position_failures: usize,
    text_failures: usize,
}

/// Capture the name and position of every icon in the control.
///
/// Never fails: a dead handle or an unopenable process yields an empty set.
/// Use [`try_enumerate`] to find out why a set came back empty.
pub fn enumerate<S: Shell>(
    shell: &S,
    handle: &ForeignControlHandle,
    options: &ScanOptions,
) -> LayoutSet {
    try_enumerate(shell, handle, options).unwrap_or_else(|e| {
        tracing::warn!("icon scan aborted: {e}");
        LayoutSet::new()
    })
}

pub fn try_enumerate<S: Shell>(
    shell: &S,
    handle: &ForeignControlHandle,
    options: &ScanOptions,
) -> Result<LayoutSet, LayoutError> {
    let view = shell.attach(handle).ok_or(LayoutError::ControlUnavailable)?;
    let count = view.item_count();
    tracing::debug!("icon list reports {count} items");
    if count == 0 {
        return Ok(LayoutSet::new());
    }

    let process = shell
        .open_process(handle.process_id)
        .map_err(LayoutError::ProcessOpenFailed)?;
    let mut channel = MemoryChannel::new(process);

    let point = channel
        .allocate(POINT_SIZE)
        .map_err(LayoutError::StagingFailed)?;
    let text = TextStage::new(&mut channel, shell.pointer_width(), options.text_capacity)
        .map_err(LayoutError::StagingFailed)?;

    let mut set = LayoutSet::new();
    let mut stats = ScanStats::default();
    for index in 0..count {
        let (x, y) = read_position(&mut channel, &view, &point, index).unwrap_or_else(|e| {
            tracing::debug!("item {index}: position unavailable: {e}");
            stats.position_failures += 1;
            (0, 0)
        });
        let name = text.fetch(&mut channel, &view, index).unwrap_or_else(|e| {
            tracing::debug!("item {index}: text unavailable: {e}");
            stats.text_failures += 1;
            String::new()
        });
        if name.is_empty() {
            stats.unnamed += 1;
            if options.skip_empty_names {
                continue;
            }
        }
        tracing::trace!("icon {name} at ({x}, {y})");
        set.push(LayoutRecord::new(name, x, y));
        stats.captured += 1;
    }

    text.release(&mut channel);
    channel.free(&point);
    channel.close();

    tracing::info!(
        "scanned {count} desktop items: {} captured, {} unnamed, {} position failures, {} text failures",
        stats.captured,
        stats.unnamed,
        stats.position_failures,
        stats.text_failures
    );
    Ok(set)
}

fn read_position<P: ForeignProcess, V: IconListView>(
    channel: &mut MemoryChannel<P>,
    view: &V,
    slot: &StagedBuffer,
    index: usize,
) -> Result<(i32, i32), ChannelError> {
    if !view.request_position(index, slot.address) {
        tracing::debug!("item {index}: control rejected position request");
    }
    let bytes = channel.read(slot, 0, POINT_SIZE)?;
    decode_point(&bytes).ok_or(ChannelError::TransferFailed {
        address: slot.address,
        expected: POINT_SIZE,
        actual: bytes.len(),
    })
}

/// Display text of the first `count` items, index-aligned with the control.
/// `None` marks an item whose text could not be transferred.
pub fn fetch_names<P: ForeignProcess, V: IconListView>(
    channel: &mut MemoryChannel<P>,
    view: &V,
    count: usize,
    width: PointerWidth,
    options: &ScanOptions,
) -> Result<Vec<Option<String>>, ChannelError> {
    let text = TextStage::new(channel, width, options.text_capacity)?;
    let names = (0..count)
        .map(|index| match text.fetch(channel, view, index) {
            Ok(name) => Some(name),
            Err(e) => {
                tracing::debug!("item {index}: text unavailable: {e}");
                None
            }
        })
        .collect();
    text.release(channel);
    Ok(names)
}
