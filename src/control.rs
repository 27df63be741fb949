use crate::errors::ChannelError;
use crate::locator::ForeignControlHandle;
use crate::memory_channel::ForeignProcess;
use crate::wire::PointerWidth;

/// Message protocol of the shell's icon list control.
///
/// Addresses passed here are foreign addresses previously staged through a
/// [`crate::memory_channel::MemoryChannel`] for the same process.
pub trait IconListView {
    fn item_count(&self) -> usize;
    /// Ask the control to write the item's position into `slot`.
    fn request_position(&self, index: usize, slot: usize) -> bool;
    /// Ask the control to fill the text buffer named by the descriptor at
    /// `descriptor`. Returns the number of UTF-16 units copied.
    fn request_text(&self, index: usize, descriptor: usize) -> usize;
    /// Move the item to the packed position.
    fn set_position(&self, index: usize, packed: isize) -> bool;
}

/// Access to the process that hosts the desktop icons.
pub trait Shell {
    type Process: ForeignProcess;
    type View: IconListView;

    fn locate(&self) -> Option<ForeignControlHandle>;

    /// `None` when the handle no longer names a live control.
    fn attach(&self, handle: &ForeignControlHandle) -> Option<Self::View>;

    fn open_process(&self, process_id: u32) -> Result<Self::Process, ChannelError>;

    fn pointer_width(&self) -> PointerWidth {
        PointerWidth::host()
    }
}
