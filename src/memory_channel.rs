use crate::errors::ChannelError;

/// Raw operations on another process's address space.
///
/// Implementations own the process handle and release it on drop. They do
/// not track allocations; [`MemoryChannel`] does that.
pub trait ForeignProcess {
    fn allocate(&mut self, size: usize) -> Result<usize, ChannelError>;
    fn write(&mut self, address: usize, bytes: &[u8]) -> Result<(), ChannelError>;
    fn read(&mut self, address: usize, len: usize) -> Result<Vec<u8>, ChannelError>;
    fn free(&mut self, address: usize) -> Result<(), ChannelError>;
}

/// A region allocated inside the foreign process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StagedBuffer {
    pub address: usize,
    pub size: usize,
}

impl StagedBuffer {
    /// Foreign address `offset` bytes into the region.
    pub fn offset(&self, offset: usize) -> usize {
        self.address + offset
    }

    fn check(&self, offset: usize, len: usize) -> Result<(), ChannelError> {
        if offset.checked_add(len).map_or(true, |end| end > self.size) {
            return Err(ChannelError::TransferFailed {
                address: self.address.wrapping_add(offset),
                expected: len,
                actual: 0,
            });
        }
        Ok(())
    }
}

/// Scoped access to one foreign process.
///
/// Every buffer handed out by [`MemoryChannel::allocate`] is released either
/// by an explicit [`MemoryChannel::free`] or when the channel is closed or
/// dropped, whichever happens first.
pub struct MemoryChannel<P: ForeignProcess> {
    process: P,
    outstanding: Vec<StagedBuffer>,
}

impl<P: ForeignProcess> MemoryChannel<P> {
    pub fn new(process: P) -> Self {
        Self {
            process,
            outstanding: Vec::new(),
        }
    }

    pub fn allocate(&mut self, size: usize) -> Result<StagedBuffer, ChannelError> {
        let address = self.process.allocate(size)?;
        let buffer = StagedBuffer { address, size };
        self.outstanding.push(buffer);
        tracing::trace!("staged foreign buffer {address:#x} ({size} bytes)");
        Ok(buffer)
    }

    pub fn write(
        &mut self,
        buffer: &StagedBuffer,
        offset: usize,
        bytes: &[u8],
    ) -> Result<(), ChannelError> {
        buffer.check(offset, bytes.len())?;
        self.process.write(buffer.offset(offset), bytes)
    }

    pub fn read(
        &mut self,
        buffer: &StagedBuffer,
        offset: usize,
        len: usize,
    ) -> Result<Vec<u8>, ChannelError> {
        buffer.check(offset, len)?;
        let bytes = self.process.read(buffer.offset(offset), len)?;
        if bytes.len() != len {
            return Err(ChannelError::TransferFailed {
                address: buffer.offset(offset),
                expected: len,
                actual: bytes.len(),
            });
        }
        Ok(bytes)
    }

    /// Release `buffer`. Buffers that were already released, or never came
    /// from this channel, are ignored.
    pub fn free(&mut self, buffer: &StagedBuffer) {
        let Some(pos) = self.outstanding.iter().position(|b| b == buffer) else {
            return;
        };
        self.outstanding.swap_remove(pos);
        if let Err(e) = self.process.free(buffer.address) {
            tracing::warn!("failed to release foreign buffer {:#x}: {e}", buffer.address);
        }
    }

    pub fn outstanding(&self) -> usize {
        self.outstanding.len()
    }

    /// Free everything still outstanding and close the process handle.
    pub fn close(self) {
        drop(self);
    }
}

impl<P: ForeignProcess> Drop for MemoryChannel<P> {
    // The process handle itself is closed when `process` drops right after.
    fn drop(&mut self) {
        for buffer in std::mem::take(&mut self.outstanding) {
            if let Err(e) = self.process.free(buffer.address) {
                tracing::warn!("failed to release foreign buffer {:#x}: {e}", buffer.address);
            }
        }
    }
}
