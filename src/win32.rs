use std::ffi::c_void;

use windows::Win32::Foundation::{
    CloseHandle, ERROR_ACCESS_DENIED, ERROR_INVALID_PARAMETER, HANDLE, HWND, LPARAM, WPARAM,
};
use windows::Win32::System::Diagnostics::Debug::{ReadProcessMemory, WriteProcessMemory};
use windows::Win32::System::Memory::{
    VirtualAllocEx, VirtualFreeEx, MEM_COMMIT, MEM_RELEASE, MEM_RESERVE, PAGE_READWRITE,
};
use windows::Win32::System::Threading::{
    OpenProcess, PROCESS_VM_OPERATION, PROCESS_VM_READ, PROCESS_VM_WRITE,
};
use windows::Win32::UI::WindowsAndMessaging::{IsWindow, SendMessageW};

use crate::control::{IconListView, Shell};
use crate::errors::ChannelError;
use crate::locator::{self, ForeignControlHandle};
use crate::memory_channel::ForeignProcess;
use crate::wire::{LVM_GETITEMCOUNT, LVM_GETITEMPOSITION, LVM_GETITEMTEXTW, LVM_SETITEMPOSITION};

/// A process opened for virtual memory operations. The handle is closed on
/// drop.
pub struct Win32Process {
    handle: HANDLE,
    pid: u32,
}

impl Win32Process {
    pub fn open(pid: u32) -> Result<Self, ChannelError> {
        let access = PROCESS_VM_OPERATION | PROCESS_VM_READ | PROCESS_VM_WRITE;
        match unsafe { OpenProcess(access, false, pid) } {
            Ok(handle) => {
                tracing::debug!("opened process {pid}");
                Ok(Self { handle, pid })
            }
            Err(e) if e.code() == ERROR_ACCESS_DENIED.to_hresult() => {
                Err(ChannelError::AccessDenied { pid })
            }
            Err(e) if e.code() == ERROR_INVALID_PARAMETER.to_hresult() => {
                Err(ChannelError::ProcessNotFound { pid })
            }
            Err(e) => Err(ChannelError::OpenFailed {
                pid,
                reason: e.to_string(),
            }),
        }
    }
}

impl ForeignProcess for Win32Process {
    fn allocate(&mut self, size: usize) -> Result<usize, ChannelError> {
        let ptr = unsafe {
            VirtualAllocEx(
                self.handle,
                None,
                size,
                MEM_COMMIT | MEM_RESERVE,
                PAGE_READWRITE,
            )
        };
        if ptr.is_null() {
            return Err(ChannelError::AllocationFailed { size });
        }
        Ok(ptr as usize)
    }

    fn write(&mut self, address: usize, bytes: &[u8]) -> Result<(), ChannelError> {
        let mut written = 0usize;
        let result = unsafe {
            WriteProcessMemory(
                self.handle,
                address as *const c_void,
                bytes.as_ptr() as *const c_void,
                bytes.len(),
                Some(&mut written),
            )
        };
        if result.is_err() || written != bytes.len() {
            return Err(ChannelError::TransferFailed {
                address,
                expected: bytes.len(),
                actual: written,
            });
        }
        Ok(())
    }

    fn read(&mut self, address: usize, len: usize) -> Result<Vec<u8>, ChannelError> {
        let mut buffer = vec![0u8; len];
        let mut read = 0usize;
        let result = unsafe {
            ReadProcessMemory(
                self.handle,
                address as *const c_void,
                buffer.as_mut_ptr() as *mut c_void,
                len,
                Some(&mut read),
            )
        };
        if result.is_err() || read != len {
            return Err(ChannelError::TransferFailed {
                address,
                expected: len,
                actual: read,
            });
        }
        Ok(buffer)
    }

    fn free(&mut self, address: usize) -> Result<(), ChannelError> {
        unsafe { VirtualFreeEx(self.handle, address as *mut c_void, 0, MEM_RELEASE) }
            .map_err(|_| ChannelError::ReleaseFailed { address })
    }
}

impl Drop for Win32Process {
    fn drop(&mut self) {
        if let Err(e) = unsafe { CloseHandle(self.handle) } {
            tracing::warn!("failed to close process {} handle: {e}", self.pid);
        }
    }
}

/// `SysListView32` driven through `SendMessageW`.
pub struct Win32ListView {
    hwnd: HWND,
}

impl Win32ListView {
    fn send(&self, msg: u32, wparam: usize, lparam: isize) -> isize {
        unsafe { SendMessageW(self.hwnd, msg, WPARAM(wparam), LPARAM(lparam)).0 }
    }
}

impl IconListView for Win32ListView {
    fn item_count(&self) -> usize {
        self.send(LVM_GETITEMCOUNT, 0, 0).max(0) as usize
    }

    fn request_position(&self, index: usize, slot: usize) -> bool {
        self.send(LVM_GETITEMPOSITION, index, slot as isize) != 0
    }

    fn request_text(&self, index: usize, descriptor: usize) -> usize {
        self.send(LVM_GETITEMTEXTW, index, descriptor as isize).max(0) as usize
    }

    fn set_position(&self, index: usize, packed: isize) -> bool {
        self.send(LVM_SETITEMPOSITION, index, packed) != 0
    }
}

/// The live Windows shell.
#[derive(Debug, Clone, Copy, Default)]
pub struct Win32Shell;

impl Shell for Win32Shell {
    type Process = Win32Process;
    type View = Win32ListView;

    fn locate(&self) -> Option<ForeignControlHandle> {
        locator::locate()
    }

    fn attach(&self, handle: &ForeignControlHandle) -> Option<Win32ListView> {
        let hwnd = HWND(handle.window as *mut c_void);
        if unsafe { IsWindow(hwnd) }.as_bool() {
            Some(Win32ListView { hwnd })
        } else {
            tracing::debug!("icon list window {:#x} is gone", handle.window);
            None
        }
    }

    fn open_process(&self, process_id: u32) -> Result<Win32Process, ChannelError> {
        Win32Process::open(process_id)
    }
}
