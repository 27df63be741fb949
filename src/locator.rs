/// The desktop's icon list control plus the id of the process that owns it.
///
/// Only valid for the pass it was located for; the shell may rebuild its
/// window tree at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForeignControlHandle {
    pub window: isize,
    pub process_id: u32,
}

/// Find the desktop icon list.
///
/// The usual path is `Progman` -> `SHELLDLL_DefView` -> `SysListView32`
/// ("FolderView"). With a wallpaper slideshow running, the DefView is
/// reparented under one of the top-level `WorkerW` windows instead.
#[cfg(windows)]
pub fn locate() -> Option<ForeignControlHandle> {
    use windows::core::{w, PCWSTR};
    use windows::Win32::Foundation::HWND;
    use windows::Win32::UI::WindowsAndMessaging::{
        FindWindowExW, FindWindowW, GetWindowThreadProcessId,
    };

    fn found(result: windows::core::Result<HWND>) -> Option<HWND> {
        result.ok().filter(|hwnd| !hwnd.0.is_null())
    }

    fn def_view_under(parent: HWND) -> Option<HWND> {
        unsafe {
            found(FindWindowExW(
                parent,
                HWND::default(),
                w!("SHELLDLL_DefView"),
                PCWSTR::null(),
            ))
        }
    }

    fn def_view_under_worker() -> Option<HWND> {
        let mut worker = HWND::default();
        loop {
            worker = unsafe {
                found(FindWindowExW(HWND::default(), worker, w!("WorkerW"), PCWSTR::null()))
            }?;
            if let Some(def_view) = def_view_under(worker) {
                tracing::debug!("desktop view found under WorkerW {:?}", worker);
                return Some(def_view);
            }
        }
    }

    let Some(progman) = (unsafe { found(FindWindowW(w!("Progman"), w!("Program Manager"))) })
    else {
        tracing::debug!("Progman window not found");
        return None;
    };

    let Some(def_view) = def_view_under(progman).or_else(def_view_under_worker) else {
        tracing::debug!("SHELLDLL_DefView window not found");
        return None;
    };

    let Some(list) = (unsafe {
        found(FindWindowExW(
            def_view,
            HWND::default(),
            w!("SysListView32"),
            w!("FolderView"),
        ))
    }) else {
        tracing::debug!("SysListView32 window not found");
        return None;
    };

    let mut pid = 0u32;
    unsafe {
        let _ = GetWindowThreadProcessId(list, Some(&mut pid));
    }
    if pid == 0 {
        tracing::debug!("icon list {:?} has no owning process", list);
        return None;
    }
    Some(ForeignControlHandle {
        window: list.0 as isize,
        process_id: pid,
    })
}

#[cfg(not(windows))]
pub fn locate() -> Option<ForeignControlHandle> {
    None
}
