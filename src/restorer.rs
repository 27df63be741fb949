use crate::control::{IconListView, Shell};
use crate::enumerator::{fetch_names, ScanOptions};
use crate::errors::LayoutError;
use crate::layout::LayoutSet;
use crate::locator::ForeignControlHandle;
use crate::memory_channel::MemoryChannel;
use crate::wire::{fits_packed, pack_position};

/// Per-pass counts for a restore that reached the control.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RestoreSummary {
    /// Items the control reported.
    pub live_items: usize,
    /// Live items whose name matched a saved record; each got a move request.
    pub attempted: usize,
    /// Move requests the control accepted.
    pub repositioned: usize,
    /// Named live items with no saved record.
    pub unmatched: usize,
    /// Live items whose name could not be read.
    pub unreadable: usize,
    /// Moves whose coordinates did not fit the 16-bit encoding.
    pub truncated: usize,
}

impl std::fmt::Display for RestoreSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "restored {} of {} matched icons ({} on the desktop)",
            self.repositioned, self.attempted, self.live_items
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoreOutcome {
    /// Nothing was sent: the control or its process was unavailable.
    TotalFailure(LayoutError),
    /// The pass ran; individual items may still have been skipped.
    PartialSuccess(RestoreSummary),
}

impl RestoreOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RestoreOutcome::PartialSuccess(_))
    }

    pub fn summary(&self) -> Option<&RestoreSummary> {
        match self {
            RestoreOutcome::PartialSuccess(summary) => Some(summary),
            RestoreOutcome::TotalFailure(_) => None,
        }
    }
}

impl std::fmt::Display for RestoreOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RestoreOutcome::TotalFailure(e) => write!(f, "restore failed: {e}"),
            RestoreOutcome::PartialSuccess(summary) => summary.fmt(f),
        }
    }
}

/// Move live icons back to the positions in `saved`, matching by name
/// without regard to case. Live icons with no saved record stay put.
///
/// If several saved records share a name, the last one is used.
pub fn restore<S: Shell>(
    shell: &S,
    handle: &ForeignControlHandle,
    saved: &LayoutSet,
    options: &ScanOptions,
) -> RestoreOutcome {
    let Some(view) = shell.attach(handle) else {
        return RestoreOutcome::TotalFailure(LayoutError::ControlUnavailable);
    };

    let lookup = saved.lookup_by_name();
    if lookup.shadowed > 0 {
        tracing::warn!(
            "{} saved records share a name with a later record and will be ignored",
            lookup.shadowed
        );
    }

    let mut summary = RestoreSummary {
        live_items: view.item_count(),
        ..RestoreSummary::default()
    };
    if lookup.is_empty() || summary.live_items == 0 {
        tracing::info!("nothing to restore");
        return RestoreOutcome::PartialSuccess(summary);
    }

    let process = match shell.open_process(handle.process_id) {
        Ok(process) => process,
        Err(e) => {
            tracing::warn!("icon restore aborted: {e}");
            return RestoreOutcome::TotalFailure(LayoutError::ProcessOpenFailed(e));
        }
    };
    let mut channel = MemoryChannel::new(process);

    let names = match fetch_names(
        &mut channel,
        &view,
        summary.live_items,
        shell.pointer_width(),
        options,
    ) {
        Ok(names) => names,
        Err(e) => {
            tracing::warn!("could not read icon names: {e}");
            summary.unreadable = summary.live_items;
            return RestoreOutcome::PartialSuccess(summary);
        }
    };
    channel.close();

    for (index, name) in names.iter().enumerate() {
        let Some(name) = name else {
            summary.unreadable += 1;
            continue;
        };
        if name.is_empty() {
            continue;
        }
        let Some(record) = lookup.get(name) else {
            summary.unmatched += 1;
            continue;
        };
        summary.attempted += 1;
        if !fits_packed(record.x, record.y) {
            tracing::warn!(
                "{} position ({}, {}) exceeds the 16-bit range and will be truncated",
                record.name,
                record.x,
                record.y
            );
            summary.truncated += 1;
        }
        if view.set_position(index, pack_position(record.x, record.y)) {
            tracing::debug!("restored {name} to ({}, {})", record.x, record.y);
            summary.repositioned += 1;
        } else {
            tracing::debug!("control refused to move {name}");
        }
    }

    tracing::info!("{summary}");
    RestoreOutcome::PartialSuccess(summary)
}
