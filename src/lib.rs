pub mod control;
pub mod desktop;
pub mod enumerator;
pub mod errors;
pub mod layout;
pub mod locator;
pub mod logging;
pub mod memory_channel;
pub mod restorer;
pub mod settings;
pub mod wire;

#[cfg(windows)]
pub mod win32;

pub use control::{IconListView, Shell};
pub use enumerator::{enumerate, ScanOptions};
pub use errors::{ChannelError, LayoutError};
pub use layout::{LayoutRecord, LayoutSet};
pub use locator::ForeignControlHandle;
pub use restorer::{restore, RestoreOutcome, RestoreSummary};
