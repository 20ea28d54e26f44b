/// Hook polled once per control-loop tick, before any network work.
///
/// An implementation may take over the process entirely (e.g. to flash and
/// restart); the loop makes no assumptions about what happens inside.
pub trait FirmwareUpdater {
    fn poll(&mut self);
}

/// Updates are handled outside this process (package manager, image swap).
#[derive(Debug, Default)]
pub struct NoUpdates;

impl FirmwareUpdater for NoUpdates {
    fn poll(&mut self) {}
}
