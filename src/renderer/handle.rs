//! Take-once release of Vulkan handles.
//!
//! Owners hand their handles to `take` before destroying them, so the slot is
//! nulled in the same step and a repeated teardown finds nothing to release.

use vulkanalia::prelude::v1_0::*;

/// Returns the handle and leaves a null one behind, or `None` if already null.
pub fn take<H: Handle + Copy>(handle: &mut H) -> Option<H> {
    if handle.is_null() {
        None
    } else {
        Some(std::mem::replace(handle, H::null()))
    }
}

/// Drains every non-null handle out of `handles`.
pub fn take_all<H: Handle + Copy>(handles: &mut Vec<H>) -> Vec<H> {
    handles.drain(..).filter(|h| !h.is_null()).collect()
}
