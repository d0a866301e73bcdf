//! COM-port interface arrival and removal on Windows
//!
//! Registers with the configuration manager for device-interface events of
//! the serial-port interface class. The callback runs on a system thread
//! pool thread.

use std::ffi::c_void;
use std::sync::Arc;

use tracing::debug;
use windows_sys::core::GUID;
use windows_sys::Win32::Devices::DeviceAndDriverInstallation::{
    CM_Register_Notification, CM_Unregister_Notification, CM_NOTIFY_ACTION,
    CM_NOTIFY_ACTION_DEVICEINTERFACEARRIVAL, CM_NOTIFY_ACTION_DEVICEINTERFACEREMOVAL,
    CM_NOTIFY_EVENT_DATA, CM_NOTIFY_FILTER, CM_NOTIFY_FILTER_TYPE_DEVICEINTERFACE, CR_SUCCESS,
    HCMNOTIFICATION,
};
use windows_sys::Win32::Foundation::ERROR_SUCCESS;

use crate::error::DetectError;

/// GUID_DEVINTERFACE_COMPORT
const COM_PORT_INTERFACE: GUID = GUID::from_u128(0x86e0d1e0_8089_11d0_9ce4_08003e301f73);

pub(crate) type ChangeCallback = Arc<dyn Fn() + Send + Sync>;

/// Active registration; dropping it unregisters
pub(crate) struct ComInterfaceNotification {
    handle: HCMNOTIFICATION,
    context: *mut ChangeCallback,
}

impl ComInterfaceNotification {
    pub(crate) fn register(on_change: ChangeCallback) -> Result<Self, DetectError> {
        let context = Box::into_raw(Box::new(on_change));

        // SAFETY: the filter is fully initialized for a device-interface
        // registration, and `context` stays valid until Drop unregisters.
        let (result, handle) = unsafe {
            let mut filter: CM_NOTIFY_FILTER = std::mem::zeroed();
            filter.cbSize = std::mem::size_of::<CM_NOTIFY_FILTER>() as u32;
            filter.FilterType = CM_NOTIFY_FILTER_TYPE_DEVICEINTERFACE;
            filter.u.DeviceInterface.ClassGuid = COM_PORT_INTERFACE;

            let mut handle: HCMNOTIFICATION = std::mem::zeroed();
            let result = CM_Register_Notification(
                &filter,
                context as *const c_void,
                Some(on_interface_event),
                &mut handle,
            );
            (result, handle)
        };

        if result != CR_SUCCESS {
            // SAFETY: registration failed, so nothing else holds the pointer
            drop(unsafe { Box::from_raw(context) });
            return Err(DetectError::WatchUnavailable(format!(
                "CM_Register_Notification failed with CONFIGRET {}",
                result
            )));
        }

        Ok(Self { handle, context })
    }
}

impl Drop for ComInterfaceNotification {
    fn drop(&mut self) {
        // SAFETY: unregistering waits for in-flight callbacks, after which
        // the context is no longer referenced.
        unsafe {
            CM_Unregister_Notification(self.handle);
            drop(Box::from_raw(self.context));
        }
    }
}

unsafe extern "system" fn on_interface_event(
    _notify: HCMNOTIFICATION,
    context: *const c_void,
    action: CM_NOTIFY_ACTION,
    _event_data: *const CM_NOTIFY_EVENT_DATA,
    _event_data_size: u32,
) -> u32 {
    if action == CM_NOTIFY_ACTION_DEVICEINTERFACEARRIVAL
        || action == CM_NOTIFY_ACTION_DEVICEINTERFACEREMOVAL
    {
        debug!("COM-port interface event {}", action);
        let on_change = &*(context as *const ChangeCallback);
        on_change();
    }
    ERROR_SUCCESS
}
