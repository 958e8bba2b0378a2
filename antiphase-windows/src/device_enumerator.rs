//! Audio driver enumeration via the MMDevice API.
//!
//! A "driver" is one audio adapter that exposes both an active capture and
//! an active render endpoint. Endpoints are grouped by the adapter's
//! `PKEY_DeviceInterface_FriendlyName`.

use windows::core::*;
use windows::Win32::Devices::FunctionDiscovery::*;
use windows::Win32::Foundation::{PROPERTYKEY, RPC_E_CHANGED_MODE};
use windows::Win32::Media::Audio::*;
use windows::Win32::System::Com::*;
use windows::Win32::UI::Shell::PropertiesSystem::IPropertyStore;

use crate::error::WasapiError;

/// One duplex-capable audio adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterDriver {
    pub name: String,
    pub capture_id: String,
    pub render_id: String,
}

/// Audio endpoint enumerator using the Windows MMDevice API.
pub struct DeviceEnumerator {
    enumerator: IMMDeviceEnumerator,
}

impl DeviceEnumerator {
    /// Requires COM to be initialized on the calling thread.
    pub fn new() -> std::result::Result<Self, WasapiError> {
        unsafe {
            let enumerator: IMMDeviceEnumerator =
                CoCreateInstance(&MMDeviceEnumerator, None, CLSCTX_ALL)
                    .map_err(|e| WasapiError::Com(format!("failed to create enumerator: {}", e)))?;
            Ok(Self { enumerator })
        }
    }

    /// Adapters with both a capture and a render endpoint, in capture order.
    pub fn list_drivers(&self) -> std::result::Result<Vec<AdapterDriver>, WasapiError> {
        let captures = self.list_endpoints(eCapture)?;
        let renders = self.list_endpoints(eRender)?;

        let mut drivers: Vec<AdapterDriver> = Vec::new();
        for (adapter, capture_id) in captures {
            if drivers.iter().any(|d| d.name == adapter) {
                continue;
            }
            if let Some((_, render_id)) = renders.iter().find(|(name, _)| *name == adapter) {
                drivers.push(AdapterDriver {
                    name: adapter,
                    capture_id,
                    render_id: render_id.clone(),
                });
            }
        }

        log::debug!("Found {} duplex audio adapter(s)", drivers.len());
        Ok(drivers)
    }

    /// Look up an endpoint by its MMDevice id.
    pub fn device(&self, id: &str) -> std::result::Result<IMMDevice, WasapiError> {
        let wide_id: Vec<u16> = id.encode_utf16().chain(std::iter::once(0)).collect();
        unsafe {
            self.enumerator
                .GetDevice(PCWSTR(wide_id.as_ptr()))
                .map_err(|_| WasapiError::DriverNotFound(id.to_string()))
        }
    }

    /// `(adapter name, endpoint id)` for every active endpoint of `data_flow`.
    fn list_endpoints(
        &self,
        data_flow: EDataFlow,
    ) -> std::result::Result<Vec<(String, String)>, WasapiError> {
        unsafe {
            let collection = self
                .enumerator
                .EnumAudioEndpoints(data_flow, DEVICE_STATE_ACTIVE)
                .map_err(|e| WasapiError::Com(format!("EnumAudioEndpoints failed: {}", e)))?;

            let count = collection
                .GetCount()
                .map_err(|e| WasapiError::Com(format!("GetCount failed: {}", e)))?;

            let mut endpoints = Vec::new();
            for i in 0..count {
                let Ok(device) = collection.Item(i) else {
                    continue;
                };
                let id = match device.GetId() {
                    Ok(id) => {
                        let text = id.to_string().unwrap_or_default();
                        CoTaskMemFree(Some(id.0 as *const _));
                        text
                    }
                    Err(_) => continue,
                };
                let Ok(store) = device.OpenPropertyStore(STGM_READ) else {
                    continue;
                };
                let adapter = read_string(&store, &PKEY_DeviceInterface_FriendlyName)
                    .or_else(|| read_string(&store, &PKEY_Device_FriendlyName))
                    .unwrap_or_else(|| format!("Audio Device {}", i));
                endpoints.push((adapter, id));
            }
            Ok(endpoints)
        }
    }
}

/// Read a string property; `None` when absent or empty.
fn read_string(store: &IPropertyStore, key: &PROPERTYKEY) -> Option<String> {
    let value = unsafe { store.GetValue(key) }.ok()?;
    let text = value.to_string();
    (!text.is_empty()).then_some(text)
}

/// Initializes COM (MTA) for the current thread for the guard's lifetime.
///
/// A thread already in another apartment is used as is and left alone
/// on drop.
pub(crate) struct ComGuard {
    owned: bool,
}

impl ComGuard {
    pub(crate) fn enter() -> std::result::Result<Self, WasapiError> {
        let hr = unsafe { CoInitializeEx(None, COINIT_MULTITHREADED) };
        if hr == RPC_E_CHANGED_MODE {
            return Ok(Self { owned: false });
        }
        hr.ok()
            .map_err(|e| WasapiError::Com(format!("CoInitializeEx failed: {}", e)))?;
        Ok(Self { owned: true })
    }
}

impl Drop for ComGuard {
    fn drop(&mut self) {
        if self.owned {
            unsafe {
                CoUninitialize();
            }
        }
    }
}
