//! WASAPI shared-mode duplex stream: capture → invert → render.
//!
//! ```text
//! [capture endpoint] → downmix → resample → PhaseInverter → SampleFifo → upmix → [render endpoint]
//!                         └→ AnalysisWindow (level / spectrum)
//! ```
//!
//! Both endpoints of one adapter are driven from a single polling thread
//! registered with MMCSS. The engine side only touches the shared gain
//! atomic and the analysis window.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;
use windows::core::*;
use windows::Win32::Media::Audio::*;
use windows::Win32::System::Com::*;
use windows::Win32::System::Threading::*;

use antiphase_core::models::config::HardwareConfig;
use antiphase_core::models::endpoint::{DriverDescriptor, DriverInfo};
use antiphase_core::models::error::BackendError;
use antiphase_core::models::gain::Gain;
use antiphase_core::models::state::BackendKind;
use antiphase_core::processing::buffers::{AnalysisWindow, SampleFifo};
use antiphase_core::processing::channel_format::{downmix_to_mono, resample, upmix_into};
use antiphase_core::processing::level_meter::level_percent;
use antiphase_core::processing::phase_inverter::{PhaseInverter, SharedGain};
use antiphase_core::processing::spectrum::SpectrumAnalyzer;
use antiphase_core::traits::backend_provider::BackendProvider;

use crate::device_enumerator::{AdapterDriver, ComGuard, DeviceEnumerator};
use crate::error::WasapiError;
use crate::permissions::check_microphone_permission;

const WAVE_FORMAT_IEEE_FLOAT: u16 = 0x0003;
const WAVE_FORMAT_EXTENSIBLE: u16 = 0xFFFE;

/// Shared-mode mix format of one endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct StreamFormat {
    channels: u16,
    sample_rate: u32,
}

/// A driver that passed `initialize`.
#[derive(Debug, Clone)]
struct OpenedDriver {
    driver: AdapterDriver,
    capture: StreamFormat,
    render: StreamFormat,
}

/// Hardware backend on top of WASAPI.
pub struct WasapiBackend {
    config: HardwareConfig,
    drivers: Vec<AdapterDriver>,
    opened: Option<OpenedDriver>,
    gain: SharedGain,
    analysis: Arc<Mutex<AnalysisWindow>>,
    analyzer: SpectrumAnalyzer,
    stream: Option<DuplexStream>,
}

impl WasapiBackend {
    /// Fails when the MMDevice API cannot be reached.
    pub fn new(config: HardwareConfig) -> std::result::Result<Self, WasapiError> {
        {
            let _com = ComGuard::enter()?;
            DeviceEnumerator::new()?;
        }
        Ok(Self {
            analysis: Arc::new(Mutex::new(AnalysisWindow::new(config.analysis_window))),
            analyzer: SpectrumAnalyzer::new(config.analysis_window),
            config,
            drivers: Vec::new(),
            opened: None,
            gain: SharedGain::new(Gain::UNITY),
            stream: None,
        })
    }

    fn refresh_drivers(&mut self) -> std::result::Result<&[AdapterDriver], WasapiError> {
        let _com = ComGuard::enter()?;
        self.drivers = DeviceEnumerator::new()?.list_drivers()?;
        Ok(&self.drivers)
    }

    fn opened(&self) -> std::result::Result<&OpenedDriver, BackendError> {
        self.opened.as_ref().ok_or(BackendError::NotInitialized)
    }

    /// Newest analysis samples of a healthy running stream.
    fn live_window(&self) -> std::result::Result<Vec<f32>, BackendError> {
        let stream = self.stream.as_ref().ok_or(BackendError::NotProcessing)?;
        if let Some(fault) = stream.fault.lock().clone() {
            return Err(BackendError::Driver(fault));
        }
        Ok(self.analysis.lock().snapshot())
    }
}

impl BackendProvider for WasapiBackend {
    fn name(&self) -> &str {
        "wasapi"
    }

    fn kind(&self) -> BackendKind {
        BackendKind::Hardware
    }

    fn initialize(&mut self, driver_name: &str) -> std::result::Result<DriverInfo, BackendError> {
        if self.stream.is_some() {
            self.stop()?;
        }
        // A failed re-initialize must not leave the previous driver usable.
        self.opened = None;
        if !self.drivers.iter().any(|d| d.name == driver_name) {
            self.refresh_drivers()?;
        }
        let driver = self
            .drivers
            .iter()
            .find(|d| d.name == driver_name)
            .cloned()
            .ok_or_else(|| WasapiError::DriverNotFound(driver_name.to_string()))?;

        if !check_microphone_permission(&driver.capture_id)? {
            return Err(WasapiError::PermissionDenied.into());
        }

        let (capture, render) = query_formats(&driver)?;
        log::info!(
            "Opened '{}': capture {} ch @ {} Hz, render {} ch @ {} Hz",
            driver.name,
            capture.channels,
            capture.sample_rate,
            render.channels,
            render.sample_rate
        );

        let info = DriverInfo {
            driver_name: driver.name.clone(),
            input_channels: capture.channels,
            output_channels: render.channels,
            buffer_size: render.sample_rate * self.config.buffer_duration_ms / 1000,
            sample_rate: Some(render.sample_rate),
        };
        self.opened = Some(OpenedDriver {
            driver,
            capture,
            render,
        });
        Ok(info)
    }

    fn start(&mut self, gain: Gain) -> std::result::Result<(), BackendError> {
        let opened = self.opened()?.clone();
        self.gain.store(gain);
        if self.stream.is_some() {
            return Ok(());
        }

        self.analysis.lock().clear();
        let params = StreamParams {
            opened,
            config: self.config.clone(),
            gain: self.gain.clone(),
            analysis: Arc::clone(&self.analysis),
        };
        self.stream = Some(DuplexStream::spawn(params, self.config.startup_timeout_ms)?);
        Ok(())
    }

    fn stop(&mut self) -> std::result::Result<(), BackendError> {
        self.opened()?;
        if let Some(stream) = self.stream.take() {
            stream.stop()?;
        }
        Ok(())
    }

    fn set_gain(&mut self, gain: Gain) -> std::result::Result<(), BackendError> {
        self.opened()?;
        self.gain.store(gain);
        Ok(())
    }

    fn input_level(&mut self) -> std::result::Result<f32, BackendError> {
        Ok(level_percent(&self.live_window()?))
    }

    fn spectrum(&mut self) -> std::result::Result<Vec<f32>, BackendError> {
        let window = self.live_window()?;
        Ok(self.analyzer.analyze(&window))
    }

    fn raw_devices(&mut self) -> std::result::Result<Vec<DriverDescriptor>, BackendError> {
        let drivers = self.refresh_drivers()?;
        Ok(drivers
            .iter()
            .enumerate()
            .map(|(index, driver)| DriverDescriptor::new(index.to_string(), driver.name.clone()))
            .collect())
    }
}

impl Drop for WasapiBackend {
    fn drop(&mut self) {
        if let Some(stream) = self.stream.take() {
            if let Err(e) = stream.stop() {
                log::warn!("Duplex stream did not stop cleanly: {}", e);
            }
        }
    }
}

/// Everything the stream thread needs, moved onto it at spawn.
struct StreamParams {
    opened: OpenedDriver,
    config: HardwareConfig,
    gain: SharedGain,
    analysis: Arc<Mutex<AnalysisWindow>>,
}

/// Handle to the running duplex thread.
struct DuplexStream {
    running: Arc<AtomicBool>,
    fault: Arc<Mutex<Option<String>>>,
    handle: thread::JoinHandle<()>,
}

impl DuplexStream {
    /// Spawn the stream thread and wait until both endpoints are running.
    fn spawn(params: StreamParams, startup_timeout_ms: u64) -> std::result::Result<Self, WasapiError> {
        let running = Arc::new(AtomicBool::new(true));
        let fault = Arc::new(Mutex::new(None));
        let (ready_tx, ready_rx) = mpsc::channel();

        let thread_running = Arc::clone(&running);
        let thread_fault = Arc::clone(&fault);
        let handle = thread::Builder::new()
            .name("antiphase-duplex".into())
            .spawn(move || {
                if let Err(e) = duplex_loop(&params, &thread_running, &ready_tx) {
                    log::error!("Duplex stream error: {}", e);
                    *thread_fault.lock() = Some(e.to_string());
                    let _ = ready_tx.send(Err(e));
                }
                thread_running.store(false, Ordering::SeqCst);
            })
            .map_err(|e| WasapiError::Stream(format!("failed to spawn duplex thread: {}", e)))?;

        match ready_rx.recv_timeout(Duration::from_millis(startup_timeout_ms)) {
            Ok(Ok(())) => Ok(Self {
                running,
                fault,
                handle,
            }),
            Ok(Err(e)) => {
                let _ = handle.join();
                Err(e)
            }
            Err(_) => {
                // The thread is left to exit on its own once it sees the flag.
                running.store(false, Ordering::SeqCst);
                log::warn!("Duplex stream startup exceeded {} ms", startup_timeout_ms);
                Err(WasapiError::StartupTimeout(startup_timeout_ms))
            }
        }
    }

    fn stop(self) -> std::result::Result<(), BackendError> {
        self.running.store(false, Ordering::SeqCst);
        self.handle
            .join()
            .map_err(|_| BackendError::Driver("duplex thread panicked".into()))?;
        log::debug!("Duplex stream stopped");
        Ok(())
    }
}

/// An activated endpoint client and its mix format.
struct OpenClient {
    client: IAudioClient,
    format_ptr: *mut WAVEFORMATEX,
    format: StreamFormat,
}

impl OpenClient {
    fn activate(enumerator: &DeviceEnumerator, endpoint_id: &str) -> std::result::Result<Self, WasapiError> {
        let device = enumerator.device(endpoint_id)?;
        unsafe {
            let client: IAudioClient = device
                .Activate(CLSCTX_ALL, None)
                .map_err(|e| WasapiError::Com(format!("Activate failed: {}", e)))?;
            let format_ptr = client
                .GetMixFormat()
                .map_err(|e| WasapiError::Com(format!("GetMixFormat failed: {}", e)))?;
            let format = match read_float_format(*format_ptr) {
                Ok(format) => format,
                Err(e) => {
                    CoTaskMemFree(Some(format_ptr as *const _));
                    return Err(e);
                }
            };
            Ok(Self {
                client,
                format_ptr,
                format,
            })
        }
    }

    fn initialize(&self, buffer_duration_ms: u32) -> std::result::Result<(), WasapiError> {
        // Buffer duration in 100-nanosecond units
        let buffer_duration = buffer_duration_ms as i64 * 10_000;
        unsafe {
            self.client
                .Initialize(
                    AUDCLNT_SHAREMODE_SHARED,
                    AUDCLNT_STREAMFLAGS_NOPERSIST,
                    buffer_duration,
                    0,
                    self.format_ptr,
                    None,
                )
                .map_err(|e| WasapiError::Com(format!("IAudioClient::Initialize failed: {}", e)))
        }
    }
}

impl Drop for OpenClient {
    fn drop(&mut self) {
        unsafe {
            let _ = self.client.Stop();
            CoTaskMemFree(Some(self.format_ptr as *const _));
        }
    }
}

/// Only 32-bit float mix formats are streamed.
fn read_float_format(format: WAVEFORMATEX) -> std::result::Result<StreamFormat, WasapiError> {
    let tag = format.wFormatTag;
    let bits = format.wBitsPerSample;
    let channels = format.nChannels;
    let sample_rate = format.nSamplesPerSec;

    let is_float = tag == WAVE_FORMAT_IEEE_FLOAT || (tag == WAVE_FORMAT_EXTENSIBLE && bits == 32);
    if !is_float || channels == 0 || sample_rate == 0 {
        return Err(WasapiError::UnsupportedFormat(format!(
            "tag {:#06x}, {} bits, {} ch @ {} Hz",
            tag, bits, channels, sample_rate
        )));
    }
    Ok(StreamFormat {
        channels,
        sample_rate,
    })
}

/// Mix formats of both endpoints of `driver`.
fn query_formats(driver: &AdapterDriver) -> std::result::Result<(StreamFormat, StreamFormat), WasapiError> {
    let _com = ComGuard::enter()?;
    let enumerator = DeviceEnumerator::new()?;
    let capture = OpenClient::activate(&enumerator, &driver.capture_id)?;
    let render = OpenClient::activate(&enumerator, &driver.render_id)?;
    Ok((capture.format, render.format))
}

/// Stream thread body.
///
/// Sequence:
/// 1. CoInitializeEx (MTA)
/// 2. Activate and initialize both endpoint clients in shared mode
/// 3. Register with MMCSS for real-time priority
/// 4. Start both clients and report readiness
/// 5. Poll: drain capture packets into the FIFO, fill free render frames from it
fn duplex_loop(
    params: &StreamParams,
    running: &AtomicBool,
    ready: &mpsc::Sender<std::result::Result<(), WasapiError>>,
) -> std::result::Result<(), WasapiError> {
    let _com = ComGuard::enter()?;
    let enumerator = DeviceEnumerator::new()?;
    let opened = &params.opened;

    let capture = OpenClient::activate(&enumerator, &opened.driver.capture_id)?;
    let render = OpenClient::activate(&enumerator, &opened.driver.render_id)?;
    capture.initialize(params.config.buffer_duration_ms)?;
    render.initialize(params.config.buffer_duration_ms)?;

    let capture_channels = capture.format.channels as usize;
    let capture_rate = capture.format.sample_rate;
    let render_channels = render.format.channels as usize;
    let render_rate = render.format.sample_rate;

    let mut inverter = PhaseInverter::new(params.gain.load());
    let mut fifo = SampleFifo::new(params.config.max_latency_samples(render_rate));
    let mut render_scratch: Vec<f32> = Vec::new();

    unsafe {
        let capture_client: IAudioCaptureClient = capture
            .client
            .GetService()
            .map_err(|e| WasapiError::Com(format!("GetService(capture) failed: {}", e)))?;
        let render_client: IAudioRenderClient = render
            .client
            .GetService()
            .map_err(|e| WasapiError::Com(format!("GetService(render) failed: {}", e)))?;
        let render_buffer_frames = render
            .client
            .GetBufferSize()
            .map_err(|e| WasapiError::Com(format!("GetBufferSize failed: {}", e)))?;

        let mut task_index: u32 = 0;
        let _mmcss_handle = AvSetMmThreadCharacteristicsW(w!("Pro Audio"), &mut task_index);

        capture
            .client
            .Start()
            .map_err(|e| WasapiError::Stream(format!("capture Start failed: {}", e)))?;
        render
            .client
            .Start()
            .map_err(|e| WasapiError::Stream(format!("render Start failed: {}", e)))?;

        log::info!(
            "Duplex stream running on '{}' (fifo {} samples)",
            opened.driver.name,
            fifo.capacity()
        );
        let _ = ready.send(Ok(()));

        let poll = Duration::from_millis(params.config.poll_interval_ms);
        let mut dropped_total: usize = 0;

        while running.load(Ordering::SeqCst) {
            thread::sleep(poll);
            inverter.set_gain(params.gain.load());

            let mut packet_length = capture_client
                .GetNextPacketSize()
                .map_err(|e| WasapiError::Stream(format!("GetNextPacketSize failed: {}", e)))?;

            while packet_length > 0 {
                let mut buffer_ptr: *mut u8 = std::ptr::null_mut();
                let mut num_frames: u32 = 0;
                let mut flags: u32 = 0;

                capture_client
                    .GetBuffer(&mut buffer_ptr, &mut num_frames, &mut flags, None, None)
                    .map_err(|e| WasapiError::Stream(format!("GetBuffer failed: {}", e)))?;

                let total_samples = num_frames as usize * capture_channels;
                let mono = if num_frames == 0 || buffer_ptr.is_null() {
                    Vec::new()
                } else if flags & (AUDCLNT_BUFFERFLAGS_SILENT.0 as u32) != 0 {
                    vec![0.0f32; num_frames as usize]
                } else {
                    let samples = std::slice::from_raw_parts(buffer_ptr as *const f32, total_samples);
                    downmix_to_mono(samples, capture_channels)
                };

                capture_client
                    .ReleaseBuffer(num_frames)
                    .map_err(|e| WasapiError::Stream(format!("ReleaseBuffer failed: {}", e)))?;

                if !mono.is_empty() {
                    params.analysis.lock().push(&mono);
                    let mut inverted = resample(&mono, capture_rate, render_rate);
                    inverter.process_in_place(&mut inverted);
                    dropped_total += fifo.write(&inverted);
                }

                packet_length = capture_client
                    .GetNextPacketSize()
                    .map_err(|e| WasapiError::Stream(format!("GetNextPacketSize failed: {}", e)))?;
            }

            let padding = render
                .client
                .GetCurrentPadding()
                .map_err(|e| WasapiError::Stream(format!("GetCurrentPadding failed: {}", e)))?;
            let available = render_buffer_frames.saturating_sub(padding);
            if available == 0 {
                continue;
            }

            let out_ptr = render_client
                .GetBuffer(available)
                .map_err(|e| WasapiError::Stream(format!("render GetBuffer failed: {}", e)))?;
            let out = std::slice::from_raw_parts_mut(
                out_ptr as *mut f32,
                available as usize * render_channels,
            );
            render_scratch.resize(available as usize, 0.0);
            fifo.read_into(&mut render_scratch);
            upmix_into(&render_scratch, render_channels, out);
            render_client
                .ReleaseBuffer(available, 0)
                .map_err(|e| WasapiError::Stream(format!("render ReleaseBuffer failed: {}", e)))?;
        }

        if dropped_total > 0 {
            log::debug!("Dropped {} samples to cap latency", dropped_total);
        }
    }

    Ok(())
}
