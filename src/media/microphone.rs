// Live microphone input through cpal

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, oneshot};
use tracing::{error, info, warn};

use super::device::{ensure_audio_only, MediaDevices};
use super::error::{MediaError, MediaResult};
use super::stream::{AudioFrame, MediaConstraints, MediaStream, MediaStreamTrack, StreamFormat, TrackKind};

/// Default (or named) input device.
///
/// cpal streams are not `Send`, so each acquired stream lives on its own
/// thread until its track is stopped.
pub struct CpalMicrophone {
    device_name: Option<String>,
}

impl CpalMicrophone {
    pub fn new(device_name: Option<String>) -> Self {
        Self { device_name }
    }
}

#[async_trait::async_trait]
impl MediaDevices for CpalMicrophone {
    async fn get_user_media(&self, constraints: MediaConstraints) -> MediaResult<MediaStream> {
        ensure_audio_only(constraints)?;

        let (frame_tx, frame_rx) = mpsc::channel(64);
        let (ready_tx, ready_rx) = oneshot::channel::<MediaResult<(StreamFormat, String)>>();
        let (stop_tx, stop_rx) = std::sync::mpsc::channel::<()>();
        let device_name = self.device_name.clone();

        std::thread::Builder::new()
            .name("cpal-microphone".to_string())
            .spawn(move || match open_input(device_name.as_deref(), frame_tx) {
                Ok((stream, format, label)) => {
                    let _ = ready_tx.send(Ok((format, label)));
                    // Blocks until the track is stopped or dropped
                    let _ = stop_rx.recv();
                    drop(stream);
                    info!("Microphone stream released");
                }
                Err(e) => {
                    let _ = ready_tx.send(Err(e));
                }
            })?;

        let (format, label) = ready_rx
            .await
            .map_err(|_| MediaError::NotReadable("microphone thread exited".to_string()))??;

        let track = MediaStreamTrack::new(TrackKind::Audio, label).with_stop_handler(move || {
            let _ = stop_tx.send(());
        });

        Ok(MediaStream::new(vec![Arc::new(track)], format, frame_rx))
    }

    fn name(&self) -> &str {
        "cpal"
    }
}

fn open_input(
    device_name: Option<&str>,
    frame_tx: mpsc::Sender<AudioFrame>,
) -> MediaResult<(cpal::Stream, StreamFormat, String)> {
    let host = cpal::default_host();

    let device = match device_name {
        Some(wanted) => host
            .input_devices()
            .map_err(|e| MediaError::NotReadable(e.to_string()))?
            .find(|d| d.name().map(|n| n == wanted).unwrap_or(false))
            .ok_or(MediaError::DeviceNotFound)?,
        None => host.default_input_device().ok_or(MediaError::DeviceNotFound)?,
    };

    let label = device.name().unwrap_or_else(|_| "Unknown".to_string());
    let supported = device
        .default_input_config()
        .map_err(|e| MediaError::NotReadable(e.to_string()))?;

    let format = StreamFormat {
        sample_rate: supported.sample_rate().0,
        channels: supported.channels(),
    };
    info!(
        "Using audio input device: {} ({}Hz, {} channels)",
        label, format.sample_rate, format.channels
    );

    let started = Instant::now();
    let stream = device
        .build_input_stream(
            &supported.config(),
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                let frame = AudioFrame {
                    samples: data
                        .iter()
                        .map(|&s| (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)
                        .collect(),
                    sample_rate: format.sample_rate,
                    channels: format.channels,
                    timestamp_ms: started.elapsed().as_millis() as u64,
                };
                // Never block the audio thread; drop the frame if the recorder lags
                if let Err(mpsc::error::TrySendError::Full(_)) = frame_tx.try_send(frame) {
                    warn!("Microphone frame dropped: consumer is behind");
                }
            },
            move |err| {
                error!("Audio stream error: {}", err);
            },
            None,
        )
        .map_err(|e| MediaError::NotReadable(e.to_string()))?;

    stream
        .play()
        .map_err(|e| MediaError::NotReadable(e.to_string()))?;

    Ok((stream, format, label))
}
