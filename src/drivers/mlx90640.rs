//! MLX90640 32×24 thermal imager on I²C.
//!
//! The device refreshes one subpage at a time.  In chess mode each
//! subpage covers half the pixels in a checkerboard, so a full frame is two
//! consecutive subpages.  Calibration (EEPROM extraction and the per-pixel
//! object temperature) is done by the `mlx9064x` crate; this module only
//! configures the device the way the hub runs it and assembles frames.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: [`Mlx90640Imager`] owns an `esp_idf_hal` `I2cDriver` on the
//! second controller and implements [`ThermalImager`].
//! On host/test: only [`collect_frame`] is built, so the subpage loop is
//! covered without hardware.
//!
//! [`ThermalImager`]: crate::app::ports::ThermalImager

use crate::error::SensorError;
use crate::sensors::thermal::THERMAL_PIXELS;

/// Factory default 7-bit I²C address.
pub const MLX90640_I2C_ADDRESS: u8 = 0x33;

/// Subpages making up one chess-mode frame.
pub const SUBPAGES_PER_FRAME: u8 = 2;

/// Wait between "data ready" polls while a frame is assembled.
pub const FRAME_POLL_INTERVAL_MS: u32 = 5;

/// Polls allowed per frame: two subpages at 4 Hz plus one period of slack.
pub const FRAME_POLL_BUDGET: u32 = 3 * 250 / FRAME_POLL_INTERVAL_MS;

/// Fill `out` with both subpages of one frame.
///
/// `subpage_ready` writes the pixels of a freshly completed subpage into
/// its argument and returns `true`, or returns `false` when no subpage is
/// ready yet.  Any transfer error, or a frame not complete within `budget`
/// polls, fails with [`SensorError::FrameTransfer`].  `out` may then hold
/// a partial frame.
pub fn collect_frame<E>(
    out: &mut [f32; THERMAL_PIXELS],
    budget: u32,
    mut subpage_ready: impl FnMut(&mut [f32]) -> Result<bool, E>,
    mut wait: impl FnMut(),
) -> Result<(), SensorError> {
    let mut subpages = 0u8;
    for _ in 0..budget {
        match subpage_ready(&mut out[..]) {
            Ok(true) => {
                subpages += 1;
                if subpages == SUBPAGES_PER_FRAME {
                    return Ok(());
                }
            }
            Ok(false) => wait(),
            Err(_) => return Err(SensorError::FrameTransfer),
        }
    }
    log::debug!("MLX90640: {} of {} subpages before timeout", subpages, SUBPAGES_PER_FRAME);
    Err(SensorError::FrameTransfer)
}

#[cfg(feature = "espidf")]
pub use device::Mlx90640Imager;

#[cfg(feature = "espidf")]
mod device {
    use esp_idf_hal::delay::FreeRtos;
    use esp_idf_hal::i2c::I2cDriver;
    use log::{info, warn};
    use mlx9064x::{AccessPattern, FrameRate, Mlx90640Driver, Resolution};

    use super::{FRAME_POLL_BUDGET, FRAME_POLL_INTERVAL_MS, MLX90640_I2C_ADDRESS, collect_frame};
    use crate::app::ports::ThermalImager;
    use crate::error::SensorError;
    use crate::sensors::thermal::THERMAL_PIXELS;

    enum ImagerState {
        /// Bus up, device not yet probed.
        Unprobed(I2cDriver<'static>),
        Ready(Mlx90640Driver<I2cDriver<'static>>),
        /// Probe failed; the bus went with it.
        Absent,
    }

    pub struct Mlx90640Imager {
        state: ImagerState,
    }

    impl Mlx90640Imager {
        pub fn new(i2c: I2cDriver<'static>) -> Self {
            Self {
                state: ImagerState::Unprobed(i2c),
            }
        }
    }

    impl ThermalImager for Mlx90640Imager {
        fn begin(&mut self) -> Result<(), SensorError> {
            let i2c = match core::mem::replace(&mut self.state, ImagerState::Absent) {
                ImagerState::Unprobed(i2c) => i2c,
                ready @ ImagerState::Ready(_) => {
                    self.state = ready;
                    return Ok(());
                }
                ImagerState::Absent => return Err(SensorError::NotDetected),
            };

            // Reading the calibration EEPROM doubles as the presence check.
            let mut camera = Mlx90640Driver::new(i2c, MLX90640_I2C_ADDRESS).map_err(|_| {
                warn!("MLX90640: no answer at 0x{:02X}", MLX90640_I2C_ADDRESS);
                SensorError::NotDetected
            })?;
            camera
                .set_access_pattern(AccessPattern::Chess)
                .map_err(|_| SensorError::NotDetected)?;
            camera
                .set_resolution(Resolution::Eighteen)
                .map_err(|_| SensorError::NotDetected)?;
            camera
                .set_frame_rate(FrameRate::Four)
                .map_err(|_| SensorError::NotDetected)?;
            info!("MLX90640: chess mode, 18-bit ADC, 4 Hz");

            self.state = ImagerState::Ready(camera);
            Ok(())
        }

        fn capture_frame(&mut self, out: &mut [f32; THERMAL_PIXELS]) -> Result<(), SensorError> {
            let ImagerState::Ready(camera) = &mut self.state else {
                return Err(SensorError::NotDetected);
            };
            collect_frame(
                out,
                FRAME_POLL_BUDGET,
                |dest| camera.generate_image_if_ready(dest),
                || FreeRtos::delay_ms(FRAME_POLL_INTERVAL_MS),
            )
        }
    }
}
