//! MLX90640 thermal-array reader (32×24 pixels).
//!
//! The imager free-runs at 4 Hz in chess mode; a full frame needs both
//! subpages, which takes roughly one refresh period to stream over I²C.
//! The reader therefore rate-gates itself: a poll within
//! `min_interval_ms` of the last *successful* capture is a no-op.
//!
//! Statistics only consider pixels in the plausible band (−20, 200) °C.
//! Anything outside is a dead pixel, a transfer glitch, or the sensor's
//! own out-of-range marker, and must not leak into min/max/avg.

use log::{debug, warn};

use crate::app::ports::ThermalImager;

pub const THERMAL_COLS: usize = 32;
pub const THERMAL_ROWS: usize = 24;
pub const THERMAL_PIXELS: usize = THERMAL_COLS * THERMAL_ROWS;

/// Exclusive plausible band for a pixel (°C).
const PIXEL_MIN_C: f32 = -20.0;
const PIXEL_MAX_C: f32 = 200.0;

/// `max` after a frame with no valid pixel; below any plausible value.
pub const STATS_MAX_SENTINEL: f32 = -40.0;
/// `min` after a frame with no valid pixel; above any plausible value.
pub const STATS_MIN_SENTINEL: f32 = 300.0;

/// Statistics of the last successfully captured frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThermalStats {
    pub max: f32,
    pub min: f32,
    pub avg: f32,
    /// Pixels that fell inside the plausible band.
    pub valid_count: usize,
}

impl Default for ThermalStats {
    fn default() -> Self {
        Self {
            max: STATS_MAX_SENTINEL,
            min: STATS_MIN_SENTINEL,
            avg: 0.0,
            valid_count: 0,
        }
    }
}

/// One full temperature grid, row-major.
#[derive(Debug, Clone)]
pub struct ThermalFrame {
    pub pixels: [f32; THERMAL_PIXELS],
    /// Milliseconds since boot; `None` until the first capture.
    pub captured_at: Option<u64>,
}

impl Default for ThermalFrame {
    fn default() -> Self {
        Self {
            pixels: [0.0; THERMAL_PIXELS],
            captured_at: None,
        }
    }
}

pub fn pixel_is_plausible(celsius: f32) -> bool {
    celsius > PIXEL_MIN_C && celsius < PIXEL_MAX_C
}

/// Rate-gated frame acquisition plus per-frame statistics.
pub struct ThermalArrayReader {
    connected: bool,
    min_interval_ms: u32,
    last_success_ms: Option<u64>,
    frame: ThermalFrame,
    /// Capture target; swapped into `frame` only on success.
    scratch: [f32; THERMAL_PIXELS],
    stats: ThermalStats,
    failed_captures: u32,
}

impl ThermalArrayReader {
    pub fn new(min_interval_ms: u32) -> Self {
        Self {
            connected: false,
            min_interval_ms,
            last_success_ms: None,
            frame: ThermalFrame::default(),
            scratch: [0.0; THERMAL_PIXELS],
            stats: ThermalStats::default(),
            failed_captures: 0,
        }
    }

    /// Detect and configure the imager.  An absent imager is not an error
    /// for the hub: the reader just stays disconnected.
    pub fn begin(&mut self, imager: &mut impl ThermalImager) -> bool {
        match imager.begin() {
            Ok(()) => {
                self.connected = true;
                log::info!(
                    "Thermal: imager ready ({}x{} @ 4 Hz)",
                    THERMAL_COLS,
                    THERMAL_ROWS
                );
            }
            Err(e) => {
                self.connected = false;
                warn!("Thermal: imager not found ({}) — check wiring", e);
            }
        }
        self.connected
    }

    /// Capture and re-derive statistics if the rate gate allows it.
    ///
    /// Returns `true` if a new frame was accepted.  A failed capture keeps
    /// the previous frame and statistics and is retried on the next poll.
    pub fn poll(&mut self, imager: &mut impl ThermalImager, now_ms: u64) -> bool {
        if !self.connected || !self.gate_open(now_ms) {
            return false;
        }

        if let Err(e) = imager.capture_frame(&mut self.scratch) {
            self.failed_captures = self.failed_captures.saturating_add(1);
            debug!("Thermal: capture failed ({}), keeping previous frame", e);
            return false;
        }

        core::mem::swap(&mut self.frame.pixels, &mut self.scratch);
        self.frame.captured_at = Some(now_ms);
        self.last_success_ms = Some(now_ms);
        self.stats = compute_stats(&self.frame.pixels, self.stats.avg);
        true
    }

    fn gate_open(&self, now_ms: u64) -> bool {
        match self.last_success_ms {
            None => true,
            Some(last) => now_ms.saturating_sub(last) >= u64::from(self.min_interval_ms),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn stats(&self) -> ThermalStats {
        self.stats
    }

    pub fn frame(&self) -> &ThermalFrame {
        &self.frame
    }

    /// Captures that failed since boot.
    pub fn failed_captures(&self) -> u32 {
        self.failed_captures
    }
}

/// Scan every pixel.  With no valid pixel, `max`/`min` go to the sentinel
/// extremes and `avg` keeps `prev_avg`.
pub fn compute_stats(pixels: &[f32], prev_avg: f32) -> ThermalStats {
    let mut max = STATS_MAX_SENTINEL;
    let mut min = STATS_MIN_SENTINEL;
    let mut sum = 0.0f32;
    let mut valid_count = 0usize;

    for &t in pixels.iter().filter(|t| pixel_is_plausible(**t)) {
        max = max.max(t);
        min = min.min(t);
        sum += t;
        valid_count += 1;
    }

    let avg = if valid_count > 0 {
        sum / valid_count as f32
    } else {
        prev_avg
    };

    ThermalStats {
        max,
        min,
        avg,
        valid_count,
    }
}
