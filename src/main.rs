//! ThermHub firmware: main entry point.
//!
//! Hexagonal layout: adapters on the outside, the acquisition core in the
//! middle, one cooperative loop driving everything.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  Ds18b20Bus / SimBus   Imager        FileLogStore   StatusLed  │
//! │  (ThermometerBus)      (Thermal)     (LogStore)     (Indicator)│
//! │  ConsoleTransport      LogEventSink  JsonConfigFile  Clock     │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │       HubContext (pollers · logger · history)          │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  Scheduler::tick(now)  ──  RequestService                      │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use log::{info, warn};

use thermhub::adapters::config_file::JsonConfigFile;
use thermhub::adapters::console::ConsoleTransport;
use thermhub::adapters::file_store::FileLogStore;
use thermhub::adapters::hardware::Hardware;
use thermhub::adapters::log_sink::LogEventSink;
use thermhub::adapters::time::MonotonicClock;
use thermhub::app::ports::{Clock, ConfigError, ConfigPort};
use thermhub::config::HubConfig;
use thermhub::context::HubContext;
use thermhub::error;
use thermhub::scheduler::Scheduler;

#[cfg(feature = "espidf")]
const CONFIG_PATH: &str = "/spiffs/thermhub.json";
#[cfg(not(feature = "espidf"))]
const CONFIG_PATH: &str = "thermhub.json";

/// Load the stored config.  A missing file means first boot.
fn load_config(port: &impl ConfigPort) -> error::Result<HubConfig> {
    match port.load() {
        Ok(cfg) => Ok(cfg),
        Err(ConfigError::NotFound) => {
            info!("Config: none stored, writing defaults");
            let cfg = HubConfig::default();
            if let Err(e) = port.save(&cfg) {
                warn!("Config: could not persist defaults ({})", e);
            }
            Ok(cfg)
        }
        Err(e) => Err(e.into()),
    }
}

fn main() -> Result<()> {
    // ── 1. Platform bootstrap ─────────────────────────────────
    #[cfg(feature = "espidf")]
    {
        esp_idf_svc::sys::link_patches();
        esp_idf_logger::init()?;
        if let Err(e) = thermhub::drivers::hw_init::mount_log_partition() {
            log::error!("{}: continuing without persistent storage", e);
        }
    }
    #[cfg(not(feature = "espidf"))]
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("╔══════════════════════════════════════╗");
    info!("║  ThermHub v{}                        ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Config ─────────────────────────────────────────────
    let config_port = JsonConfigFile::new(CONFIG_PATH);
    let config = load_config(&config_port).unwrap_or_else(|e| {
        warn!("Config: {} ({}), using defaults", CONFIG_PATH, e);
        HubConfig::default()
    });

    // ── 3. Adapters ───────────────────────────────────────────
    let clock = MonotonicClock::new();
    let mut sink = LogEventSink::new();
    let mut console = ConsoleTransport::spawn()?;
    let mut hw = build_hardware(&config)?;

    // ── 4. Core ───────────────────────────────────────────────
    let idle = Duration::from_millis(u64::from(config.idle_delay_ms));
    let mut scheduler = Scheduler::new(&config);
    let mut ctx = HubContext::new(config);
    scheduler.start(&mut ctx, &mut hw, &mut sink, clock.now_ms());

    info!("System ready. Entering main loop.");

    // ── 5. Main loop ──────────────────────────────────────────
    let mut console_open = true;
    loop {
        scheduler.tick(&mut ctx, &mut hw, &mut console, &mut sink, clock.now_ms());
        if console_open && console.is_closed() {
            console_open = false;
            info!("Console: input closed, hub keeps running");
        }
        std::thread::sleep(idle);
    }
}

/// Device 1-Wire line: open-drain `PinDriver` plus busy-wait delays.
#[cfg(feature = "espidf")]
type OneWirePin = esp_idf_hal::gpio::PinDriver<'static, esp_idf_hal::gpio::AnyIOPin, esp_idf_hal::gpio::InputOutput>;

/// Claim a candidate GPIO for a rescan probe.  Dropping the driver resets
/// the pin.
#[cfg(feature = "espidf")]
fn open_probe_pin(gpio: i32) -> Option<(OneWirePin, esp_idf_hal::delay::Ets)> {
    use esp_idf_hal::gpio::{AnyIOPin, PinDriver};

    // SAFETY: the bus searches its own data line in place and never opens
    // it here; the probe list holds no other claimed pin.
    let pin = unsafe { AnyIOPin::new(gpio) };
    match PinDriver::input_output_od(pin) {
        Ok(driver) => Some((driver, esp_idf_hal::delay::Ets)),
        Err(e) => {
            warn!("Rescan: GPIO {} unavailable ({})", gpio, e);
            None
        }
    }
}

/// Device peripherals: the 1-Wire bus on its configured pin, the MLX90640
/// on the second I2C controller, the heartbeat LED and the SPIFFS log.
#[cfg(feature = "espidf")]
fn build_hardware(
    config: &HubConfig,
) -> Result<
    Hardware<
        thermhub::drivers::onewire::Ds18b20Bus<OneWirePin, esp_idf_hal::delay::Ets>,
        thermhub::drivers::mlx90640::Mlx90640Imager,
        FileLogStore,
        thermhub::drivers::status_led::StatusLed<
            esp_idf_hal::gpio::PinDriver<'static, esp_idf_hal::gpio::AnyOutputPin, esp_idf_hal::gpio::Output>,
        >,
        thermhub::adapters::sim::NoPeer,
    >,
> {
    use esp_idf_hal::gpio::{AnyIOPin, AnyOutputPin, PinDriver};
    use esp_idf_hal::i2c::{I2C1, I2cConfig, I2cDriver};
    use esp_idf_hal::units::Hertz;
    use thermhub::drivers::hw_init::LOG_PARTITION_BASE;
    use thermhub::drivers::mlx90640::Mlx90640Imager;
    use thermhub::pins;

    // SAFETY: each GPIO number and the I2C1 controller are claimed exactly
    // once, here.
    let data = unsafe { AnyIOPin::new(config.one_wire_gpio) };
    let led = unsafe { AnyOutputPin::new(pins::HEARTBEAT_LED_GPIO) };
    let sda = unsafe { AnyIOPin::new(pins::THERMAL_I2C_SDA_GPIO) };
    let scl = unsafe { AnyIOPin::new(pins::THERMAL_I2C_SCL_GPIO) };
    let i2c1 = unsafe { I2C1::new() };

    let bus = thermhub::drivers::onewire::Ds18b20Bus::new(
        PinDriver::input_output_od(data)?,
        esp_idf_hal::delay::Ets,
        config.one_wire_gpio,
    )
    .with_probe_pins(open_probe_pin);

    let i2c = I2cDriver::new(
        i2c1,
        sda,
        scl,
        &I2cConfig::new().baudrate(Hertz(pins::THERMAL_I2C_FREQ_HZ)),
    )?;

    let file_name = Path::new(&config.log_path)
        .file_name()
        .map_or_else(|| "templog.csv".into(), |n| n.to_string_lossy().into_owned());
    let store = FileLogStore::new(
        format!("{}/{}", LOG_PARTITION_BASE, file_name),
        config.storage_capacity_bytes,
    );

    Ok(Hardware::new(
        bus,
        Mlx90640Imager::new(i2c),
        store,
        thermhub::drivers::status_led::StatusLed::new(PinDriver::output(led)?),
        thermhub::adapters::sim::NoPeer,
    ))
}

/// Host run: simulated sensors, file-backed log, in-memory LED.
#[cfg(not(feature = "espidf"))]
fn build_hardware(
    config: &HubConfig,
) -> Result<
    Hardware<
        thermhub::adapters::sim::SimThermometerBus,
        thermhub::adapters::sim::SimThermalImager,
        FileLogStore,
        thermhub::drivers::status_led::MemoryLed,
        thermhub::adapters::sim::SimPeer,
    >,
> {
    use thermhub::adapters::sim::{SimPeer, SimThermalImager, SimThermometerBus};
    use thermhub::drivers::status_led::MemoryLed;

    info!(
        "Host simulation: 1-Wire on GPIO {}, log at {}",
        config.one_wire_gpio,
        Path::new(&config.log_path).display()
    );
    Ok(Hardware::new(
        SimThermometerBus::new(config.one_wire_gpio),
        SimThermalImager::new(),
        FileLogStore::new(&config.log_path, config.storage_capacity_bytes),
        MemoryLed::default(),
        SimPeer::default(),
    ))
}
