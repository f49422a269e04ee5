//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter        | Implements         | Connects to                 |
//! |----------------|--------------------|-----------------------------|
//! | `hardware`     | (bundle)           | every driven adapter below  |
//! | `config_file`  | ConfigPort         | JSON file                   |
//! | `console`      | RequestPort        | stdin / stdout              |
//! | `file_store`   | LogStore           | SPIFFS / host file          |
//! | `memory_store` | LogStore           | RAM                         |
//! | `log_sink`     | EventSink          | Serial log output           |
//! | `sim`          | ThermometerBus     | simulated 1-Wire bus        |
//! |                | ThermalImager      | simulated / absent imager   |
//! |                | PeerSource         | simulated / absent peer     |
//! | `time`         | Clock              | ESP32 system timer          |

pub mod config_file;
pub mod console;
pub mod file_store;
pub mod hardware;
pub mod log_sink;
pub mod memory_store;
pub mod sim;
pub mod time;
