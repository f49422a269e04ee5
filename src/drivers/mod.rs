//! Peripheral drivers and one-shot platform initialisation.

pub mod hw_init;
pub mod mlx90640;
pub mod onewire;
pub mod status_led;
