//! Fuzz target: `decode_scratchpad`
//!
//! Arbitrary 9-byte scratchpads must decode or fail with a typed error,
//! and anything that decodes must sit inside the 16-bit register range.
//!
//! cargo fuzz run fuzz_scratchpad

#![no_main]

use libfuzzer_sys::fuzz_target;
use thermhub::drivers::onewire::decode_scratchpad;
use thermhub::sensors::address::Family;

fuzz_target!(|data: &[u8]| {
    let Some((&family, rest)) = data.split_first() else {
        return;
    };
    let Ok(pad) = <[u8; 9]>::try_from(rest.get(..9).unwrap_or(&[])) else {
        return;
    };
    if let Ok(celsius) = decode_scratchpad(Family::from_code(family), &pad) {
        assert!(celsius.is_finite());
        assert!((-16_384.0..=16_384.0).contains(&celsius));
    }
});
