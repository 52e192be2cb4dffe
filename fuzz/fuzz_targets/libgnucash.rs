#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Garbage in must come back as an error, never a panic.
    let _ = libgnucash::parse_reader(data, None);
});
