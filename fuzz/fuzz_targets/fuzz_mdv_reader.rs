#![no_main]

use libfuzzer_sys::fuzz_target;
use std::io::Cursor;

use mdv2rainbow::mdv::MdvReader;

fuzz_target!(|data: &[u8]| {
    // Malformed input must come back as an error, never a panic
    let mut reader = MdvReader::new(Cursor::new(data));
    if reader.read_headers().is_err() {
        return;
    }

    let mut reader = MdvReader::new(Cursor::new(data));
    let _ = reader.read_volume();
});
