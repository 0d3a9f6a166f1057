#![no_main]

use imgapp::{Codec, ImageCodec};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // The codec adapter should never panic, regardless of input
    let _ = ImageCodec.decode(data, None);
});
