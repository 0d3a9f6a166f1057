#![no_main]

use arbitrary::Arbitrary;
use imgapp::{params::keys, validate, ParameterSet, Request};
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
struct FuzzInput {
    entries: Vec<(u8, String)>,
}

fuzz_target!(|input: FuzzInput| {
    // Bias keys towards the recognized ones
    let params: ParameterSet = input
        .entries
        .into_iter()
        .map(|(k, v)| (keys::ALL[k as usize % keys::ALL.len()], v))
        .collect();

    // Validation should never panic, and accepted requests must be usable
    if let Ok(Request::Encode(r)) = validate(&params) {
        assert!(r.width > 0 && r.height > 0);
        assert!(imgapp::raw_len(r.width, r.height).is_some());
    }
});
