#![no_main]

use arbitrary::Arbitrary;
use imgapp::{read_raw_from, write_raw_to};
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
struct FuzzInput {
    width: u8,
    height: u8,
    pixels: Vec<u8>,
}

fuzz_target!(|input: FuzzInput| {
    let width = (input.width as u32).max(1);
    let height = (input.height as u32).max(1);

    let grid = match read_raw_from(input.pixels.as_slice(), width, height) {
        Ok(grid) => grid,
        Err(_) => {
            assert!(input.pixels.len() < (width * height * 4) as usize);
            return;
        }
    };

    let mut out = Vec::new();
    write_raw_to(&grid, &mut out).unwrap();
    assert_eq!(out.as_slice(), &input.pixels[..out.len()]);
});
