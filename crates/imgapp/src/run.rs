//! Orchestrator: validate, dispatch to one path, report.
//!
//! `Start -> Validate -> {Encode | Decode} -> Done | Failed`. Every failure is
//! returned to the caller; nothing is retried.

use std::fs;
use std::io::Write;
use std::path::PathBuf;

use log::{debug, info};

use crate::params::{DecodeRequest, EncodeRequest};
use crate::raw::{read_raw, write_atomically, write_raw};
use crate::{validate, Codec, ImgError, Mode, ParameterSet, Request, Result};

/// Summary of a completed operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub mode: Mode,
    pub output: PathBuf,
    pub width: u32,
    pub height: u32,
    pub bytes_written: usize,
}

/// Validate `params` and run the single operation it selects.
pub fn run(params: &ParameterSet, codec: &dyn Codec) -> Result<Outcome> {
    let request = validate(params)?;
    execute(&request, codec)
}

/// Run an already validated request.
pub fn execute(request: &Request, codec: &dyn Codec) -> Result<Outcome> {
    let outcome = match request {
        Request::Encode(r) => encode(r, codec)?,
        Request::Decode(r) => decode(r, codec)?,
    };
    info!(
        "{}: {}x{} -> '{}' ({} bytes)",
        outcome.mode,
        outcome.width,
        outcome.height,
        outcome.output.display(),
        outcome.bytes_written
    );
    Ok(outcome)
}

fn encode(request: &EncodeRequest, codec: &dyn Codec) -> Result<Outcome> {
    debug!(
        "encoding {} ({}x{}) into {} as {}",
        request.input.display(),
        request.width,
        request.height,
        request.output.display(),
        request.format
    );

    let grid = read_raw(&request.input, request.width, request.height)?;
    let bytes = codec.encode(&grid, request.format, request.quality)?;
    write_atomically(&request.output, |file| {
        file.write_all(&bytes).map_err(ImgError::from)
    })?;

    Ok(Outcome {
        mode: Mode::Encode,
        output: request.output.clone(),
        width: grid.width(),
        height: grid.height(),
        bytes_written: bytes.len(),
    })
}

fn decode(request: &DecodeRequest, codec: &dyn Codec) -> Result<Outcome> {
    debug!(
        "decoding {} into {}",
        request.input.display(),
        request.output.display()
    );

    let data = fs::read(&request.input).map_err(|e| ImgError::io(&request.input, e))?;
    let grid = codec.decode(&data, request.color_space)?;
    write_raw(&grid, &request.output)?;

    Ok(Outcome {
        mode: Mode::Decode,
        output: request.output.clone(),
        width: grid.width(),
        height: grid.height(),
        bytes_written: grid.raw_len(),
    })
}
