#![forbid(unsafe_code)]
use std::io::{Read, Write};
use std::path::PathBuf;
use std::{env, ffi, fs, io};

use lzwpack::{base64, frame};

fn main() -> CodingResult {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp(None)
        .format_target(false)
        .init();

    CodingResult::catch_panic(|| {
        let flags = Flags::from_args(env::args_os())?;
        run_coding(flags)
    })
}

fn run_coding(flags: Flags) -> Result<(), io::Error> {
    let mut data = match &flags.input {
        Input::File(path) => fs::read(path)?,
        Input::Stdin => {
            let mut data = vec![];
            io::stdin().lock().read_to_end(&mut data)?;
            data
        }
    };

    if flags.base64 {
        data = base64::decode(&data);
    }

    let output = match (flags.operation, flags.raw) {
        (Operation::Encode, false) => frame::encode(&data).map_err(invalid_data)?,
        (Operation::Encode, true) => {
            let compressed = lzwpack::encode(&data);
            eprintln!("bits: {}, size: {}", compressed.bit_count, data.len());
            compressed.bytes
        }
        (Operation::Decode, false) => frame::decode(&data).map_err(invalid_data)?,
        (Operation::Decode, true) => {
            let size = flags.size.ok_or_else(|| {
                io::Error::new(io::ErrorKind::InvalidInput, "--raw decoding requires --size")
            })?;
            let bits = flags.bits.unwrap_or(data.len() * 8);
            lzwpack::decode(&data, bits, size)
        }
    };

    match &flags.output {
        Some(path) => fs::write(path, &output),
        None => {
            let out = io::stdout();
            let mut out = out.lock();
            out.write_all(&output)?;
            out.flush()
        }
    }
}

fn invalid_data(err: frame::FrameError) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, err.to_string())
}

struct Flags {
    input: Input,
    output: Option<PathBuf>,
    operation: Operation,
    raw: bool,
    bits: Option<usize>,
    size: Option<usize>,
    base64: bool,
}

#[derive(Debug)]
enum Input {
    File(PathBuf),
    Stdin,
}

#[derive(Clone, Copy, Debug)]
enum Operation {
    Encode,
    Decode,
}

fn command() -> clap::Command {
    clap::Command::new("lzwpack")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Pack and unpack headerless 12-bit LZW payloads")
        .arg(
            clap::Arg::new("decode")
                .short('d')
                .long("decode")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            clap::Arg::new("encode")
                .short('e')
                .long("encode")
                .action(clap::ArgAction::SetTrue),
        )
        .group(
            clap::ArgGroup::new("operation")
                .args(["decode", "encode"])
                .multiple(false)
                .required(true),
        )
        .arg(
            clap::Arg::new("raw")
                .long("raw")
                .help("Bare code stream without frame header")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            clap::Arg::new("bits")
                .long("bits")
                .help("Bit count of a raw code stream, defaults to all input bits")
                .requires("raw")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            clap::Arg::new("size")
                .long("size")
                .help("Uncompressed length of a raw code stream")
                .requires("raw")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            clap::Arg::new("base64")
                .long("base64")
                .help("Input is base64 text")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            clap::Arg::new("output")
                .short('o')
                .long("output")
                .value_parser(clap::builder::ValueParser::path_buf()),
        )
        .arg(
            clap::Arg::new("file")
                .default_value("-")
                .value_parser(clap::builder::ValueParser::path_buf()),
        )
}

impl Flags {
    fn from_args(args: impl Iterator<Item = ffi::OsString>) -> Result<Self, io::Error> {
        let matches = command().get_matches_from(args);

        let operation = if matches.get_flag("decode") {
            Operation::Decode
        } else {
            Operation::Encode
        };

        let input = match matches.get_one::<PathBuf>("file") {
            None => Input::Stdin,
            Some(p) if *p == PathBuf::from("-") => Input::Stdin,
            Some(p) => Input::File(p.clone()),
        };

        Ok(Flags {
            input,
            output: matches.get_one::<PathBuf>("output").cloned(),
            operation,
            raw: matches.get_flag("raw"),
            bits: length_arg(&matches, "bits")?,
            size: length_arg(&matches, "size")?,
            base64: matches.get_flag("base64"),
        })
    }
}

fn length_arg(matches: &clap::ArgMatches, id: &str) -> Result<Option<usize>, io::Error> {
    matches
        .get_one::<u64>(id)
        .map(|&value| {
            usize::try_from(value).map_err(|_| {
                io::Error::new(io::ErrorKind::InvalidInput, format!("--{} is too large", id))
            })
        })
        .transpose()
}

enum CodingResult {
    Ok,
    Err(io::Error),
    Panic,
}

impl CodingResult {
    fn catch_panic(op: fn() -> Result<(), io::Error>) -> Self {
        std::panic::catch_unwind(|| match op() {
            Ok(()) => CodingResult::Ok,
            Err(err) => CodingResult::Err(err),
        })
        .unwrap_or(CodingResult::Panic)
    }
}

impl std::process::Termination for CodingResult {
    fn report(self) -> std::process::ExitCode {
        match self {
            CodingResult::Ok => std::process::ExitCode::SUCCESS,
            CodingResult::Err(err) => {
                eprintln!("lzwpack: {}", err);
                std::process::ExitCode::FAILURE
            }
            CodingResult::Panic => {
                eprintln!(
                    "The process failed irrecoverably! This should never happen and is a bug."
                );
                std::process::ExitCode::from(128)
            }
        }
    }
}
