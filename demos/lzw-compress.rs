//! Compresses the input from stdin into a frame and writes the result to stdout.

use std::io::{self, Read, Write};

fn main() {
    match (|| -> io::Result<()> {
        let mut data = vec![];
        io::stdin().lock().read_to_end(&mut data)?;
        let frame = lzwpack::frame::encode(&data)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err.to_string()))?;
        let stdout = io::stdout();
        let mut stdout = stdout.lock();
        stdout.write_all(&frame)?;
        stdout.flush()
    })() {
        Ok(()) => (),
        Err(err) => eprintln!("{}", err),
    }
}
