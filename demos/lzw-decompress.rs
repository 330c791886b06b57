//! Decompresses a frame from stdin and writes the result to stdout.

use std::io::{self, Read, Write};

fn main() {
    match (|| -> io::Result<()> {
        let mut frame = vec![];
        io::stdin().lock().read_to_end(&mut frame)?;
        let data = lzwpack::frame::decode(&frame)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err.to_string()))?;
        let stdout = io::stdout();
        let mut stdout = stdout.lock();
        stdout.write_all(&data)?;
        stdout.flush()
    })() {
        Ok(()) => (),
        Err(err) => eprintln!("{}", err),
    }
}
