//! Reading and validating the server address list.

use std::io::BufRead;

use anyhow::{bail, Result};

/// Read `HOST:PORT` addresses, one per line. Blank lines and `#` comments are
/// skipped; any remaining line must be a valid address.
pub fn read_addresses<R: BufRead>(reader: R) -> Result<Vec<String>> {
    let mut out = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        validate_addr(line)?;
        out.push(line.to_string());
    }
    Ok(out)
}

fn validate_addr(line: &str) -> Result<()> {
    let Some((host, port)) = line.rsplit_once(':') else {
        bail!("{line:?} does not look like a valid address in HOST:PORT format");
    };
    if host.is_empty() || port.is_empty() || port.parse::<u16>().is_err() {
        bail!("{line:?} does not look like a valid address in HOST:PORT format");
    }
    Ok(())
}
