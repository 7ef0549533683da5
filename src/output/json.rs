use std::io;

use failure::Error;

use super::history::History;

pub fn json_history<W: io::Write>(history: &History, f: &mut W) -> Result<(), Error> {
    serde_json::to_writer_pretty(&mut *f, history)?;
    writeln!(f)?;
    Ok(())
}
