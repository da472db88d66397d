use crate::error::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::Write;
use std::path::Path;

/// Pretty-printed JSON, the text form used by every report format.
pub fn to_pretty_string<T: Serialize>(record: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(record)?)
}

pub fn write_json<W: Write, T: Serialize>(mut writer: W, record: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, record)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

pub fn read_json_record<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> Result<T> {
    let file = std::fs::File::open(path.as_ref())?;
    Ok(serde_json::from_reader(std::io::BufReader::new(file))?)
}
