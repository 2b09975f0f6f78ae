//! Inspect command implementation.

use evio_core::Reader;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Footer summary of one event file.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// File path.
    pub path: String,
    /// File size in bytes.
    pub file_size: u64,
    /// Byte length of the record region.
    pub footer_pointer: u64,
    /// Declared number of records.
    pub events: u32,
    /// Provenance tag.
    pub provenance: String,
    /// Creation time in seconds since the Unix epoch, 0 if unset.
    pub created_at: u64,
    /// Trigger index.
    pub triggers: Vec<TriggerInfo>,
}

/// One entry of the trigger index.
#[derive(Debug, Serialize)]
pub struct TriggerInfo {
    /// Hash, as 16 hex digits.
    pub hash: String,
    /// Trigger name.
    pub name: String,
}

/// Runs the inspect command.
pub fn run(files: &[PathBuf], format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let results = files
        .iter()
        .map(|path| inspect_file(path))
        .collect::<Result<Vec<_>, _>>()?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&results)?);
        }
        _ => {
            for result in &results {
                print_text_output(result);
            }
        }
    }

    Ok(())
}

/// Opens `path` and summarizes its footer.
pub fn inspect_file(path: &Path) -> Result<InspectResult, Box<dyn std::error::Error>> {
    let reader = Reader::open(path)?;
    let file_size = std::fs::metadata(path)?.len();
    let metadata = reader.metadata();

    Ok(InspectResult {
        path: path.display().to_string(),
        file_size,
        footer_pointer: reader.footer_pointer(),
        events: metadata.events(),
        provenance: metadata.provenance().to_string(),
        created_at: metadata.created_at(),
        triggers: metadata
            .triggers()
            .iter()
            .map(|item| TriggerInfo {
                hash: format!("{:016x}", item.hash),
                name: item.name.clone(),
            })
            .collect(),
    })
}

fn print_text_output(result: &InspectResult) {
    println!("{}", result.path);
    println!("  File size:      {}", format_size(result.file_size));
    println!("  Record region:  {}", format_size(result.footer_pointer));
    println!("  Events:         {}", result.events);
    println!("  Provenance:     {}", result.provenance);
    if result.created_at == 0 {
        println!("  Created:        unset");
    } else {
        println!("  Created:        {} (unix seconds)", result.created_at);
    }

    if !result.triggers.is_empty() {
        println!("  Triggers:");
        for trigger in &result.triggers {
            println!("    {} {}", trigger.hash, trigger.name);
        }
    }
    println!();
}

fn format_size(bytes: u64) -> String {
    if bytes < 1000 {
        format!("{bytes} bytes")
    } else if bytes < 1000 * 1000 {
        format!("{:.1} KB", bytes as f64 / 1000.0)
    } else if bytes < 1000 * 1000 * 1000 {
        format!("{:.1} MB", bytes as f64 / (1000.0 * 1000.0))
    } else {
        format!("{:.1} GB", bytes as f64 / (1000.0 * 1000.0 * 1000.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use evio_core::{Provenance, StampProvenance, Writer};
    use evio_testkit::{fast_config, TestDir};

    #[test]
    fn summarizes_footer() {
        let dir = TestDir::new();
        let mut writer = Writer::new(dir.base("run.evio"), fast_config());
        writer.set_delegate(Some(Box::new(StampProvenance::new(Provenance::Data))));
        writer.open().unwrap();
        writer.metadata_mut().add_trigger("HLT_Mu15");
        writer.write(&b"payload".to_vec());
        writer.close().unwrap();

        let result = inspect_file(&writer.files_written()[0]).unwrap();
        assert_eq!(result.events, 1);
        assert_eq!(result.footer_pointer, 8);
        assert_eq!(result.provenance, "data");
        assert!(result.created_at > 0);
        assert_eq!(result.triggers.len(), 1);
        assert_eq!(result.triggers[0].hash.len(), 16);

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["triggers"][0]["name"], "HLT_Mu15");
    }

    #[test]
    fn sizes_use_decimal_units() {
        assert_eq!(format_size(999), "999 bytes");
        assert_eq!(format_size(1500), "1.5 KB");
        assert_eq!(format_size(2_000_000), "2.0 MB");
    }
}
