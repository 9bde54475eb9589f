//! PCF particle file command implementations

use anyhow::{Context, Result};
use clap::Subcommand;
use std::collections::BTreeMap;
use std::fs;

use source_pcf::Document;

#[derive(Subcommand)]
pub enum PcfCommands {
    /// Show information about a PCF file
    Info {
        /// Path to the PCF file
        file: String,

        /// List every element with its type
        #[arg(short, long)]
        detailed: bool,
    },

    /// Decode and re-encode a PCF file, checking the round trip
    Verify {
        /// Path to the PCF file
        file: String,
    },
}

pub fn execute(command: PcfCommands) -> Result<()> {
    match command {
        PcfCommands::Info { file, detailed } => info(&file, detailed),
        PcfCommands::Verify { file } => verify(&file),
    }
}

fn info(file: &str, detailed: bool) -> Result<()> {
    let raw = fs::read(file).with_context(|| format!("failed to read {file}"))?;
    let document = Document::decode(&raw).with_context(|| format!("failed to decode {file}"))?;

    let attribute_count: usize = document
        .elements()
        .iter()
        .map(|e| e.attributes().len())
        .sum();

    println!("File:       {file}");
    println!("Version:    {}", document.version());
    println!("Size:       {} bytes", raw.len());
    println!("Elements:   {}", document.element_count());
    println!("Attributes: {attribute_count}");

    if detailed {
        println!();
        for (index, element) in document.elements().iter().enumerate() {
            println!(
                "{index:>6}  {}  \"{}\"  ({} attributes)",
                element.type_name(),
                element.name(),
                element.attributes().len()
            );
        }
    } else {
        let mut by_type: BTreeMap<&str, usize> = BTreeMap::new();
        for element in document.elements() {
            *by_type.entry(element.type_name()).or_default() += 1;
        }
        println!();
        for (type_name, count) in by_type {
            println!("{count:>6}  {type_name}");
        }
    }
    Ok(())
}

fn verify(file: &str) -> Result<()> {
    let raw = fs::read(file).with_context(|| format!("failed to read {file}"))?;
    let document = Document::decode(&raw).with_context(|| format!("failed to decode {file}"))?;
    let encoded = document.encode()?;
    let reparsed = Document::decode(&encoded).context("re-encoded output failed to decode")?;

    if reparsed != document {
        anyhow::bail!("round trip changed the document structure");
    }

    println!("{file}: OK");
    println!(
        "  {} -> {} bytes ({} elements)",
        raw.len(),
        encoded.len(),
        document.element_count()
    );
    Ok(())
}
