use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::model::{FactionPair, Relation, World};

/// One row of `relations.jsonl`.
#[derive(Serialize)]
struct RelationRow {
    faction_a: u64,
    faction_b: u64,
    #[serde(flatten)]
    relation: Relation,
}

/// One row of `resources.jsonl` and `buildings.jsonl`: the keyed value plus its id.
#[derive(Serialize)]
struct Keyed<'a, T> {
    id: u64,
    #[serde(flatten)]
    value: &'a T,
}

/// Write an iterator of serializable items to a JSONL file (one JSON object per line).
fn write_jsonl<T: Serialize>(path: &Path, items: impl Iterator<Item = T>) -> io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    for item in items {
        serde_json::to_writer(&mut writer, &item)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()
}

/// Read every line of a JSONL file back into `T`.
pub fn read_jsonl<T: DeserializeOwned>(path: &Path) -> io::Result<Vec<T>> {
    let reader = BufReader::new(File::open(path)?);
    let mut items = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        items.push(serde_json::from_str(&line)?);
    }
    Ok(items)
}

/// Flush the world state to JSONL files in the given output directory.
///
/// Creates the output directory if it does not exist. Writes one file per
/// table: `factions`, `units`, `cities`, `buildings`, `garrisons`,
/// `resources`, `relations` and `trade_agreements`.
pub fn flush_to_jsonl(world: &World, output_dir: &Path) -> io::Result<()> {
    fs::create_dir_all(output_dir)?;

    write_jsonl(&output_dir.join("factions.jsonl"), world.factions.values())?;
    write_jsonl(&output_dir.join("units.jsonl"), world.catalog.iter())?;
    write_jsonl(&output_dir.join("cities.jsonl"), world.cities.values())?;
    write_jsonl(
        &output_dir.join("buildings.jsonl"),
        world
            .buildings
            .iter()
            .map(|(id, value)| Keyed { id: *id, value }),
    )?;
    write_jsonl(&output_dir.join("garrisons.jsonl"), world.garrisons.iter())?;
    write_jsonl(
        &output_dir.join("resources.jsonl"),
        world
            .resources
            .iter()
            .map(|(id, value)| Keyed { id: *id, value }),
    )?;
    write_jsonl(
        &output_dir.join("relations.jsonl"),
        world
            .diplomacy
            .iter()
            .map(|(pair, relation): (FactionPair, Relation)| RelationRow {
                faction_a: pair.first(),
                faction_b: pair.second(),
                relation,
            }),
    )?;
    write_jsonl(
        &output_dir.join("trade_agreements.jsonl"),
        world.trade_agreements.iter(),
    )?;

    Ok(())
}
