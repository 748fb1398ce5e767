use std::fmt::Display;

use serde::Serialize;
use sqlx::{PgConnection, PgPool};
use tracing::debug;

use crate::error::Result;
use crate::model::{TradeStatus, World};

/// Replace the stored game with `world`.
///
/// Everything happens in one transaction: the tables are truncated, then
/// refilled with COPY FROM STDIN (text format). Order respects FK
/// constraints: factions and cities first.
pub async fn save_world(pool: &PgPool, world: &World) -> Result<()> {
    let mut tx = pool.begin().await?;
    sqlx::raw_sql(include_str!("../../sql/truncate.sql"))
        .execute(&mut *tx)
        .await?;

    sqlx::query(
        "INSERT INTO game_state (id, turn, crystal_price, next_agreement_id) VALUES (1, $1, $2, $3)",
    )
    .bind(world.turn as i32)
    .bind(world.market.crystal_price)
    .bind(world.next_agreement_id as i64)
    .execute(&mut *tx)
    .await?;

    // Factions
    {
        let mut buf = String::new();
        for f in world.factions.values() {
            let seasonal = serde_json::to_string(&f.seasonal)?;
            buf.push_str(&format!(
                "{}\t{}\t{}\t{}\t{}\t{}\t{}\n",
                f.id,
                escape(&f.name),
                enum_str(&f.ideology),
                enum_str(&f.controller),
                f.money_loss_coefficient,
                f.food_loss_coefficient,
                escape(&seasonal),
            ));
        }
        copy_in(&mut tx, include_str!("../../sql/copy_factions.sql"), &buf).await?;
    }

    // Units
    {
        let mut buf = String::new();
        for t in world.catalog.iter() {
            let baseline = world.catalog.baseline(t.faction, &t.name).unwrap_or(t);
            let baseline = serde_json::to_string(baseline)?;
            buf.push_str(&format!(
                "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\n",
                t.faction,
                escape(&t.name),
                t.attack,
                t.defense,
                t.durability,
                t.class.tier(),
                t.cost.currency,
                t.cost.time,
                t.consumption,
                escape(&t.image),
                escape(&baseline),
            ));
        }
        copy_in(&mut tx, include_str!("../../sql/copy_units.sql"), &buf).await?;
    }

    // Cities
    {
        let mut buf = String::new();
        for c in world.cities.values() {
            buf.push_str(&format!(
                "{}\t{}\t{}\t{}\t{}\t{}\n",
                c.id,
                escape(&c.name),
                c.x,
                c.y,
                opt(c.owner),
                c.crystal_coefficient,
            ));
        }
        copy_in(&mut tx, include_str!("../../sql/copy_cities.sql"), &buf).await?;
    }

    // Buildings
    {
        let mut buf = String::new();
        for (city_id, b) in &world.buildings {
            buf.push_str(&format!("{}\t{}\t{}\n", city_id, b.hospitals, b.factories));
        }
        copy_in(&mut tx, include_str!("../../sql/copy_buildings.sql"), &buf).await?;
    }

    // Garrisons
    {
        let mut buf = String::new();
        for g in world.garrisons.iter() {
            buf.push_str(&format!(
                "{}\t{}\t{}\t{}\n",
                g.city_id,
                escape(&g.unit_name),
                g.count,
                escape(&g.image),
            ));
        }
        copy_in(&mut tx, include_str!("../../sql/copy_garrisons.sql"), &buf).await?;
    }

    // Resources
    {
        let mut buf = String::new();
        for (faction, r) in &world.resources {
            buf.push_str(&format!(
                "{}\t{}\t{}\t{}\t{}\t{}\t{}\n",
                faction,
                r.currency,
                r.crystal,
                r.labor,
                r.population,
                r.total_consumption,
                r.army_limit,
            ));
        }
        copy_in(&mut tx, include_str!("../../sql/copy_resources.sql"), &buf).await?;
    }

    // Relations (level) and diplomacies (kind) share one source table in memory
    {
        let mut levels = String::new();
        let mut kinds = String::new();
        for (pair, rel) in world.diplomacy.iter() {
            levels.push_str(&format!("{}\t{}\t{}\n", pair.first(), pair.second(), rel.level));
            kinds.push_str(&format!(
                "{}\t{}\t{}\n",
                pair.first(),
                pair.second(),
                rel.kind.as_str()
            ));
        }
        copy_in(&mut tx, include_str!("../../sql/copy_relations.sql"), &levels).await?;
        copy_in(&mut tx, include_str!("../../sql/copy_diplomacies.sql"), &kinds).await?;
    }

    // Trade agreements
    {
        let mut buf = String::new();
        for a in &world.trade_agreements {
            let (status, reason) = match a.status {
                TradeStatus::Pending => ("pending", None),
                TradeStatus::Accepted => ("accepted", None),
                TradeStatus::Rejected(reason) => ("rejected", Some(enum_str(&reason))),
            };
            buf.push_str(&format!(
                "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\n",
                a.id,
                a.proposer,
                a.target,
                a.offered.kind.as_str(),
                a.offered.amount,
                a.requested.kind.as_str(),
                a.requested.amount,
                status,
                opt(reason),
            ));
        }
        copy_in(&mut tx, include_str!("../../sql/copy_trade_agreements.sql"), &buf).await?;
    }

    tx.commit().await?;
    debug!(turn = world.turn, "world saved");
    Ok(())
}

/// Execute a COPY FROM STDIN with the given text-format payload.
async fn copy_in(conn: &mut PgConnection, statement: &str, data: &str) -> Result<()> {
    let mut copy = conn.copy_in_raw(statement).await?;
    copy.send(data.as_bytes()).await?;
    copy.finish().await?;
    Ok(())
}

/// Escape a string for Postgres COPY text format.
/// Backslash must be escaped first, then the special whitespace characters.
pub(super) fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            _ => out.push(c),
        }
    }
    out
}

/// Render an optional value as a COPY text value (`\N` for NULL).
fn opt<T: Display>(v: Option<T>) -> String {
    match v {
        Some(v) => escape(&v.to_string()),
        None => "\\N".to_string(),
    }
}

/// The snake_case name serde gives a unit enum variant.
pub(super) fn enum_str<T: Serialize>(val: &T) -> String {
    match serde_json::to_value(val) {
        Ok(serde_json::Value::String(s)) => s,
        _ => String::new(),
    }
}
