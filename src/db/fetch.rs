use serde::de::DeserializeOwned;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use crate::error::{CoreError, Result};
use crate::model::{
    Buildings, City, Faction, FactionId, Market, Relation, RelationKind, ResourceKind,
    ResourceStock, TradeAgreement, TradeLeg, TradeStatus, UnitClass, UnitCost, UnitTemplate, World,
};

/// Rebuild a `World` from the tables written by [`super::save_world`].
///
/// Pending diplomatic queries are not stored; they live for one turn only.
pub async fn fetch_world(pool: &PgPool) -> Result<World> {
    let mut world = World::new();

    if let Some(row) = sqlx::query("SELECT turn, crystal_price, next_agreement_id FROM game_state")
        .fetch_optional(pool)
        .await?
    {
        world.turn = row.try_get::<i32, _>("turn")? as u32;
        world.market = Market {
            crystal_price: row.try_get("crystal_price")?,
        };
        world.next_agreement_id = row.try_get::<i64, _>("next_agreement_id")? as u64;
    }

    let factions = sqlx::query(
        "SELECT id, name, ideology, controller, money_loss_coefficient, food_loss_coefficient, seasonal \
         FROM factions ORDER BY id",
    )
    .fetch_all(pool)
    .await?;
    for row in &factions {
        let faction = Faction {
            id: id(row, "id")?,
            name: row.try_get("name")?,
            ideology: parse_enum(row.try_get("ideology")?)?,
            controller: parse_enum(row.try_get("controller")?)?,
            money_loss_coefficient: row.try_get("money_loss_coefficient")?,
            food_loss_coefficient: row.try_get("food_loss_coefficient")?,
            seasonal: parse_json(row.try_get("seasonal")?)?,
        };
        world.add_faction(faction, ResourceStock::default());
    }

    let resources = sqlx::query(
        "SELECT faction_id, currency, crystal, labor, population, total_consumption, army_limit \
         FROM resources",
    )
    .fetch_all(pool)
    .await?;
    for row in &resources {
        let faction = id(row, "faction_id")?;
        let stock = ResourceStock {
            currency: row.try_get("currency")?,
            crystal: row.try_get("crystal")?,
            labor: row.try_get("labor")?,
            population: row.try_get("population")?,
            total_consumption: row.try_get("total_consumption")?,
            army_limit: row.try_get("army_limit")?,
        };
        world.resources.insert(faction, stock);
    }

    let units = sqlx::query(
        "SELECT faction_id, name, attack, defense, durability, class, cost_currency, cost_time, \
         consumption, image, baseline FROM units ORDER BY faction_id, name",
    )
    .fetch_all(pool)
    .await?;
    for row in &units {
        let tier: i16 = row.try_get("class")?;
        let class = u8::try_from(tier)
            .ok()
            .and_then(UnitClass::from_tier)
            .ok_or_else(|| CoreError::CorruptRow(format!("unit class {tier}")))?;
        let template = UnitTemplate {
            faction: id(row, "faction_id")?,
            name: row.try_get("name")?,
            attack: row.try_get("attack")?,
            defense: row.try_get("defense")?,
            durability: row.try_get("durability")?,
            class,
            cost: UnitCost {
                currency: row.try_get("cost_currency")?,
                time: row.try_get("cost_time")?,
            },
            consumption: row.try_get("consumption")?,
            image: row.try_get("image")?,
        };
        let baseline: UnitTemplate = parse_json(row.try_get("baseline")?)?;
        world.catalog.restore(template, baseline);
    }

    let cities = sqlx::query(
        "SELECT c.id, c.name, c.x, c.y, c.owner_id, c.crystal_coefficient, \
         COALESCE(b.hospitals, 0) AS hospitals, COALESCE(b.factories, 0) AS factories \
         FROM cities c LEFT JOIN buildings b ON b.city_id = c.id ORDER BY c.id",
    )
    .fetch_all(pool)
    .await?;
    for row in &cities {
        let owner: Option<i64> = row.try_get("owner_id")?;
        let city = City {
            id: id(row, "id")?,
            name: row.try_get("name")?,
            x: row.try_get("x")?,
            y: row.try_get("y")?,
            owner: owner.map(|o| o as FactionId),
            crystal_coefficient: row.try_get("crystal_coefficient")?,
        };
        let buildings = Buildings {
            hospitals: row.try_get("hospitals")?,
            factories: row.try_get("factories")?,
        };
        world.add_city(city, buildings);
    }

    let garrisons = sqlx::query("SELECT city_id, unit_name, count, image FROM garrisons ORDER BY city_id")
        .fetch_all(pool)
        .await?;
    for row in &garrisons {
        let unit_name: String = row.try_get("unit_name")?;
        let image: String = row.try_get("image")?;
        world
            .garrisons
            .upsert(id(row, "city_id")?, &unit_name, row.try_get("count")?, &image);
    }

    let relations = sqlx::query(
        "SELECT r.faction_a, r.faction_b, r.level, COALESCE(d.kind, 'peace') AS kind \
         FROM relations r LEFT JOIN diplomacies d \
         ON d.faction_a = r.faction_a AND d.faction_b = r.faction_b",
    )
    .fetch_all(pool)
    .await?;
    for row in &relations {
        let kind: RelationKind = parse_enum(row.try_get("kind")?)?;
        world.diplomacy.set(
            id(row, "faction_a")?,
            id(row, "faction_b")?,
            Relation {
                level: row.try_get("level")?,
                kind,
            },
        );
    }

    let agreements = sqlx::query(
        "SELECT id, proposer_id, target_id, offered_kind, offered_amount, requested_kind, \
         requested_amount, status, reject_reason FROM trade_agreements ORDER BY id",
    )
    .fetch_all(pool)
    .await?;
    for row in &agreements {
        let status: String = row.try_get("status")?;
        let reason: Option<String> = row.try_get("reject_reason")?;
        let status = match (status.as_str(), reason) {
            ("pending", _) => TradeStatus::Pending,
            ("accepted", _) => TradeStatus::Accepted,
            ("rejected", Some(reason)) => TradeStatus::Rejected(parse_enum(reason)?),
            (other, _) => return Err(CoreError::CorruptRow(format!("trade status {other}"))),
        };
        world.trade_agreements.push(TradeAgreement {
            id: id(row, "id")?,
            proposer: id(row, "proposer_id")?,
            target: id(row, "target_id")?,
            offered: leg(row, "offered_kind", "offered_amount")?,
            requested: leg(row, "requested_kind", "requested_amount")?,
            status,
        });
    }

    Ok(world)
}

fn id(row: &PgRow, column: &str) -> Result<u64> {
    Ok(row.try_get::<i64, _>(column)? as u64)
}

fn leg(row: &PgRow, kind_column: &str, amount_column: &str) -> Result<TradeLeg> {
    let kind: String = row.try_get(kind_column)?;
    let kind = ResourceKind::parse(&kind)
        .ok_or_else(|| CoreError::CorruptRow(format!("resource kind {kind}")))?;
    Ok(TradeLeg::new(kind, row.try_get(amount_column)?))
}

fn parse_enum<T: DeserializeOwned>(value: String) -> Result<T> {
    serde_json::from_value(serde_json::Value::String(value.clone()))
        .map_err(|_| CoreError::CorruptRow(value))
}

fn parse_json<T: DeserializeOwned>(value: String) -> Result<T> {
    serde_json::from_str(&value).map_err(|_| CoreError::CorruptRow(value))
}
