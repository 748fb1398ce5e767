mod common;

use conquest_core::db::{fetch_world, migrate, save_world};
use conquest_core::model::*;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use testcontainers::ContainerAsync;
use testcontainers::runners::AsyncRunner;
use testcontainers_modules::postgres::Postgres;

async fn setup() -> (PgPool, ContainerAsync<Postgres>) {
    let container = Postgres::default().start().await.unwrap();
    let host = container.get_host().await.unwrap();
    let port = container.get_host_port_ipv4(5432).await.unwrap();
    let pool = PgPoolOptions::new()
        .connect(&format!(
            "postgres://postgres:postgres@{}:{}/postgres",
            host, port
        ))
        .await
        .unwrap();
    (pool, container)
}

async fn count(pool: &PgPool, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(pool)
        .await
        .unwrap()
}

#[tokio::test]
#[ignore]
async fn save_populates_all_tables() {
    let (pool, _container) = setup().await;
    let world = common::build_test_world();

    migrate(&pool).await.unwrap();
    save_world(&pool, &world).await.unwrap();

    assert_eq!(count(&pool, "factions").await, 2);
    assert_eq!(count(&pool, "units").await, 2);
    assert_eq!(count(&pool, "cities").await, 3);
    assert_eq!(count(&pool, "buildings").await, 3);
    assert_eq!(count(&pool, "garrisons").await, 2);
    assert_eq!(count(&pool, "resources").await, 2);
    assert_eq!(count(&pool, "relations").await, 1);
    assert_eq!(count(&pool, "diplomacies").await, 1);
    assert_eq!(count(&pool, "trade_agreements").await, 2);

    let turn: i32 = sqlx::query_scalar("SELECT turn FROM game_state")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(turn, 7);
}

#[tokio::test]
#[ignore]
async fn saving_twice_replaces_previous_game() {
    let (pool, _container) = setup().await;
    let mut world = common::build_test_world();

    migrate(&pool).await.unwrap();
    save_world(&pool, &world).await.unwrap();

    world.garrisons.upsert(30, "Pikeman", 5, "");
    world.turn = 8;
    save_world(&pool, &world).await.unwrap();

    assert_eq!(count(&pool, "garrisons").await, 3);
    assert_eq!(count(&pool, "game_state").await, 1);
    assert_eq!(count(&pool, "factions").await, 2);
}

#[tokio::test]
#[ignore]
async fn fetch_restores_saved_world() {
    let (pool, _container) = setup().await;
    let world = common::build_test_world();

    migrate(&pool).await.unwrap();
    save_world(&pool, &world).await.unwrap();
    let restored = fetch_world(&pool).await.unwrap();

    assert_eq!(restored.turn, world.turn);
    assert_eq!(restored.market, world.market);
    assert_eq!(restored.next_agreement_id, world.next_agreement_id);
    assert_eq!(restored.factions, world.factions);
    assert_eq!(restored.resources, world.resources);
    assert_eq!(restored.cities, world.cities);
    assert_eq!(restored.buildings, world.buildings);
    assert_eq!(restored.garrisons, world.garrisons);
    assert_eq!(restored.diplomacy, world.diplomacy);
    assert_eq!(restored.trade_agreements, world.trade_agreements);

    assert_eq!(restored.diplomacy.get(2, 1).kind, RelationKind::War);
    assert_eq!(restored.cities[&30].owner, None);
    assert_eq!(restored.factions[&2].name, "Southern\tIsles");
}

#[tokio::test]
#[ignore]
async fn champion_baseline_survives_round_trip() {
    let (pool, _container) = setup().await;
    let world = common::build_test_world();

    migrate(&pool).await.unwrap();
    save_world(&pool, &world).await.unwrap();
    let restored = fetch_world(&pool).await.unwrap();

    let current = restored.catalog.get(2, "Corsair").unwrap();
    let baseline = restored.catalog.baseline(2, "Corsair").unwrap();
    assert_eq!(current.attack, 2750);
    assert_eq!(baseline.attack, 2500);
    assert_eq!(current.class, UnitClass::Champion);
}
