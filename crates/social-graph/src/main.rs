use anyhow::{Context, Result};
use tracing::info;

use social_graph::{
    config, export_graph, init_tracing, Address, Direction, FollowEdge, FollowRepository,
    GraphConfig, GraphTraversalSource, StoreMode, User, UserRepository,
};

/// Seeds a small demo graph: three users, two follows.
async fn seed_demo(g: &GraphTraversalSource) -> Result<()> {
    let users = UserRepository::new(g.clone());
    let follows = FollowRepository::new(g.clone());

    let ann = users
        .insert_user(&User::new("@ann", Some("Ann Lee")).with_address(Address {
            city: Some("Los Angeles".to_string()),
            state: Some("CA".to_string()),
            country: Some("US".to_string()),
            ..Address::default()
        }))
        .await?;
    let bob = users.insert_user(&User::new("@bob", Some("Bob Stone"))).await?;
    let joanna = users
        .insert_user(&User::new("@joanna", Some("Joanna Ruiz")).with_address(Address {
            city: Some("Sacramento".to_string()),
            state: Some("CA".to_string()),
            ..Address::default()
        }))
        .await?;

    let ann_id = ann.id.context("inserted user has no id")?;
    let bob_id = bob.id.context("inserted user has no id")?;
    let joanna_id = joanna.id.context("inserted user has no id")?;

    let active = FollowEdge {
        start_period: chrono::NaiveDate::from_ymd_opt(2024, 1, 1),
        ..FollowEdge::with_status("ACTIVE")
    };
    follows.create_follow_edge(&bob_id, &ann_id, &active).await?;
    follows.create_follow_edge(&joanna_id, &ann_id, &active).await?;

    let followers = follows.list_follow_edges(&ann_id, Direction::In).await?;
    info!(followers = followers.len(), "Demo graph seeded");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let graph_config = GraphConfig::from_env();
    info!(mode = ?graph_config.mode, partition = %graph_config.partition_name, "Starting social graph");

    let g = config::traversal_source(&graph_config).context("failed to connect to graph store")?;

    if graph_config.mode == StoreMode::Embedded {
        seed_demo(&g).await.context("failed to seed demo graph")?;
    }

    let snapshot = export_graph(&g).await.context("failed to export graph")?;
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}
