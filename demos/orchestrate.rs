//! # Example: orchestrate
//!
//! Starts one or more items against the same controller and waits until the
//! controller idles out.
//!
//! Each argument is `<type>:<id>` where type is `a`, `b` or anything else for a
//! basic item. Items started while another one holds the slot are denied.
//!
//! ## Flow
//! ```text
//! start_item(X) ──► ensure_controller ──► Ping
//!               └─► ItemClient: Register ─► StartProcessing ─► work ─► StopProcessing ─► Deregister
//! start_item(Y) ──► ItemClient: Register ─► StartProcessing (denied) ─► Deregister
//! run_until_idle ──► controller terminates after idle_timeout
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=info cargo run --example orchestrate --features logging -- a:1 b:2 basic:3
//! ```

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, bail};
use slotvisor::{
    BasicItem, Item, ItemA, ItemB, ItemReport, LogWriter, Orchestrator, OrchestratorConfig, SleepWork,
    Subscribe,
};
use tokio::task::JoinHandle;
use tracing_subscriber::EnvFilter;

fn parse(arg: &str) -> anyhow::Result<(String, String)> {
    let (kind, id) = arg
        .split_once(':')
        .with_context(|| format!("expected <type>:<id>, got {arg:?}"))?;
    if id.is_empty() {
        bail!("an item id must be provided in {arg:?}");
    }
    Ok((kind.to_ascii_lowercase(), id.to_owned()))
}

async fn report<T: Item>(h: JoinHandle<ItemReport<T>>) -> anyhow::Result<()> {
    let report = h.await?;
    match report.result {
        Ok(outcome) => println!("item '{}' completed with result: {outcome}", report.item.id()),
        Err(e) => println!("item '{}' failed: {e}", report.item.id()),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.is_empty() {
        bail!("an item type and id must be provided, e.g. a:42");
    }

    let mut cfg = OrchestratorConfig::default();
    cfg.controller.idle_timeout = Duration::from_secs(5);
    cfg.item.start_delay = Duration::from_secs(2);
    cfg.grace = Duration::from_secs(5);

    let orch = Orchestrator::builder(cfg)
        .with_subscribers(vec![Arc::new(LogWriter::new()) as Arc<dyn Subscribe>])
        .build();

    let work = SleepWork::new(Duration::from_secs(3));
    let mut waits = Vec::new();
    for arg in &args {
        let (kind, id) = parse(arg)?;
        let wait = match kind.as_str() {
            "a" => {
                let item = ItemA {
                    basic: BasicItem::new(&id, format!("Item-A-{id}")),
                    extra_field_a: "Extra data for Item A".into(),
                };
                let h = orch.start_item(item, work.clone()).await?;
                tokio::spawn(report(h))
            }
            "b" => {
                let item = ItemB {
                    basic: BasicItem::new(&id, format!("Item-B-{id}")),
                    extra_field_b: "Extra data for Item B".into(),
                };
                let h = orch.start_item(item, work.clone()).await?;
                tokio::spawn(report(h))
            }
            _ => {
                let h = orch
                    .start_item(BasicItem::new(&id, format!("Item-{id}")), work.clone())
                    .await?;
                tokio::spawn(report(h))
            }
        };
        waits.push(wait);
    }

    for w in waits {
        w.await??;
    }

    match orch.run_until_idle().await? {
        Some(state) => {
            println!();
            println!("Controller state:");
            println!(" ├─► Signals handled: {}", state.signals_handled);
            println!(" ├─► Items known:     {}", state.registry.len());
            println!(" └─► Still registered: {}", state.registry.registered_count());
        }
        None => println!("controller was never started"),
    }
    Ok(())
}
