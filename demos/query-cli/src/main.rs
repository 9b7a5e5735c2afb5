use anyhow::{Context, Result};
use chrono::{Duration, Local, NaiveDateTime};
use clap::Parser;
use qapi::{
    api, coerce_declared, render_catalog, Condition, DispatchConfig, Dispatcher, HandlerResult,
    Outcome, Registry, Rest, TracingConfig, TracingFormat,
};
use serde_json::json;
use std::sync::Arc;

// ============================================
// Command line
// ============================================

/// Call a registered query handler with string tokens
#[derive(Parser, Debug)]
#[command(name = "qapi-demo", version)]
struct Cli {
    /// Fail on malformed tokens instead of falling back to defaults
    #[arg(long, env = "QAPI_STRICT")]
    strict: bool,

    /// Print the handler catalog and exit
    #[arg(long)]
    list: bool,

    /// Print the catalog as JSON Schema tool descriptions
    #[arg(long, requires = "list")]
    json: bool,

    /// Coerce a single token against a declared type (e.g. `--coerce int64 42`)
    #[arg(long, num_args = 2, value_names = ["TYPE", "TOKEN"])]
    coerce: Option<Vec<String>>,

    /// Natural-language query the tokens were derived from
    #[arg(short, long, default_value = "")]
    query: String,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,

    /// Handler name followed by its arguments
    tokens: Vec<String>,
}

// ============================================
// Sample data
// ============================================

struct Order {
    id: u32,
    total: f64,
    placed_at: NaiveDateTime,
    tags: &'static [&'static str],
}

fn orders() -> Vec<Order> {
    let now = Local::now().naive_local();
    vec![
        Order { id: 1, total: 120.0, placed_at: now - Duration::days(1), tags: &["vip"] },
        Order { id: 2, total: 35.5, placed_at: now - Duration::days(3), tags: &["new"] },
        Order { id: 3, total: 980.0, placed_at: now - Duration::days(9), tags: &["vip", "bulk"] },
        Order { id: 4, total: 12.0, placed_at: now - Duration::days(20), tags: &[] },
    ]
}

fn order_json(order: &Order) -> serde_json::Value {
    json!({
        "id": order.id,
        "total": order.total,
        "placed_at": order.placed_at.format(qapi::value::TIMESTAMP_LAYOUT).to_string(),
        "tags": order.tags,
    })
}

// ============================================
// Handlers
// ============================================

/// Orders placed in the last few days
#[api(name = "recentOrders", hint(days = "近几天"))]
fn recent_orders(days: i32) -> HandlerResult {
    let since = Local::now().naive_local() - Duration::days(days.into());
    let found: Vec<_> = orders()
        .iter()
        .filter(|o| o.placed_at >= since)
        .map(order_json)
        .collect();

    let mut condition = Condition::new();
    condition.insert("days".into(), json!(days));
    Ok(Outcome::new(condition, json!(found)))
}

/// Orders placed between two timestamps, newest first
#[api(name = "orderRange", hint(from = "开始时间", to = "结束时间", size = "条数"))]
fn order_range(from: NaiveDateTime, to: NaiveDateTime, size: i64) -> HandlerResult {
    let mut found: Vec<_> = orders()
        .into_iter()
        .filter(|o| o.placed_at >= from && o.placed_at <= to)
        .collect();
    found.sort_by(|a, b| b.placed_at.cmp(&a.placed_at));
    if size > 0 {
        found.truncate(usize::try_from(size)?);
    }

    let mut condition = Condition::new();
    condition.insert("from".into(), json!(from.to_string()));
    condition.insert("to".into(), json!(to.to_string()));
    condition.insert("size".into(), json!(size));
    Ok(Outcome::new(
        condition,
        found.iter().map(order_json).collect::<serde_json::Value>(),
    ))
}

/// Orders with a total at or above a threshold carrying any of the tags
#[api(name = "byTags", hint(min_total = "最低金额", tags = "标签"))]
fn by_tags(min_total: f64, Rest(tags): Rest<String>) -> HandlerResult {
    let wanted: Vec<&str> = tags.iter().map(String::as_str).filter(|t| !t.is_empty()).collect();
    let found: Vec<_> = orders()
        .iter()
        .filter(|o| o.total >= min_total)
        .filter(|o| wanted.is_empty() || o.tags.iter().any(|t| wanted.contains(t)))
        .map(order_json)
        .collect();

    let mut condition = Condition::new();
    condition.insert("min_total".into(), json!(min_total));
    condition.insert("tags".into(), json!(wanted));
    Ok(Outcome::new(condition, json!(found)))
}

fn build_registry() -> Result<Registry> {
    let registry = Registry::new();
    registry.register(recent_orders_entry())?;
    registry.register(order_range_entry())?;
    registry.register(by_tags_entry())?;
    Ok(registry)
}

// ============================================
// Main
// ============================================

fn main() -> Result<()> {
    let cli = Cli::parse();

    qapi::init_subscriber_with_config(TracingConfig {
        format: if cli.json_logs {
            TracingFormat::Json
        } else {
            TracingFormat::Compact
        },
        ..Default::default()
    });

    if let Some(pair) = &cli.coerce {
        let value = coerce_declared(&pair[1], &pair[0])?;
        println!("{}", serde_json::to_string(&value)?);
        return Ok(());
    }

    let registry = Arc::new(build_registry().context("Failed to build registry")?);

    if cli.list {
        let tools = registry.catalog();
        if cli.json {
            println!("{}", serde_json::to_string_pretty(&tools)?);
        } else {
            print!("{}", render_catalog(&tools));
        }
        return Ok(());
    }

    let config = DispatchConfig::default().strict(cli.strict);
    let dispatcher = Dispatcher::with_config(registry, config);

    let envelope = dispatcher
        .dispatch(&cli.query, &cli.tokens)
        .context("Dispatch failed")?;
    println!("{}", serde_json::to_string_pretty(&envelope)?);
    Ok(())
}
