//! Reads a planner input (or hot-list request) as JSON on stdin and prints
//! the resulting plan (or hot list) as JSON on stdout.
//!
//! Usage: `plan_purchases [plan|hot-list] < input.json`

use std::io::Read;

use anyhow::{anyhow, Context, Result};
use card_procurement::bin_common::{load_config_from_env, parse_args, ConfigType, RunMode};
use card_procurement::planner::{
    compute_hot_list, init_tracing, parse_hot_list_request, parse_planner_input,
    run_pipeline_with_config, PlannerConfig,
};
use tracing::{info, warn};

fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let mode = RunMode::from_args(&parse_args()).map_err(|e| anyhow!(e))?;

    let config_path = load_config_from_env(ConfigType::Planner);
    let config = if config_path.exists() {
        PlannerConfig::load(&config_path)
            .with_context(|| format!("loading {}", config_path.display()))?
    } else {
        PlannerConfig::default()
    };

    init_tracing(&config.log_level);
    if !config_path.exists() {
        warn!("Config file {} not found, using defaults", config_path.display());
    }
    config.log();

    let mut raw = String::new();
    std::io::stdin()
        .read_to_string(&mut raw)
        .context("reading stdin")?;

    let output = match mode {
        RunMode::Plan => {
            let input = parse_planner_input(&raw)?;
            let plan = run_pipeline_with_config(&input, &config.optimizer);
            info!(
                "Plan: {} basket(s), total {:.2}, {}/{} demand unit(s) covered, {} unfilled line(s)",
                plan.summary.total_baskets,
                plan.summary.overall_total,
                plan.summary.demand_satisfied,
                plan.summary.demand_requested,
                plan.unfilled_demand.len()
            );
            if let Some(budget) = &plan.budget {
                for warning in &budget.warnings {
                    warn!("[Budget] {}", warning);
                }
            }
            serde_json::to_string_pretty(&plan)?
        }
        RunMode::HotList => {
            let mut request = parse_hot_list_request(&raw)?;
            if request.config.is_none() {
                request.config = Some(config.ips.clone());
            }
            let hot_list = compute_hot_list(&request);
            info!("Hot list: {} card(s) scored", hot_list.len());
            serde_json::to_string_pretty(&hot_list)?
        }
    };

    println!("{}", output);
    Ok(())
}
