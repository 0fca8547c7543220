// ==========================================
// 人员调配系统 - 命令行入口
// ==========================================
// 用法:
//   staffing-fulfillment [--db PATH] [--strategy S] [--actor A] <command> [args...]
//
// 命令:
//   init-db                    建表（幂等）
//   import-roster <csv>        导入花名册
//   preview <id>...            批量预览（不提交）
//   fulfill <id>               单需求调配
//   bulk <id>...               批量调配
//   bulk-date <YYYY-MM-DD>     按日期批量调配
//   commit <selections.json>   按显式人选提交
//   revise <id>                需求修订
//
// 结果以 JSON 输出到 stdout，日志输出到 stderr
// ==========================================

use anyhow::{anyhow, bail, Context, Result};
use chrono::NaiveDate;
use serde::Serialize;
use staffing_fulfillment::app::{get_default_db_path, AppState};
use staffing_fulfillment::engine::{ExplicitSelection, FulfillmentStrategy};
use staffing_fulfillment::{logging, APP_NAME, VERSION};

struct CliArgs {
    db_path: String,
    strategy: FulfillmentStrategy,
    actor: String,
    command: String,
    rest: Vec<String>,
}

fn parse_args() -> Result<CliArgs> {
    let mut db_path = None;
    let mut strategy = FulfillmentStrategy::default();
    let mut actor = "cli".to_string();
    let mut positional = Vec::new();

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--db" => db_path = Some(args.next().context("--db 需要参数")?),
            "--strategy" => {
                let raw = args.next().context("--strategy 需要参数")?;
                strategy = raw.parse().map_err(|e: String| anyhow!(e))?;
            }
            "--actor" => actor = args.next().context("--actor 需要参数")?,
            _ => positional.push(arg),
        }
    }

    if positional.is_empty() {
        bail!("缺少命令（init-db / import-roster / preview / fulfill / bulk / bulk-date / commit / revise）");
    }
    let command = positional.remove(0);

    Ok(CliArgs {
        db_path: db_path.unwrap_or_else(get_default_db_path),
        strategy,
        actor,
        command,
        rest: positional,
    })
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn require_args(rest: &[String], what: &str) -> Result<()> {
    if rest.is_empty() {
        bail!("缺少参数: {}", what);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();

    let args = parse_args()?;
    tracing::info!("{} v{}，数据库: {}", APP_NAME, VERSION, args.db_path);

    let state = AppState::new(args.db_path.clone()).map_err(|e| anyhow!(e))?;
    let api = state.fulfillment_api.clone();

    match args.command.as_str() {
        "init-db" => {
            print_json(&serde_json::json!({ "db_path": state.get_db_path(), "ok": true }))?;
        }
        "import-roster" => {
            require_args(&args.rest, "<csv>")?;
            let summary = state.import_api.import_roster(&args.rest[0], &args.actor)?;
            print_json(&summary)?;
        }
        "preview" => {
            require_args(&args.rest, "<id>...")?;
            let preview = api.preview_bulk(&args.rest, args.strategy).await?;
            print_json(&preview)?;
        }
        "fulfill" => {
            require_args(&args.rest, "<id>")?;
            let response = api.fulfill(&args.rest[0], args.strategy, &args.actor).await?;
            print_json(&response)?;
        }
        "bulk" => {
            require_args(&args.rest, "<id>...")?;
            let result = api.bulk_fulfill(&args.rest, args.strategy, &args.actor).await?;
            print_json(&result)?;
        }
        "bulk-date" => {
            require_args(&args.rest, "<YYYY-MM-DD>")?;
            let date = NaiveDate::parse_from_str(&args.rest[0], "%Y-%m-%d")
                .with_context(|| format!("日期格式错误: {}", args.rest[0]))?;
            let ids: Vec<String> = api
                .list_requests_by_date(date)?
                .into_iter()
                .filter(|r| !r.is_fulfilled())
                .map(|r| r.request_id)
                .collect();
            if ids.is_empty() {
                bail!("{} 没有待满足的需求", date);
            }
            let result = api.bulk_fulfill(&ids, args.strategy, &args.actor).await?;
            print_json(&result)?;
        }
        "commit" => {
            require_args(&args.rest, "<selections.json>")?;
            let raw = std::fs::read_to_string(&args.rest[0])
                .with_context(|| format!("无法读取文件: {}", args.rest[0]))?;
            let selections: Vec<ExplicitSelection> =
                serde_json::from_str(&raw).context("人选文件格式错误")?;
            let result = api.commit_selections(&selections, &args.actor).await?;
            print_json(&result)?;
        }
        "revise" => {
            require_args(&args.rest, "<id>")?;
            let receipt = api.request_revision(&args.rest[0], &args.actor).await?;
            print_json(&receipt)?;
        }
        other => bail!("未知命令: {}", other),
    }

    Ok(())
}
