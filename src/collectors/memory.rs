use super::parse::{columns, line_with_label, parse_u64, percent};
use super::Field;
use crate::format::bytes_to_human;
use crate::runner::CommandRunner;
use serde::Serialize;

pub const FREE_COMMAND: &str = "free -k";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemoryStat {
    pub total: Field,
    pub usage: Field,
    pub percentage_used: Field,
}

impl MemoryStat {
    pub fn unknown() -> Self {
        Self {
            total: Field::Unknown,
            usage: Field::Unknown,
            percentage_used: Field::Unknown,
        }
    }
}

/// Swap falls back to numeric zeros rather than `"unknown"`: a host without
/// swap is normal, not a collection failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SwapStat {
    pub total: Field,
    pub usage: Field,
    pub percentage_used: Field,
}

impl SwapStat {
    pub fn zero() -> Self {
        Self {
            total: Field::Number(0),
            usage: Field::Number(0),
            percentage_used: Field::Number(0),
        }
    }
}

pub async fn collect_memory(runner: &dyn CommandRunner) -> MemoryStat {
    parse_memory(&runner.run(FREE_COMMAND).await)
}

pub async fn collect_swap(runner: &dyn CommandRunner) -> SwapStat {
    parse_swap(&runner.run(FREE_COMMAND).await)
}

pub fn parse_memory(free_out: &str) -> MemoryStat {
    match used_and_total_bytes(free_out, "Mem:") {
        Some((total, used)) if total > 0 => MemoryStat {
            total: Field::Text(bytes_to_human(total)),
            usage: Field::Text(bytes_to_human(used)),
            percentage_used: percent(used as f64, total as f64).into(),
        },
        _ => MemoryStat::unknown(),
    }
}

pub fn parse_swap(free_out: &str) -> SwapStat {
    match used_and_total_bytes(free_out, "Swap:") {
        Some((total, used)) if total > 0 => SwapStat {
            total: Field::Text(bytes_to_human(total)),
            usage: Field::Text(bytes_to_human(used)),
            percentage_used: percent(used as f64, total as f64)
                .map(Field::Number)
                .unwrap_or(Field::Number(0)),
        },
        _ => SwapStat::zero(),
    }
}

fn used_and_total_bytes(free_out: &str, label: &str) -> Option<(u64, u64)> {
    let line = line_with_label(free_out, label)?;
    let cols = columns(line);
    if cols.len() < 3 {
        return None;
    }
    let total_kb = parse_u64(cols[1])?;
    let used_kb = parse_u64(cols[2])?;
    Some((total_kb.saturating_mul(1024), used_kb.saturating_mul(1024)))
}
