use super::memory::{collect_swap, SwapStat};
use super::parse::{columns, parse_u64, percent};
use super::Field;
use crate::format::bytes_to_human;
use crate::runner::CommandRunner;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StorageStat {
    pub disk_total: Field,
    pub disk_usage: Field,
    pub disk_percentage_used: Field,
    pub swap_total: Field,
    pub swap_usage: Field,
    pub swap_percentage_used: Field,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiskStat {
    pub total: Field,
    pub usage: Field,
    pub percentage_used: Field,
}

impl DiskStat {
    pub fn unknown() -> Self {
        Self {
            total: Field::Unknown,
            usage: Field::Unknown,
            percentage_used: Field::Unknown,
        }
    }
}

pub fn df_command(mount: &str) -> String {
    format!("df --block-size=1 '{mount}'")
}

pub async fn collect_storage(runner: &dyn CommandRunner, mount: &str) -> StorageStat {
    let command = df_command(mount);
    let (df_out, swap) = tokio::join!(runner.run(&command), collect_swap(runner));
    merge_storage(parse_df(&df_out), swap)
}

pub fn merge_storage(disk: DiskStat, swap: SwapStat) -> StorageStat {
    StorageStat {
        disk_total: disk.total,
        disk_usage: disk.usage,
        disk_percentage_used: disk.percentage_used,
        swap_total: swap.total,
        swap_usage: swap.usage,
        swap_percentage_used: swap.percentage_used,
    }
}

pub fn parse_df(df_out: &str) -> DiskStat {
    let Some(line) = df_out.lines().map(str::trim).filter(|l| !l.is_empty()).last() else {
        return DiskStat::unknown();
    };
    let cols = columns(line);
    if cols.len() < 3 {
        return DiskStat::unknown();
    }
    let (Some(total), Some(used)) = (parse_u64(cols[1]), parse_u64(cols[2])) else {
        return DiskStat::unknown();
    };
    if total == 0 {
        return DiskStat::unknown();
    }

    DiskStat {
        total: Field::Text(bytes_to_human(total)),
        usage: Field::Text(bytes_to_human(used)),
        percentage_used: percent(used as f64, total as f64).into(),
    }
}
