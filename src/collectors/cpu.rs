use super::parse::{parse_f64_loose, parse_u64, percent};
use super::Field;
use crate::runner::CommandRunner;
use serde::Serialize;

pub const CORES_COMMAND: &str = "nproc";
pub const LOADAVG_COMMAND: &str = "cat /proc/loadavg";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CpuStat {
    pub total: Field,
    pub usage: Field,
    pub percentage_used: Field,
}

impl CpuStat {
    pub fn unknown() -> Self {
        Self {
            total: Field::Unknown,
            usage: Field::Unknown,
            percentage_used: Field::Unknown,
        }
    }
}

pub async fn collect_cpu(runner: &dyn CommandRunner) -> CpuStat {
    let (cores, loadavg) = tokio::join!(runner.run(CORES_COMMAND), runner.run(LOADAVG_COMMAND));
    parse_cpu(&cores, &loadavg)
}

pub fn parse_cpu(nproc_out: &str, loadavg_out: &str) -> CpuStat {
    let Some(cores) = parse_u64(nproc_out).filter(|c| *c > 0) else {
        return CpuStat::unknown();
    };
    let Some(load1) = loadavg_out
        .split_whitespace()
        .next()
        .and_then(parse_f64_loose)
        .filter(|v| *v >= 0.0)
    else {
        return CpuStat::unknown();
    };

    CpuStat {
        total: Field::Number(cores),
        usage: Field::Number(cores.min(load1.round() as u64)),
        percentage_used: percent(load1, cores as f64).into(),
    }
}
