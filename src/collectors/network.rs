use super::parse::parse_u64;
use super::Field;
use crate::format::bytes_to_human;
use crate::runner::CommandRunner;
use serde::Serialize;

pub const NET_DEV_COMMAND: &str = "cat /proc/net/dev";

/// Column count of a well-formed `/proc/net/dev` row, counting the
/// interface label as column 0.
const NET_DEV_COLUMNS: usize = 17;
const RX_BYTES_COLUMN: usize = 1;
const TX_BYTES_COLUMN: usize = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Connectivity {
    Connected,
    Disconnected,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkStat {
    pub status: Connectivity,
    pub download: Field,
    pub upload: Field,
}

pub fn ping_command(probe_host: &str) -> String {
    format!("ping -c 1 {probe_host}")
}

pub async fn collect_network(
    runner: &dyn CommandRunner,
    interface: &str,
    probe_host: &str,
) -> NetworkStat {
    let ping = ping_command(probe_host);
    let (ping_out, net_dev) = tokio::join!(runner.run(&ping), runner.run(NET_DEV_COMMAND));
    let (download, upload) = parse_net_dev(&net_dev, interface);
    NetworkStat {
        status: parse_ping(&ping_out),
        download,
        upload,
    }
}

/// Connected only when the ping summary reports exactly one reply, e.g.
/// `1 packets transmitted, 1 received, 0% packet loss`.
pub fn parse_ping(ping_out: &str) -> Connectivity {
    let received = ping_out
        .lines()
        .filter(|line| line.contains("transmitted"))
        .flat_map(|line| line.split(','))
        .find_map(|part| {
            let part = part.trim();
            let count = part
                .strip_suffix("packets received")
                .or_else(|| part.strip_suffix("received"))?;
            parse_u64(count)
        });

    match received {
        Some(1) => Connectivity::Connected,
        _ => Connectivity::Disconnected,
    }
}

/// Returns `(download, upload)` for `interface`. The label is split off at
/// its colon, because large counters can butt up against it.
pub fn parse_net_dev(net_dev: &str, interface: &str) -> (Field, Field) {
    let row = net_dev.lines().find_map(|line| {
        let (label, counters) = line.split_once(':')?;
        (label.trim() == interface).then_some(counters)
    });
    let Some(counters) = row else {
        return (Field::Unknown, Field::Unknown);
    };

    let mut cols = vec![interface];
    cols.extend(counters.split_whitespace());
    if cols.len() < NET_DEV_COLUMNS {
        return (Field::Unknown, Field::Unknown);
    }

    // Both or neither: half a reading is as malformed as none.
    match (parse_u64(cols[RX_BYTES_COLUMN]), parse_u64(cols[TX_BYTES_COLUMN])) {
        (Some(rx), Some(tx)) => (bytes_to_human(rx).into(), bytes_to_human(tx).into()),
        _ => (Field::Unknown, Field::Unknown),
    }
}
