use std::str::FromStr;

use clap::Parser;

use super::{BenchType, Database, KvstressArgs};

#[test]
fn database_parses_known_names() -> Result<(), String> {
    for (input, expected) in [
        ("etcdv2", Database::Etcdv2),
        ("etcdv3", Database::Etcdv3),
        ("zk", Database::Zookeeper),
        ("zookeeper", Database::Zookeeper),
        ("Consul", Database::Consul),
    ] {
        let parsed = Database::from_str(input).map_err(|err| format!("{}: {}", input, err))?;
        if parsed != expected {
            return Err(format!("{} parsed to {}", input, parsed));
        }
    }
    Ok(())
}

#[test]
fn database_rejects_unknown_names() -> Result<(), String> {
    if Database::from_str("redis").is_ok() {
        return Err("Expected redis to be rejected".to_owned());
    }
    Ok(())
}

#[test]
fn bench_type_parses_and_rejects() -> Result<(), String> {
    let write = BenchType::from_str("write").map_err(|err| err.to_string())?;
    if write != BenchType::Write {
        return Err("Expected write".to_owned());
    }
    let read = BenchType::from_str("READ").map_err(|err| err.to_string())?;
    if read != BenchType::Read {
        return Err("Expected read".to_owned());
    }
    if BenchType::from_str("scan").is_ok() {
        return Err("Expected scan to be rejected".to_owned());
    }
    Ok(())
}

#[test]
fn agent_subcommand_has_defaults() -> Result<(), String> {
    let args = KvstressArgs::try_parse_from(["kvstress", "agent"])
        .map_err(|err| format!("Parse failed: {}", err))?;
    match args.command {
        super::Command::Agent(agent) => {
            if agent.agent_port != 3500 {
                return Err(format!("Unexpected default port {}", agent.agent_port));
            }
            Ok(())
        }
        super::Command::Control(_) => Err("Expected agent subcommand".to_owned()),
    }
}
