use std::io::Write;

use crate::args::{BenchType, Database};

use super::load_run_config;

const EXAMPLE: &str = r#"
database = "etcdv3"
test_name = "nightly-etcdv3"
peer_ips = ["10.0.0.1", "10.0.0.2", "10.0.0.3"]
agent_port = 3500
database_port = 2379

[step1]
skip = false

[step2]
bench_type = "write"
key_size = 64
value_size = 256
total_requests = 1000
clients = 5
connections = 5

[step3]
skip = true

[storage]
project = "bench"
bucket = "bench-logs"
subdirectory = "nightly"
"#;

fn write_temp_config(content: &str) -> Result<tempfile::NamedTempFile, String> {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .map_err(|err| format!("Failed to create temp file: {}", err))?;
    file.write_all(content.as_bytes())
        .map_err(|err| format!("Failed to write temp file: {}", err))?;
    Ok(file)
}

#[test]
fn example_config_loads() -> Result<(), String> {
    let file = write_temp_config(EXAMPLE)?;
    let config =
        load_run_config(file.path()).map_err(|err| format!("Load failed: {}", err))?;

    if config.database != Database::Etcdv3 {
        return Err(format!("Unexpected database {}", config.database));
    }
    if config.step2.bench_type != BenchType::Write {
        return Err("Expected write bench type".to_owned());
    }
    if !config.step3.skip {
        return Err("Expected step3 to be skipped".to_owned());
    }
    if config.peer_ip_string() != "10.0.0.1___10.0.0.2___10.0.0.3" {
        return Err(format!("Unexpected peer string {}", config.peer_ip_string()));
    }
    let agents = config.agent_endpoints();
    if agents.first().map(String::as_str) != Some("10.0.0.1:3500") {
        return Err(format!("Unexpected agent endpoints {:?}", agents));
    }
    let databases = config.database_endpoints();
    if databases.last().map(String::as_str) != Some("10.0.0.3:2379") {
        return Err(format!("Unexpected database endpoints {:?}", databases));
    }
    Ok(())
}

#[test]
fn unknown_database_is_rejected() -> Result<(), String> {
    let content = EXAMPLE.replace("\"etcdv3\"", "\"redis\"");
    let file = write_temp_config(&content)?;
    if load_run_config(file.path()).is_ok() {
        return Err("Expected unknown database to fail".to_owned());
    }
    Ok(())
}

#[test]
fn zero_clients_is_rejected() -> Result<(), String> {
    let content = EXAMPLE.replace("clients = 5", "clients = 0");
    let file = write_temp_config(&content)?;
    if load_run_config(file.path()).is_ok() {
        return Err("Expected zero clients to fail".to_owned());
    }
    Ok(())
}

#[test]
fn skipped_step2_is_not_validated() -> Result<(), String> {
    let content = EXAMPLE.replace("bench_type = \"write\"", "bench_type = \"write\"\nskip = true")
        .replace("total_requests = 1000", "total_requests = 0");
    let file = write_temp_config(&content)?;
    load_run_config(file.path()).map_err(|err| format!("Load failed: {}", err))?;
    Ok(())
}

#[test]
fn zookeeper_alias_is_accepted() -> Result<(), String> {
    let content = EXAMPLE.replace("\"etcdv3\"", "\"zk\"");
    let file = write_temp_config(&content)?;
    let config =
        load_run_config(file.path()).map_err(|err| format!("Load failed: {}", err))?;
    if config.database != Database::Zookeeper {
        return Err(format!("Unexpected database {}", config.database));
    }
    Ok(())
}
