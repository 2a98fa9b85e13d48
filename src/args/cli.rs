use clap::{Args, Parser, Subcommand};

use super::defaults::{
    DEFAULT_CONSUL_BINARY, DEFAULT_ETCD_BINARY, DEFAULT_JAVA_BINARY, DEFAULT_ZOOKEEPER_CLASSPATH,
    default_working_directory,
};

#[derive(Debug, Parser, Clone)]
#[clap(
    version,
    about = "Distributed key-value store benchmark harness for etcd, ZooKeeper, and Consul clusters."
)]
pub struct KvstressArgs {
    #[command(subcommand)]
    pub command: Command,

    /// Enable debug logging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the benchmark controller against a cluster of agents
    Control(ControlArgs),
    /// Run the database agent on a cluster node
    Agent(AgentArgs),
}

#[derive(Debug, Args, Clone)]
pub struct ControlArgs {
    /// TOML configuration file path
    #[arg(long, short = 'c')]
    pub config: String,
}

#[derive(Debug, Args, Clone)]
pub struct AgentArgs {
    /// Port the agent control endpoint listens on
    #[arg(long = "agent-port", default_value_t = 3500)]
    pub agent_port: u16,

    /// Working directory for logs, data directories, and monitor output
    #[arg(long = "working-directory", default_value_t = default_working_directory())]
    pub working_directory: String,

    /// Path to the etcd binary
    #[arg(long = "etcd-binary", env = "KVSTRESS_ETCD_BINARY", default_value = DEFAULT_ETCD_BINARY)]
    pub etcd_binary: String,

    /// Path to the consul binary
    #[arg(long = "consul-binary", env = "KVSTRESS_CONSUL_BINARY", default_value = DEFAULT_CONSUL_BINARY)]
    pub consul_binary: String,

    /// Path to the java binary used to launch ZooKeeper
    #[arg(long = "java-binary", env = "KVSTRESS_JAVA_BINARY", default_value = DEFAULT_JAVA_BINARY)]
    pub java_binary: String,

    /// Classpath passed to java for the ZooKeeper quorum peer
    #[arg(long = "zookeeper-classpath", default_value = DEFAULT_ZOOKEEPER_CLASSPATH)]
    pub zookeeper_classpath: String,
}
