use std::path::{Path, PathBuf};

use clap::Parser;

use crate::agent::{AgentOptions, BinaryPaths, run_agent};
use crate::args::{Command, KvstressArgs};
use crate::control::run_control;
use crate::error::AppResult;
use crate::logger;

pub(crate) fn run() -> AppResult<()> {
    let args = KvstressArgs::parse();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    match args.command {
        Command::Control(control) => {
            logger::init_logging(args.verbose);
            runtime.block_on(run_control(Path::new(&control.config)))
        }
        Command::Agent(agent) => {
            let working_directory = PathBuf::from(&agent.working_directory);
            logger::init_file_logging(&working_directory.join("agent.log"), args.verbose)?;
            let options = AgentOptions {
                port: agent.agent_port,
                working_directory,
                binaries: BinaryPaths {
                    etcd: PathBuf::from(agent.etcd_binary),
                    consul: PathBuf::from(agent.consul_binary),
                    java: PathBuf::from(agent.java_binary),
                    zookeeper_classpath: agent.zookeeper_classpath,
                },
            };
            runtime.block_on(run_agent(options))
        }
    }
}
