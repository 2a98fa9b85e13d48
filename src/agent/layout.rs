use std::path::PathBuf;

/// Fixed file layout under the agent's working directory.
#[derive(Debug, Clone)]
pub(crate) struct AgentLayout {
    root: PathBuf,
}

impl AgentLayout {
    pub(crate) fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub(crate) fn agent_log(&self) -> PathBuf {
        self.root.join("agent.log")
    }

    pub(crate) fn database_log(&self) -> PathBuf {
        self.root.join("database.log")
    }

    pub(crate) fn monitor_csv(&self) -> PathBuf {
        self.root.join("monitor.csv")
    }

    pub(crate) fn storage_key(&self) -> PathBuf {
        self.root.join("storage-key.json")
    }

    pub(crate) fn etcd_data_dir(&self) -> PathBuf {
        self.root.join("data.etcd")
    }

    pub(crate) fn consul_data_dir(&self) -> PathBuf {
        self.root.join("data.consul")
    }

    /// ZooKeeper runs with this as its current directory so relative
    /// classpath entries resolve.
    pub(crate) fn zookeeper_working_dir(&self) -> PathBuf {
        self.root.join("zookeeper")
    }

    pub(crate) fn zookeeper_data_dir(&self) -> PathBuf {
        self.zookeeper_working_dir().join("data.zk")
    }

    pub(crate) fn zookeeper_myid(&self) -> PathBuf {
        self.zookeeper_data_dir().join("myid")
    }

    pub(crate) fn zookeeper_config(&self) -> PathBuf {
        self.zookeeper_working_dir().join("zookeeper.config")
    }
}
