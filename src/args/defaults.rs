pub(super) fn default_working_directory() -> String {
    std::env::var("HOME").unwrap_or_else(|_| ".".to_owned())
}

pub(super) const DEFAULT_ETCD_BINARY: &str = "/usr/local/bin/etcd";
pub(super) const DEFAULT_CONSUL_BINARY: &str = "/usr/local/bin/consul";
pub(super) const DEFAULT_JAVA_BINARY: &str = "/usr/bin/java";

// Release-specific; override per deployment.
pub(super) const DEFAULT_ZOOKEEPER_CLASSPATH: &str =
    "zookeeper-3.4.8.jar:lib/slf4j-api-1.6.1.jar:lib/slf4j-log4j12-1.6.1.jar:lib/log4j-1.2.16.jar:conf";
