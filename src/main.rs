mod agent;
mod args;
mod backend;
mod bench;
mod config;
mod control;
mod entry;
mod error;
mod logger;
mod protocol;
mod storage;

use error::AppResult;

fn main() -> AppResult<()> {
    entry::run()
}
