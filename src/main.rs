use std::env;

use anyhow::Context;
use log::info;
use montecarlo::SweepConfig;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    // The only argument is an optional JSON config, the reference sweep runs otherwise.
    let config = match env::args().nth(1) {
        Some(path) => {
            SweepConfig::load(&path).with_context(|| format!("loading config from '{path}'"))?
        }
        None => SweepConfig::default(),
    };

    let written = montecarlo::run(config).context("variance sweep failed")?;

    info!("done, {} result file(s) written", written.len());
    Ok(())
}
