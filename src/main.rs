mod cli;
mod errors;
mod passthru;
mod settings;

use cli::{Args, USAGE};
use jack_bridge::JackClient;
use log::{info, warn};
use passthru::Passthru;
use settings::PassthruSettings;
use std::io::{self, BufRead};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse(std::env::args().skip(1))?;
    if args.help {
        println!("{}", USAGE);
        return Ok(());
    }

    let mut settings = PassthruSettings::load_or_default(args.config.as_deref())?;
    if let Some(name) = args.name {
        settings.client.name = name;
    }
    if let Some(gain) = args.gain {
        settings.gain = gain;
    }
    settings.validate()?;

    let client = JackClient::from_config(&settings.client)?;
    info!(
        "Running '{}' at {} Hz, {} frames per block, gain {}",
        client.name(),
        client.sample_rate(),
        client.buffer_size(),
        settings.gain
    );

    let active = client.activate(Passthru::new(settings.gain))?;

    println!("Press Enter to quit");
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;

    let failures = active.handler_failures();
    let cycles = active.cycles();
    active.deactivate()?;

    if failures > 0 {
        warn!("{} of {} blocks failed", failures, cycles);
    }
    info!("Stopped after {} blocks", cycles);
    Ok(())
}
