#![warn(trivial_numeric_casts)]

mod config;
mod decoder;
mod device;
mod display;
mod frame;
mod macros;
mod renderer;
mod scheduler;

use std::{
    env,
    sync::{atomic::AtomicBool, mpsc, Arc},
    thread,
};

use eyre::{eyre, Result, WrapErr};
use log::info;

use config::SimConfig;
use device::pong::PongDevice;
use display::Display;
use frame::{FrameExchange, FrameReader};
use scheduler::{Scheduler, StopOnExit};

fn usage() {
    println!("Parameters:");
    println!("  --decimate <n>  -- decode only every n:th clock cycle");
    println!("  --frames <n>    -- stop after n frames");
    println!("  --seed <n>      -- seed for the initial ball direction");
    println!("  --headless      -- run without a window");
}

fn main() -> Result<()> {
    env_logger::init();
    let args: Vec<String> = env::args().skip(1).collect();

    if args.contains(&"--help".to_owned()) {
        usage();
        return Ok(());
    }

    let (config, headless) = SimConfig::from_args(&args).wrap_err("Invalid parameters")?;
    let timing = config.timing;

    let exchange = FrameExchange::new(timing.active_width, timing.active_height);
    let stop = Arc::new(AtomicBool::new(false));
    let device = PongDevice::new(timing, config.seed);
    let mut scheduler = Scheduler::new(device, config, exchange.clone(), stop.clone())?;
    let (ready_tx, ready_rx) = mpsc::channel();

    if headless {
        info!("Running headless");
        ready_tx.send(())?;
        scheduler.run(ready_rx)?;
        return Ok(());
    }

    // SDL has to stay on the main thread, so the simulation gets its own
    let guard = StopOnExit(stop.clone());
    let simulation = thread::spawn(move || {
        let _guard = guard;
        scheduler.run(ready_rx)
    });

    let shown = Display::new(timing.active_width, timing.active_height)
        .wrap_err("Unable to open display")
        .and_then(|mut display| display.run(FrameReader::new(exchange), ready_tx, &stop));
    stop.store(true, std::sync::atomic::Ordering::Relaxed);

    let simulated = simulation
        .join()
        .map_err(|_| eyre!("Simulation thread panicked"))?;
    shown?;
    simulated?;
    Ok(())
}
