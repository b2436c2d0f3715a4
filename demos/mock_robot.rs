//! Desktop demo driving a simulated robot from the terminal.
//!
//! The robot is an in-memory mock, so no Bluetooth adapter is needed. Type a
//! key name and press Enter to fire its binding:
//!
//! - `w` / `s` / `a` / `d`: drive
//! - `up`: light show
//! - `button_a` / `button_b`: the robot's hardware buttons
//! - `q`, or end of input: shut down
//!
//! # Usage
//!
//! ```sh
//! RUST_LOG=wac_robot=debug cargo run --example mock_robot
//! ```

use std::io::BufRead;
use std::thread;

use anyhow::Context;
use tracing_subscriber::EnvFilter;
use wac_robot::hal::MockLink;
use wac_robot::services::StatusReporter;
use wac_robot::traits::StatusDisplay;
use wac_robot::{Config, ControllerConfig, ControllerStatus, DeviceController, Key, Pattern};

/// Prints each status change on its own line.
struct TerminalDisplay;

impl StatusDisplay for TerminalDisplay {
    type Error = std::convert::Infallible;

    fn show(&mut self, status: &ControllerStatus) -> Result<(), Self::Error> {
        println!("[{:>12}] {}", status.state.as_str(), status.message);
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("wac_robot=info")),
        )
        .init();

    let link = MockLink::new()
        .with_device("WAC-2463", "F0:01")
        .with_device("WAC-7F36", "F0:02");
    let device = link.device();

    let config = Config::for_device("beep")
        .with_controller(ControllerConfig::default().with_ack_display_ms(500));
    // The guard finishes the robot however main returns.
    let mut controller = DeviceController::new(link, config)
        .context("resolving the robot nickname")?
        .into_guard();

    // Startup sequence: a progress bar while the lights warm up, saved so
    // it plays again after every key.
    let main = controller.main_queue();
    for step in 0..=5 {
        main.display_pattern(Pattern::progress(step * 5), 100);
    }
    main.set_color(0, 64, 0, 0).clear_display().save();

    controller.bind("w")?.set_motion(100, 100, 500).stop(0);
    controller.bind("s")?.set_motion(-100, -100, 500).stop(0);
    controller.bind("a")?.set_motion(-60, 60, 300).stop(0);
    controller.bind("d")?.set_motion(60, -60, 300).stop(0);
    controller
        .bind("up")?
        .set_color(255, 0, 0, 200)
        .set_color(0, 255, 0, 200)
        .set_color(0, 0, 255, 200)
        .emit_tone(880, 150)
        .set_color(0, 0, 0, 0);
    controller
        .router()
        .bind_key(Key::BUTTON_B)
        .display_text("Hi!", 1000)
        .clear_display();

    let reporter = StatusReporter::new(controller.subscribe_status(), TerminalDisplay);
    let reporter = tokio::spawn(reporter.run());

    controller
        .connect()
        .await
        .context("connecting to the simulated robot")?;

    let router = controller.router();
    let shutdown = controller.shutdown_handle();
    thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            let name = line.trim();
            if name == "q" {
                break;
            }
            match Key::parse(name) {
                Ok(key) if key == Key::BUTTON_A => {
                    device.press(1);
                }
                Ok(key) if key == Key::BUTTON_B => {
                    device.press(2);
                }
                Ok(key) => {
                    if !router.dispatch_key(key) {
                        println!("{key} is not bound");
                    }
                }
                Err(err) => println!("{err}"),
            }
        }
        shutdown.finish();
    });

    controller.run().await?;
    controller.close().await;
    reporter.await?;
    Ok(())
}
