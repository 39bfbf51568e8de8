//! Check the capture engine and show effective configuration.

use framecast_capture_engine::{CaptureEngine, CommandEngine};
use framecast_common::config::ServiceConfig;

pub fn run(config: &ServiceConfig) -> anyhow::Result<()> {
    println!("Framecast System Check");
    println!("{}", "=".repeat(50));

    let engine = CommandEngine::from_config(&config.engine);
    if engine.is_available() {
        println!("[OK] Capture engine program: {}", engine.program());
    } else {
        println!(
            "[FAIL] Capture engine program not found: {} (set engine.program or FRAMECAST_ENGINE_PROGRAM)",
            engine.program()
        );
    }

    let temp_dir = config.engine.effective_temp_dir();
    match std::fs::create_dir_all(&temp_dir) {
        Ok(()) => println!("[OK] Temp directory: {}", temp_dir.display()),
        Err(e) => println!("[FAIL] Temp directory {}: {e}", temp_dir.display()),
    }

    println!();
    println!("Effective configuration:");
    println!("{}", serde_json::to_string_pretty(config)?);

    Ok(())
}
