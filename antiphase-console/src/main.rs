mod observer;
mod settings;

use std::io::{self, BufRead, Write};
use std::process::ExitCode;
use std::sync::Arc;

use antiphase_core::{BackendError, ControlSurface, SessionEngine};

use observer::LogObserver;
use settings::Settings;

fn main() -> ExitCode {
    env_logger::init();

    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            log::error!("Invalid configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let hardware = if settings.simulate_only {
        Err(BackendError::Unavailable("simulation requested".into()))
    } else {
        antiphase_windows::probe(settings.hardware.clone())
    };

    let mut engine = SessionEngine::new(settings.engine, hardware);
    engine.set_observer(Arc::new(LogObserver));
    let surface = ControlSurface::new(Arc::new(engine));

    let negotiation = surface.engine().negotiation();
    log::info!(
        "antiphase ready (hardware: {})",
        negotiation
            .hardware_backend
            .as_deref()
            .unwrap_or("unavailable, simulating")
    );

    match serve(&surface, io::stdin().lock(), io::stdout().lock()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("Console I/O failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// One JSON request per input line, one JSON response per output line.
fn serve(surface: &ControlSurface, input: impl BufRead, mut output: impl Write) -> io::Result<()> {
    for line in input.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let response = surface.dispatch_json(&line);
        serde_json::to_writer(&mut output, &response)?;
        writeln!(output)?;
        output.flush()?;
    }

    // Leave the audio path closed on exit.
    if let Err(e) = surface.engine().stop() {
        log::warn!("Stop on exit failed: {}", e);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use antiphase_core::EngineConfig;
    use serde_json::Value;

    #[test]
    fn serves_one_response_per_request_line() {
        let surface = ControlSurface::new(Arc::new(SessionEngine::simulated_only(EngineConfig::default())));
        let input = "{\"op\":\"discover\"}\n\n{\"op\":\"initialize\",\"endpointId\":\"input_sim\"}\n{\"op\":\"stop\"}\n";
        let mut output = Vec::new();

        serve(&surface, input.as_bytes(), &mut output).unwrap();

        let lines: Vec<Value> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0]["devices"].as_array().unwrap().len(), 2);
        assert_eq!(lines[1]["success"], true);
        assert_eq!(lines[2]["message"], "processing already stopped");
    }
}
