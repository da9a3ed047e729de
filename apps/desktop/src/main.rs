use drivetime::{enter_runtime, get_default_config, init_logging, App, InputEvent, MouseButton};
use std::io::{self, BufRead, Write};
use std::time::{Duration, Instant};
use tracing::{event, Level};

const VIEWPORT: (f64, f64) = (1280.0, 720.0);
const WAIT_TIMEOUT: Duration = Duration::from_secs(30);

const HELP: &str = "\
commands:
  click <x> <y>    left click at a screen pixel
  tap <x> <y>      touch tap at a screen pixel
  resize <w> <h>   change the viewport size
  wait             block until running queries finish
  show             print the scene as JSON
  quit";

enum Command {
    Click(f64, f64),
    Tap(f64, f64),
    Resize(f64, f64),
    Wait,
    Show,
    Quit,
}

fn parse_command(line: &str) -> Result<Command, String> {
    let mut words = line.split_whitespace();
    let name = words.next().unwrap_or_default();
    let mut pair = || -> Result<(f64, f64), String> {
        let mut next = || -> Result<f64, String> {
            words
                .next()
                .ok_or_else(|| format!("{name}: expected two numbers"))?
                .parse::<f64>()
                .map_err(|e| format!("{name}: {e}"))
        };
        Ok((next()?, next()?))
    };

    match name {
        "click" => pair().map(|(x, y)| Command::Click(x, y)),
        "tap" => pair().map(|(x, y)| Command::Tap(x, y)),
        "resize" => pair().map(|(w, h)| Command::Resize(w, h)),
        "wait" => Ok(Command::Wait),
        "show" => Ok(Command::Show),
        "quit" | "exit" => Ok(Command::Quit),
        other => Err(format!("unknown command '{other}'")),
    }
}

fn wait_for_queries(app: &App) {
    let deadline = Instant::now() + WAIT_TIMEOUT;
    while app.controller().pending_queries() > 0 {
        if Instant::now() > deadline {
            log::warn!("Gave up waiting for the routing service");
            return;
        }
        std::thread::sleep(Duration::from_millis(50));
    }
}

fn main() {
    let _ = dotenv::dotenv();
    init_logging();

    let _guard = enter_runtime();
    let config = get_default_config();

    let mut app = match pollster::block_on(App::bootstrap(config, VIEWPORT)) {
        Ok(app) => app,
        Err(e) => {
            event!(Level::ERROR, error = %e, "Failed to start");
            std::process::exit(1);
        }
    };

    println!("{HELP}");
    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let Ok(line) = line else { break };
        if line.trim().is_empty() {
            continue;
        }

        match parse_command(&line) {
            Ok(Command::Click(x, y)) => {
                app.input(InputEvent::MouseMoved(x, y));
                app.input(InputEvent::MouseButtonPressed(MouseButton::Left));
                app.input(InputEvent::MouseButtonReleased(MouseButton::Left));
            }
            Ok(Command::Tap(x, y)) => {
                app.input(InputEvent::GestureTap { x, y });
            }
            Ok(Command::Resize(w, h)) => app.resize(w, h),
            Ok(Command::Wait) => wait_for_queries(&app),
            Ok(Command::Show) => match serde_json::to_string_pretty(&app.snapshot()) {
                Ok(json) => println!("{json}"),
                Err(e) => log::error!("Failed to serialize scene: {e}"),
            },
            Ok(Command::Quit) => break,
            Err(e) => {
                eprintln!("{e}");
                eprintln!("{HELP}");
            }
        }
        let _ = io::stdout().flush();
    }
}
