use clap::Parser;
use client::app::App;
use client::game::GameSession;
use client::network::{spawn_worker, ClientConfig};
use client::rendering::Renderer;
use log::{error, info};
use macroquad::prelude::*;
use std::time::{Duration, Instant};

const WINDOW_WIDTH: usize = 800;
const WINDOW_HEIGHT: usize = 600;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Scoreboard server address
    #[arg(short = 's', long, default_value = "127.0.0.1:8080")]
    server: String,

    /// Scoreboard the scores and comments belong to
    #[arg(short = 'c', long, default_value = "local")]
    context: String,

    /// Name shown next to your comments
    #[arg(short = 'u', long)]
    user: Option<String>,

    /// How long to wait for a scoreboard reply, in milliseconds
    #[arg(short = 't', long, default_value = "2000")]
    timeout_ms: u64,

    /// Play without contacting the scoreboard
    #[arg(long)]
    offline: bool,
}

fn window_conf() -> Conf {
    Conf {
        window_title: "Snake".to_owned(),
        window_width: WINDOW_WIDTH as i32,
        window_height: WINDOW_HEIGHT as i32,
        window_resizable: false,
        ..Default::default()
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    info!("Starting client...");
    info!("Controls: arrows/WASD to steer, Space to start/pause/restart");
    info!("Tab to type a comment, Enter to submit your score");

    let network = if args.offline {
        info!("Offline mode, scores stay local");
        None
    } else {
        info!("Scoreboard: {} (context {})", args.server, args.context);
        let config = ClientConfig {
            server: args.server,
            context: Some(args.context),
            user: args.user,
            timeout: Duration::from_millis(args.timeout_ms),
        };
        match spawn_worker(config) {
            Ok(handle) => Some(handle),
            Err(e) => {
                error!("Could not start network worker: {}", e);
                None
            }
        }
    };

    let renderer = Renderer::new(WINDOW_WIDTH, WINDOW_HEIGHT);
    let mut app = App::new(GameSession::new(), network, renderer);
    app.load();

    loop {
        app.frame(Instant::now());
        next_frame().await;
    }
}
