use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tankwire::prelude::*;

// ---------------------------------------------------------------------------
// Agent
// ---------------------------------------------------------------------------

/// Picks uniformly between moving, rotating, using an ability and passing.
struct RandomAgent {
    rng: StdRng,
}

impl Agent for RandomAgent {
    fn on_joining_lobby(lobby: &LobbyInfo) -> Self {
        tracing::info!(
            player_id = %lobby.player_id,
            grid = lobby.grid_dimension(),
            "random agent joined"
        );
        RandomAgent {
            rng: StdRng::from_os_rng(),
        }
    }

    fn on_game_starting(&mut self) {
        tracing::info!("game starting");
    }

    fn next_move(&mut self, lobby: &LobbyInfo, snapshot: &WorldSnapshot) -> Action {
        let alive = snapshot.tank_of(&lobby.player_id).is_some();
        random_action(&mut self.rng, alive)
    }

    fn on_warning(&mut self, warning: &Warning) {
        tracing::warn!(%warning, "server warning");
    }

    fn on_game_ended(&mut self, game_end: &GameEnd) {
        match game_end.leader() {
            Some(leader) => {
                tracing::info!(winner = %leader.nickname, score = leader.score, "game over")
            }
            None => tracing::info!("game over"),
        }
    }
}

/// A dead (or not yet visible) tank can only pass.
fn random_action(rng: &mut impl Rng, alive: bool) -> Action {
    if !alive {
        return Action::Pass;
    }
    match rng.random_range(0..4) {
        0 => Action::Move(if rng.random_bool(0.5) {
            MoveDirection::Forward
        } else {
            MoveDirection::Backward
        }),
        1 => Action::Rotate {
            tank: random_rotation(rng),
            turret: random_rotation(rng),
        },
        2 => Action::Ability(match rng.random_range(0..5) {
            0 => AbilityKind::FireBullet,
            1 => AbilityKind::FireDoubleBullet,
            2 => AbilityKind::UseLaser,
            3 => AbilityKind::UseRadar,
            _ => AbilityKind::DropMine,
        }),
        _ => Action::Pass,
    }
}

fn random_rotation(rng: &mut impl Rng) -> Option<Rotation> {
    match rng.random_range(0..3) {
        0 => Some(Rotation::Left),
        1 => Some(Rotation::Right),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Startup
// ---------------------------------------------------------------------------

fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    if std::env::var("LOG_FORMAT").is_ok_and(|f| f == "json") {
        builder.json().with_current_span(true).init();
    } else {
        builder.compact().init();
    }
}

/// Reads `TANKWIRE_*` variables over the defaults.
fn config_from_env() -> Result<ClientConfig, Box<dyn std::error::Error>> {
    let mut config = ClientConfig::default().with_nickname("random-bot");
    if let Ok(host) = std::env::var("TANKWIRE_HOST") {
        config = config.with_host(host);
    }
    if let Ok(port) = std::env::var("TANKWIRE_PORT") {
        let port = port
            .parse()
            .map_err(|e| format!("TANKWIRE_PORT `{port}`: {e}"))?;
        config = config.with_port(port);
    }
    if let Ok(nickname) = std::env::var("TANKWIRE_NICKNAME") {
        config = config.with_nickname(nickname);
    }
    if let Ok(code) = std::env::var("TANKWIRE_JOIN_CODE") {
        config = config.with_join_code(code);
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let config = config_from_env()?;
    let session = ClientBuilder::new()
        .config(config)
        .connect::<RandomAgent>()
        .await?;

    session
        .run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "could not listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
        })
        .await?;
    Ok(())
}
