//! CAT terminal client.
//!
//! Attaches to one game and reads commands from stdin. Type `help` for the
//! command list.

use anyhow::{anyhow, bail, Context};
use cat_client::{
    ClientConfig, HttpTransport, SessionEvent, SubmitError, SyncCoordinator, SyncPhase,
};
use cat_core::{BoardGeometry, CardKind, FigureId, GameView, PlayerColor};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

type Coordinator = SyncCoordinator<HttpTransport>;

const HELP: &str = "\
commands:
  state                      show the board and your hand
  card <n>                   select (or deselect) hand card n
  figure <color> <n>         click figure n of a color
  joker <name>               imitate a card with the selected Joker (8, Start, Swap Card, ...)
  jokers                     list cards a Joker can imitate
  inferno <color> <n> <k>    give figure n k Inferno steps (0 removes it)
  actions                    list playable actions and missing choices
  play [n]                   submit action n (default 0)
  cancel                     cancel the Joker choice and reset the selection
  reset                      clear the selection
  refresh                    refetch the game state
  quit";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ClientConfig::from_env()?;
    let geometry = BoardGeometry::new(config.rules)?;

    info!("Connecting to {}", config.server_url);
    let transport = HttpTransport::new(config.server_url.clone(), config.ws_url.clone());
    let (coordinator, mut events) =
        SyncCoordinator::new(transport, config.game_id, config.player_id, config.rules);

    coordinator
        .attach()
        .await
        .context("Could not load the game")?;
    print_state(&coordinator, &geometry);
    println!("{}", HELP);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match handle_command(&coordinator, &geometry, line.trim()).await {
                    Ok(true) => {}
                    Ok(false) => break,
                    Err(e) => println!("! {}", e),
                }
            }
            event = events.recv() => {
                let Some(event) = event else { break };
                match event {
                    SessionEvent::StateChanged => print_state(&coordinator, &geometry),
                    SessionEvent::SelectionChanged => print_selection(&coordinator),
                    SessionEvent::FetchFailed(e) => warn!("Showing stale state: {}", e),
                    SessionEvent::PushLost => {
                        warn!("Live updates lost; use `refresh` to update the board")
                    }
                    SessionEvent::Closed { reason } => {
                        println!("Game closed: {}", reason);
                        break;
                    }
                }
            }
        }
    }

    coordinator.detach();
    Ok(())
}

/// Run one command. Returns `false` to quit.
async fn handle_command(
    coordinator: &Coordinator,
    geometry: &BoardGeometry,
    line: &str,
) -> anyhow::Result<bool> {
    let mut words = line.split_whitespace();
    let Some(command) = words.next() else {
        return Ok(true);
    };
    let args: Vec<&str> = words.collect();

    match command {
        "help" => println!("{}", HELP),
        "state" => print_state(coordinator, geometry),
        "card" => {
            let index = parse_arg::<usize>(&args, 0, "card index")?;
            coordinator.select_card(index)?;
        }
        "figure" => {
            let figure = figure_arg(coordinator, &args)?;
            coordinator.select_figure(figure)?;
        }
        "joker" => {
            let name = args.join(" ");
            let kind = CardKind::parse_imitation(&name)
                .ok_or_else(|| anyhow!("Unknown card to imitate: {}", name))?;
            coordinator.set_joker_imitation(kind)?;
        }
        "jokers" => {
            let options: Vec<String> = coordinator
                .joker_options()
                .iter()
                .filter_map(|kind| kind.imitate_card_name())
                .collect();
            println!("{}", options.join(", "));
        }
        "inferno" => {
            let figure = figure_arg(coordinator, &args)?;
            let steps = parse_arg::<i64>(&args, 2, "steps")?;
            coordinator.allocate_inferno(figure, steps)?;
        }
        "actions" => print_actions(coordinator),
        "play" => {
            let index = if args.is_empty() {
                0
            } else {
                parse_arg::<usize>(&args, 0, "action index")?
            };
            let actions = coordinator.submittable_actions();
            let planned = actions
                .get(index)
                .ok_or_else(|| anyhow!("No action {}; try `actions`", index))?;
            match coordinator.submit(planned).await {
                Ok(response) => println!("{}", response.message),
                Err(SubmitError::Rejected { reason, .. }) => println!("Server: {}", reason),
                Err(e) => return Err(e.into()),
            }
        }
        "cancel" => coordinator.cancel_joker_imitation()?,
        "reset" => coordinator.reset_selection()?,
        "refresh" => {
            coordinator.refresh().await?;
        }
        "quit" | "exit" => return Ok(false),
        other => bail!("Unknown command `{}`; type `help`", other),
    }
    Ok(true)
}

fn parse_arg<T: std::str::FromStr>(args: &[&str], at: usize, what: &str) -> anyhow::Result<T> {
    let raw = args.get(at).ok_or_else(|| anyhow!("Missing {}", what))?;
    raw.parse()
        .map_err(|_| anyhow!("Invalid {}: {}", what, raw))
}

/// Resolve `<color> <n>` to a figure id from the current state
fn figure_arg(coordinator: &Coordinator, args: &[&str]) -> anyhow::Result<FigureId> {
    let name = args.first().ok_or_else(|| anyhow!("Missing color"))?;
    let color = PlayerColor::ALL
        .iter()
        .copied()
        .find(|c| c.as_str() == *name)
        .ok_or_else(|| anyhow!("Unknown color: {}", name))?;
    let index = parse_arg::<usize>(args, 1, "figure number")?;

    let state = coordinator
        .snapshot()
        .ok_or_else(|| anyhow!("No game state yet"))?;
    state
        .players
        .iter()
        .find(|p| p.color == color)
        .and_then(|p| p.figures.get(index))
        .map(|f| f.uuid)
        .ok_or_else(|| anyhow!("No {} figure {}", name, index))
}

fn print_state(coordinator: &Coordinator, geometry: &BoardGeometry) {
    let phase = coordinator.phase();
    let Some(state) = coordinator.snapshot() else {
        println!("[{:?}] no game state", phase);
        return;
    };
    if phase == (SyncPhase::Active { stale: true }) {
        println!("(stale)");
    }
    print_board(&state, geometry, coordinator.player_id());

    if let Some(player) = state.current_player() {
        let clock = coordinator
            .turn_remaining()
            .map(|left| format!(", {}s left", left.as_secs()))
            .unwrap_or_default();
        println!(
            "Round {}: {}'s turn ({}){}",
            state.round_number,
            player.name,
            player.color.as_str(),
            clock
        );
    }
    if let Some(card) = &state.last_played_card {
        println!("Last played: {}", card.name);
    }
    if let Some(me) = state.local_player(coordinator.player_id()) {
        let hand: Vec<String> = me
            .cards
            .cards()
            .iter()
            .enumerate()
            .map(|(i, card)| format!("[{}] {}", i, card.kind.label()))
            .collect();
        println!("Hand: {}", hand.join("  "));
    }
    if state.game_over {
        println!("Game over");
    }
}

fn print_board(state: &GameView, geometry: &BoardGeometry, me: uuid::Uuid) {
    for player in &state.players {
        let marker = if player.uuid == Some(me) { "*" } else { " " };
        let figures: Vec<String> = player
            .figures
            .iter()
            .enumerate()
            .map(|(i, figure)| {
                match geometry.to_cell(figure.color, figure.position, i) {
                    Ok(cell) => format!("{}@{}", i, cell.grid_area()),
                    Err(e) => {
                        error!("{}", e);
                        format!("{}@?", i)
                    }
                }
            })
            .collect();
        println!(
            "{} {:<8} {:<12} cards:{:<2} {}",
            marker,
            player.color.as_str(),
            player.name,
            player.cards.len(),
            figures.join(" ")
        );
    }
}

fn print_selection(coordinator: &Coordinator) {
    let selection = coordinator.selection();
    let mut parts = Vec::new();
    if let Some(card) = selection.selected_card() {
        parts.push(format!("card {}", card));
    }
    if let Some(kind) = selection.joker_imitation() {
        parts.push(format!("as {}", kind.label()));
    }
    if let Some(figure) = selection.selected_figure() {
        parts.push(format!("figure {}", figure));
    }
    if let Some(target) = selection.target_figure() {
        parts.push(format!("target {}", target));
    }
    for (figure, steps) in selection.inferno_plan() {
        parts.push(format!("{}x{}", figure, steps));
    }
    if parts.is_empty() {
        println!("Selection cleared");
    } else {
        println!("Selected: {}", parts.join(", "));
    }
}

fn print_actions(coordinator: &Coordinator) {
    let actions = coordinator.submittable_actions();
    if actions.is_empty() {
        println!("Missing: {:?}", coordinator.requirements());
        return;
    }
    for (i, action) in actions.iter().enumerate() {
        println!("[{}] {}", i, action.describe());
    }
}
