use std::process::ExitCode;
use std::time::Instant;

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde_json::Value;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use card_pile::app::PileController;
use card_pile::config::PileConfig;
use card_pile::domain::core::Rect;
use card_pile::domain::{DataSource, Direction};
use card_pile::fakedata::{Model, RecordSet};
use card_pile::input::ActivationZones;
use card_pile::ui::{LayoutMetrics, PileLayout, PileRenderer, RecordingCard};

type DemoPile = PileController<RecordSet, RecordingCard<Value>>;

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(%err, "card pile demo failed");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = PileConfig::load()?;

    let mut rng = StdRng::seed_from_u64(17);
    let records = RecordSet::generate(&Model::polaroid(), config.capacity * 3, &mut rng);
    let cards = RecordingCard::pile(config.capacity);
    let mut pile: DemoPile = PileController::new(&config, records, cards)?;
    log_pile(&pile, "initial");

    let metrics = LayoutMetrics::from_config(&config);
    let pile_width = metrics.card_width as i32 * 2;
    let container = Rect::new(0, 0, pile_width * 2, metrics.card_height as i32);
    let zones = ActivationZones::from_container(container, config.zone_fraction);

    // left strip: tilt the top card, then let it report back
    let click = zones.forward_zone();
    if let Some(outcome) = pile.handle_activation(&zones, click.x + 1, click.y + 1) {
        info!(?outcome, "left activation");
    }
    pile.on_tilt_finished(Direction::Forward)?;
    log_pile(&pile, "after forward");

    // right strip twice while the first tilt is still animating
    let click = zones.backward_zone();
    for _ in 0..2 {
        if let Some(outcome) = pile.handle_activation(&zones, click.x + 1, click.y + 1) {
            info!(?outcome, "right activation");
        }
    }
    pile.on_tilt_finished(Direction::Backward)?;
    pile.on_tilt_finished(Direction::Backward)?;
    log_pile(&pile, "after two backward");

    // a stray completion from an unrelated card
    if let Err(err) = pile.on_tilt_finished(Direction::Forward) {
        warn!(%err, "stray notification ignored");
    }

    let page = pile.advance_page()?;
    info!(page, "advanced page");
    log_pile(&pile, "after page advance");

    // a card that never finishes its tilt
    let start = Instant::now();
    pile.request_rotation_at(Direction::Forward, start)?;
    if let Some(abandoned) = pile.check_timeout(start + pile.tilt_timeout()) {
        info!(target = %abandoned.target, "abandoned stuck rotation");
    }

    let layout = PileLayout::from_controller(&pile, &metrics);
    let renderer = PileRenderer::new();
    let pixmap = renderer.render(&layout)?;
    info!(
        width = pixmap.width(),
        height = pixmap.height(),
        bytes = renderer.pixmap_to_rgba(&pixmap).len(),
        front = ?layout.front().map(|placement| placement.slot),
        "pile rendered"
    );

    Ok(())
}

fn log_pile(pile: &DemoPile, label: &str) {
    for slot in pile.order().slots() {
        let caption = pile
            .bound_record(*slot)
            .and_then(|index| pile.source().text_field(index, "caption"))
            .unwrap_or("-");
        info!(
            label,
            %slot,
            z = ?pile.z_rank_of(*slot).map(|rank| rank.value()),
            record = ?pile.bound_record(*slot),
            caption,
            records = pile.source().len(),
            page = pile.window().page_index(),
            progress = pile.window().progress(),
            "pile slot"
        );
    }
}
