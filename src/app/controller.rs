//! Pile controller and coordination layer
//!
//! The controller owns the slot order, the data window and the cards bound to
//! each slot. It turns user commands into tilts on the extreme card and only
//! commits a rotation once that card reports its animation finished.

use std::collections::VecDeque;
use std::str::FromStr;
use std::time::{Duration, Instant};

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::app::state::{Effect, PendingRotation, PileState, StateEvent, StateMachine};
use crate::config::PileConfig;
use crate::domain::error::{DropReason, PileError, UnmatchedReason};
use crate::domain::order::{Direction, PileOrder, SlotId, ZRank, ZRanks};
use crate::domain::window::{DataSource, DataWindow};
use crate::input::zones::{ActivationZones, PileCommand};
use crate::ui::card::Card;

/// What happens to a rotation request while another is in flight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlapPolicy {
    /// Run it after the current rotation completes
    #[default]
    Queue,
    /// Drop it
    Ignore,
}

impl FromStr for OverlapPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "queue" => Ok(OverlapPolicy::Queue),
            "ignore" => Ok(OverlapPolicy::Ignore),
            other => Err(format!("unknown overlap policy '{other}'")),
        }
    }
}

/// Result of a rotation request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    /// The tilt went out to this slot's card
    Issued { target: SlotId },
    /// Waiting behind the in-flight rotation
    Queued { waiting: usize },
}

/// A rotation that was finalized by its completion notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationCommitted {
    pub direction: Direction,
    /// Front slot after the rotation
    pub top: SlotId,
    pub progress: usize,
    /// Target of the queued rotation issued right after this one
    pub next: Option<SlotId>,
}

/// Result of a dispatched [`PileCommand`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    Rotation(RequestOutcome),
    Page(usize),
}

/// Main pile controller
///
/// Cards are handed over in slot order: the first card is `slot-0`, which
/// starts at the front of the pile.
pub struct PileController<S, C>
where
    S: DataSource,
    C: Card<Record = S::Record>,
{
    order: PileOrder,
    /// Ranks last pushed to the cards
    applied_ranks: ZRanks,
    window: DataWindow,
    source: S,
    cards: Vec<Option<C>>,
    /// Record index shown by each slot
    bound_records: Vec<Option<usize>>,
    state: PileState,
    overlap_policy: OverlapPolicy,
    queue: VecDeque<Direction>,
    queue_limit: usize,
    tilt_timeout: Duration,
}

impl<S, C> PileController<S, C>
where
    S: DataSource,
    C: Card<Record = S::Record>,
{
    /// Creates a controller, applies initial ranks and binds the first window
    ///
    /// # Arguments
    /// * `config` - Capacity, policies and timeout for the pile
    /// * `source` - Records the window pages through
    /// * `cards` - One card per slot, `slot-0` first
    ///
    /// # Returns
    /// The bound controller, or the first error hit while binding
    pub fn new(config: &PileConfig, source: S, cards: Vec<C>) -> Result<Self, PileError> {
        let order = PileOrder::new(config.capacity)?;
        let capacity = order.capacity();
        if cards.len() != capacity {
            return Err(PileError::SlotCountMismatch {
                expected: capacity,
                bound: cards.len(),
            });
        }
        let window = DataWindow::new(capacity, config.initial_page, config.index_policy)?;

        let mut controller = Self {
            applied_ranks: order.z_ranks(),
            order,
            window,
            source,
            cards: cards.into_iter().map(Some).collect(),
            bound_records: vec![None; capacity],
            state: PileState::Idle,
            overlap_policy: config.overlap_policy,
            queue: VecDeque::new(),
            queue_limit: config.queue_limit.max(1),
            tilt_timeout: config.tilt_timeout(),
        };
        controller.apply_ranks();
        controller.bind_initial_window()?;

        info!(
            capacity,
            records = controller.source.len(),
            page = controller.window.page_index(),
            "pile initialized"
        );
        Ok(controller)
    }

    pub fn capacity(&self) -> usize {
        self.order.capacity()
    }

    pub fn order(&self) -> &PileOrder {
        &self.order
    }

    pub fn state(&self) -> &PileState {
        &self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state.is_idle()
    }

    pub fn window(&self) -> &DataWindow {
        &self.window
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn tilt_timeout(&self) -> Duration {
        self.tilt_timeout
    }

    /// Requests waiting behind the in-flight rotation
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    pub fn top_slot(&self) -> SlotId {
        self.order.top_slot()
    }

    pub fn bottom_slot(&self) -> SlotId {
        self.order.bottom_slot()
    }

    /// Ranks currently applied to the cards
    pub fn applied_ranks(&self) -> &ZRanks {
        &self.applied_ranks
    }

    pub fn z_rank_of(&self, slot: SlotId) -> Option<ZRank> {
        self.applied_ranks.get(slot)
    }

    /// Index of the record `slot` shows
    pub fn bound_record(&self, slot: SlotId) -> Option<usize> {
        self.bound_records.get(slot.index()).copied().flatten()
    }

    pub fn card(&self, slot: SlotId) -> Option<&C> {
        self.cards.get(slot.index()).and_then(Option::as_ref)
    }

    pub fn card_mut(&mut self, slot: SlotId) -> Option<&mut C> {
        self.cards.get_mut(slot.index()).and_then(Option::as_mut)
    }

    pub fn bound_card_count(&self) -> usize {
        self.cards.iter().filter(|card| card.is_some()).count()
    }

    /// Removes the card from `slot`, e.g. when its widget is torn down
    pub fn detach_card(&mut self, slot: SlotId) -> Option<C> {
        let card = self.cards.get_mut(slot.index())?.take();
        if card.is_some() {
            warn!(%slot, "card detached from pile");
        }
        card
    }

    /// Puts a card into `slot`, giving it the slot's rank and record
    ///
    /// Returns the card that was there before, or hands `card` back if the
    /// slot does not exist.
    pub fn attach_card(&mut self, slot: SlotId, mut card: C) -> Result<Option<C>, C> {
        if slot.index() >= self.capacity() {
            return Err(card);
        }
        if let Some(rank) = self.applied_ranks.get(slot) {
            card.set_z_rank(rank);
        }
        if let Some(index) = self.bound_record(slot) {
            if let Some(record) = self.source.get(index) {
                card.bind(index, record);
            }
        }
        debug!(%slot, "card attached to pile");
        Ok(self.cards[slot.index()].replace(card))
    }

    /// Recomputes ranks from the order and applies them to every card
    ///
    /// Nothing is applied unless every slot has a card.
    pub fn recompute_z_ranks(&mut self) -> Result<(), PileError> {
        self.ensure_all_bound()?;
        self.applied_ranks = self.order.z_ranks();
        self.apply_ranks();
        Ok(())
    }

    pub fn rotate_forward(&mut self) -> Result<RequestOutcome, PileError> {
        self.request_rotation(Direction::Forward)
    }

    pub fn rotate_backward(&mut self) -> Result<RequestOutcome, PileError> {
        self.request_rotation(Direction::Backward)
    }

    /// Sends a tilt to the extreme card for `direction`
    ///
    /// The order does not change until [`Self::on_tilt_finished`].
    ///
    /// # Arguments
    /// * `direction` - `Forward` tilts the top card, `Backward` the bottom one
    ///
    /// # Returns
    /// Whether the tilt went out or was queued, or `RequestDropped` when the
    /// overlap policy refuses it
    pub fn request_rotation(&mut self, direction: Direction) -> Result<RequestOutcome, PileError> {
        self.request_rotation_at(direction, Instant::now())
    }

    /// [`Self::request_rotation`] with an explicit issue time
    pub fn request_rotation_at(
        &mut self,
        direction: Direction,
        now: Instant,
    ) -> Result<RequestOutcome, PileError> {
        if let Some(in_flight) = self.state.pending().map(|pending| pending.direction) {
            return match self.overlap_policy {
                OverlapPolicy::Queue if self.queue.len() < self.queue_limit => {
                    self.queue.push_back(direction);
                    debug!(%direction, %in_flight, waiting = self.queue.len(), "rotation queued");
                    Ok(RequestOutcome::Queued {
                        waiting: self.queue.len(),
                    })
                }
                OverlapPolicy::Queue => {
                    warn!(%direction, limit = self.queue_limit, "rotation queue full");
                    Err(PileError::RequestDropped {
                        direction,
                        reason: DropReason::QueueFull {
                            limit: self.queue_limit,
                        },
                    })
                }
                OverlapPolicy::Ignore => {
                    debug!(%direction, %in_flight, "rotation ignored while in flight");
                    Err(PileError::RequestDropped {
                        direction,
                        reason: DropReason::RotationInFlight,
                    })
                }
            };
        }

        let target = self.issue_tilt(direction, now)?;
        Ok(RequestOutcome::Issued { target })
    }

    /// Completion notification from a card whose sender is unknown
    ///
    /// # Arguments
    /// * `direction` - Direction the card reports it finished
    ///
    /// # Returns
    /// The committed rotation, or `UnmatchedNotification` with nothing changed
    pub fn on_tilt_finished(
        &mut self,
        direction: Direction,
    ) -> Result<RotationCommitted, PileError> {
        self.finish_tilt(direction, None, Instant::now())
    }

    /// Completion notification from the card in `slot`
    pub fn on_tilt_finished_from(
        &mut self,
        slot: SlotId,
        direction: Direction,
    ) -> Result<RotationCommitted, PileError> {
        self.finish_tilt(direction, Some(slot), Instant::now())
    }

    /// [`Self::on_tilt_finished`] with an explicit completion time
    ///
    /// A queued rotation issued by this commit is stamped with `now`.
    pub fn on_tilt_finished_at(
        &mut self,
        direction: Direction,
        now: Instant,
    ) -> Result<RotationCommitted, PileError> {
        self.finish_tilt(direction, None, now)
    }

    /// [`Self::on_tilt_finished_from`] with an explicit completion time
    pub fn on_tilt_finished_from_at(
        &mut self,
        slot: SlotId,
        direction: Direction,
        now: Instant,
    ) -> Result<RotationCommitted, PileError> {
        self.finish_tilt(direction, Some(slot), now)
    }

    /// Abandons the pending rotation and everything queued behind it
    pub fn cancel_rotation(&mut self) -> Option<PendingRotation> {
        let abandoned = self.abandon(StateEvent::Cancelled);
        if let Some(pending) = &abandoned {
            info!(direction = %pending.direction, target = %pending.target, "rotation cancelled");
        }
        abandoned
    }

    /// Abandons the pending rotation if it has waited past the tilt timeout
    ///
    /// # Arguments
    /// * `now` - Current time on the same clock used to issue tilts
    ///
    /// # Returns
    /// The abandoned rotation, or None if nothing timed out
    pub fn check_timeout(&mut self, now: Instant) -> Option<PendingRotation> {
        let timed_out = self
            .state
            .pending()
            .is_some_and(|pending| pending.is_timed_out_at(now, self.tilt_timeout));
        if !timed_out {
            return None;
        }
        let abandoned = self.abandon(StateEvent::TimedOut);
        if let Some(pending) = &abandoned {
            warn!(
                direction = %pending.direction,
                target = %pending.target,
                waited_ms = pending.elapsed_at(now).as_millis() as u64,
                "tilt never finished, rotation abandoned"
            );
        }
        abandoned
    }

    /// Binds the current page to the slots by order position
    pub fn bind_initial_window(&mut self) -> Result<(), PileError> {
        let indices = self.window.bindings(self.source.len())?;
        self.bind_indices(&indices)
    }

    /// Moves to the next page and rebinds every slot
    ///
    /// Order and ranks are untouched. On error the page and every binding
    /// stay as they were.
    ///
    /// # Returns
    /// The new page index
    pub fn advance_page(&mut self) -> Result<usize, PileError> {
        let page = self.window.next_page()?;
        self.move_to_page(page)
    }

    /// Moves to the previous page and rebinds every slot
    pub fn retreat_page(&mut self) -> Result<usize, PileError> {
        let page = self.window.previous_page()?;
        self.move_to_page(page)
    }

    pub fn dispatch(&mut self, command: PileCommand) -> Result<CommandOutcome, PileError> {
        match command {
            PileCommand::RotateForward => self.rotate_forward().map(CommandOutcome::Rotation),
            PileCommand::RotateBackward => self.rotate_backward().map(CommandOutcome::Rotation),
            PileCommand::AdvancePage => self.advance_page().map(CommandOutcome::Page),
            PileCommand::RetreatPage => self.retreat_page().map(CommandOutcome::Page),
        }
    }

    /// Routes a click at `(x, y)` through the activation zones
    ///
    /// Returns None when the point is outside every zone.
    pub fn handle_activation(
        &mut self,
        zones: &ActivationZones,
        x: i32,
        y: i32,
    ) -> Option<Result<CommandOutcome, PileError>> {
        let command = zones.command_at(x, y)?;
        debug!(x, y, ?command, "activation");
        Some(self.dispatch(command))
    }

    fn ensure_all_bound(&self) -> Result<(), PileError> {
        let bound = self.bound_card_count();
        if bound != self.capacity() {
            return Err(PileError::SlotCountMismatch {
                expected: self.capacity(),
                bound,
            });
        }
        Ok(())
    }

    fn apply_ranks(&mut self) {
        for (slot, rank) in self.applied_ranks.iter() {
            if let Some(Some(card)) = self.cards.get_mut(slot.index()) {
                card.set_z_rank(rank);
            }
        }
    }

    fn issue_tilt(&mut self, direction: Direction, now: Instant) -> Result<SlotId, PileError> {
        self.ensure_all_bound()?;
        let target = self.order.extreme_for(direction);
        let expected = self.capacity();
        let bound = self.bound_card_count();
        let Some(card) = self.card_mut(target) else {
            return Err(PileError::SlotCountMismatch { expected, bound });
        };
        card.tilt(direction);

        let pending = PendingRotation::new(direction, target, now);
        let (next, _) = StateMachine::process_event(
            std::mem::take(&mut self.state),
            StateEvent::TiltIssued(pending),
        );
        self.state = next;
        debug!(%direction, %target, "tilt issued");
        Ok(target)
    }

    fn finish_tilt(
        &mut self,
        direction: Direction,
        slot: Option<SlotId>,
        now: Instant,
    ) -> Result<RotationCommitted, PileError> {
        let (next, effect) = StateMachine::process_event(
            self.state.clone(),
            StateEvent::TiltFinished { direction, slot },
        );

        let pending = match effect {
            Effect::Commit(pending) => pending,
            Effect::Ignored(reason) => {
                warn!(%reason, "ignoring tilt notification");
                return Err(reason.into());
            }
            Effect::None | Effect::Abandoned(_) => {
                return Err(UnmatchedReason::NotPending { got: direction }.into());
            }
        };
        self.state = next;

        if let Err(err) = self.commit_rotation(pending.direction) {
            warn!(%err, dropped = self.queue.len(), "rotation could not be committed");
            self.queue.clear();
            return Err(err);
        }

        let next = self.issue_queued(now);
        Ok(RotationCommitted {
            direction: pending.direction,
            top: self.order.top_slot(),
            progress: self.window.progress(),
            next,
        })
    }

    fn commit_rotation(&mut self, direction: Direction) -> Result<(), PileError> {
        self.ensure_all_bound()?;
        self.order.rotate(direction);
        self.applied_ranks = self.order.z_ranks();
        self.apply_ranks();
        self.window.record_rotation(direction);
        info!(
            %direction,
            top = %self.order.top_slot(),
            progress = self.window.progress(),
            "rotation committed"
        );
        Ok(())
    }

    fn issue_queued(&mut self, now: Instant) -> Option<SlotId> {
        let direction = self.queue.pop_front()?;
        match self.issue_tilt(direction, now) {
            Ok(target) => Some(target),
            Err(err) => {
                warn!(%err, %direction, "queued rotation could not be issued");
                self.queue.clear();
                None
            }
        }
    }

    fn abandon(&mut self, event: StateEvent) -> Option<PendingRotation> {
        let (next, effect) = StateMachine::process_event(std::mem::take(&mut self.state), event);
        self.state = next;
        match effect {
            Effect::Abandoned(pending) => {
                if !self.queue.is_empty() {
                    debug!(dropped = self.queue.len(), "queued rotations dropped");
                    self.queue.clear();
                }
                Some(pending)
            }
            _ => None,
        }
    }

    fn move_to_page(&mut self, page: usize) -> Result<usize, PileError> {
        let indices = self.window.resolve_page(page, self.source.len())?;
        self.bind_indices(&indices)?;
        self.window.set_page(page);
        info!(page, "page bound");
        Ok(page)
    }

    /// Binds `indices[p]` to the slot at order position `p`
    fn bind_indices(&mut self, indices: &[usize]) -> Result<(), PileError> {
        let len = self.source.len();
        if let Some(&missing) = indices.iter().find(|&&index| self.source.get(index).is_none()) {
            return Err(PileError::IndexOutOfRange {
                index: missing as i64,
                len,
            });
        }

        for (position, &index) in indices.iter().enumerate() {
            let Some(slot) = self.order.slot_at(position) else {
                continue;
            };
            let Some(record) = self.source.get(index) else {
                continue;
            };
            self.bound_records[slot.index()] = Some(index);
            if let Some(Some(card)) = self.cards.get_mut(slot.index()) {
                card.bind(index, record);
            }
        }
        Ok(())
    }
}
