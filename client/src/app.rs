//! Per-frame orchestration of simulation, input, network results and drawing

use crate::game::{GameSession, TickOutcome};
use crate::input::{InputEvent, InputManager};
use crate::network::{NetCommand, NetworkHandle};
use crate::rendering::Renderer;
use crate::scheduler::TickScheduler;
use crate::scoreboard::ScoreboardView;
use log::{debug, info};
use std::time::Instant;

/// Owns the one game session and everything that reads or steers it.
pub struct App {
    session: GameSession,
    scheduler: TickScheduler,
    input: InputManager,
    view: ScoreboardView,
    network: Option<NetworkHandle>,
    renderer: Renderer,
    // Score of the current game already sent to the server.
    last_submitted: Option<u32>,
    // Final score held back while an earlier submission is in flight.
    deferred_final: Option<u32>,
}

impl App {
    pub fn new(session: GameSession, network: Option<NetworkHandle>, renderer: Renderer) -> Self {
        Self {
            session,
            scheduler: TickScheduler::new(),
            input: InputManager::new(),
            view: ScoreboardView::new(),
            network,
            renderer,
            last_submitted: None,
            deferred_final: None,
        }
    }

    pub fn session(&self) -> &GameSession {
        &self.session
    }

    pub fn view(&self) -> &ScoreboardView {
        &self.view
    }

    pub fn input(&self) -> &InputManager {
        &self.input
    }

    /// Requests the scoreboard. Gameplay does not wait for the answer.
    pub fn load(&mut self) {
        if !self.send(NetCommand::Init) {
            self.view.apply_init_failure("playing offline".to_string());
        }
    }

    /// One frame: poll the keyboard, advance the game, draw.
    pub fn frame(&mut self, now: Instant) {
        let events = self.input.update();
        self.step(now, &events);
        self.renderer.render(&self.session, &self.view, self.input.message());
    }

    /// Everything a frame does except touching the window.
    pub fn step(&mut self, now: Instant, events: &[InputEvent]) -> Option<TickOutcome> {
        self.pump_network();

        for event in events {
            self.handle_input(*event);
        }

        let outcome = self.scheduler.drive(&mut self.session, now);
        if let Some(TickOutcome::Collided(_)) = outcome {
            self.on_game_over();
        }
        outcome
    }

    pub fn handle_input(&mut self, event: InputEvent) {
        match event {
            InputEvent::Steer(direction) => {
                self.session.steer(direction);
            }
            InputEvent::Control => {
                let was_over = self.session.is_over();
                self.session.control();
                if was_over {
                    self.last_submitted = None;
                    self.deferred_final = None;
                }
            }
            InputEvent::ToggleFocus => {
                let message = self.input.message_mut();
                let focused = !message.is_focused();
                message.set_focused(focused);
            }
            InputEvent::Blur => self.input.message_mut().set_focused(false),
            InputEvent::Submit => self.submit(),
        }
    }

    fn pump_network(&mut self) {
        let Some(network) = self.network.as_mut() else {
            return;
        };
        while let Some(event) = network.try_next() {
            debug!("Network event: {:?}", event);
            self.view.apply(event);
        }

        if self.view.is_pending() {
            return;
        }
        if let Some(score) = self.deferred_final.take() {
            if self.last_submitted != Some(score) {
                info!("Submitting deferred final score {}", score);
                self.submit();
            }
        }
    }

    fn on_game_over(&mut self) {
        let score = self.session.score();
        if score == 0 || self.last_submitted == Some(score) {
            return;
        }
        if self.view.is_pending() {
            debug!("Final score {} waits for the submission in flight", score);
            self.deferred_final = Some(score);
            return;
        }
        info!("Submitting final score {}", score);
        self.submit();
    }

    /// Sends the current score with whatever has been typed so far.
    fn submit(&mut self) {
        let score = self.session.score();
        if !self.view.can_submit(score) {
            debug!("Nothing to submit (score {})", score);
            return;
        }

        let message = self.input.message_mut().take();
        self.input.message_mut().set_focused(false);

        self.view.begin_submit();
        if self.send(NetCommand::Submit { score, message }) {
            self.last_submitted = Some(score);
        } else {
            self.view.apply_submit_failure("scoreboard is offline".to_string());
        }
    }

    fn send(&self, command: NetCommand) -> bool {
        self.network
            .as_ref()
            .is_some_and(|network| network.send(command))
    }
}
