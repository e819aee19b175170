//! Snake simulation: movement, input buffering, collisions, growth and speed

use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shared::{Cell, Direction, BASE_TICK_MS, BOARD_SIZE, MIN_TICK_MS, SPEEDUP_FACTOR};
use std::collections::VecDeque;
use std::time::Duration;

pub const FOOD_PLACEMENT_ATTEMPTS: usize = 100;
/// Used when rejection sampling runs out of attempts. May overlap the snake.
pub const FALLBACK_FOOD: Cell = Cell::new(0, 0);
pub const START_DIRECTION: Direction = Direction::Right;

const GRID_SIDE: usize = BOARD_SIZE as usize;

fn starting_snake() -> VecDeque<Cell> {
    VecDeque::from([Cell::new(10, 10), Cell::new(9, 10), Cell::new(8, 10)])
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Running,
    Paused,
    GameOver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collision {
    Wall,
    Body,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The session was not running; nothing changed.
    Skipped,
    Moved,
    Ate,
    Collided(Collision),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnakeColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl SnakeColor {
    pub const DEFAULT: SnakeColor = SnakeColor { r: 0, g: 200, b: 83 };

    fn random(rng: &mut StdRng) -> Self {
        // Keep channels away from black so the snake stays visible.
        Self {
            r: rng.gen_range(64..=255),
            g: rng.gen_range(64..=255),
            b: rng.gen_range(64..=255),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CellMarker {
    #[default]
    Empty,
    Snake,
    Food,
}

/// Board projection indexed as `grid[y][x]`.
pub type Grid = [[CellMarker; GRID_SIDE]; GRID_SIDE];

/// One game from start to game over.
///
/// The session is owned by whoever drives the frame loop. Input handlers
/// only touch the buffered direction and the phase; [`GameSession::tick`]
/// is the only place the board changes.
#[derive(Debug, Clone)]
pub struct GameSession {
    snake: VecDeque<Cell>,
    direction: Direction,
    next_direction: Direction,
    food: Cell,
    score: u32,
    tick_interval_ms: f64,
    phase: Phase,
    color: SnakeColor,
    rng: StdRng,
}

impl GameSession {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    /// Builds an idle session from an explicit board, head first.
    ///
    /// Returns `None` if `snake` is empty.
    pub fn with_layout(
        snake: Vec<Cell>,
        direction: Direction,
        food: Cell,
        seed: u64,
    ) -> Option<Self> {
        if snake.is_empty() {
            return None;
        }
        Some(Self {
            snake: snake.into(),
            direction,
            next_direction: direction,
            food,
            score: 0,
            tick_interval_ms: BASE_TICK_MS,
            phase: Phase::Idle,
            color: SnakeColor::DEFAULT,
            rng: StdRng::seed_from_u64(seed),
        })
    }

    fn with_rng(mut rng: StdRng) -> Self {
        let snake = starting_snake();
        let food = Self::place_food(&mut rng, &snake);
        Self {
            snake,
            direction: START_DIRECTION,
            next_direction: START_DIRECTION,
            food,
            score: 0,
            tick_interval_ms: BASE_TICK_MS,
            phase: Phase::Idle,
            color: SnakeColor::DEFAULT,
            rng,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.phase == Phase::Running
    }

    pub fn is_over(&self) -> bool {
        self.phase == Phase::GameOver
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn snake(&self) -> &VecDeque<Cell> {
        &self.snake
    }

    pub fn head(&self) -> Cell {
        self.snake[0]
    }

    pub fn food(&self) -> Cell {
        self.food
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn buffered_direction(&self) -> Direction {
        self.next_direction
    }

    pub fn tick_interval_ms(&self) -> f64 {
        self.tick_interval_ms
    }

    pub fn tick_duration(&self) -> Duration {
        Duration::from_micros((self.tick_interval_ms * 1000.0).round() as u64)
    }

    pub fn color(&self) -> SnakeColor {
        self.color
    }

    /// Buffers a heading for the next tick. The latest accepted input wins.
    ///
    /// Reversal is judged against the committed direction, not the buffered
    /// one.
    pub fn steer(&mut self, direction: Direction) -> bool {
        if self.phase == Phase::GameOver || direction == self.direction.opposite() {
            return false;
        }
        self.next_direction = direction;
        true
    }

    /// The dedicated control input: start, pause/resume, or restart after a
    /// game over.
    pub fn control(&mut self) -> Phase {
        match self.phase {
            Phase::Idle | Phase::Paused => self.phase = Phase::Running,
            Phase::Running => self.phase = Phase::Paused,
            Phase::GameOver => {
                self.reset();
                self.phase = Phase::Running;
            }
        }
        debug!("Control input, now {:?}", self.phase);
        self.phase
    }

    pub fn start(&mut self) -> bool {
        match self.phase {
            Phase::Idle | Phase::Paused => {
                self.phase = Phase::Running;
                true
            }
            _ => false,
        }
    }

    pub fn pause(&mut self) -> bool {
        if self.phase != Phase::Running {
            return false;
        }
        self.phase = Phase::Paused;
        true
    }

    /// Starts over from the initial board in the `Idle` phase.
    pub fn reset(&mut self) {
        let rng = std::mem::replace(&mut self.rng, StdRng::seed_from_u64(0));
        *self = Self::with_rng(rng);
    }

    /// Advances the simulation by one cell.
    pub fn tick(&mut self) -> TickOutcome {
        if self.phase != Phase::Running {
            return TickOutcome::Skipped;
        }

        self.direction = self.next_direction;
        let head = self.head().offset(self.direction);

        if !head.in_bounds() {
            return self.end(Collision::Wall);
        }
        if self.snake.contains(&head) {
            return self.end(Collision::Body);
        }

        self.snake.push_front(head);

        if head != self.food {
            self.snake.pop_back();
            return TickOutcome::Moved;
        }

        self.score += 1;
        self.tick_interval_ms = (self.tick_interval_ms * SPEEDUP_FACTOR).max(MIN_TICK_MS);
        self.color = SnakeColor::random(&mut self.rng);
        self.food = Self::place_food(&mut self.rng, &self.snake);
        debug!(
            "Ate at {:?}, score {}, interval {:.1}ms",
            head, self.score, self.tick_interval_ms
        );
        TickOutcome::Ate
    }

    fn end(&mut self, collision: Collision) -> TickOutcome {
        self.phase = Phase::GameOver;
        info!("Game over ({:?}) with score {}", collision, self.score);
        TickOutcome::Collided(collision)
    }

    fn place_food(rng: &mut StdRng, snake: &VecDeque<Cell>) -> Cell {
        for _ in 0..FOOD_PLACEMENT_ATTEMPTS {
            let candidate = Cell::new(rng.gen_range(0..BOARD_SIZE), rng.gen_range(0..BOARD_SIZE));
            if !snake.contains(&candidate) {
                return candidate;
            }
        }
        warn!(
            "No free cell after {} attempts, placing food at {:?}",
            FOOD_PLACEMENT_ATTEMPTS, FALLBACK_FOOD
        );
        FALLBACK_FOOD
    }

    /// Projects the board for presentation. Food is drawn last so it stays
    /// visible in the rare case it was placed on the snake.
    pub fn project(&self) -> Grid {
        let mut grid = [[CellMarker::Empty; GRID_SIDE]; GRID_SIDE];
        for cell in self.snake.iter().filter(|c| c.in_bounds()) {
            grid[cell.y as usize][cell.x as usize] = CellMarker::Snake;
        }
        if self.food.in_bounds() {
            grid[self.food.y as usize][self.food.x as usize] = CellMarker::Food;
        }
        grid
    }
}

impl Default for GameSession {
    fn default() -> Self {
        Self::new()
    }
}
