//! Rules of the paddle game
//!
//! Positions are top-left corners in back-buffer pixels, so the court can hand
//! them straight to the blitter.

use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::core::controller::{Button, Controller};
use crate::core::rect::{Point, Rect};
use crate::core::timer::{Accumulator, Countdown};
use crate::engine::SceneState;

pub const PADDLE_WIDTH: u32 = 19;
pub const PADDLE_HEIGHT: u32 = 79;
/// Gap between a paddle and the side of the court, and its travel limit from the edges
pub const PADDLE_MARGIN: i32 = 15;
/// Pixels a paddle moves per step
pub const PADDLE_STEP: i32 = 6;
pub const BALL_SIZE: u32 = 30;
pub const MAX_SCORE: u32 = 10;
pub const MIN_BALL_SPEED: i32 = 1;
pub const MAX_BALL_SPEED: i32 = 5;

/// Ball updates per second
const STEP_HZ: f32 = 100.0;
const MAX_STEPS_PER_UPDATE: u8 = 10;
/// Pause after a point, in seconds
const SCORE_PAUSE: f32 = 0.25;
/// How far the ball is pushed back in after a point
const SCORE_NUDGE: i32 = 5;
/// How far the ball is pushed off a paddle it hit
const PADDLE_KICK: i32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Player {
    One,
    Two,
}

impl Player {
    fn index(self) -> usize {
        match self {
            Player::One => 0,
            Player::Two => 1,
        }
    }

    pub fn win_banner(self) -> &'static str {
        match self {
            Player::One => "PLAYER ONE WINS!!!",
            Player::Two => "PLAYER TWO WINS!!!",
        }
    }
}

/// Two paddles, one ball and the score
#[derive(Debug, Clone)]
pub struct Court {
    width: i32,
    height: i32,
    paddles: [Point; 2],
    ball: Point,
    /// Unit direction per axis, -1 or 1
    direction: Point,
    ball_speed: i32,
    bounce_count: u32,
    scores: [u32; 2],
    serve_pause: Countdown,
    steps: Accumulator,
    rng: StdRng,
}

impl Court {
    /// Court for a `width` x `height` back buffer; `seed` picks the serve directions
    pub fn new(width: u32, height: u32, seed: u64) -> Self {
        let (width, height) = (width as i32, height as i32);
        let mut court = Self {
            width,
            height,
            paddles: [
                Point::new(PADDLE_MARGIN, height / 2),
                Point::new(width - PADDLE_MARGIN - PADDLE_WIDTH as i32, height / 2),
            ],
            ball: Point::new((width - BALL_SIZE as i32) / 2, (height - BALL_SIZE as i32) / 2),
            direction: Point::ONE,
            ball_speed: MIN_BALL_SPEED,
            bounce_count: 0,
            scores: [0, 0],
            serve_pause: Countdown::new(SCORE_PAUSE),
            steps: Accumulator::new(STEP_HZ, MAX_STEPS_PER_UPDATE),
            rng: StdRng::seed_from_u64(seed),
        };
        court.random_direction();
        court
    }

    fn random_direction(&mut self) {
        let x = if self.rng.gen_bool(0.5) { 1 } else { -1 };
        let y = if self.rng.gen_bool(0.5) { 1 } else { -1 };
        self.direction = Point::new(x, y);
    }

    pub fn paddle(&self, player: Player) -> Point {
        self.paddles[player.index()]
    }

    pub fn ball(&self) -> Point {
        self.ball
    }

    pub fn direction(&self) -> Point {
        self.direction
    }

    pub fn score(&self, player: Player) -> u32 {
        self.scores[player.index()]
    }

    pub fn ball_speed(&self) -> i32 {
        self.ball_speed
    }

    pub fn bounce_count(&self) -> u32 {
        self.bounce_count
    }

    pub fn winner(&self) -> Option<Player> {
        if self.scores[0] >= MAX_SCORE {
            Some(Player::One)
        } else if self.scores[1] >= MAX_SCORE {
            Some(Player::Two)
        } else {
            None
        }
    }

    /// Clamped to 1..=5
    pub fn set_ball_speed(&mut self, speed: i32) {
        self.ball_speed = speed.clamp(MIN_BALL_SPEED, MAX_BALL_SPEED);
    }

    pub fn place_ball(&mut self, at: Point, direction: Point) {
        self.ball = at;
        self.direction = direction.signum();
    }

    /// Move a paddle `dir` steps (negative is up), kept inside the court margins
    pub fn move_paddle(&mut self, player: Player, dir: i32) {
        let top = PADDLE_MARGIN;
        let bottom = (self.height - PADDLE_HEIGHT as i32 - PADDLE_MARGIN).max(top);
        let paddle = &mut self.paddles[player.index()];
        paddle.y = (paddle.y + dir * PADDLE_STEP).clamp(top, bottom);
    }

    /// True when the player asked to leave
    pub fn wants_quit(&self, controller: &impl Controller) -> bool {
        controller.is_down(Button::Escape)
            || (self.winner().is_some() && controller.is_down(Button::Start))
    }

    /// Advance the game by `delta` seconds of wall time
    pub fn update(&mut self, delta: f32, controller: &impl Controller) {
        for speed in controller.get_down_keys().iter().filter_map(|b| b.ball_speed()) {
            self.set_ball_speed(speed);
        }

        let steps = self.steps.tick(delta);
        for _ in 0..steps {
            self.step(controller);
        }
    }

    fn step(&mut self, controller: &impl Controller) {
        for (player, up, down) in [
            (Player::One, Button::PlayerOneUp, Button::PlayerOneDown),
            (Player::Two, Button::PlayerTwoUp, Button::PlayerTwoDown),
        ] {
            if controller.is_down(up) {
                self.move_paddle(player, -1);
            }
            if controller.is_down(down) {
                self.move_paddle(player, 1);
            }
        }

        if self.serve_pause.is_active() {
            self.serve_pause.tick(self.steps.timestep());
            return;
        }
        if self.winner().is_none() {
            self.move_ball();
        }
    }

    /// One ball step: scoring, wall and paddle reflections, then movement
    pub fn move_ball(&mut self) {
        let right_limit = self.width - BALL_SIZE as i32;
        let bottom_limit = self.height - BALL_SIZE as i32;

        if self.ball.x <= 0 {
            self.point_for(Player::Two);
            self.ball.x += SCORE_NUDGE;
            self.direction.x = 1;
        } else if self.ball.x >= right_limit {
            self.point_for(Player::One);
            self.ball.x -= SCORE_NUDGE;
            self.direction.x = -1;
        }

        if self.ball.y <= 0 {
            self.direction.y = 1;
        } else if self.ball.y >= bottom_limit {
            self.direction.y = -1;
        }

        // Left paddle is hit by the ball's top-left corner, right paddle by its bottom-right
        if self.paddle_rect(Player::One).contains(self.ball) {
            self.direction.x = -self.direction.x;
            self.ball.x += PADDLE_KICK;
            self.bounce_count += 1;
        }
        let far_corner = self.ball + Point::splat(BALL_SIZE as i32);
        if self.paddle_rect(Player::Two).contains(far_corner) {
            self.direction.x = -self.direction.x;
            self.ball.x -= PADDLE_KICK;
            self.bounce_count += 1;
        }

        self.ball += self.direction * self.ball_speed;
    }

    fn paddle_rect(&self, player: Player) -> Rect {
        Rect::from_origin(self.paddle(player), PADDLE_WIDTH, PADDLE_HEIGHT)
    }

    fn point_for(&mut self, player: Player) {
        self.scores[player.index()] += 1;
        self.serve_pause.start();
        debug!("Score {}:{}", self.scores[0], self.scores[1]);
        if let Some(winner) = self.winner() {
            info!("{:?} wins {}:{}", winner, self.scores[0], self.scores[1]);
        }
    }

    /// Positions and counters the renderer needs for one frame
    pub fn scene(&self) -> SceneState {
        SceneState {
            paddles: self.paddles,
            ball: self.ball,
            scores: self.scores,
            ball_speed: self.ball_speed,
            bounce_count: self.bounce_count,
            winner: self.winner(),
        }
    }
}
