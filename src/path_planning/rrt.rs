//! RRT (Rapidly-exploring Random Tree) path planning algorithm
//!
//! Sampling-based planner that grows a tree from the start by steering towards
//! random samples in the workspace. Collision checking is delegated to the
//! caller's state-validity predicate. When the deadline or the iteration budget
//! runs out, the branch ending closest to the goal is returned as an
//! approximate solution.

use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::common::{MotionPlanner, Pose2D, StateValidity};
use crate::path_planning::plan_request::{PlannerSolution, PlanningRequest, WorkspaceBounds};

/// Internal node for RRT tree
#[derive(Debug, Clone)]
pub struct RRTNode {
    pub x: f64,
    pub y: f64,
    pub path_x: Vec<f64>,
    pub path_y: Vec<f64>,
    pub parent: Option<usize>,
}

impl RRTNode {
    pub fn new(x: f64, y: f64) -> Self {
        RRTNode {
            x,
            y,
            path_x: Vec::new(),
            path_y: Vec::new(),
            parent: None,
        }
    }
}

/// Configuration for RRT planner
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RRTConfig {
    /// Expansion distance per step [m]
    pub expand_dis: f64,
    /// Path resolution for collision checking [m]
    pub path_resolution: f64,
    /// Goal sampling rate (0-100)
    pub goal_sample_rate: i32,
    /// Maximum iterations
    pub max_iter: usize,
    /// Fixed RNG seed for reproducible plans
    pub seed: Option<u64>,
}

impl Default for RRTConfig {
    fn default() -> Self {
        Self {
            expand_dis: 0.3,
            path_resolution: 0.02,
            goal_sample_rate: 10,
            max_iter: 20_000,
            seed: None,
        }
    }
}

/// RRT path planner
#[derive(Debug, Clone, Default)]
pub struct RRTPlanner {
    config: RRTConfig,
}

impl RRTPlanner {
    pub fn new(config: RRTConfig) -> Self {
        RRTPlanner { config }
    }

    pub fn config(&self) -> &RRTConfig {
        &self.config
    }

    fn rng(&self) -> StdRng {
        match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    fn steer(&self, from_node: &RRTNode, to_x: f64, to_y: f64, extend_length: f64) -> RRTNode {
        let mut new_node = RRTNode::new(from_node.x, from_node.y);
        let (d, theta) = calc_distance_and_angle(from_node.x, from_node.y, to_x, to_y);

        new_node.path_x = vec![new_node.x];
        new_node.path_y = vec![new_node.y];

        let extend_length = extend_length.min(d);
        let n_expand = (extend_length / self.config.path_resolution).floor() as usize;

        for _ in 0..n_expand {
            new_node.x += self.config.path_resolution * theta.cos();
            new_node.y += self.config.path_resolution * theta.sin();
            new_node.path_x.push(new_node.x);
            new_node.path_y.push(new_node.y);
        }

        let (d, _) = calc_distance_and_angle(new_node.x, new_node.y, to_x, to_y);
        if d <= self.config.path_resolution {
            new_node.path_x.push(to_x);
            new_node.path_y.push(to_y);
            new_node.x = to_x;
            new_node.y = to_y;
        }

        new_node
    }

    fn get_random_point(&self, rng: &mut StdRng, bounds: &WorkspaceBounds, goal: &Pose2D) -> (f64, f64) {
        if rng.gen_range(0..=100) > self.config.goal_sample_rate {
            (
                rng.gen_range(bounds.low()..=bounds.high()),
                rng.gen_range(bounds.low()..=bounds.high()),
            )
        } else {
            (goal.x, goal.y)
        }
    }

    fn check_node(node: &RRTNode, bounds: &WorkspaceBounds, validity: &dyn StateValidity) -> bool {
        node.path_x
            .iter()
            .zip(node.path_y.iter())
            .all(|(&px, &py)| bounds.contains(px, py) && validity.is_valid(px, py))
    }

    /// Walk parents back to the root and return start→node waypoints
    fn generate_course(node_list: &[RRTNode], last: usize, start: &Pose2D) -> Vec<Pose2D> {
        let mut indices = vec![last];
        let mut node_index = node_list[last].parent;
        while let Some(index) = node_index {
            indices.push(index);
            node_index = node_list[index].parent;
        }
        indices.reverse();

        let mut course = vec![*start];
        for pair in indices.windows(2) {
            let (a, b) = (&node_list[pair[0]], &node_list[pair[1]]);
            let (_, theta) = calc_distance_and_angle(a.x, a.y, b.x, b.y);
            course.push(Pose2D::new(b.x, b.y, theta));
        }
        course
    }
}

fn calc_distance_and_angle(x0: f64, y0: f64, x1: f64, y1: f64) -> (f64, f64) {
    let dx = x1 - x0;
    let dy = y1 - y0;
    ((dx * dx + dy * dy).sqrt(), dy.atan2(dx))
}

fn nearest_node_index(node_list: &[RRTNode], x: f64, y: f64) -> usize {
    let mut min_dist = f64::INFINITY;
    let mut min_ind = 0;
    for (i, node) in node_list.iter().enumerate() {
        let dist = (node.x - x).powi(2) + (node.y - y).powi(2);
        if dist < min_dist {
            min_dist = dist;
            min_ind = i;
        }
    }
    min_ind
}

impl MotionPlanner for RRTPlanner {
    fn solve(
        &self,
        request: &PlanningRequest,
        validity: &dyn StateValidity,
        timeout: Duration,
    ) -> Option<PlannerSolution> {
        let deadline = Instant::now() + timeout;
        let mut rng = self.rng();
        let start = request.start;
        let goal = request.goal;
        let mut node_list = vec![RRTNode::new(start.x, start.y)];

        let mut iterations = 0;
        while iterations < self.config.max_iter && Instant::now() < deadline {
            iterations += 1;
            let (rx, ry) = self.get_random_point(&mut rng, &request.bounds, &goal);
            let nearest_ind = nearest_node_index(&node_list, rx, ry);
            let mut new_node = self.steer(&node_list[nearest_ind], rx, ry, self.config.expand_dis);

            if !Self::check_node(&new_node, &request.bounds, validity) {
                continue;
            }
            new_node.parent = Some(nearest_ind);
            node_list.push(new_node);

            let last_ind = node_list.len() - 1;
            let last = &node_list[last_ind];
            let (d, _) = calc_distance_and_angle(last.x, last.y, goal.x, goal.y);
            if d <= self.config.expand_dis {
                let final_node = self.steer(last, goal.x, goal.y, self.config.expand_dis);
                if Self::check_node(&final_node, &request.bounds, validity) {
                    let mut waypoints = Self::generate_course(&node_list, last_ind, &start);
                    waypoints.push(goal);
                    log::debug!(
                        "RRT reached the goal after {} iterations with {} nodes",
                        iterations,
                        node_list.len()
                    );
                    return Some(PlannerSolution { waypoints, distance_to_goal: 0.0 });
                }
            }
        }

        log::debug!(
            "RRT stopped after {} iterations with {} nodes and no exact solution",
            iterations,
            node_list.len()
        );
        if node_list.len() < 2 {
            return None;
        }
        let closest = nearest_node_index(&node_list, goal.x, goal.y);
        if closest == 0 {
            return None;
        }
        let node = &node_list[closest];
        let (distance_to_goal, _) = calc_distance_and_angle(node.x, node.y, goal.x, goal.y);
        Some(PlannerSolution {
            waypoints: Self::generate_course(&node_list, closest, &start),
            distance_to_goal,
        })
    }
}
