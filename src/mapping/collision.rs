//! Point collision checking against the obstacle model

use crate::common::{Point2D, StateValidity};
use crate::mapping::obstacle_model::Obstacle;

/// Cross products within this band count as "on the edge"
const EDGE_TOLERANCE: f64 = 1e-9;

/// Strict point-in-convex-polygon test.
///
/// The point is inside when it lies on the same side of every edge. Points on
/// an edge or a vertex are reported as outside.
pub fn strictly_inside(vertices: &[Point2D], x: f64, y: f64) -> bool {
    if vertices.len() < 3 {
        return false;
    }
    let mut positive = 0;
    let mut negative = 0;
    for (i, a) in vertices.iter().enumerate() {
        let b = &vertices[(i + 1) % vertices.len()];
        let cross = (b.x - a.x) * (y - a.y) - (b.y - a.y) * (x - a.x);
        if cross > EDGE_TOLERANCE {
            positive += 1;
        } else if cross < -EDGE_TOLERANCE {
            negative += 1;
        } else {
            return false;
        }
    }
    positive == vertices.len() || negative == vertices.len()
}

/// State-validity predicate over a fixed obstacle set
#[derive(Debug, Clone, Default)]
pub struct CollisionChecker {
    obstacles: Vec<Obstacle>,
}

impl CollisionChecker {
    pub fn new(obstacles: Vec<Obstacle>) -> Self {
        CollisionChecker { obstacles }
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }
}

impl StateValidity for CollisionChecker {
    fn is_valid(&self, x: f64, y: f64) -> bool {
        !self.obstacles.iter().any(|o| o.contains(x, y))
    }
}
