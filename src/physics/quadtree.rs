//! Barnes–Hut tree for the charge term.
//!
//! Points go into square cells stored in one flat arena, one insert at a
//! time. A leaf covers a single location: a second point at a different spot
//! splits the leaf until the two land in different quadrants, and points at
//! the same spot are chained in the leaf. Once every point is in, each cell
//! gets the total charge and centroid of the points below it.

use eframe::egui::{Vec2, vec2};

/// Leaves this deep stop splitting and chain whatever lands in them, so
/// points a rounding error apart cannot recurse forever.
const MAX_DEPTH: u32 = 32;

#[derive(Clone, Debug)]
pub(super) struct Cell {
    min: Vec2,
    side: f32,
    /// Arena indices of the quadrants: left-top, right-top, left-bottom, right-bottom.
    children: [Option<usize>; 4],
    /// First point of a leaf's chain; `None` on interior cells.
    head: Option<usize>,
    /// Number of points below this cell.
    pub(super) count: u32,
    /// `count` times the per-node strength.
    pub(super) charge: f32,
    pub(super) centroid: Vec2,
}

impl Cell {
    fn leaf(min: Vec2, side: f32, head: Option<usize>) -> Self {
        Self {
            min,
            side,
            children: [None; 4],
            head,
            count: 0,
            charge: 0.0,
            centroid: Vec2::ZERO,
        }
    }

    pub(super) fn side(&self) -> f32 {
        self.side
    }

    pub(super) fn is_leaf(&self) -> bool {
        self.children.iter().all(Option::is_none)
    }

    /// Half-open containment, matching how points are routed to quadrants.
    pub(super) fn contains(&self, point: Vec2) -> bool {
        let max = self.min + vec2(self.side, self.side);
        point.x >= self.min.x && point.x < max.x && point.y >= self.min.y && point.y < max.y
    }

    fn quadrant_for(&self, point: Vec2) -> usize {
        let mid = self.min + vec2(self.side, self.side) * 0.5;
        usize::from(point.x >= mid.x) | (usize::from(point.y >= mid.y) << 1)
    }

    fn quadrant(&self, quadrant: usize) -> (Vec2, f32) {
        let half = self.side * 0.5;
        let offset = vec2(
            if quadrant & 1 == 0 { 0.0 } else { half },
            if quadrant & 2 == 0 { 0.0 } else { half },
        );
        (self.min + offset, half)
    }
}

#[derive(Debug)]
pub(super) struct ChargeTree<'a> {
    positions: &'a [Vec2],
    cells: Vec<Cell>,
    /// Next point in the same leaf chain, per point.
    next: Vec<Option<usize>>,
}

impl<'a> ChargeTree<'a> {
    /// `None` when there are no points or any point is not finite.
    pub(super) fn build(positions: &'a [Vec2], strength: f32) -> Option<Self> {
        let (min, side) = root_square(positions)?;
        let mut tree = Self {
            positions,
            cells: vec![Cell::leaf(min, side, None)],
            next: vec![None; positions.len()],
        };
        for index in 0..positions.len() {
            tree.insert(index);
        }
        tree.aggregate(strength);
        Some(tree)
    }

    fn insert(&mut self, index: usize) {
        let point = self.positions[index];
        let mut current = 0usize;
        let mut depth = 0u32;

        loop {
            let cell = &self.cells[current];
            if !cell.is_leaf() {
                let quadrant = cell.quadrant_for(point);
                let slot = cell.children[quadrant];
                match slot {
                    Some(child) => {
                        current = child;
                        depth += 1;
                    }
                    None => {
                        let (min, side) = cell.quadrant(quadrant);
                        let child = self.push(Cell::leaf(min, side, Some(index)));
                        self.cells[current].children[quadrant] = Some(child);
                        return;
                    }
                }
                continue;
            }

            let Some(occupant) = cell.head else {
                self.cells[current].head = Some(index);
                return;
            };

            if self.positions[occupant] == point || depth >= MAX_DEPTH {
                self.next[index] = Some(occupant);
                self.cells[current].head = Some(index);
                return;
            }

            // Push the resident chain one level down and retry from here.
            let quadrant = cell.quadrant_for(self.positions[occupant]);
            let (min, side) = cell.quadrant(quadrant);
            let child = self.push(Cell::leaf(min, side, Some(occupant)));
            let cell = &mut self.cells[current];
            cell.head = None;
            cell.children[quadrant] = Some(child);
        }
    }

    fn push(&mut self, cell: Cell) -> usize {
        self.cells.push(cell);
        self.cells.len() - 1
    }

    /// Children always sit after their parent in the arena, so one reverse
    /// sweep sees every child before the cell that owns it.
    fn aggregate(&mut self, strength: f32) {
        for current in (0..self.cells.len()).rev() {
            let (count, sum) = if self.cells[current].is_leaf() {
                self.chain(&self.cells[current])
                    .fold((0u32, Vec2::ZERO), |(count, sum), index| {
                        (count + 1, sum + self.positions[index])
                    })
            } else {
                self.cells[current]
                    .children
                    .iter()
                    .flatten()
                    .map(|&child| &self.cells[child])
                    .fold((0u32, Vec2::ZERO), |(count, sum), child| {
                        (count + child.count, sum + child.centroid * child.count as f32)
                    })
            };

            let cell = &mut self.cells[current];
            cell.count = count;
            cell.charge = strength * count as f32;
            if count > 0 {
                cell.centroid = sum / count as f32;
            }
        }
    }

    pub(super) fn root(&self) -> &Cell {
        &self.cells[0]
    }

    /// Points chained in a leaf.
    pub(super) fn chain(&self, cell: &Cell) -> impl Iterator<Item = usize> + '_ {
        std::iter::successors(cell.head, |&index| self.next[index])
    }

    /// Pre-order walk from the root. `enter` returns whether to descend into
    /// the cell's children.
    pub(super) fn visit(&self, mut enter: impl FnMut(&Cell) -> bool) {
        let mut stack = vec![0usize];
        while let Some(current) = stack.pop() {
            let cell = &self.cells[current];
            if enter(cell) {
                stack.extend(cell.children.iter().rev().flatten());
            }
        }
    }
}

/// Smallest square, anchored at the lower corner, that holds every point
/// with the upper edge exclusive.
fn root_square(positions: &[Vec2]) -> Option<(Vec2, f32)> {
    // `f32::min` skips NaN, so check every point rather than the bounds.
    if !positions.iter().all(|point| point.x.is_finite() && point.y.is_finite()) {
        return None;
    }

    let first = *positions.first()?;
    let (min, max) = positions
        .iter()
        .fold((first, first), |(min, max), point| (min.min(*point), max.max(*point)));

    let span = (max.x - min.x).max(max.y - min.y);
    // Pad so points on the max edge still fall strictly inside.
    let side = (span * (1.0 + 1e-3)).max(1.0);
    Some((min, side))
}
