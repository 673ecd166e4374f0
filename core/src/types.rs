use serde::{Deserialize, Serialize};

/// Single coordinate axis used for board width, height, and positions.
pub type Coord = u8;

/// Two-dimensional coordinates. Grid games use `(row, col)`, snake uses `(x, y)`.
pub type Coord2 = (Coord, Coord);

pub trait ToNdIndex {
    type Output;
    fn to_nd_index(self) -> Self::Output;
}

impl ToNdIndex for Coord2 {
    type Output = [usize; 2];

    fn to_nd_index(self) -> Self::Output {
        [self.0.into(), self.1.into()]
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [Self::Up, Self::Down, Self::Left, Self::Right];

    pub const fn opposite(self) -> Self {
        use Direction::*;
        match self {
            Up => Down,
            Down => Up,
            Left => Right,
            Right => Left,
        }
    }

    pub const fn is_opposite(self, other: Self) -> bool {
        matches!(
            (self, other),
            (Self::Up, Self::Down)
                | (Self::Down, Self::Up)
                | (Self::Left, Self::Right)
                | (Self::Right, Self::Left)
        )
    }

    /// Displacement as `(dx, dy)` with `y` growing downwards.
    pub const fn delta(self) -> (i8, i8) {
        use Direction::*;
        match self {
            Up => (0, -1),
            Down => (0, 1),
            Left => (-1, 0),
            Right => (1, 0),
        }
    }

    /// Moves `(x, y)` one step, returning a value only when it remains inside `bounds`.
    pub fn apply(self, (x, y): Coord2, (max_x, max_y): Coord2) -> Option<Coord2> {
        let (dx, dy) = self.delta();

        let next_x = x.checked_add_signed(dx)?;
        if next_x >= max_x {
            return None;
        }

        let next_y = y.checked_add_signed(dy)?;
        if next_y >= max_y {
            return None;
        }

        Some((next_x, next_y))
    }

    /// Arrow keys and WASD, as reported by `KeyboardEvent.key`.
    pub fn from_key(key: &str) -> Option<Self> {
        use Direction::*;
        match key {
            "ArrowUp" | "w" | "W" => Some(Up),
            "ArrowDown" | "s" | "S" => Some(Down),
            "ArrowLeft" | "a" | "A" => Some(Left),
            "ArrowRight" | "d" | "D" => Some(Right),
            _ => None,
        }
    }

    /// Swipe along the dominant axis, ignored below `threshold` pixels.
    pub fn from_swipe(dx: f64, dy: f64, threshold: f64) -> Option<Self> {
        use Direction::*;
        if dx.abs().max(dy.abs()) < threshold {
            return None;
        }
        if dx.abs() > dy.abs() {
            Some(if dx > 0. { Right } else { Left })
        } else {
            Some(if dy > 0. { Down } else { Up })
        }
    }
}
