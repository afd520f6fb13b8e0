//! Board generation and difficulty progression
//!
//! Everything here is a pure function of its inputs; the only randomness is the
//! target cell, drawn from the RNG the caller passes in.

use glam::Vec2;
use rand::Rng;

use super::state::{Color, Dot, PALETTE};
use crate::consts::*;

/// Next rung of the dot ladder (caps at the last rung)
pub fn next_max_dots(current: u32) -> u32 {
    DOT_LADDER
        .iter()
        .position(|&n| n == current)
        .and_then(|i| DOT_LADDER.get(i + 1))
        .copied()
        .unwrap_or(DOT_LADDER[DOT_LADDER.len() - 1])
}

/// Dot diameter after one difficulty step
pub fn shrink_dot(size: f32) -> f32 {
    if size > MIN_DOT_SIZE {
        (size - DOT_SHRINK_STEP).max(MIN_DOT_SIZE)
    } else {
        size
    }
}

/// Displayed per-round budget after stepping up to `max_dots`
pub fn time_budget_ms(max_dots: u32) -> u64 {
    let divisor = max_dots.clamp(1, TIME_BUDGET_DOT_CAP) as u64;
    (START_TIME_BUDGET_MS / divisor).max(MIN_TIME_BUDGET_MS)
}

/// Side of the square grid holding `max_dots`
pub fn grid_side(max_dots: u32) -> usize {
    ((max_dots as f64).sqrt().ceil() as usize).max(1)
}

/// How strongly the target is darkened on palette boards
pub fn darken_factor(correct_choices: u32) -> f32 {
    (DARKEN_BASE + correct_choices as f32 * DARKEN_STEP).min(DARKEN_MAX)
}

/// Generate a board for one round
///
/// The board always has `grid_side(max_dots)²` dots in row-major order, with
/// exactly one target chosen uniformly at random.
pub fn layout<R: Rng + ?Sized>(
    max_dots: u32,
    dot_size: f32,
    round: u32,
    correct_choices: u32,
    rng: &mut R,
) -> Vec<Dot> {
    let side = grid_side(max_dots);
    let total = side * side;
    let target = rng.random_range(0..total);
    let pitch = dot_size + DOT_GAP;

    // Small boards: white decoys, red target. Large boards: one palette colour
    // per round, target is a darker shade of it.
    let (decoy, accent) = if max_dots < PALETTE_MODE_MIN_DOTS {
        (Color::WHITE, Color::RED)
    } else {
        let base = Color::from_argb(PALETTE[round as usize % PALETTE.len()]);
        (base, base.darken(darken_factor(correct_choices)))
    };

    (0..total)
        .map(|i| {
            let is_target = i == target;
            Dot {
                pos: Vec2::new((i % side) as f32 * pitch, (i / side) as f32 * pitch),
                size: dot_size,
                color: if is_target { accent } else { decoy },
                is_target,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_ladder_advances_and_caps() {
        assert_eq!(next_max_dots(4), 9);
        assert_eq!(next_max_dots(9), 16);
        assert_eq!(next_max_dots(16), 25);
        assert_eq!(next_max_dots(25), 36);
        assert_eq!(next_max_dots(36), 36);
    }

    #[test]
    fn test_shrink_dot_floors_at_min() {
        assert_eq!(shrink_dot(43.0), 41.5);
        assert_eq!(shrink_dot(39.0), 38.0);
        assert_eq!(shrink_dot(38.0), 38.0);

        let mut size = INITIAL_DOT_SIZE;
        for _ in 0..20 {
            size = shrink_dot(size);
        }
        assert_eq!(size, MIN_DOT_SIZE);
    }

    #[test]
    fn test_time_budget() {
        assert_eq!(time_budget_ms(9), 1000);
        assert_eq!(time_budget_ms(36), 1000);
        assert_eq!(time_budget_ms(2), 1500);
    }

    #[test]
    fn test_grid_side_rounds_up() {
        assert_eq!(grid_side(4), 2);
        assert_eq!(grid_side(5), 3);
        assert_eq!(grid_side(36), 6);
    }

    #[test]
    fn test_small_board_two_colour_mode() {
        let mut rng = Pcg32::seed_from_u64(7);
        let dots = layout(9, 43.0, 3, 2, &mut rng);
        assert_eq!(dots.len(), 9);
        assert_eq!(dots.iter().filter(|d| d.is_target).count(), 1);
        for dot in &dots {
            let expected = if dot.is_target { Color::RED } else { Color::WHITE };
            assert_eq!(dot.color, expected);
        }
    }

    #[test]
    fn test_large_board_palette_mode() {
        let mut rng = Pcg32::seed_from_u64(11);
        let round = 25;
        let dots = layout(16, 40.0, round, 5, &mut rng);
        let base = Color::from_argb(PALETTE[round as usize % 22]);
        let target = dots.iter().find(|d| d.is_target).unwrap();
        assert_eq!(target.color, base.darken(darken_factor(5)));
        assert!(dots.iter().filter(|d| !d.is_target).all(|d| d.color == base));
    }

    #[test]
    fn test_darken_factor_caps() {
        assert!((darken_factor(0) - 0.2).abs() < 1e-6);
        assert!((darken_factor(10) - 0.5).abs() < 1e-6);
        assert_eq!(darken_factor(100), DARKEN_MAX);
    }

    #[test]
    fn test_row_major_positions() {
        let mut rng = Pcg32::seed_from_u64(1);
        let dots = layout(4, 43.0, 1, 0, &mut rng);
        assert_eq!(dots[0].pos, Vec2::new(0.0, 0.0));
        assert_eq!(dots[1].pos, Vec2::new(63.0, 0.0));
        assert_eq!(dots[2].pos, Vec2::new(0.0, 63.0));
        assert_eq!(dots[3].pos, Vec2::new(63.0, 63.0));
    }

    #[test]
    fn test_layout_is_seedable() {
        let a = layout(25, 41.5, 7, 4, &mut Pcg32::seed_from_u64(99));
        let b = layout(25, 41.5, 7, 4, &mut Pcg32::seed_from_u64(99));
        assert_eq!(a, b);
    }
}
