//! Special-tile creation from connected groups of five or more.

use crate::board::{Board, Position, Special, TileKind};
use crate::generator::TileFactory;
use crate::matcher::Match;
use std::collections::{HashMap, HashSet, VecDeque};

/// Group size that earns a special tile.
pub const SPECIAL_GROUP_MIN: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecialTile {
    pub position: Position,
    pub kind: TileKind,
    pub special: Special,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecialPlan {
    pub created: Vec<SpecialTile>,
    /// Input matches with every created position removed.
    pub remaining: Vec<Match>,
}

/// Decide which matched cells become special tiles.
///
/// Matched positions are grouped into 4-connected same-colour components in
/// first-encounter order. A straight line of exactly five becomes a bolt, but only when
/// `last_swap` is one of its cells. Any other group of five or more becomes a bomb at
/// `last_swap` when it belongs to the group, else at the member with the most
/// same-colour matched neighbours (first encountered wins ties).
pub fn plan_specials(board: &Board, matches: &[Match], last_swap: Option<Position>) -> SpecialPlan {
    let mut order: Vec<Position> = Vec::new();
    let mut colors: HashMap<Position, TileKind> = HashMap::new();
    for pos in matches.iter().flat_map(|m| m.positions.iter().copied()) {
        if colors.insert(pos, board[pos].kind).is_none() {
            order.push(pos);
        }
    }

    let mut created = Vec::new();
    let mut visited: HashSet<Position> = HashSet::new();
    for &start in &order {
        if visited.contains(&start) {
            continue;
        }
        let color = colors[&start];
        let group = connected_group(start, color, &colors, board.size(), &mut visited);
        if group.len() < SPECIAL_GROUP_MIN {
            continue;
        }
        let swapped_here = last_swap.filter(|p| group.contains(p));
        if is_straight_five(&group) {
            if let Some(position) = swapped_here {
                created.push(SpecialTile {
                    position,
                    kind: color,
                    special: Special::Bolt,
                });
            }
        } else {
            let position = swapped_here
                .unwrap_or_else(|| best_bomb_cell(&group, color, &colors, board.size()));
            created.push(SpecialTile {
                position,
                kind: color,
                special: Special::Bomb,
            });
        }
    }

    let taken: HashSet<Position> = created.iter().map(|s| s.position).collect();
    let remaining = matches
        .iter()
        .map(|m| Match {
            positions: m
                .positions
                .iter()
                .copied()
                .filter(|p| !taken.contains(p))
                .collect(),
            ..m.clone()
        })
        .collect();

    SpecialPlan { created, remaining }
}

/// Write fresh, unmatched special tiles into the board so they survive the refill.
pub fn apply_specials(board: &mut Board, created: &[SpecialTile], factory: &mut TileFactory) {
    for s in created {
        let tile = factory.special(s.position, s.kind, s.special);
        board.set(s.position, tile);
    }
}

/// Breadth-first walk over matched cells of `color`.
fn connected_group(
    start: Position,
    color: TileKind,
    colors: &HashMap<Position, TileKind>,
    size: usize,
    visited: &mut HashSet<Position>,
) -> Vec<Position> {
    let mut group = Vec::new();
    let mut queue = VecDeque::from([start]);
    while let Some(pos) = queue.pop_front() {
        if !visited.insert(pos) {
            continue;
        }
        group.push(pos);
        for n in pos.neighbours(size) {
            if colors.get(&n) == Some(&color) && !visited.contains(&n) {
                queue.push_back(n);
            }
        }
    }
    group
}

fn is_straight_five(group: &[Position]) -> bool {
    if group.len() != SPECIAL_GROUP_MIN {
        return false;
    }
    let span = |values: Vec<usize>| {
        let lo = values.iter().min().copied().unwrap_or(0);
        let hi = values.iter().max().copied().unwrap_or(0);
        hi - lo
    };
    let first = group[0];
    if group.iter().all(|p| p.row == first.row) {
        return span(group.iter().map(|p| p.col).collect()) == SPECIAL_GROUP_MIN - 1;
    }
    if group.iter().all(|p| p.col == first.col) {
        return span(group.iter().map(|p| p.row).collect()) == SPECIAL_GROUP_MIN - 1;
    }
    false
}

fn best_bomb_cell(
    group: &[Position],
    color: TileKind,
    colors: &HashMap<Position, TileKind>,
    size: usize,
) -> Position {
    let mut best = group[0];
    let mut best_count = 0;
    for &pos in group {
        let count = pos
            .neighbours(size)
            .filter(|n| colors.get(n) == Some(&color))
            .count();
        if count > best_count {
            best_count = count;
            best = pos;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::find_matches;

    fn board(s: &str) -> Board {
        s.parse().expect("valid layout")
    }

    fn p(row: usize, col: usize) -> Position {
        Position::new(row, col)
    }

    const FIVE_IN_ROW: &str = "BGBGBGB
                               GRRRRRG
                               BGBGBGB
                               GBGBGBG
                               BGBGBGB
                               GBGBGBG
                               BGBGBGB";

    #[test]
    fn test_straight_five_with_swap_makes_bolt() {
        let b = board(FIVE_IN_ROW);
        let matches = find_matches(&b);
        let plan = plan_specials(&b, &matches, Some(p(1, 3)));
        assert_eq!(
            plan.created,
            vec![SpecialTile {
                position: p(1, 3),
                kind: TileKind::Red,
                special: Special::Bolt,
            }]
        );
        assert_eq!(plan.remaining[0].len(), 4);
        assert!(!plan.remaining[0].positions.contains(&p(1, 3)));
    }

    #[test]
    fn test_straight_five_without_swap_makes_nothing() {
        let b = board(FIVE_IN_ROW);
        let matches = find_matches(&b);
        assert!(plan_specials(&b, &matches, None).created.is_empty());
        assert!(plan_specials(&b, &matches, Some(p(0, 0))).created.is_empty());
    }

    #[test]
    fn test_t_shape_bomb_at_swap() {
        let b = board(
            "YYYBG
             BYGRB
             GYBGR
             BGRBG
             GRGBR",
        );
        let matches = find_matches(&b);
        assert_eq!(matches.len(), 2);
        let plan = plan_specials(&b, &matches, Some(p(2, 1)));
        assert_eq!(plan.created.len(), 1);
        assert_eq!(plan.created[0].position, p(2, 1));
        assert_eq!(plan.created[0].special, Special::Bomb);
        assert_eq!(plan.created[0].kind, TileKind::Yellow);
    }

    #[test]
    fn test_l_shape_bomb_at_busiest_cell_without_swap() {
        let b = board(
            "YYYBG
             BGYRB
             GRYGR
             BGRBG
             GRGBR",
        );
        let matches = find_matches(&b);
        let plan = plan_specials(&b, &matches, None);
        assert_eq!(plan.created.len(), 1);
        // (0, 1), (0, 2) and (1, 2) tie at two neighbours; (0, 1) is seen first.
        assert_eq!(plan.created[0].position, p(0, 1));
        let cleared: usize = plan.remaining.iter().map(Match::len).sum();
        assert_eq!(cleared, 5);
    }

    #[test]
    fn test_swap_outside_group_falls_back_to_busiest_cell() {
        let b = board(
            "GYGBG
             YYYRB
             GYBGR
             BGRBG
             GRGBR",
        );
        let matches = find_matches(&b);
        let plan = plan_specials(&b, &matches, Some(p(4, 4)));
        assert_eq!(plan.created.len(), 1);
        assert_eq!(plan.created[0].position, p(1, 1));
    }

    #[test]
    fn test_small_groups_make_nothing() {
        let b = board(
            "RRRBG
             BGBGB
             GBGBG
             BGBGB
             GBGBG",
        );
        let plan = plan_specials(&b, &find_matches(&b), Some(p(0, 1)));
        assert!(plan.created.is_empty());
        assert_eq!(plan.remaining, find_matches(&b));
    }

    #[test]
    fn test_apply_specials_leaves_fresh_unmatched_tile() {
        let mut b = board(FIVE_IN_ROW);
        b[p(1, 3)].matched = true;
        let mut factory = TileFactory::new(9);
        let created = [SpecialTile {
            position: p(1, 3),
            kind: TileKind::Red,
            special: Special::Bolt,
        }];
        apply_specials(&mut b, &created, &mut factory);
        let tile = &b[p(1, 3)];
        assert!(tile.is_bolt());
        assert!(!tile.matched);
        assert_eq!(tile.kind, TileKind::Red);
        assert_eq!(tile.position, p(1, 3));
    }
}
