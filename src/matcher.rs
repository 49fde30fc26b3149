//! Match detection over rows and columns.

use crate::board::{Board, MATCH_MIN, Position};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    Row,
    Column,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchKind {
    /// Run of exactly three.
    Line3,
    /// Run of exactly four; the match holds every same-colour tile of the whole line.
    Line4Capture,
    /// Run of five or more; candidate for a special tile.
    ConnectedGroup,
}

/// One resolved run. Positions are in scan order (left to right, top to bottom).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    pub kind: MatchKind,
    pub axis: Axis,
    pub positions: Vec<Position>,
}

impl Match {
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Index of the row or column this match lies in.
    pub fn line(&self) -> Option<usize> {
        let first = self.positions.first()?;
        Some(match self.axis {
            Axis::Row => first.row,
            Axis::Column => first.col,
        })
    }
}

/// All row matches (top to bottom) followed by all column matches (left to right).
/// A tile that sits in both a horizontal and a vertical run appears in both.
pub fn find_matches(board: &Board) -> Vec<Match> {
    let mut out = Vec::new();
    for row in 0..board.size() {
        let line: Vec<Position> = board.row(row).collect();
        scan_line(board, &line, Axis::Row, &mut out);
    }
    for col in 0..board.size() {
        let line: Vec<Position> = board.column(col).collect();
        scan_line(board, &line, Axis::Column, &mut out);
    }
    out
}

/// Walk one line, emitting a match for every maximal run of at least `MATCH_MIN`.
/// Countdown tiles never start a run and, having their own kind, end any run they meet.
fn scan_line(board: &Board, line: &[Position], axis: Axis, out: &mut Vec<Match>) {
    let mut start = 0;
    while start < line.len() {
        let kind = board[line[start]].kind;
        if kind.is_countdown() {
            start += 1;
            continue;
        }
        let mut end = start + 1;
        while end < line.len() && board[line[end]].kind == kind {
            end += 1;
        }
        let run = &line[start..end];
        match run.len() {
            n if n < MATCH_MIN => {}
            4 => out.push(Match {
                kind: MatchKind::Line4Capture,
                axis,
                positions: line
                    .iter()
                    .copied()
                    .filter(|&p| board[p].kind == kind)
                    .collect(),
            }),
            3 => out.push(Match {
                kind: MatchKind::Line3,
                axis,
                positions: run.to_vec(),
            }),
            _ => out.push(Match {
                kind: MatchKind::ConnectedGroup,
                axis,
                positions: run.to_vec(),
            }),
        }
        start = end;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board(s: &str) -> Board {
        s.parse().expect("valid layout")
    }

    fn p(row: usize, col: usize) -> Position {
        Position::new(row, col)
    }

    #[test]
    fn test_no_matches_on_checkerboard() {
        let b = board(
            "RBRBR
             BRBRB
             RBRBR
             BRBRB
             RBRBR",
        );
        assert!(find_matches(&b).is_empty());
    }

    #[test]
    fn test_row_run_of_three() {
        let b = board(
            "RRRBG
             BGBGB
             GBGBG
             BGBGB
             GBGBG",
        );
        let m = find_matches(&b);
        assert_eq!(m.len(), 1);
        assert_eq!(m[0].kind, MatchKind::Line3);
        assert_eq!(m[0].axis, Axis::Row);
        assert_eq!(m[0].positions, vec![p(0, 0), p(0, 1), p(0, 2)]);
    }

    #[test]
    fn test_run_at_edge_is_counted_once() {
        let b = board(
            "BGRRR
             GBGBG
             BGBGB
             GBGBG
             BGBGB",
        );
        let m = find_matches(&b);
        assert_eq!(m.len(), 1);
        assert_eq!(m[0].positions, vec![p(0, 2), p(0, 3), p(0, 4)]);
    }

    #[test]
    fn test_run_of_four_captures_whole_row() {
        let b = board(
            "RRRRBR#R
             BGBGBGBG
             GBGBGBGB
             BGBGBGBG
             GBGBGBGB
             BGBGBGBG
             GBGBGBGB
             BGBGBGBG",
        );
        let m = find_matches(&b);
        assert_eq!(m.len(), 1);
        assert_eq!(m[0].kind, MatchKind::Line4Capture);
        assert_eq!(
            m[0].positions,
            vec![p(0, 0), p(0, 1), p(0, 2), p(0, 3), p(0, 5), p(0, 7)]
        );
    }

    #[test]
    fn test_run_of_four_in_column() {
        let b = board(
            "YBGBG
             YGBGB
             YBGBG
             YGBGB
             BBGYG",
        );
        let m = find_matches(&b);
        assert_eq!(m.len(), 1);
        assert_eq!(m[0].kind, MatchKind::Line4Capture);
        assert_eq!(m[0].axis, Axis::Column);
        assert_eq!(m[0].line(), Some(0));
        assert_eq!(m[0].len(), 4);
    }

    #[test]
    fn test_run_of_five_is_connected_group() {
        let b = board(
            "PPPPP
             BGBGB
             GBGBG
             BGBGB
             GBGBG",
        );
        let m = find_matches(&b);
        assert_eq!(m.len(), 1);
        assert_eq!(m[0].kind, MatchKind::ConnectedGroup);
        assert_eq!(m[0].len(), 5);
    }

    #[test]
    fn test_countdown_separates_runs() {
        let b = board(
            "RR#RR
             BGBGB
             GBGBG
             BGBGB
             GBGBG",
        );
        assert!(find_matches(&b).is_empty());

        let b = board(
            "RRR#RRR
             BGBGBGB
             GBGBGBG
             BGBGBGB
             GBGBGBG
             BGBGBGB
             GBGBGBG",
        );
        let m = find_matches(&b);
        assert_eq!(m.len(), 2);
        assert_eq!(m[0].positions, vec![p(0, 0), p(0, 1), p(0, 2)]);
        assert_eq!(m[1].positions, vec![p(0, 4), p(0, 5), p(0, 6)]);
    }

    #[test]
    fn test_countdown_runs_never_match() {
        let b = board(
            "###BG
             #GBGB
             #BGBG
             BGBGB
             GBGBG",
        );
        assert!(find_matches(&b).is_empty());
    }

    #[test]
    fn test_crossing_runs_are_reported_separately() {
        let b = board(
            "GRGBG
             RRRGB
             GRBGB
             BGGBG
             GBBGB",
        );
        let m = find_matches(&b);
        assert_eq!(m.len(), 2);
        assert_eq!(m[0].axis, Axis::Row);
        assert_eq!(m[1].axis, Axis::Column);
        assert!(m[0].positions.contains(&p(1, 1)));
        assert!(m[1].positions.contains(&p(1, 1)));
    }
}
