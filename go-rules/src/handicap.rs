use crate::Point;
use crate::error::GoError;
use crate::grid::Grid;

/// Largest handicap a board can hold: 9 from 13x13 up, 5 on smaller odd
/// square boards, none otherwise.
pub fn max_handicap(grid: &Grid) -> u8 {
    let size = grid.cols();
    if !grid.is_square() || size < 7 || size.is_multiple_of(2) {
        return 0;
    }
    if size >= 13 { 9 } else { 5 }
}

/// Star points of the board, corners first. Empty when the board has no
/// conventional star points.
pub fn star_points(grid: &Grid) -> Vec<Point> {
    let max = max_handicap(grid);
    if max == 0 {
        return Vec::new();
    }
    let mut points = place(grid, max);
    points.sort_unstable();
    points
}

/// Fixed handicap stones for `count`. A handicap of 0 places nothing; a
/// handicap of 1 is not a placement, so it is rejected together with counts
/// the board cannot hold.
pub fn handicap_points(grid: &Grid, count: u8) -> Result<Vec<Point>, GoError> {
    if count == 0 {
        return Ok(Vec::new());
    }
    if count < 2 || count > max_handicap(grid) {
        return Err(GoError::InvalidHandicap {
            count,
            cols: grid.cols(),
            rows: grid.rows(),
        });
    }
    Ok(place(grid, count))
}

fn place(grid: &Grid, count: u8) -> Vec<Point> {
    let size = grid.cols();
    // Star point distance from the edge.
    let off = if size >= 13 { 3 } else { 2 };
    let far = size - 1 - off;
    let mid = size / 2;

    let tl = (off, off);
    let tr = (far, off);
    let bl = (off, far);
    let br = (far, far);
    let cc = (mid, mid);
    let ml = (off, mid);
    let mr = (far, mid);
    let tc = (mid, off);
    let bc = (mid, far);

    match count {
        2 => vec![tr, bl],
        3 => vec![tr, bl, br],
        4 => vec![tl, tr, bl, br],
        5 => vec![tl, tr, bl, br, cc],
        6 => vec![tl, tr, ml, mr, bl, br],
        7 => vec![tl, tr, ml, mr, bl, br, cc],
        8 => vec![tl, tr, ml, mr, bl, br, tc, bc],
        _ => vec![tl, tr, ml, mr, bl, br, tc, bc, cc],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(cols: u8, rows: u8) -> Grid {
        Grid::new(cols, rows).unwrap()
    }

    #[test]
    fn max_handicap_by_size() {
        assert_eq!(max_handicap(&grid(5, 5)), 0);
        assert_eq!(max_handicap(&grid(6, 6)), 0);
        assert_eq!(max_handicap(&grid(7, 7)), 5);
        assert_eq!(max_handicap(&grid(11, 11)), 5);
        assert_eq!(max_handicap(&grid(13, 13)), 9);
        assert_eq!(max_handicap(&grid(19, 19)), 9);
        assert_eq!(max_handicap(&grid(9, 13)), 0);
    }

    #[test]
    fn rejects_impossible_handicaps() {
        assert_eq!(
            handicap_points(&grid(9, 9), 6),
            Err(GoError::InvalidHandicap { count: 6, cols: 9, rows: 9 })
        );
        assert!(handicap_points(&grid(19, 19), 1).is_err());
        assert!(handicap_points(&grid(19, 19), 10).is_err());
        assert!(handicap_points(&grid(6, 6), 2).is_err());
    }

    #[test]
    fn zero_handicap_places_nothing() {
        assert_eq!(handicap_points(&grid(19, 19), 0), Ok(Vec::new()));
        assert_eq!(handicap_points(&grid(4, 4), 0), Ok(Vec::new()));
    }

    #[test]
    fn counts_match_on_19x19() {
        for n in 2..=9 {
            assert_eq!(handicap_points(&grid(19, 19), n).unwrap().len(), n as usize);
        }
    }

    #[test]
    fn nine_stones_on_13x13() {
        let pts = handicap_points(&grid(13, 13), 9).unwrap();
        for p in [(3, 3), (9, 3), (3, 6), (9, 6), (3, 9), (9, 9), (6, 3), (6, 9), (6, 6)] {
            assert!(pts.contains(&p), "13x13: missing {p:?}");
        }
    }

    #[test]
    fn star_points_of_9x9() {
        assert_eq!(
            star_points(&grid(9, 9)),
            vec![(2, 2), (2, 6), (4, 4), (6, 2), (6, 6)]
        );
        assert!(star_points(&grid(5, 5)).is_empty());
    }
}
