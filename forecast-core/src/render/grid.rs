use crate::model::{CELL_LINES, Cell, ForecastPeriod};

/// Lay periods out left to right as one fixed-width block of text.
///
/// Every line of every cell is centered to the widest line found anywhere in
/// the grid, then row `r` of each cell is joined with `|`. No periods gives an
/// empty string.
pub fn render_grid(periods: &[ForecastPeriod]) -> String {
    let cells: Vec<Cell> = periods.iter().map(ForecastPeriod::cell).collect();
    render_cells(&cells)
}

pub fn render_cells(cells: &[Cell]) -> String {
    let Some(width) = cells.iter().map(Cell::width).max() else {
        return String::new();
    };

    (0..CELL_LINES)
        .map(|row| {
            cells
                .iter()
                .map(|cell| center(&cell.lines()[row], width))
                .collect::<Vec<_>>()
                .join("|")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Pad `text` with spaces to `width` characters; an odd pad puts the extra
/// space on the right. Text already at least `width` wide is returned as is.
pub fn center(text: &str, width: usize) -> String {
    let len = text.chars().count();
    if len >= width {
        return text.to_string();
    }

    let pad = width - len;
    let left = pad / 2;
    format!("{}{}{}", " ".repeat(left), text, " ".repeat(pad - left))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::period::tests::raw_period;

    fn period(start: &str, end: &str, temp: i64, wind: &str) -> ForecastPeriod {
        let mut raw = raw_period(start, end, temp);
        raw["windSpeed"] = wind.into();
        ForecastPeriod::from_raw(raw).unwrap()
    }

    #[test]
    fn centering_puts_odd_space_on_the_right() {
        assert_eq!(center("ab", 5), " ab  ");
        assert_eq!(center("ab", 6), "  ab  ");
        assert_eq!(center("", 3), "   ");
        assert_eq!(center("toolong", 3), "toolong");
    }

    #[test]
    fn empty_input_is_empty_string() {
        assert_eq!(render_grid(&[]), "");
    }

    #[test]
    fn single_cell_has_no_separators() {
        let p = period("2024-06-01T14:00:00-05:00", "2024-06-01T15:00:00-05:00", 55, "5 mph");
        let out = render_grid(std::slice::from_ref(&p));

        assert!(!out.contains('|'));
        let width = p.cell().width();
        let lines: Vec<&str> = out.split('\n').collect();
        assert_eq!(lines.len(), CELL_LINES);
        for (got, want) in lines.iter().zip(p.cell().lines()) {
            assert_eq!(got.chars().count(), width);
            assert_eq!(got.trim(), want);
        }
    }

    #[test]
    fn all_cells_pad_to_the_longest_line_in_the_grid() {
        let short = period("2024-06-01T14:00:00-05:00", "2024-06-01T15:00:00-05:00", 55, "5 mph");
        let long = period("2024-06-01T15:00:00-05:00", "2024-06-01T16:00:00-05:00", 54, "10 to 15 mph");

        // `10to15mph` is 9 characters and the widest line in either cell
        let out = render_grid(&[short, long]);
        let lines: Vec<&str> = out.split('\n').collect();

        assert_eq!(lines.len(), CELL_LINES);
        assert_eq!(lines[0], "   55F   |   54F   ");
        assert_eq!(lines[2], "         |         ");
        assert_eq!(lines[5], "  5mph   |10to15mph");
        assert_eq!(lines[6], "  2-3PM  |  3-4PM  ");
        for line in &lines {
            assert_eq!(line.chars().count(), 9 * 2 + 1);
        }
    }
}
