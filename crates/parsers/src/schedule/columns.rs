use std::ops::Range;

/// Column titles of a schedule listing, in their fixed left-to-right order
const HEADERS: [&str; 8] = [
    "CCode",
    "Typ",
    "Sec",
    "Unt",
    "Instructor",
    "Time",
    "Place",
    "Final",
];

/// Character ranges of the data columns, discovered from a header row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnLayout {
    /// Length of the header row; shorter rows are not data rows
    pub width: usize,
    pub code: Range<usize>,
    pub section_type: Range<usize>,
    pub section: Range<usize>,
    pub units: Range<usize>,
    pub instructor: Range<usize>,
    pub time: Range<usize>,
    pub place: Range<usize>,
}

impl ColumnLayout {
    /// Derives column ranges from a header row.
    ///
    /// Each column ends one character before the next title starts, and every
    /// column after the first starts where the previous one ends, so data
    /// reaching left of a short title is still captured.
    ///
    /// # Arguments
    /// * `line` - A row containing every column title in order
    ///
    /// # Returns
    /// `None` if any title is missing or out of order
    pub fn from_header(line: &str) -> Option<Self> {
        let mut spans = [(0, 0); HEADERS.len()];
        let mut from = 0;

        for (span, title) in spans.iter_mut().zip(HEADERS) {
            let start = from + line.get(from..)?.find(title)?;
            *span = (start, start + title.len());
            from = span.1;
        }

        let column = |i: usize| {
            let start = if i == 0 {
                spans[0].0
            } else {
                spans[i].0.saturating_sub(1)
            };
            let end = spans[i + 1].0.saturating_sub(1).max(start);
            start..end
        };

        Some(Self {
            width: line.len(),
            code: column(0),
            section_type: column(1),
            section: column(2),
            units: column(3),
            instructor: column(4),
            time: column(5),
            place: column(6),
        })
    }

    /// The trimmed contents of `range` in `line`, clamped to the line's length
    pub fn field<'a>(&self, line: &'a str, range: &Range<usize>) -> &'a str {
        let end = range.end.min(line.len());
        let start = range.start.min(end);
        line.get(start..end).unwrap_or_default().trim()
    }
}
