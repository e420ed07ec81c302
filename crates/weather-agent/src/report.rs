use std::fmt::Write as _;

const COLUMN_WIDTH: usize = 52;

/// One row of the question/answer report.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReportRow {
    /// The question asked.
    pub question: String,
    /// A one-line answer, e.g. `function:current_temperature`.
    pub answer: String,
}

impl ReportRow {
    /// Creates a row.
    #[inline]
    pub fn new<Q, A>(question: Q, answer: A) -> Self
    where
        Q: Into<String>,
        A: Into<String>,
    {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }
}

/// Renders the rows as a two-column table, one line per row.
///
/// Cells are left-justified and padded with `_` to the column width.
/// Longer cells are kept whole.
pub fn render_table(rows: &[ReportRow]) -> String {
    let width = COLUMN_WIDTH;
    let dashes = "-".repeat(width);
    let mut table = String::new();
    _ = writeln!(
        table,
        "|{:^width$}|{:^width$}|",
        "agent question", "agent anwser"
    );
    _ = writeln!(table, "|{dashes}|{dashes}|");
    for row in rows {
        _ = writeln!(
            table,
            "|{:_<width$}|{:_<width$}|",
            row.question, row.answer
        );
    }
    table
}
