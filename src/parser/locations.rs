/// A position in the program source, 1-based in both coordinates.
#[derive(Clone, Copy, Default, PartialEq, Eq, Debug)]
pub struct Location {
    pub(crate) line: usize,
    pub(crate) column: usize,
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}
