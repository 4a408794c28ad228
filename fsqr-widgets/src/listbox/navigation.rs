use super::OptionSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

/// Next enabled option after `from`, wrapping around the list.
///
/// `from` itself is considered last, so a lone enabled option maps to itself.
/// Returns `None` only when every option is disabled.
#[must_use]
pub fn step_enabled(options: &[OptionSnapshot], from: usize, direction: Direction) -> Option<usize> {
    let len = options.len();
    if len == 0 {
        return None;
    }
    let from = from % len;
    (1..=len)
        .map(|offset| match direction {
            Direction::Forward => (from + offset) % len,
            Direction::Backward => (from + len - offset % len) % len,
        })
        .find(|&idx| options[idx].is_enabled())
}

#[must_use]
pub fn first_enabled(options: &[OptionSnapshot]) -> Option<usize> {
    options.iter().position(OptionSnapshot::is_enabled)
}

#[must_use]
pub fn last_enabled(options: &[OptionSnapshot]) -> Option<usize> {
    options.iter().rposition(OptionSnapshot::is_enabled)
}

/// Index shown when the widget is first built: the first selected enabled
/// option, else the first enabled option, else 0.
#[must_use]
pub fn resolve_initial(options: &[OptionSnapshot]) -> usize {
    options
        .iter()
        .position(|opt| opt.selected && opt.is_enabled())
        .or_else(|| first_enabled(options))
        .unwrap_or(0)
}
