// the collection of small utility functions shared across the engine
use simplelog::{ColorChoice, CombinedLogger, Config, LevelFilter, TermLogger, TerminalMode};

/// Set up terminal logging for consumers and tests. Repeated calls are
/// harmless: only the first initialization takes effect.
pub fn init_logging(level: &str) {
    let level = match level {
        "trace" => LevelFilter::Trace,
        "debug" => LevelFilter::Debug,
        "info" => LevelFilter::Info,
        "warn" => LevelFilter::Warn,
        "error" => LevelFilter::Error,
        _ => LevelFilter::Info,
    };
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}

/// All items except the one at `index`.
pub fn all_except<T: Clone>(items: &[T], index: usize) -> Vec<T> {
    items
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != index)
        .map(|(_, t)| t.clone())
        .collect()
}

/// Split items into (chosen, remaining) by a sorted list of indices.
pub fn split_by_indices<T: Clone>(items: &[T], indices: &[usize]) -> (Vec<T>, Vec<T>) {
    let mut chosen = Vec::with_capacity(indices.len());
    let mut remaining = Vec::with_capacity(items.len() - indices.len());
    let mut next = indices.iter().peekable();
    for (i, item) in items.iter().enumerate() {
        if next.peek() == Some(&&i) {
            chosen.push(item.clone());
            next.next();
        } else {
            remaining.push(item.clone());
        }
    }
    (chosen, remaining)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_except() {
        assert_eq!(all_except(&[1, 2, 3], 1), vec![1, 3]);
        assert_eq!(all_except(&[1], 0), Vec::<i32>::new());
    }

    #[test]
    fn test_split_by_indices() {
        let (chosen, rest) = split_by_indices(&[10, 20, 30, 40], &[0, 2]);
        assert_eq!(chosen, vec![10, 30]);
        assert_eq!(rest, vec![20, 40]);
    }
}
